//! Brightness state for Sengled lights.

use serde::{Deserialize, Serialize};

/// Brightness in the vendor encoding, bounded by `min..=max`.
///
/// `value` is `None` when the device does not report brightness, which is how
/// the vendor signals that brightness control is unsupported.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BrightnessState {
    value: Option<u8>,
    min: u8,
    max: u8,
}

impl Default for BrightnessState {
    fn default() -> Self {
        Self::unsupported()
    }
}

impl BrightnessState {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 255;

    /// Brightness for a device that reports `value`, clamped into range.
    pub fn new(value: u8) -> Self {
        BrightnessState {
            value: Some(value.clamp(Self::MIN, Self::MAX)),
            min: Self::MIN,
            max: Self::MAX,
        }
    }

    /// Brightness for a device without brightness control.
    pub fn unsupported() -> Self {
        BrightnessState {
            value: None,
            min: Self::MIN,
            max: Self::MAX,
        }
    }

    pub(crate) fn from_reported(value: Option<u8>) -> Self {
        value.map_or_else(Self::unsupported, Self::new)
    }

    pub fn supports_brightness(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<u8> {
        self.value
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Set the brightness, clamping into `min..=max`.
    ///
    /// Returns the stored value, or `None` (leaving the state untouched) when
    /// brightness is unsupported.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_lights_rs::BrightnessState;
    ///
    /// let mut brightness = BrightnessState::new(10);
    /// assert_eq!(brightness.set_value(300), Some(255));
    /// assert_eq!(brightness.value(), Some(255));
    ///
    /// let mut unsupported = BrightnessState::unsupported();
    /// assert_eq!(unsupported.set_value(20), None);
    /// ```
    pub fn set_value(&mut self, value: u16) -> Option<u8> {
        if !self.supports_brightness() {
            return None;
        }
        let clamped = value.clamp(u16::from(self.min), u16::from(self.max)) as u8;
        self.value = Some(clamped);
        self.value
    }
}
