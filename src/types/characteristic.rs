//! Host-facing characteristics of a light accessory.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// A capability the host framework binds get/set hooks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum Characteristic {
    On,
    Brightness,
    ColorTemperature,
    Hue,
    Saturation,
}

/// A value read from or written to a [`Characteristic`].
///
/// Brightness is in the vendor encoding (`0..=255`), color temperature in
/// mireds, hue in degrees and saturation in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CharacteristicValue {
    On(bool),
    Brightness(u16),
    ColorTemperature(u16),
    Hue(f64),
    Saturation(f64),
}

impl CharacteristicValue {
    /// The characteristic this value belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_lights_rs::{Characteristic, CharacteristicValue};
    ///
    /// assert_eq!(CharacteristicValue::Hue(12.0).characteristic(), Characteristic::Hue);
    /// ```
    pub fn characteristic(&self) -> Characteristic {
        match self {
            CharacteristicValue::On(_) => Characteristic::On,
            CharacteristicValue::Brightness(_) => Characteristic::Brightness,
            CharacteristicValue::ColorTemperature(_) => Characteristic::ColorTemperature,
            CharacteristicValue::Hue(_) => Characteristic::Hue,
            CharacteristicValue::Saturation(_) => Characteristic::Saturation,
        }
    }
}
