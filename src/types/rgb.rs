//! RGB color representations and the black-body approximation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::types::temperature::mireds_to_kelvins;

/// An RGB color with components normalized to `0.0..=1.0`.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct NormalizedRgb {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl NormalizedRgb {
    /// Create a color, clamping each component into `0.0..=1.0`.
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self {
            red: red.clamp(0.0, 1.0),
            green: green.clamp(0.0, 1.0),
            blue: blue.clamp(0.0, 1.0),
        }
    }

    /// Encode as vendor bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_lights_rs::{ByteRgb, NormalizedRgb};
    ///
    /// let rgb = NormalizedRgb::new(1.0, 0.5, 0.0);
    /// assert_eq!(rgb.to_bytes(), ByteRgb::rgb(255, 128, 0));
    /// ```
    pub fn to_bytes(&self) -> ByteRgb {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        ByteRgb::rgb(byte(self.red), byte(self.green), byte(self.blue))
    }
}

/// An RGB color in the vendor's wire encoding (0-255 each).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ByteRgb {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl ByteRgb {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Decode into normalized components.
    pub fn to_normalized(&self) -> NormalizedRgb {
        NormalizedRgb {
            red: f64::from(self.red) / 255.0,
            green: f64::from(self.green) / 255.0,
            blue: f64::from(self.blue) / 255.0,
        }
    }
}

impl From<ByteRgb> for NormalizedRgb {
    fn from(rgb: ByteRgb) -> Self {
        rgb.to_normalized()
    }
}

impl From<NormalizedRgb> for ByteRgb {
    fn from(rgb: NormalizedRgb) -> Self {
        rgb.to_bytes()
    }
}

impl FromStr for ByteRgb {
    type Err = Error;

    /// Parse from comma-separated string (e.g., "255,128,0").
    fn from_str(s: &str) -> Result<Self, Error> {
        let parts = s
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| Error::InvalidColorString(s.to_string()))?;
        match parts[..] {
            [red, green, blue] => Ok(Self::rgb(red, green, blue)),
            _ => Err(Error::InvalidColorString(s.to_string())),
        }
    }
}

/// Approximate the color of a black-body radiator at `kelvins`.
///
/// Tanner Helland's curve fit, producing normalized components. The input is
/// clamped to 1000K..=40000K.
///
/// # Examples
///
/// ```
/// use sengled_lights_rs::{NormalizedRgb, kelvins_to_rgb};
///
/// assert_eq!(kelvins_to_rgb(6600), NormalizedRgb::new(1.0, 1.0, 1.0));
/// ```
pub fn kelvins_to_rgb(kelvins: u32) -> NormalizedRgb {
    let t = (f64::from(kelvins.clamp(1000, 40000)) / 100.0).floor();

    let red = if t <= 66.0 {
        1.0
    } else {
        329.698727446 * (t - 60.0).powf(-0.1332047592) / 255.0
    };

    let green = if t <= 66.0 {
        (99.4708025861 * t.ln() - 161.1195681661) / 255.0
    } else {
        288.1221695283 * (t - 60.0).powf(-0.0755148492) / 255.0
    };

    let blue = if t >= 66.0 {
        1.0
    } else if t <= 19.0 {
        0.0
    } else {
        (138.5177312231 * (t - 10.0).ln() - 305.0447927307) / 255.0
    };

    NormalizedRgb::new(red, green, blue)
}

/// Black-body color for a temperature given in mireds.
pub fn mireds_to_rgb(mireds: u16) -> NormalizedRgb {
    kelvins_to_rgb(mireds_to_kelvins(mireds))
}
