//! Color state of a single light.
//!
//! A light may support color temperature, RGB, or both. [`ColorState`] makes
//! that explicit: hue and saturation only exist next to an RGB value, and are
//! recomputed whenever the value they derive from changes, so they can never
//! go stale.

use serde::{Deserialize, Serialize};
use strum_macros::FromRepr;

use crate::config::ColorConfig;
use crate::errors::Error;
use crate::types::{
    ByteRgb, Characteristic, Hsv, NormalizedRgb, mireds_to_rgb, mireds_to_vendor, normalize_hue,
    rgb_to_hsv, vendor_to_mireds,
};

type Result<T> = std::result::Result<T, Error>;

/// Which representation was set last and is therefore authoritative.
///
/// The discriminants are the vendor's `colorMode` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRepr)]
#[repr(u8)]
pub enum ColorMode {
    Rgb = 1,
    Temperature = 2,
}

/// Color data for a light, tagged by capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorState {
    TemperatureOnly {
        mireds: u16,
    },
    RgbOnly {
        rgb: NormalizedRgb,
        hsv: Hsv,
    },
    /// `hsv` follows `mireds` in [`ColorMode::Temperature`] and `rgb` in
    /// [`ColorMode::Rgb`].
    Both {
        mireds: u16,
        rgb: NormalizedRgb,
        hsv: Hsv,
        mode: ColorMode,
    },
}

impl ColorState {
    /// Build the state for whichever capabilities are present.
    ///
    /// Returns `None` when the light supports neither.
    pub fn new(
        mireds: Option<u16>,
        rgb: Option<NormalizedRgb>,
        mode: ColorMode,
    ) -> Option<Self> {
        match (mireds, rgb) {
            (Some(mireds), None) => Some(ColorState::TemperatureOnly { mireds }),
            (None, Some(rgb)) => Some(ColorState::RgbOnly {
                rgb,
                hsv: rgb_to_hsv(&rgb),
            }),
            (Some(mireds), Some(rgb)) => {
                let hsv = match mode {
                    ColorMode::Temperature => rgb_to_hsv(&mireds_to_rgb(mireds)),
                    ColorMode::Rgb => rgb_to_hsv(&rgb),
                };
                Some(ColorState::Both {
                    mireds,
                    rgb,
                    hsv,
                    mode,
                })
            }
            (None, None) => None,
        }
    }
}

/// Opaque copy of a [`ColorModel`]'s state, for rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSnapshot(ColorState);

/// Single source of truth for one light's color.
///
/// # Example
///
/// ```
/// use sengled_lights_rs::{ColorConfig, ColorMode, ColorModel, ColorState, NormalizedRgb};
///
/// let red = NormalizedRgb::new(1.0, 0.0, 0.0);
/// let state = ColorState::new(Some(300), Some(red), ColorMode::Rgb).unwrap();
/// let mut color = ColorModel::new(ColorConfig::default(), state);
/// assert_eq!(color.hue().unwrap(), 0.0);
///
/// color.set_color_temperature(200).unwrap();
/// assert_eq!(color.mode(), ColorMode::Temperature);
/// assert_eq!(color.color_temperature().unwrap(), 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorModel {
    config: ColorConfig,
    state: ColorState,
}

impl ColorModel {
    /// Create a model. A temperature outside the config's range is clamped.
    pub fn new(config: ColorConfig, state: ColorState) -> Self {
        let state = match state {
            ColorState::TemperatureOnly { mireds } => ColorState::TemperatureOnly {
                mireds: config.clamp_mireds(mireds),
            },
            ColorState::Both {
                mireds, rgb, mode, ..
            } => {
                // Re-derive hsv from the clamped temperature.
                let mireds = config.clamp_mireds(mireds);
                ColorState::new(Some(mireds), Some(rgb), mode)
                    .unwrap_or(ColorState::TemperatureOnly { mireds })
            }
            rgb_only => rgb_only,
        };
        ColorModel { config, state }
    }

    /// Build a model from vendor-encoded attributes.
    ///
    /// Returns `None` when the device reports neither a color temperature nor
    /// an RGB color.
    pub fn from_vendor(
        config: ColorConfig,
        temperature: Option<u8>,
        rgb: Option<ByteRgb>,
        mode: Option<ColorMode>,
    ) -> Option<Self> {
        let mireds = temperature.map(|t| vendor_to_mireds(t, &config));
        let mode = mode.unwrap_or(if mireds.is_some() {
            ColorMode::Temperature
        } else {
            ColorMode::Rgb
        });
        ColorState::new(mireds, rgb.map(NormalizedRgb::from), mode)
            .map(|state| Self::new(config, state))
    }

    pub fn config(&self) -> &ColorConfig {
        &self.config
    }

    pub fn state(&self) -> &ColorState {
        &self.state
    }

    pub fn min_color_temperature(&self) -> u16 {
        self.config.min_mireds
    }

    pub fn max_color_temperature(&self) -> u16 {
        self.config.max_mireds
    }

    pub fn supports_color_temperature(&self) -> bool {
        matches!(
            self.state,
            ColorState::TemperatureOnly { .. } | ColorState::Both { .. }
        )
    }

    pub fn supports_rgb(&self) -> bool {
        matches!(self.state, ColorState::RgbOnly { .. } | ColorState::Both { .. })
    }

    pub fn mode(&self) -> ColorMode {
        match self.state {
            ColorState::TemperatureOnly { .. } => ColorMode::Temperature,
            ColorState::RgbOnly { .. } => ColorMode::Rgb,
            ColorState::Both { mode, .. } => mode,
        }
    }

    pub fn color_temperature(&self) -> Result<u16> {
        match self.state {
            ColorState::TemperatureOnly { mireds } | ColorState::Both { mireds, .. } => Ok(mireds),
            ColorState::RgbOnly { .. } => Err(Error::Unsupported(Characteristic::ColorTemperature)),
        }
    }

    /// Set the color temperature and make it authoritative.
    ///
    /// The value is clamped into the product's range. When RGB is supported
    /// too, hue and saturation are recomputed from the black-body color.
    pub fn set_color_temperature(&mut self, mireds: u16) -> Result<()> {
        let mireds = self.config.clamp_mireds(mireds);
        match &mut self.state {
            ColorState::TemperatureOnly { mireds: current } => *current = mireds,
            ColorState::Both {
                mireds: current,
                hsv,
                mode,
                ..
            } => {
                *current = mireds;
                *hsv = rgb_to_hsv(&mireds_to_rgb(mireds));
                *mode = ColorMode::Temperature;
            }
            ColorState::RgbOnly { .. } => {
                return Err(Error::Unsupported(Characteristic::ColorTemperature));
            }
        }
        Ok(())
    }

    pub fn hsv(&self) -> Result<Hsv> {
        match self.state {
            ColorState::RgbOnly { hsv, .. } | ColorState::Both { hsv, .. } => Ok(hsv),
            ColorState::TemperatureOnly { .. } => Err(Error::Unsupported(Characteristic::Hue)),
        }
    }

    pub fn hue(&self) -> Result<f64> {
        self.hsv().map(|hsv| hsv.hue)
    }

    pub fn saturation(&self) -> Result<f64> {
        self.hsv()
            .map(|hsv| hsv.saturation)
            .map_err(|_| Error::Unsupported(Characteristic::Saturation))
    }

    /// Set the hue, recompute RGB at full value and make RGB authoritative.
    pub fn set_hue(&mut self, hue: f64) -> Result<()> {
        self.update_hsv(Characteristic::Hue, |hsv| hsv.hue = normalize_hue(hue))
    }

    /// Set the saturation, recompute RGB at full value and make RGB
    /// authoritative.
    pub fn set_saturation(&mut self, saturation: f64) -> Result<()> {
        self.update_hsv(Characteristic::Saturation, |hsv| {
            hsv.saturation = saturation.clamp(0.0, 100.0)
        })
    }

    pub fn rgb(&self) -> Result<NormalizedRgb> {
        match self.state {
            ColorState::RgbOnly { rgb, .. } | ColorState::Both { rgb, .. } => Ok(rgb),
            ColorState::TemperatureOnly { .. } => Err(Error::Unsupported(Characteristic::Hue)),
        }
    }

    /// The current temperature in the vendor's `0..=100` encoding.
    pub fn vendor_color_temperature(&self) -> Result<u8> {
        self.color_temperature()
            .map(|mireds| mireds_to_vendor(mireds, &self.config))
    }

    /// The current RGB color in the vendor's byte encoding.
    pub fn vendor_rgb(&self) -> Result<ByteRgb> {
        self.rgb().map(|rgb| rgb.to_bytes())
    }

    pub fn snapshot(&self) -> ColorSnapshot {
        ColorSnapshot(self.state.clone())
    }

    pub fn restore(&mut self, snapshot: ColorSnapshot) {
        self.state = snapshot.0;
    }

    fn update_hsv<F>(&mut self, characteristic: Characteristic, update: F) -> Result<()>
    where
        F: FnOnce(&mut Hsv),
    {
        match &mut self.state {
            ColorState::RgbOnly { rgb, hsv } => {
                update(hsv);
                hsv.value = 100.0;
                *rgb = hsv.to_rgb();
            }
            ColorState::Both { rgb, hsv, mode, .. } => {
                update(hsv);
                hsv.value = 100.0;
                *rgb = hsv.to_rgb();
                *mode = ColorMode::Rgb;
            }
            ColorState::TemperatureOnly { .. } => return Err(Error::Unsupported(characteristic)),
        }
        Ok(())
    }
}
