//! Value types and unit conversions for light state.

mod brightness;
mod characteristic;
mod hsv;
mod rgb;
mod temperature;

pub use brightness::BrightnessState;
pub use characteristic::{Characteristic, CharacteristicValue};
pub use hsv::{Hsv, hsv_to_rgb, rgb_to_hsv};
pub(crate) use hsv::normalize_hue;
pub use rgb::{ByteRgb, NormalizedRgb, kelvins_to_rgb, mireds_to_rgb};
pub use temperature::{
    VENDOR_TEMPERATURE_MAX, VENDOR_TEMPERATURE_MIN, kelvins_to_mireds, mireds_to_kelvins,
    mireds_to_vendor, vendor_to_mireds,
};
