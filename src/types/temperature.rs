//! Color temperature units and the vendor's compact temperature encoding.
//!
//! The host side speaks mireds (`1_000_000 / kelvin`, larger is warmer); the
//! vendor cloud speaks a `0..=100` scale where `0` is the warmest end of the
//! product's range and `100` the coolest.

use crate::config::ColorConfig;

/// Lowest value of the vendor color temperature encoding (warmest).
pub const VENDOR_TEMPERATURE_MIN: u8 = 0;
/// Highest value of the vendor color temperature encoding (coolest).
pub const VENDOR_TEMPERATURE_MAX: u8 = 100;

/// Convert mireds to Kelvin, rounding to the nearest whole Kelvin.
///
/// # Examples
///
/// ```
/// use sengled_lights_rs::mireds_to_kelvins;
///
/// assert_eq!(mireds_to_kelvins(200), 5000);
/// assert_eq!(mireds_to_kelvins(500), 2000);
/// ```
pub fn mireds_to_kelvins(mireds: u16) -> u32 {
    (1_000_000.0 / f64::from(mireds.max(1))).round() as u32
}

/// Convert Kelvin to mireds, rounding to the nearest whole mired.
///
/// # Examples
///
/// ```
/// use sengled_lights_rs::kelvins_to_mireds;
///
/// assert_eq!(kelvins_to_mireds(5000), 200);
/// assert_eq!(kelvins_to_mireds(6500), 154);
/// ```
pub fn kelvins_to_mireds(kelvins: u32) -> u16 {
    let mireds = (1_000_000.0 / f64::from(kelvins.max(1))).round();
    mireds.min(f64::from(u16::MAX)) as u16
}

/// Decode a vendor color temperature into mireds for the given product.
///
/// The scale is linear and reversed: vendor `0` is the config's maximum
/// mireds, vendor `100` its minimum.
///
/// # Examples
///
/// ```
/// use sengled_lights_rs::{ColorConfig, vendor_to_mireds};
///
/// let config = ColorConfig::default();
/// assert_eq!(vendor_to_mireds(0, &config), config.max_mireds);
/// assert_eq!(vendor_to_mireds(100, &config), config.min_mireds);
/// ```
pub fn vendor_to_mireds(vendor: u8, config: &ColorConfig) -> u16 {
    let vendor = vendor.min(VENDOR_TEMPERATURE_MAX);
    scale_range(
        f64::from(vendor),
        f64::from(VENDOR_TEMPERATURE_MIN),
        f64::from(VENDOR_TEMPERATURE_MAX),
        f64::from(config.max_mireds),
        f64::from(config.min_mireds),
    )
    .round() as u16
}

/// Encode mireds as a vendor color temperature for the given product.
///
/// Values outside the config's range saturate at the ends of the vendor scale.
pub fn mireds_to_vendor(mireds: u16, config: &ColorConfig) -> u8 {
    let vendor = scale_range(
        f64::from(config.clamp_mireds(mireds)),
        f64::from(config.min_mireds),
        f64::from(config.max_mireds),
        f64::from(VENDOR_TEMPERATURE_MAX),
        f64::from(VENDOR_TEMPERATURE_MIN),
    )
    .round();
    vendor.clamp(
        f64::from(VENDOR_TEMPERATURE_MIN),
        f64::from(VENDOR_TEMPERATURE_MAX),
    ) as u8
}

fn scale_range(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    (value - from_min) * (to_max - to_min) / (from_max - from_min) + to_min
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelvin_mired_examples() {
        assert_eq!(kelvins_to_mireds(5000), 200);
        assert_eq!(mireds_to_kelvins(200), 5000);
        assert_eq!(mireds_to_kelvins(140), 7143);
        assert_eq!(kelvins_to_mireds(0), u16::MAX);
    }

    #[test]
    fn test_vendor_scale_is_reversed() {
        let config = ColorConfig::default();
        assert_eq!(mireds_to_vendor(config.max_mireds, &config), 0);
        assert_eq!(mireds_to_vendor(config.min_mireds, &config), 100);
        assert_eq!(vendor_to_mireds(50, &config), 320);
        assert_eq!(mireds_to_vendor(320, &config), 50);
    }

    #[test]
    fn test_vendor_out_of_range_saturates() {
        let config = ColorConfig::default();
        assert_eq!(mireds_to_vendor(1000, &config), 0);
        assert_eq!(mireds_to_vendor(10, &config), 100);
        assert_eq!(vendor_to_mireds(250, &config), config.min_mireds);
    }

    #[test]
    fn test_vendor_round_trip_is_bounded_and_monotonic() {
        for config in [ColorConfig::default(), ColorConfig::for_product("E12-N1E")] {
            let mut previous = u8::MAX;
            for mireds in config.min_mireds..=config.max_mireds {
                let vendor = mireds_to_vendor(mireds, &config);
                assert!(vendor <= previous, "vendor encoding must not increase");
                previous = vendor;

                let back = vendor_to_mireds(vendor, &config);
                assert!(
                    back.abs_diff(mireds) <= 2,
                    "{mireds} -> {vendor} -> {back} exceeds quantization error"
                );
            }
        }
    }
}
