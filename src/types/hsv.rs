//! Hue/saturation/value color representation.

use serde::{Deserialize, Serialize};

use super::NormalizedRgb;

/// Hue in degrees (`0..360`), saturation and value in percent (`0..=100`).
///
/// This is the representation the host framework uses for colored lights.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl Default for Hsv {
    fn default() -> Self {
        Hsv {
            hue: 0.0,
            saturation: 0.0,
            value: 100.0,
        }
    }
}

impl Hsv {
    /// Create a color at full value, normalizing hue into `0..360` and
    /// clamping saturation into `0..=100`.
    pub fn new(hue: f64, saturation: f64) -> Self {
        Hsv {
            hue: normalize_hue(hue),
            saturation: saturation.clamp(0.0, 100.0),
            value: 100.0,
        }
    }

    /// Convert to normalized RGB.
    pub fn to_rgb(&self) -> NormalizedRgb {
        hsv_to_rgb(self)
    }
}

impl From<&NormalizedRgb> for Hsv {
    fn from(rgb: &NormalizedRgb) -> Self {
        rgb_to_hsv(rgb)
    }
}

/// Wrap a hue angle into `0..360`.
pub(crate) fn normalize_hue(hue: f64) -> f64 {
    if hue.is_finite() {
        hue.rem_euclid(360.0)
    } else {
        0.0
    }
}

/// Convert normalized RGB to HSV, rounding each channel to a whole number.
///
/// A gray (zero chroma) input has hue `0`.
///
/// # Examples
///
/// ```
/// use sengled_lights_rs::{Hsv, NormalizedRgb, rgb_to_hsv};
///
/// let hsv = rgb_to_hsv(&NormalizedRgb::new(0.0, 0.0, 1.0));
/// assert_eq!(hsv, Hsv { hue: 240.0, saturation: 100.0, value: 100.0 });
///
/// let gray = rgb_to_hsv(&NormalizedRgb::new(0.5, 0.5, 0.5));
/// assert_eq!(gray.hue, 0.0);
/// assert_eq!(gray.saturation, 0.0);
/// ```
pub fn rgb_to_hsv(rgb: &NormalizedRgb) -> Hsv {
    let NormalizedRgb { red, green, blue } = *rgb;
    let max = red.max(green).max(blue);
    let min = red.min(green).min(blue);
    let chroma = max - min;

    let sector = if chroma == 0.0 {
        0.0
    } else if max == red {
        (6.0 + (green - blue) / chroma) % 6.0
    } else if max == green {
        2.0 + (blue - red) / chroma
    } else {
        4.0 + (red - green) / chroma
    };

    let saturation = if max == 0.0 { 0.0 } else { chroma / max };

    Hsv {
        hue: normalize_hue((sector * 60.0).round()),
        saturation: (saturation * 100.0).round(),
        value: (max * 100.0).round(),
    }
}

/// Convert HSV to normalized RGB.
///
/// # Examples
///
/// ```
/// use sengled_lights_rs::{Hsv, NormalizedRgb, hsv_to_rgb};
///
/// assert_eq!(hsv_to_rgb(&Hsv::new(120.0, 100.0)), NormalizedRgb::new(0.0, 1.0, 0.0));
/// assert_eq!(hsv_to_rgb(&Hsv::new(0.0, 0.0)), NormalizedRgb::new(1.0, 1.0, 1.0));
/// ```
pub fn hsv_to_rgb(hsv: &Hsv) -> NormalizedRgb {
    let saturation = hsv.saturation.clamp(0.0, 100.0) / 100.0;
    let value = hsv.value.clamp(0.0, 100.0) / 100.0;
    let sector = normalize_hue(hsv.hue) / 60.0;

    let chroma = value * saturation;
    let x = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());

    let (r, g, b) = if sector < 1.0 {
        (chroma, x, 0.0)
    } else if sector < 2.0 {
        (x, chroma, 0.0)
    } else if sector < 3.0 {
        (0.0, chroma, x)
    } else if sector < 4.0 {
        (0.0, x, chroma)
    } else if sector < 5.0 {
        (x, 0.0, chroma)
    } else {
        (chroma, 0.0, x)
    };

    let m = value - chroma;
    NormalizedRgb::new(r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(hsv_to_rgb(&Hsv::new(0.0, 100.0)), NormalizedRgb::new(1.0, 0.0, 0.0));
        assert_eq!(hsv_to_rgb(&Hsv::new(240.0, 100.0)), NormalizedRgb::new(0.0, 0.0, 1.0));
        assert_eq!(rgb_to_hsv(&NormalizedRgb::new(1.0, 0.0, 0.0)).hue, 0.0);
        assert_eq!(rgb_to_hsv(&NormalizedRgb::new(0.0, 1.0, 0.0)).hue, 120.0);
    }

    #[test]
    fn test_hue_wraps() {
        assert_eq!(Hsv::new(360.0, 50.0).hue, 0.0);
        assert_eq!(Hsv::new(-90.0, 50.0).hue, 270.0);
        assert_eq!(Hsv::new(f64::NAN, 50.0).hue, 0.0);
    }

    #[test]
    fn test_black_has_zero_saturation() {
        let hsv = rgb_to_hsv(&NormalizedRgb::new(0.0, 0.0, 0.0));
        assert_eq!(hsv, Hsv { hue: 0.0, saturation: 0.0, value: 0.0 });
    }

    #[test]
    fn test_half_saturated_orange() {
        let rgb = hsv_to_rgb(&Hsv::new(30.0, 50.0));
        assert_eq!(rgb.red, 1.0);
        assert!((rgb.green - 0.75).abs() < 1e-9);
        assert!((rgb.blue - 0.5).abs() < 1e-9);
        assert_eq!(rgb_to_hsv(&rgb), Hsv { hue: 30.0, saturation: 50.0, value: 100.0 });
    }
}
