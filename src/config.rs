//! Product color ranges and platform configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// CIE xy chromaticity triangle a product can reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gamut {
    pub red: (f64, f64),
    pub green: (f64, f64),
    pub blue: (f64, f64),
}

/// Per-product color temperature bounds, in mireds.
///
/// `min_mireds` is the coolest temperature the product can show and
/// `max_mireds` the warmest. [`ColorConfig::new`] and deserialization both
/// reject ranges where `min_mireds >= max_mireds`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawColorConfig")]
pub struct ColorConfig {
    pub min_mireds: u16,
    pub max_mireds: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamut: Option<Gamut>,
}

/// Unchecked wire form of [`ColorConfig`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColorConfig {
    min_mireds: u16,
    max_mireds: u16,
    #[serde(default)]
    gamut: Option<Gamut>,
}

impl TryFrom<RawColorConfig> for ColorConfig {
    type Error = Error;

    fn try_from(raw: RawColorConfig) -> Result<Self> {
        ColorConfig::new(raw.min_mireds, raw.max_mireds, raw.gamut)
    }
}

/// Host default range: 2000K to ~7143K.
const DEFAULT_COLOR_CONFIG: ColorConfig = ColorConfig {
    min_mireds: 140,
    max_mireds: 500,
    gamut: None,
};

/// Known products and the color range each of them supports.
const PRODUCT_COLOR_CONFIGS: &[(&[&str], ColorConfig)] = &[(
    &["E12-N1E"],
    // 2000K to ~6500K
    ColorConfig {
        min_mireds: 154,
        max_mireds: 500,
        gamut: None,
    },
)];

impl Default for ColorConfig {
    fn default() -> Self {
        DEFAULT_COLOR_CONFIG
    }
}

impl ColorConfig {
    /// A color range from `min_mireds` (coolest) to `max_mireds` (warmest).
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_lights_rs::{ColorConfig, Error};
    ///
    /// assert!(ColorConfig::new(153, 370, None).is_ok());
    /// assert!(matches!(
    ///     ColorConfig::new(500, 140, None),
    ///     Err(Error::InvalidColorRange { min: 500, max: 140 })
    /// ));
    /// ```
    pub fn new(min_mireds: u16, max_mireds: u16, gamut: Option<Gamut>) -> Result<Self> {
        if min_mireds >= max_mireds {
            return Err(Error::InvalidColorRange {
                min: min_mireds,
                max: max_mireds,
            });
        }
        Ok(ColorConfig {
            min_mireds,
            max_mireds,
            gamut,
        })
    }

    /// Look up the color range for a product code, case-insensitively.
    ///
    /// Unknown products get the default range.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_lights_rs::ColorConfig;
    ///
    /// assert_eq!(ColorConfig::for_product("e12-n1e").min_mireds, 154);
    /// assert_eq!(ColorConfig::for_product("W21-N13"), ColorConfig::default());
    /// ```
    pub fn for_product(product_code: &str) -> Self {
        PRODUCT_COLOR_CONFIGS
            .iter()
            .find(|(codes, _)| codes.iter().any(|c| c.eq_ignore_ascii_case(product_code)))
            .map(|(_, config)| *config)
            .unwrap_or_default()
    }

    /// Clamp a temperature into this product's range.
    ///
    /// A range built by hand with its bounds swapped clamps to the warmest
    /// bound instead of panicking.
    pub fn clamp_mireds(&self, mireds: u16) -> u16 {
        mireds.max(self.min_mireds).min(self.max_mireds)
    }
}

/// When a write policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyGate {
    Never,
    Always,
    /// Only while the automatic lighting schedule drives the light.
    #[default]
    WhileScheduleActive,
}

impl PolicyGate {
    pub fn applies(self, schedule_active: bool) -> bool {
        match self {
            PolicyGate::Never => false,
            PolicyGate::Always => true,
            PolicyGate::WhileScheduleActive => schedule_active,
        }
    }
}

/// Policies that trade remote writes for local-only updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WritePolicy {
    /// Keep color writes local while the light is off and flush them on
    /// the next power-on.
    pub defer_while_off: PolicyGate,
    /// Skip color writes that encode to the value already on the device.
    pub suppress_redundant: PolicyGate,
}

/// Settings the host hands to the platform.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformConfig {
    pub username: String,
    pub password: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub discovery_interval: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub request_timeout: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub session_lifetime: Duration,
    pub enable_adaptive_lighting: bool,
    pub write_policy: WritePolicy,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        PlatformConfig {
            username: String::new(),
            password: String::new(),
            discovery_interval: Duration::from_secs(360),
            request_timeout: Duration::from_millis(4000),
            session_lifetime: Duration::from_secs(24 * 60 * 60),
            enable_adaptive_lighting: false,
            write_policy: WritePolicy::default(),
        }
    }
}

impl PlatformConfig {
    /// Parse the JSON configuration block supplied by the host.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use sengled_lights_rs::PlatformConfig;
    ///
    /// let config = PlatformConfig::from_json(
    ///     r#"{"username": "me@example.com", "password": "hunter2", "discoveryInterval": 60}"#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.discovery_interval, Duration::from_secs(60));
    /// assert_eq!(config.request_timeout, Duration::from_millis(4000));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::JsonLoad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_lookup() {
        let config = ColorConfig::for_product("E12-N1E");
        assert_eq!(config.min_mireds, 154);
        assert_eq!(config.max_mireds, 500);
        assert_eq!(ColorConfig::for_product(""), ColorConfig::default());
        assert!(config.min_mireds < config.max_mireds);
    }

    #[test]
    fn test_color_config_round_trip() {
        let config = ColorConfig::for_product("E12-N1E");
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"minMireds":154,"maxMireds":500}"#);
        assert_eq!(serde_json::from_str::<ColorConfig>(&json).unwrap(), config);
    }

    #[test]
    fn test_inverted_color_range_is_rejected() {
        let err = serde_json::from_str::<ColorConfig>(r#"{"minMireds":500,"maxMireds":140}"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid color temperature range"));
        let empty = r#"{"minMireds":300,"maxMireds":300}"#;
        assert!(serde_json::from_str::<ColorConfig>(empty).is_err());
    }

    #[test]
    fn test_clamp_with_swapped_bounds() {
        let swapped = ColorConfig {
            min_mireds: 500,
            max_mireds: 140,
            gamut: None,
        };
        assert_eq!(swapped.clamp_mireds(320), 140);

        let config = ColorConfig::default();
        assert_eq!(config.clamp_mireds(10), 140);
        assert_eq!(config.clamp_mireds(320), 320);
        assert_eq!(config.clamp_mireds(900), 500);
    }

    #[test]
    fn test_policy_gate() {
        assert!(!PolicyGate::Never.applies(true));
        assert!(PolicyGate::Always.applies(false));
        assert!(PolicyGate::WhileScheduleActive.applies(true));
        assert!(!PolicyGate::WhileScheduleActive.applies(false));
    }

    #[test]
    fn test_full_config() {
        let config = PlatformConfig::from_json(
            r#"{
                "username": "me@example.com",
                "password": "secret",
                "requestTimeout": 2500,
                "sessionLifetime": 3600,
                "enableAdaptiveLighting": true,
                "writePolicy": {"deferWhileOff": "always", "suppressRedundant": "never"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.session_lifetime, Duration::from_secs(3600));
        assert_eq!(config.discovery_interval, Duration::from_secs(360));
        assert!(config.enable_adaptive_lighting);
        assert_eq!(config.write_policy.defer_while_off, PolicyGate::Always);
        assert_eq!(config.write_policy.suppress_redundant, PolicyGate::Never);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            PlatformConfig::from_json(r#"{"discoveryInterval": "soon"}"#),
            Err(Error::JsonLoad(_))
        ));
    }
}
