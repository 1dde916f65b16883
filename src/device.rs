//! Device attributes reported by the vendor cloud, and the durable record
//! kept for each tracked accessory.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::color::{ColorMode, ColorModel};
use crate::config::ColorConfig;
use crate::errors::Error;
use crate::gateway::check_response;
use crate::types::{BrightnessState, ByteRgb};

type Result<T> = std::result::Result<T, Error>;

const MANUFACTURER: &str = "Sengled";
const DEFAULT_MODEL: &str = "Sengled Hub";

/// One device as reported by a device listing.
///
/// Optional attributes are the only capability signal: a bulb without
/// `color_temperature` cannot change temperature, one without `rgb` cannot
/// show colors, one without `brightness` cannot dim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    pub id: String,
    pub name: Option<String>,
    pub on: bool,
    pub brightness: Option<u8>,
    pub color_temperature: Option<u8>,
    pub color_mode: Option<ColorMode>,
    pub rgb: Option<ByteRgb>,
    pub is_online: bool,
    pub signal_quality: Option<i32>,
    pub product_code: Option<String>,
    pub firmware_version: Option<String>,
}

/// The name shown for a device: its name, or its id when the name is empty.
///
/// # Examples
///
/// ```
/// use sengled_lights_rs::{DeviceAttributes, display_name};
///
/// let mut device = DeviceAttributes { id: "B0:CE:18".into(), ..Default::default() };
/// assert_eq!(display_name(&device), "B0:CE:18");
///
/// device.name = Some("Porch".into());
/// assert_eq!(display_name(&device), "Porch");
/// ```
pub fn display_name(device: &DeviceAttributes) -> &str {
    match device.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => &device.id,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceDetailsResponse {
    #[serde(default)]
    ret: i32,
    #[serde(default)]
    device_infos: Vec<DeviceInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceInfo {
    #[serde(default)]
    lamp_infos: Vec<LampInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LampInfo {
    device_uuid: String,
    #[serde(default)]
    attributes: LampAttributes,
}

/// Lamp attributes as sent by the vendor; numbers may arrive as strings.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LampAttributes {
    name: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    onoff: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    brightness: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    color_temperature: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    color_mode: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    rgb_color_r: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    rgb_color_g: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    rgb_color_b: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    is_online: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    device_rssi: Option<i32>,
    product_code: Option<String>,
    firmware_version: Option<String>,
}

impl LampInfo {
    fn into_attributes(self) -> DeviceAttributes {
        let attrs = self.attributes;
        let rgb = match (attrs.rgb_color_r, attrs.rgb_color_g, attrs.rgb_color_b) {
            (Some(r), Some(g), Some(b)) => Some(ByteRgb::rgb(r, g, b)),
            _ => None,
        };

        DeviceAttributes {
            id: self.device_uuid,
            name: attrs.name,
            on: attrs.onoff.is_some_and(|v| v != 0),
            brightness: attrs.brightness,
            color_temperature: attrs.color_temperature,
            color_mode: attrs.color_mode.and_then(ColorMode::from_repr),
            rgb,
            is_online: attrs.is_online.is_some_and(|v| v != 0),
            signal_quality: attrs.device_rssi,
            product_code: attrs.product_code,
            firmware_version: attrs.firmware_version,
        }
    }
}

/// Parse the body of a device-details listing into one entry per lamp.
///
/// A non-success response code is reported the same way a write failure is,
/// see [`check_response`].
pub fn parse_device_details(body: &str) -> Result<Vec<DeviceAttributes>> {
    let response: DeviceDetailsResponse = serde_json::from_str(body).map_err(Error::JsonLoad)?;
    check_response("getDevices", response.ret)?;

    Ok(response
        .device_infos
        .into_iter()
        .flat_map(|info| info.lamp_infos)
        .map(LampInfo::into_attributes)
        .collect())
}

/// Durable per-accessory context.
///
/// Created on the first sighting of a device id and refreshed on every
/// discovery tick. A host can persist it and hand it back on restart.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    id: String,
    display_name: String,
    power_on: bool,
    brightness: BrightnessState,
    color: Option<ColorModel>,
    is_online: bool,
    signal_quality: Option<i32>,
    firmware_version: Option<String>,
    product_code: Option<String>,
}

impl DeviceRecord {
    pub fn from_attributes(device: &DeviceAttributes) -> Self {
        DeviceRecord {
            id: device.id.clone(),
            display_name: display_name(device).to_string(),
            power_on: device.on,
            brightness: BrightnessState::from_reported(device.brightness),
            color: color_from_attributes(device),
            is_online: device.is_online,
            signal_quality: device.signal_quality,
            firmware_version: device.firmware_version.clone(),
            product_code: device.product_code.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn power_on(&self) -> bool {
        self.power_on
    }

    pub fn brightness(&self) -> &BrightnessState {
        &self.brightness
    }

    /// Color state, or `None` for lights without any color control.
    pub fn color(&self) -> Option<&ColorModel> {
        self.color.as_ref()
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn signal_quality(&self) -> Option<i32> {
        self.signal_quality
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    pub fn product_code(&self) -> Option<&str> {
        self.product_code.as_deref()
    }

    pub fn manufacturer(&self) -> &str {
        MANUFACTURER
    }

    pub fn model(&self) -> &str {
        self.product_code.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Refresh mutable fields from a newer report of the same device.
    ///
    /// With `keep_color` the local color state is left alone.
    pub fn refresh(&mut self, device: &DeviceAttributes, keep_color: bool) {
        self.power_on = device.on;
        self.brightness = BrightnessState::from_reported(device.brightness);
        if !keep_color {
            self.color = color_from_attributes(device);
        }
        self.is_online = device.is_online;
        self.signal_quality = device.signal_quality;
        self.firmware_version.clone_from(&device.firmware_version);
        self.product_code.clone_from(&device.product_code);
    }

    pub(crate) fn set_power_on(&mut self, on: bool) {
        self.power_on = on;
    }

    pub(crate) fn brightness_mut(&mut self) -> &mut BrightnessState {
        &mut self.brightness
    }

    pub(crate) fn color_mut(&mut self) -> Option<&mut ColorModel> {
        self.color.as_mut()
    }
}

fn color_from_attributes(device: &DeviceAttributes) -> Option<ColorModel> {
    let config = device
        .product_code
        .as_deref()
        .map(ColorConfig::for_product)
        .unwrap_or_default();
    ColorModel::from_vendor(
        config,
        device.color_temperature,
        device.rgb,
        device.color_mode,
    )
}
