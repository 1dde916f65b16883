//! In-memory collaborators for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::accessory::AccessoryHost;
use crate::color::ColorMode;
use crate::device::{DeviceAttributes, DeviceRecord};
use crate::errors::Error;
use crate::gateway::{Credentials, DeviceApi, Session};
use crate::runtime;
use crate::types::{ByteRgb, CharacteristicValue};

type Result<T> = std::result::Result<T, Error>;

/// A bulb supporting every characteristic, powered on, in temperature mode.
pub(crate) fn device(id: &str, name: &str) -> DeviceAttributes {
    DeviceAttributes {
        id: id.to_string(),
        name: Some(name.to_string()),
        on: true,
        brightness: Some(255),
        color_temperature: Some(50),
        color_mode: Some(ColorMode::Temperature),
        rgb: Some(ByteRgb::rgb(255, 0, 0)),
        is_online: true,
        signal_quality: Some(-60),
        product_code: None,
        firmware_version: Some("1.0.0".to_string()),
    }
}

/// Scripted vendor cloud.
///
/// Writes update the stored roster so a later listing reflects them.
pub(crate) struct MockApi {
    devices: Mutex<Vec<DeviceAttributes>>,
    failures: Mutex<Vec<(String, Error)>>,
    writes: Mutex<Vec<String>>,
    logins: AtomicUsize,
    fetches: AtomicUsize,
    latency: Duration,
}

impl MockApi {
    pub(crate) fn new(devices: Vec<DeviceAttributes>) -> Self {
        MockApi {
            devices: Mutex::new(devices),
            failures: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            logins: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Delay every request by `latency`.
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next request for `action` with `error`.
    pub(crate) fn fail_next(&self, action: &str, error: Error) {
        self.failures
            .lock()
            .unwrap()
            .push((action.to_string(), error));
    }

    pub(crate) fn set_devices(&self, devices: Vec<DeviceAttributes>) {
        *self.devices.lock().unwrap() = devices;
    }

    /// Successful writes, as `"<action> <id> <value>"`.
    pub(crate) fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn begin(&self, action: &str) -> Result<()> {
        if !self.latency.is_zero() {
            runtime::sleep(self.latency).await;
        }
        let mut failures = self.failures.lock().unwrap();
        match failures.iter().position(|(a, _)| a == action) {
            Some(index) => Err(failures.remove(index).1),
            None => Ok(()),
        }
    }

    fn write<F>(&self, action: &str, id: &str, value: String, update: F) -> Result<()>
    where
        F: FnOnce(&mut DeviceAttributes),
    {
        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::not_found(id))?;
        update(device);
        self.writes
            .lock()
            .unwrap()
            .push(format!("{action} {id} {value}"));
        Ok(())
    }
}

impl DeviceApi for MockApi {
    async fn login(&self, _credentials: &Credentials) -> Result<Session> {
        let count = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        self.begin("login").await?;
        Ok(Session::new(&format!("token-{count}")))
    }

    async fn get_devices(&self, _session: &Session) -> Result<Vec<DeviceAttributes>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.begin("getDevices").await?;
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn set_on_off(&self, _session: &Session, id: &str, on: bool) -> Result<()> {
        self.begin("deviceSetOnOff").await?;
        self.write("deviceSetOnOff", id, on.to_string(), |d| d.on = on)
    }

    async fn set_brightness(&self, _session: &Session, id: &str, brightness: u8) -> Result<()> {
        self.begin("deviceSetBrightness").await?;
        self.write("deviceSetBrightness", id, brightness.to_string(), |d| {
            d.brightness = Some(brightness)
        })
    }

    async fn set_color_temperature(
        &self,
        _session: &Session,
        id: &str,
        temperature: u8,
    ) -> Result<()> {
        self.begin("deviceSetColorTemperature").await?;
        self.write(
            "deviceSetColorTemperature",
            id,
            temperature.to_string(),
            |d| {
                d.color_temperature = Some(temperature);
                d.color_mode = Some(ColorMode::Temperature);
            },
        )
    }

    async fn set_rgb_color(&self, _session: &Session, id: &str, rgb: ByteRgb) -> Result<()> {
        self.begin("deviceSetRgbColor").await?;
        let value = format!("{},{},{}", rgb.red(), rgb.green(), rgb.blue());
        self.write("deviceSetRgbColor", id, value, |d| {
            d.rgb = Some(rgb);
            d.color_mode = Some(ColorMode::Rgb);
            d.on = true;
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HostEvent {
    Registered { id: String, name: String },
    Unregistered { id: String, name: String },
    Updated { id: String, value: CharacteristicValue },
}

/// Host that records every call.
#[derive(Default)]
pub(crate) struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub(crate) fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub(crate) fn registered(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Registered { id, name } => Some((id, name)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn unregistered(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Unregistered { id, name } => Some((id, name)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn updates(&self, device_id: &str) -> Vec<CharacteristicValue> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Updated { id, value } if id == device_id => Some(value),
                _ => None,
            })
            .collect()
    }
}

impl AccessoryHost for RecordingHost {
    fn register(&self, record: &DeviceRecord) {
        self.events.lock().unwrap().push(HostEvent::Registered {
            id: record.id().to_string(),
            name: record.display_name().to_string(),
        });
    }

    fn unregister(&self, id: &str, display_name: &str) {
        self.events.lock().unwrap().push(HostEvent::Unregistered {
            id: id.to_string(),
            name: display_name.to_string(),
        });
    }

    fn update_value(&self, id: &str, value: CharacteristicValue) {
        self.events.lock().unwrap().push(HostEvent::Updated {
            id: id.to_string(),
            value,
        });
    }
}
