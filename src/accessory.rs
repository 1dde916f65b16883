//! Host-facing binding of a single light.

use log::{debug, error};
use strum::IntoEnumIterator;

use crate::cache::{DeviceStateCache, PendingFlush, Snapshot};
use crate::color::{ColorMode, ColorModel};
use crate::config::WritePolicy;
use crate::device::{DeviceAttributes, DeviceRecord};
use crate::errors::Error;
use crate::gateway::{DeviceApi, Gateway};
use crate::types::{Characteristic, CharacteristicValue, mireds_to_vendor};

type Result<T> = std::result::Result<T, Error>;

/// The accessory framework embedding the platform.
pub trait AccessoryHost: Send + Sync {
    /// Start exposing a newly discovered accessory.
    fn register(&self, record: &DeviceRecord);

    /// Stop exposing an accessory.
    fn unregister(&self, id: &str, display_name: &str);

    /// Push a value the host did not ask for.
    fn update_value(&self, id: &str, value: CharacteristicValue);
}

/// One light bound to the host.
///
/// Every setter follows the same protocol: snapshot, mutate the local model,
/// write to the device, and restore the snapshot when the write fails.
#[derive(Debug, Clone, PartialEq)]
pub struct LightAccessory {
    cache: DeviceStateCache,
    policy: WritePolicy,
    schedule_active: bool,
    /// A hue was set locally and has not been written with a saturation yet.
    hue_pending: bool,
}

impl LightAccessory {
    pub fn new(record: DeviceRecord, policy: WritePolicy) -> Self {
        LightAccessory {
            cache: DeviceStateCache::new(record),
            policy,
            schedule_active: false,
            hue_pending: false,
        }
    }

    pub fn id(&self) -> &str {
        self.cache.record().id()
    }

    pub fn record(&self) -> &DeviceRecord {
        self.cache.record()
    }

    pub fn cache(&self) -> &DeviceStateCache {
        &self.cache
    }

    pub fn schedule_active(&self) -> bool {
        self.schedule_active
    }

    /// Whether an automatic lighting schedule can drive this light.
    pub fn supports_schedule(&self) -> bool {
        self.record().brightness().supports_brightness()
            && self
                .record()
                .color()
                .is_some_and(ColorModel::supports_color_temperature)
    }

    pub fn set_schedule_active(&mut self, active: bool) -> Result<()> {
        if !self.supports_schedule() {
            return Err(Error::ScheduleUnsupported(self.id().to_string()));
        }
        self.schedule_active = active;
        Ok(())
    }

    pub fn supports(&self, characteristic: Characteristic) -> bool {
        let color = self.record().color();
        match characteristic {
            Characteristic::On => true,
            Characteristic::Brightness => self.record().brightness().supports_brightness(),
            Characteristic::ColorTemperature => {
                color.is_some_and(ColorModel::supports_color_temperature)
            }
            Characteristic::Hue | Characteristic::Saturation => {
                color.is_some_and(ColorModel::supports_rgb)
            }
        }
    }

    /// The characteristics the host should bind for this light.
    pub fn characteristics(&self) -> Vec<Characteristic> {
        Characteristic::iter().filter(|c| self.supports(*c)).collect()
    }

    /// The cached value of a characteristic.
    pub fn get(&self, characteristic: Characteristic) -> Result<CharacteristicValue> {
        let record = self.record();
        let color = || record.color().ok_or(Error::Unsupported(characteristic));
        Ok(match characteristic {
            Characteristic::On => CharacteristicValue::On(record.power_on()),
            Characteristic::Brightness => CharacteristicValue::Brightness(u16::from(
                record
                    .brightness()
                    .value()
                    .ok_or(Error::Unsupported(characteristic))?,
            )),
            Characteristic::ColorTemperature => {
                CharacteristicValue::ColorTemperature(color()?.color_temperature()?)
            }
            Characteristic::Hue => CharacteristicValue::Hue(color()?.hue()?),
            Characteristic::Saturation => CharacteristicValue::Saturation(color()?.saturation()?),
        })
    }

    pub async fn set<A, H>(
        &mut self,
        gateway: &Gateway<A>,
        host: &H,
        value: CharacteristicValue,
    ) -> Result<()>
    where
        A: DeviceApi,
        H: AccessoryHost,
    {
        let result = match value {
            CharacteristicValue::On(on) => self.set_power(gateway, on).await,
            CharacteristicValue::Brightness(brightness) => {
                self.set_brightness(gateway, brightness).await
            }
            CharacteristicValue::ColorTemperature(mireds) => {
                self.set_color_temperature(gateway, host, mireds).await
            }
            CharacteristicValue::Hue(hue) => self.set_hue(hue),
            CharacteristicValue::Saturation(saturation) => {
                self.set_saturation(gateway, host, saturation).await
            }
        };
        if let Err(e) = &result {
            error!(
                "Failed to set {} of {}: {e}",
                value.characteristic(),
                self.record().display_name()
            );
        }
        result
    }

    /// Switch the light. Turning it on first flushes a deferred color.
    pub async fn set_power<A: DeviceApi>(&mut self, gateway: &Gateway<A>, on: bool) -> Result<()> {
        let id = self.id().to_string();

        if on {
            match self.cache.pending_flush()? {
                Some(PendingFlush::Temperature(temperature)) => {
                    debug!("Flushing cached color temperature {temperature} to {id}");
                    gateway.set_color_temperature(&id, temperature).await?;
                    self.cache.mark_live();
                }
                Some(PendingFlush::Rgb(rgb)) => {
                    debug!("Flushing cached rgb color to {id}");
                    gateway.set_rgb_color(&id, rgb).await?;
                    self.cache.mark_live();
                }
                None => {}
            }
        }

        let snapshot = self.cache.snapshot_power();
        self.cache.record_mut().set_power_on(on);
        let result = gateway.set_on_off(&id, on).await;
        self.commit(snapshot, result)
    }

    /// Set the brightness in vendor encoding, clamped to `0..=255`.
    pub async fn set_brightness<A: DeviceApi>(
        &mut self,
        gateway: &Gateway<A>,
        brightness: u16,
    ) -> Result<()> {
        let id = self.id().to_string();
        let snapshot = self.cache.snapshot_brightness();
        let brightness = self
            .cache
            .record_mut()
            .brightness_mut()
            .set_value(brightness)
            .ok_or(Error::Unsupported(Characteristic::Brightness))?;
        let result = gateway.set_brightness(&id, brightness).await;
        self.commit(snapshot, result)
    }

    /// Set the color temperature in mireds.
    ///
    /// Zero selects the coolest supported temperature.
    pub async fn set_color_temperature<A, H>(
        &mut self,
        gateway: &Gateway<A>,
        host: &H,
        mireds: u16,
    ) -> Result<()>
    where
        A: DeviceApi,
        H: AccessoryHost,
    {
        let id = self.id().to_string();
        let color = self
            .record()
            .color()
            .filter(|c| c.supports_color_temperature())
            .ok_or(Error::Unsupported(Characteristic::ColorTemperature))?;

        let mireds = match mireds {
            0 => color.min_color_temperature(),
            m => color.config().clamp_mireds(m),
        };
        let vendor = mireds_to_vendor(mireds, color.config());

        if self.suppress_redundant()
            && color.mode() == ColorMode::Temperature
            && color.vendor_color_temperature()? == vendor
        {
            debug!("Skipping color temperature {vendor} for {id}, already set on device");
            self.apply_color_temperature(host, mireds)?;
            return Ok(());
        }

        if self.defer_color() {
            debug!("Caching color temperature {vendor} for {id} until power-on");
            self.apply_color_temperature(host, mireds)?;
            self.cache.defer();
            return Ok(());
        }

        let snapshot = self.color_snapshot()?;
        self.color_mut()?.set_color_temperature(mireds)?;
        let result = gateway.set_color_temperature(&id, vendor).await;
        self.commit(snapshot, result)?;
        self.cache.mark_live();
        self.publish_hue_saturation(host);
        Ok(())
    }

    /// Set the hue locally.
    ///
    /// The host always sets saturation right after hue, and that call
    /// carries both to the device.
    pub fn set_hue(&mut self, hue: f64) -> Result<()> {
        let color = self.rgb_color(Characteristic::Hue)?;
        if self.suppress_redundant() && color.mode() == ColorMode::Rgb && color.hue()? == hue {
            return Ok(());
        }

        self.color_mut()?.set_hue(hue)?;
        self.hue_pending = true;
        if self.defer_color() {
            self.cache.defer();
        }
        Ok(())
    }

    /// Set the saturation and write the resulting RGB color.
    pub async fn set_saturation<A, H>(
        &mut self,
        gateway: &Gateway<A>,
        host: &H,
        saturation: f64,
    ) -> Result<()>
    where
        A: DeviceApi,
        H: AccessoryHost,
    {
        let id = self.id().to_string();
        let color = self.rgb_color(Characteristic::Saturation)?;
        // A hue set since the last write changes the RGB bytes even when the
        // saturation stays the same.
        if self.suppress_redundant()
            && !self.hue_pending
            && color.mode() == ColorMode::Rgb
            && color.saturation()? == saturation
        {
            debug!("Skipping saturation {saturation} for {id}, already set on device");
            return Ok(());
        }

        if self.defer_color() {
            debug!("Caching saturation {saturation} for {id} until power-on");
            self.color_mut()?.set_saturation(saturation)?;
            self.cache.defer();
            self.hue_pending = false;
            return Ok(());
        }

        let snapshot = self.color_snapshot()?;
        let color = self.color_mut()?;
        color.set_saturation(saturation)?;
        let rgb = color.vendor_rgb()?;
        let result = gateway.set_rgb_color(&id, rgb).await;
        self.commit(snapshot, result)?;
        self.hue_pending = false;

        // The vendor's RGB endpoint also turns the light on.
        self.cache.mark_live();
        self.cache.record_mut().set_power_on(true);
        host.update_value(&id, CharacteristicValue::On(true));
        Ok(())
    }

    /// Take a newer device report and publish the result to the host.
    pub fn refresh<H: AccessoryHost>(&mut self, device: &DeviceAttributes, host: &H) {
        if !self.cache.is_pending() {
            self.hue_pending = false;
        }
        self.cache.refresh(device);
        self.publish_state(host);
    }

    /// Push every supported value to the host.
    pub fn publish_state<H: AccessoryHost>(&self, host: &H) {
        for characteristic in self.characteristics() {
            if let Ok(value) = self.get(characteristic) {
                host.update_value(self.id(), value);
            }
        }
    }

    fn suppress_redundant(&self) -> bool {
        self.policy.suppress_redundant.applies(self.schedule_active)
    }

    fn defer_color(&self) -> bool {
        self.policy.defer_while_off.applies(self.schedule_active) && !self.record().power_on()
    }

    fn rgb_color(&self, characteristic: Characteristic) -> Result<&ColorModel> {
        self.record()
            .color()
            .filter(|c| c.supports_rgb())
            .ok_or(Error::Unsupported(characteristic))
    }

    fn color_mut(&mut self) -> Result<&mut ColorModel> {
        self.cache
            .record_mut()
            .color_mut()
            .ok_or(Error::Unsupported(Characteristic::Hue))
    }

    fn color_snapshot(&self) -> Result<Snapshot> {
        self.cache
            .snapshot_color()
            .ok_or(Error::Unsupported(Characteristic::Hue))
    }

    fn apply_color_temperature<H: AccessoryHost>(&mut self, host: &H, mireds: u16) -> Result<()> {
        self.color_mut()?.set_color_temperature(mireds)?;
        self.publish_hue_saturation(host);
        Ok(())
    }

    /// Temperature changes move hue and saturation on RGB-capable lights.
    fn publish_hue_saturation<H: AccessoryHost>(&self, host: &H) {
        let Some(color) = self.record().color().filter(|c| c.supports_rgb()) else {
            return;
        };
        if let Ok(hsv) = color.hsv() {
            host.update_value(self.id(), CharacteristicValue::Hue(hsv.hue));
            host.update_value(self.id(), CharacteristicValue::Saturation(hsv.saturation));
        }
    }

    fn commit(&mut self, snapshot: Snapshot, result: Result<()>) -> Result<()> {
        if result.is_err() {
            self.cache.restore(snapshot);
        }
        result
    }
}
