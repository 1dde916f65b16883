//! Per-device optimistic state cache.
//!
//! Setters mutate the cached [`DeviceRecord`] before the remote write goes
//! out. A [`Snapshot`] taken beforehand puts the record back when the write
//! fails. Color writes may also be held back locally and flushed later, which
//! [`CacheState`] tracks.

use serde::{Deserialize, Serialize};

use crate::color::{ColorMode, ColorModel, ColorSnapshot};
use crate::device::{DeviceAttributes, DeviceRecord};
use crate::errors::Error;
use crate::types::{BrightnessState, ByteRgb};

type Result<T> = std::result::Result<T, Error>;

/// Whether the cached color has reached the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CacheState {
    #[default]
    Live,
    /// A color change was applied locally only. It is written out on the
    /// next power-on.
    CachedPendingFlush,
}

/// Part of a record captured before an optimistic mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Power(bool),
    Brightness(BrightnessState),
    Color(ColorSnapshot),
}

/// The write that brings a device up to date with a deferred color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingFlush {
    /// Vendor-encoded color temperature.
    Temperature(u8),
    Rgb(ByteRgb),
}

impl PendingFlush {
    /// The write for whichever representation is authoritative.
    pub fn for_color(color: &ColorModel) -> Result<Self> {
        match color.mode() {
            ColorMode::Temperature => color
                .vendor_color_temperature()
                .map(PendingFlush::Temperature),
            ColorMode::Rgb => color.vendor_rgb().map(PendingFlush::Rgb),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStateCache {
    record: DeviceRecord,
    state: CacheState,
}

impl DeviceStateCache {
    pub fn new(record: DeviceRecord) -> Self {
        DeviceStateCache {
            record,
            state: CacheState::Live,
        }
    }

    pub fn record(&self) -> &DeviceRecord {
        &self.record
    }

    pub(crate) fn record_mut(&mut self) -> &mut DeviceRecord {
        &mut self.record
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == CacheState::CachedPendingFlush
    }

    /// Hold the current color locally until the next power-on.
    pub fn defer(&mut self) {
        self.state = CacheState::CachedPendingFlush;
    }

    pub fn mark_live(&mut self) {
        self.state = CacheState::Live;
    }

    /// The write needed to flush a deferred color, if any.
    pub fn pending_flush(&self) -> Result<Option<PendingFlush>> {
        if !self.is_pending() {
            return Ok(None);
        }
        self.record
            .color()
            .map(PendingFlush::for_color)
            .transpose()
    }

    pub fn snapshot_power(&self) -> Snapshot {
        Snapshot::Power(self.record.power_on())
    }

    pub fn snapshot_brightness(&self) -> Snapshot {
        Snapshot::Brightness(self.record.brightness().clone())
    }

    /// `None` for lights without color control.
    pub fn snapshot_color(&self) -> Option<Snapshot> {
        self.record
            .color()
            .map(|color| Snapshot::Color(color.snapshot()))
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        match snapshot {
            Snapshot::Power(on) => self.record.set_power_on(on),
            Snapshot::Brightness(brightness) => *self.record.brightness_mut() = brightness,
            Snapshot::Color(color) => {
                if let Some(model) = self.record.color_mut() {
                    model.restore(color);
                }
            }
        }
    }

    /// Refresh from a newer device report.
    ///
    /// While a color write is pending, the local color wins over the
    /// reported one.
    pub fn refresh(&mut self, device: &DeviceAttributes) {
        self.record.refresh(device, self.is_pending());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> DeviceStateCache {
        let device = DeviceAttributes {
            id: "A".into(),
            on: true,
            brightness: Some(100),
            color_temperature: Some(0),
            rgb: Some(ByteRgb::rgb(255, 0, 0)),
            color_mode: Some(ColorMode::Rgb),
            ..Default::default()
        };
        DeviceStateCache::new(DeviceRecord::from_attributes(&device))
    }

    #[test]
    fn test_restore_each_snapshot() {
        let mut cache = cache();
        let original = cache.record().clone();

        let power = cache.snapshot_power();
        let brightness = cache.snapshot_brightness();
        let color = cache.snapshot_color().unwrap();

        cache.record_mut().set_power_on(false);
        cache.record_mut().brightness_mut().set_value(3);
        cache.record_mut().color_mut().unwrap().set_hue(200.0).unwrap();
        assert_ne!(cache.record(), &original);

        cache.restore(power);
        cache.restore(brightness);
        cache.restore(color);
        assert_eq!(cache.record(), &original);
    }

    #[test]
    fn test_pending_flush_follows_mode() {
        let mut cache = cache();
        assert_eq!(cache.pending_flush().unwrap(), None);

        cache.defer();
        assert_eq!(
            cache.pending_flush().unwrap(),
            Some(PendingFlush::Rgb(ByteRgb::rgb(255, 0, 0)))
        );

        cache
            .record_mut()
            .color_mut()
            .unwrap()
            .set_color_temperature(500)
            .unwrap();
        assert_eq!(
            cache.pending_flush().unwrap(),
            Some(PendingFlush::Temperature(0))
        );

        cache.mark_live();
        assert_eq!(cache.state(), CacheState::Live);
        assert_eq!(cache.pending_flush().unwrap(), None);
    }

    #[test]
    fn test_refresh_keeps_pending_color() {
        let mut cache = cache();
        cache.record_mut().color_mut().unwrap().set_hue(120.0).unwrap();
        cache.defer();

        let report = DeviceAttributes {
            id: "A".into(),
            on: false,
            brightness: Some(20),
            color_temperature: Some(0),
            rgb: Some(ByteRgb::rgb(255, 0, 0)),
            color_mode: Some(ColorMode::Rgb),
            ..Default::default()
        };
        cache.refresh(&report);

        assert!(!cache.record().power_on());
        assert_eq!(cache.record().brightness().value(), Some(20));
        assert_eq!(cache.record().color().unwrap().hue().unwrap(), 120.0);

        cache.mark_live();
        cache.refresh(&report);
        assert_eq!(cache.record().color().unwrap().hue().unwrap(), 0.0);
    }
}
