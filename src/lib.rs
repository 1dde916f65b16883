//! # sengled_lights_rs
//!
//! An async Rust library that keeps Sengled cloud bulbs in sync with a
//! home-automation accessory host.
//!
//! The crate owns the state a host needs for each bulb: power, brightness and
//! a color model that converts between mireds, hue/saturation and RGB. Host
//! writes are applied optimistically and rolled back when the vendor cloud
//! rejects them. A periodic discovery tick reconciles the cloud's device list
//! with the accessories the host exposes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use sengled_lights_rs::{CharacteristicValue, Platform, PlatformConfig};
//!
//! async fn run(api: MyCloudClient, host: MyHost) -> Result<(), sengled_lights_rs::Error> {
//!     let config = PlatformConfig::from_json(r#"{"username": "me", "password": "secret"}"#)?;
//!     let platform = Arc::new(Platform::new(api, host, config));
//!
//!     // One discovery tick now, then one every six minutes.
//!     let discovery = platform.start_discovery();
//!
//!     // Host callbacks route through the platform.
//!     platform.set("B0CE1814030A", CharacteristicValue::ColorTemperature(250)).await?;
//!
//!     discovery.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Color model**: temperature-only, RGB-only and dual-mode bulbs via [`ColorModel`]
//! - **Brightness**: clamped vendor brightness with [`BrightnessState`]
//! - **Optimistic writes**: snapshot and rollback through [`DeviceStateCache`]
//! - **Deferred color**: color changes held while a scheduled light is off, see [`WritePolicy`]
//! - **Reconciliation**: add, refresh, rename and remove via [`AccessoryRegistry`]
//! - **Sessions**: login, expiry and one-shot renewal in [`Gateway`]
//!
//! ## Transport
//!
//! HTTP access to the vendor cloud is not part of this crate. Implement
//! [`DeviceApi`] on top of any client; [`parse_device_details`] and
//! [`check_response`] decode the vendor's responses.
//!
//! ## Runtime
//!
//! Timers, tasks and locks come from tokio through the [`runtime`] module.

mod accessory;
mod cache;
mod color;
mod config;
mod device;
mod errors;
mod gateway;
mod platform;
mod registry;
pub mod runtime;
#[cfg(test)]
mod testing;
mod types;

// Re-export public API
pub use accessory::{AccessoryHost, LightAccessory};
pub use cache::{CacheState, DeviceStateCache, PendingFlush, Snapshot};
pub use color::{ColorMode, ColorModel, ColorSnapshot, ColorState};
pub use config::{ColorConfig, Gamut, PlatformConfig, PolicyGate, WritePolicy};
pub use device::{DeviceAttributes, DeviceRecord, display_name, parse_device_details};
pub use errors::Error;
pub use gateway::{
    Credentials, DEFAULT_SESSION_LIFETIME, DeviceApi, Gateway, Session, check_response,
};
pub use platform::{DiscoveryTask, Platform};
pub use registry::{AccessoryRegistry, ReconcileEvent, ReconcileReport};
pub use types::{
    BrightnessState, ByteRgb, Characteristic, CharacteristicValue, Hsv, NormalizedRgb,
    VENDOR_TEMPERATURE_MAX, VENDOR_TEMPERATURE_MIN, hsv_to_rgb, kelvins_to_mireds,
    kelvins_to_rgb, mireds_to_kelvins, mireds_to_rgb, mireds_to_vendor, rgb_to_hsv,
    vendor_to_mireds,
};
