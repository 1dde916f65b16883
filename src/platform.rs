//! Periodic discovery and host-facing entry points.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::channel::oneshot;
use futures::future::{self, Either};
use log::{debug, error, info};

use crate::accessory::{AccessoryHost, LightAccessory};
use crate::config::PlatformConfig;
use crate::device::DeviceRecord;
use crate::errors::Error;
use crate::gateway::{DeviceApi, Gateway};
use crate::registry::{AccessoryRegistry, ReconcileReport};
use crate::runtime::{self, JoinHandle, Mutex};
use crate::types::{Characteristic, CharacteristicValue};

type Result<T> = std::result::Result<T, Error>;

/// Handle to the periodic discovery loop started by
/// [`Platform::start_discovery`].
///
/// Dropping the handle stops the loop after the running tick.
pub struct DiscoveryTask {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl DiscoveryTask {
    /// Stop the loop and wait for the running tick to finish.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Clears the single-flight flag when a tick ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sengled lights exposed to an accessory host.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sengled_lights_rs::{AccessoryHost, DeviceApi, Platform, PlatformConfig};
///
/// async fn run<A, H>(api: A, host: H) -> Result<(), sengled_lights_rs::Error>
/// where
///     A: DeviceApi + 'static,
///     H: AccessoryHost + 'static,
/// {
///     let config = PlatformConfig::from_json(r#"{"username": "me", "password": "secret"}"#)?;
///     let platform = Arc::new(Platform::new(api, host, config));
///     let discovery = platform.start_discovery();
///     // ...
///     discovery.stop().await;
///     Ok(())
/// }
/// ```
pub struct Platform<A, H> {
    config: PlatformConfig,
    gateway: Gateway<A>,
    host: H,
    registry: Mutex<AccessoryRegistry>,
    discovering: AtomicBool,
}

impl<A, H> Platform<A, H>
where
    A: DeviceApi,
    H: AccessoryHost,
{
    pub fn new(api: A, host: H, config: PlatformConfig) -> Self {
        Platform {
            gateway: Gateway::new(api, &config),
            host,
            registry: Mutex::new(AccessoryRegistry::new(config.write_policy)),
            discovering: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Gateway<A> {
        &self.gateway
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Re-adopt an accessory the host cached from a previous run.
    pub async fn configure_accessory(&self, record: DeviceRecord) {
        self.registry.lock().await.restore(record, &self.host);
    }

    /// Tracked device ids, sorted.
    pub async fn ids(&self) -> Vec<String> {
        self.registry.lock().await.ids()
    }

    /// A copy of the tracked record for `id`.
    pub async fn record(&self, id: &str) -> Option<DeviceRecord> {
        let accessory = self.registry.lock().await.get(id)?;
        let record = accessory.lock().await.record().clone();
        Some(record)
    }

    /// Run one discovery tick: fetch the roster and reconcile it.
    ///
    /// Returns `Ok(None)` without doing anything when a tick is already
    /// running.
    pub async fn discover(&self) -> Result<Option<ReconcileReport>> {
        if self.discovering.swap(true, Ordering::SeqCst) {
            debug!("Discovery already running, skipping tick");
            return Ok(None);
        }
        let _in_flight = InFlight(&self.discovering);

        let devices = self.gateway.get_devices().await?;
        let report = self.registry.lock().await.reconcile(&devices, &self.host);
        debug!("Discovery complete: {} events", report.events.len());
        Ok(Some(report))
    }

    /// Read a characteristic from the cache.
    pub async fn get(
        &self,
        id: &str,
        characteristic: Characteristic,
    ) -> Result<CharacteristicValue> {
        let accessory = self.accessory(id).await?;
        let accessory = accessory.lock().await;
        accessory.get(characteristic)
    }

    /// Write a characteristic to the device.
    ///
    /// A device the cloud no longer knows is removed and unregistered.
    pub async fn set(&self, id: &str, value: CharacteristicValue) -> Result<()> {
        let accessory = self.accessory(id).await?;
        let result = accessory
            .lock()
            .await
            .set(&self.gateway, &self.host, value)
            .await;

        if let Err(Error::NotFound(_)) = &result {
            info!("Device {id} not found remotely, removing");
            self.registry.lock().await.remove(id, &self.host);
        }
        result
    }

    /// Mark the automatic lighting schedule as driving `id` or not.
    pub async fn set_schedule_active(&self, id: &str, active: bool) -> Result<()> {
        if !self.config.enable_adaptive_lighting {
            return Err(Error::ScheduleUnsupported(id.to_string()));
        }
        let accessory = self.accessory(id).await?;
        let mut accessory = accessory.lock().await;
        accessory.set_schedule_active(active)
    }

    async fn accessory(&self, id: &str) -> Result<Arc<Mutex<LightAccessory>>> {
        self.registry
            .lock()
            .await
            .get(id)
            .ok_or_else(|| Error::not_found(id))
    }
}

impl<A, H> Platform<A, H>
where
    A: DeviceApi + 'static,
    H: AccessoryHost + 'static,
{
    /// Spawn the discovery loop: one tick now, then one per
    /// `discovery_interval`. Failed ticks are logged and the loop goes on.
    pub fn start_discovery(self: &Arc<Self>) -> DiscoveryTask {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let platform = Arc::clone(self);
        let interval = self.config.discovery_interval;

        let handle = runtime::spawn(async move {
            loop {
                match platform.discover().await {
                    Ok(Some(report)) if report.changed() => {
                        info!("Discovery updated {} accessories", report.events.len())
                    }
                    Ok(_) => {}
                    Err(e) => error!("Failed device discovery: {e}"),
                }

                let tick = runtime::sleep(interval);
                futures::pin_mut!(tick);
                if let Either::Right(_) = future::select(tick, &mut stop_rx).await {
                    break;
                }
            }
            debug!("Discovery stopped");
        });

        DiscoveryTask {
            stop: Some(stop_tx),
            handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{MockApi, RecordingHost, device};

    fn platform(api: MockApi) -> Platform<MockApi, RecordingHost> {
        let config = PlatformConfig {
            enable_adaptive_lighting: true,
            ..Default::default()
        };
        Platform::new(api, RecordingHost::default(), config)
    }

    #[tokio::test]
    async fn test_discover_tracks_roster() {
        let platform = platform(MockApi::new(vec![device("A", "Lamp"), device("B", "Desk")]));
        let report = platform.discover().await.unwrap().unwrap();
        assert_eq!(report.created().count(), 2);
        assert_eq!(platform.ids().await, vec!["A", "B"]);

        platform.gateway().api().set_devices(vec![device("B", "Desk")]);
        let report = platform.discover().await.unwrap().unwrap();
        assert_eq!(report.removed().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(platform.ids().await, vec!["B"]);
    }

    #[tokio::test]
    async fn test_overlapping_discovery_is_skipped() {
        let api = MockApi::new(vec![device("A", "Lamp")]).with_latency(Duration::from_millis(50));
        let platform = platform(api);

        let (first, second) = tokio::join!(platform.discover(), platform.discover());
        let reports = [first.unwrap(), second.unwrap()];
        assert_eq!(reports.iter().filter(|r| r.is_some()).count(), 1);
        assert_eq!(platform.gateway().api().fetch_count(), 1);

        // The guard is released once the tick ends.
        assert!(platform.discover().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_discovery_releases_guard() {
        let api = MockApi::new(vec![device("A", "Lamp")]);
        api.fail_next("getDevices", Error::remote_write("getDevices", 500));
        let platform = platform(api);

        assert!(platform.discover().await.is_err());
        assert!(platform.ids().await.is_empty());
        assert!(platform.discover().await.unwrap().is_some());
        assert_eq!(platform.ids().await, vec!["A"]);
    }

    #[tokio::test]
    async fn test_discovery_does_not_wait_on_busy_accessory() {
        let platform = platform(MockApi::new(vec![device("A", "Lamp"), device("B", "Desk")]));
        platform.discover().await.unwrap();

        // Holding A's lock stands in for a write still on the wire.
        let busy = platform.accessory("A").await.unwrap();
        let guard = busy.lock().await;

        let report = runtime::timeout(Duration::from_millis(500), platform.discover())
            .await
            .expect("discovery waited on a busy accessory")
            .unwrap()
            .unwrap();
        assert_eq!(report.skipped().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(report.refreshed().collect::<Vec<_>>(), vec!["B"]);

        let desk = runtime::timeout(
            Duration::from_millis(500),
            platform.get("B", Characteristic::On),
        )
        .await;
        assert_eq!(desk, Ok(Ok(CharacteristicValue::On(true))));
        drop(guard);
    }

    #[tokio::test]
    async fn test_get_and_set_route_to_accessory() {
        let platform = platform(MockApi::new(vec![device("A", "Lamp")]));
        platform.discover().await.unwrap();

        platform.set("A", CharacteristicValue::Brightness(12)).await.unwrap();
        assert_eq!(
            platform.get("A", Characteristic::Brightness).await,
            Ok(CharacteristicValue::Brightness(12))
        );
        assert_eq!(
            platform.get("Z", Characteristic::On).await,
            Err(Error::not_found("Z"))
        );
    }

    #[tokio::test]
    async fn test_not_found_removes_accessory() {
        let platform = platform(MockApi::new(vec![device("A", "Lamp")]));
        platform.discover().await.unwrap();
        platform.gateway().api().set_devices(vec![]);

        let result = platform.set("A", CharacteristicValue::On(false)).await;
        assert_eq!(result, Err(Error::not_found("A")));
        assert!(platform.ids().await.is_empty());
        assert_eq!(
            platform.host().unregistered(),
            vec![("A".to_string(), "Lamp".to_string())]
        );
    }

    #[tokio::test]
    async fn test_schedule_requires_adaptive_lighting() {
        let disabled = Platform::new(
            MockApi::new(vec![device("A", "Lamp")]),
            RecordingHost::default(),
            PlatformConfig::default(),
        );
        disabled.discover().await.unwrap();
        assert_eq!(
            disabled.set_schedule_active("A", true).await,
            Err(Error::ScheduleUnsupported("A".into()))
        );

        let enabled = platform(MockApi::new(vec![device("A", "Lamp")]));
        enabled.discover().await.unwrap();
        assert!(enabled.set_schedule_active("A", true).await.is_ok());
        assert_eq!(
            enabled.set_schedule_active("Z", true).await,
            Err(Error::not_found("Z"))
        );
    }

    #[tokio::test]
    async fn test_configure_accessory_then_discover() {
        let platform = platform(MockApi::new(vec![device("A", "Lamp")]));
        platform
            .configure_accessory(DeviceRecord::from_attributes(&device("A", "Lamp")))
            .await;

        let report = platform.discover().await.unwrap().unwrap();
        assert_eq!(report.refreshed().collect::<Vec<_>>(), vec!["A"]);
        assert!(platform.host().registered().is_empty());
    }

    #[tokio::test]
    async fn test_discovery_task_runs_and_stops() {
        let api = MockApi::new(vec![device("A", "Lamp")]);
        api.fail_next("getDevices", Error::remote_write("getDevices", 500));
        let config = PlatformConfig {
            discovery_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let platform = Arc::new(Platform::new(api, RecordingHost::default(), config));

        let task = platform.start_discovery();
        runtime::sleep(Duration::from_millis(100)).await;
        task.stop().await;

        // The first tick failed, a later one succeeded.
        assert!(platform.gateway().api().fetch_count() >= 2);
        assert_eq!(platform.ids().await, vec!["A"]);
    }
}
