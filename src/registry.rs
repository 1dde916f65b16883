//! The set of accessories currently exposed to the host.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::accessory::{AccessoryHost, LightAccessory};
use crate::config::WritePolicy;
use crate::device::{DeviceAttributes, DeviceRecord, display_name};
use crate::runtime::Mutex;

/// One roster change made by [`AccessoryRegistry::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    Created(String),
    Refreshed(String),
    /// Known device whose accessory was busy with a write. The next pass
    /// refreshes it.
    Skipped(String),
    Removed(String),
}

/// Everything a reconciliation did, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub events: Vec<ReconcileEvent>,
}

impl ReconcileReport {
    pub fn created(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            ReconcileEvent::Created(id) => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn refreshed(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            ReconcileEvent::Refreshed(id) => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            ReconcileEvent::Skipped(id) => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            ReconcileEvent::Removed(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// Whether the roster changed, as opposed to being refreshed.
    pub fn changed(&self) -> bool {
        self.events.iter().any(|e| {
            matches!(
                e,
                ReconcileEvent::Created(_) | ReconcileEvent::Removed(_)
            )
        })
    }
}

#[derive(Debug)]
struct Tracked {
    display_name: String,
    accessory: Arc<Mutex<LightAccessory>>,
}

/// Tracked accessories, keyed by device id.
#[derive(Debug, Default)]
pub struct AccessoryRegistry {
    accessories: HashMap<String, Tracked>,
    policy: WritePolicy,
}

impl AccessoryRegistry {
    pub fn new(policy: WritePolicy) -> Self {
        AccessoryRegistry {
            accessories: HashMap::new(),
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.accessories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessories.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.accessories.contains_key(id)
    }

    /// Tracked ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.accessories.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.accessories.get(id).map(|t| t.display_name.as_str())
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<LightAccessory>>> {
        self.accessories.get(id).map(|t| Arc::clone(&t.accessory))
    }

    /// Re-adopt an accessory the host persisted from an earlier run.
    ///
    /// The host does not get a `register` call for it. If the id is already
    /// tracked, the tracked accessory is unregistered and replaced.
    pub fn restore<H: AccessoryHost>(&mut self, record: DeviceRecord, host: &H) {
        let id = record.id().to_string();
        if self.contains(&id) {
            warn!("Duplicate accessory {id} restored, replacing the existing one");
            self.remove(&id, host);
        }
        debug!("Restoring accessory {id} ({})", record.display_name());
        self.insert(LightAccessory::new(record, self.policy));
    }

    /// Stop tracking `id` and unregister it from the host.
    ///
    /// Returns whether anything was removed.
    pub fn remove<H: AccessoryHost>(&mut self, id: &str, host: &H) -> bool {
        match self.accessories.remove(id) {
            Some(tracked) => {
                host.unregister(id, &tracked.display_name);
                true
            }
            None => false,
        }
    }

    /// Bring the tracked set in line with a freshly fetched roster.
    ///
    /// New ids are created and registered, known ids with an unchanged
    /// display name are refreshed in place, renamed ids are replaced, and ids
    /// missing from the roster are removed. Running it twice on the same
    /// roster only refreshes the second time.
    ///
    /// Never waits on an accessory: one that is locked for a write is
    /// reported as [`ReconcileEvent::Skipped`] and left as it is.
    pub fn reconcile<H: AccessoryHost>(
        &mut self,
        roster: &[DeviceAttributes],
        host: &H,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut seen = HashSet::new();

        for device in roster {
            if !seen.insert(device.id.as_str()) {
                warn!("Device {} listed twice, ignoring the repeat", device.id);
                continue;
            }
            let name = display_name(device);

            match self.accessories.get(&device.id) {
                None => {
                    info!("Adding device {} ({name})", device.id);
                    self.create(device, host);
                    report.events.push(ReconcileEvent::Created(device.id.clone()));
                }
                Some(tracked) if tracked.display_name != name => {
                    info!(
                        "Device {} renamed from \"{}\" to \"{name}\", re-adding",
                        device.id, tracked.display_name
                    );
                    self.remove(&device.id, host);
                    report.events.push(ReconcileEvent::Removed(device.id.clone()));
                    self.create(device, host);
                    report.events.push(ReconcileEvent::Created(device.id.clone()));
                }
                Some(tracked) => match tracked.accessory.try_lock() {
                    Ok(mut accessory) => {
                        debug!("Refreshing device {} ({name})", device.id);
                        accessory.refresh(device, host);
                        report
                            .events
                            .push(ReconcileEvent::Refreshed(device.id.clone()));
                    }
                    Err(_) => {
                        debug!("Device {} busy, refreshing on the next pass", device.id);
                        report.events.push(ReconcileEvent::Skipped(device.id.clone()));
                    }
                },
            }
        }

        let missing: Vec<String> = self
            .ids()
            .into_iter()
            .filter(|id| !seen.contains(id.as_str()))
            .collect();
        for id in missing {
            info!("Device {id} no longer reported, removing");
            self.remove(&id, host);
            report.events.push(ReconcileEvent::Removed(id));
        }

        report
    }

    fn create<H: AccessoryHost>(&mut self, device: &DeviceAttributes, host: &H) {
        let accessory = LightAccessory::new(DeviceRecord::from_attributes(device), self.policy);
        host.register(accessory.record());
        accessory.publish_state(host);
        self.insert(accessory);
    }

    fn insert(&mut self, accessory: LightAccessory) {
        let id = accessory.id().to_string();
        let tracked = Tracked {
            display_name: accessory.record().display_name().to_string(),
            accessory: Arc::new(Mutex::new(accessory)),
        };
        self.accessories.insert(id, tracked);
    }
}
