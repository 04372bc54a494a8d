use crate::scene::VehicleConfiguration;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Immutable snapshot of a build; only `name` changes after creation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SavedVehicle {
    pub id: String,
    pub name: String,
    pub config: VehicleConfiguration,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SavedVehicles {
    pub vehicles: BTreeMap<String, SavedVehicle>,
    pub current: Option<String>,
    #[serde(default)]
    next_sequence: u64,
}

impl SavedVehicles {
    pub fn ids(&self) -> Vec<String> {
        self.vehicles.keys().cloned().collect()
    }

    /// Snapshots `config` under a fresh id and points `current` at it.
    pub fn insert(&mut self, name: &str, config: VehicleConfiguration) -> SavedVehicle {
        let timestamp = now_millis();
        self.next_sequence += 1;
        let id = format!("build-{}-{}", timestamp, self.next_sequence);
        let saved = SavedVehicle {
            id: id.clone(),
            name: name.to_string(),
            config,
            timestamp,
        };
        self.vehicles.insert(id.clone(), saved.clone());
        self.current = Some(id);
        saved
    }
}

/// Handle to the saved-vehicle collection; clones share one collection.
#[derive(Clone, Default)]
pub struct SavedVehicleStore {
    inner: Rc<RefCell<SavedVehicles>>,
}

impl SavedVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_saved(saved: SavedVehicles) -> Self {
        Self {
            inner: Rc::new(RefCell::new(saved)),
        }
    }

    pub fn get(&self) -> SavedVehicles {
        self.inner.borrow().clone()
    }

    pub fn set<F, R>(&self, update: F) -> R
    where
        F: FnOnce(&mut SavedVehicles) -> R,
    {
        update(&mut self.inner.borrow_mut())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
