pub mod decal;
pub mod saved;
pub mod serialization;

pub use decal::{Decal, DecalId, DecalPhase};
pub use saved::{SavedVehicle, SavedVehicleStore, SavedVehicles};

use crate::catalog::Catalog;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// The single mutable vehicle aggregate. Field names are the wire names.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VehicleConfiguration {
    pub body: String,
    pub lift: f64,
    pub color: String,
    pub roughness: f64,
    pub rim: String,
    pub rim_color: String,
    pub rim_color_secondary: String,
    pub rim_diameter: f64,
    pub rim_width: f64,
    pub tire: String,
    pub tire_diameter: f64,
    pub wheel_offset: f64,
    #[serde(default)]
    pub addons: BTreeMap<String, String>,
    pub spare: bool,
}

/// Serializable scene: the vehicle plus the decals placed on its body.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneState {
    pub vehicle: VehicleConfiguration,
    #[serde(default)]
    decals: Vec<Decal>,
    #[serde(default)]
    next_decal_id: u64,
    /// Uploaded image content, base64, keyed by the decals' `image_url`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    images: BTreeMap<String, String>,
}

impl SceneState {
    pub fn new(vehicle: VehicleConfiguration) -> Self {
        Self {
            vehicle,
            decals: Vec::new(),
            next_decal_id: 1,
            images: BTreeMap::new(),
        }
    }

    pub fn decals(&self) -> &[Decal] {
        &self.decals
    }

    fn allocate_decal_id(&mut self) -> DecalId {
        let highest = self.decals.iter().map(|decal| decal.id.0).max().unwrap_or(0);
        let id = self.next_decal_id.max(highest + 1);
        self.next_decal_id = id + 1;
        DecalId(id)
    }

    /// Drops stored images no decal refers to.
    fn release_unreferenced_images(&mut self) {
        let decals = &self.decals;
        self.images
            .retain(|key, _| decals.iter().any(|decal| &decal.image_url == key));
    }

    #[cfg(test)]
    pub fn add_decal(&mut self, decal: Decal) {
        self.decals.push(decal);
    }
}

/// Owner of the shared scene aggregate.
///
/// Cloning yields another handle to the same state, so the façade, the
/// orchestrator and the decal engine all observe one aggregate with
/// last-writer-wins semantics. Every write is one synchronous borrow; the
/// handle is deliberately `!Send` because there is no locking.
#[derive(Clone)]
pub struct SceneStore {
    state: Rc<RefCell<SceneState>>,
    catalog: Rc<Catalog>,
}

impl SceneStore {
    /// Starts from the catalog's factory defaults.
    pub fn new(catalog: Rc<Catalog>) -> Self {
        let vehicle = catalog.defaults_for_body(&catalog.defaults.body);
        Self::with_state(catalog, SceneState::new(vehicle))
    }

    pub fn with_state(catalog: Rc<Catalog>, state: SceneState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_handle(&self) -> Rc<Catalog> {
        Rc::clone(&self.catalog)
    }

    pub fn vehicle(&self) -> VehicleConfiguration {
        self.state.borrow().vehicle.clone()
    }

    /// Partial write. A change of `body` always resets `addons` to the new
    /// body's defaults; this is the only place that rule lives.
    pub fn update_vehicle<F>(&self, mutate: F) -> VehicleConfiguration
    where
        F: FnOnce(&mut VehicleConfiguration),
    {
        let mut state = self.state.borrow_mut();
        let previous_body = state.vehicle.body.clone();
        mutate(&mut state.vehicle);
        if state.vehicle.body != previous_body {
            let addons = self.catalog.default_addons(&state.vehicle.body);
            log::debug!(
                "body changed {} -> {}, resetting {} addon slots",
                previous_body,
                state.vehicle.body,
                addons.len()
            );
            state.vehicle.addons = addons;
        }
        state.vehicle.clone()
    }

    /// Authoritative overwrite; stored exactly as given.
    pub fn replace_vehicle(&self, vehicle: VehicleConfiguration) {
        self.state.borrow_mut().vehicle = vehicle;
    }

    pub fn decals(&self) -> Vec<Decal> {
        self.state.borrow().decals.clone()
    }

    pub fn decal(&self, id: DecalId) -> Option<Decal> {
        self.state
            .borrow()
            .decals
            .iter()
            .find(|decal| decal.id == id)
            .cloned()
    }

    /// Inserts a decal built from a freshly allocated id.
    pub fn insert_decal<F>(&self, build: F) -> Decal
    where
        F: FnOnce(DecalId) -> Decal,
    {
        let mut state = self.state.borrow_mut();
        let id = state.allocate_decal_id();
        let decal = build(id);
        state.decals.push(decal.clone());
        decal
    }

    /// Image swaps release the previous content once nothing uses it.
    pub fn update_decal<F>(&self, id: DecalId, mutate: F) -> Option<Decal>
    where
        F: FnOnce(&mut Decal),
    {
        let mut state = self.state.borrow_mut();
        let decal = state.decals.iter_mut().find(|decal| decal.id == id)?;
        let previous_image = decal.image_url.clone();
        mutate(decal);
        let updated = decal.clone();
        if updated.image_url != previous_image {
            state.release_unreferenced_images();
        }
        Some(updated)
    }

    pub fn remove_decal(&self, id: DecalId) -> Option<Decal> {
        let mut state = self.state.borrow_mut();
        let index = state.decals.iter().position(|decal| decal.id == id)?;
        let removed = state.decals.remove(index);
        state.release_unreferenced_images();
        Some(removed)
    }

    pub fn clear_decals(&self) -> Vec<DecalId> {
        let mut state = self.state.borrow_mut();
        let ids = state.decals.drain(..).map(|decal| decal.id).collect();
        state.images.clear();
        ids
    }

    /// Keeps uploaded image content with the scene so decal geometry can be
    /// rebuilt after a restore.
    pub fn store_image(&self, key: &str, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        if !state.images.contains_key(key) {
            state.images.insert(key.to_string(), STANDARD.encode(bytes));
        }
    }

    pub fn image_bytes(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.state.borrow();
        let encoded = state.images.get(key)?;
        match STANDARD.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::warn!("Stored image {} is not valid base64: {}", key, err);
                None
            }
        }
    }

    pub fn snapshot(&self) -> SceneState {
        self.state.borrow().clone()
    }

    pub fn restore(&self, scene: SceneState) {
        *self.state.borrow_mut() = scene;
    }
}
