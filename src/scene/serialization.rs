use crate::scene::{SavedVehicles, SceneState, VehicleConfiguration};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_scene_to_file(scene: &SceneState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(scene)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_scene_from_file(path: &Path) -> Result<SceneState> {
    let json = std::fs::read_to_string(path)?;
    let scene: SceneState = serde_json::from_str(&json)?;
    Ok(scene)
}

pub fn save_garage_to_file(saved: &SavedVehicles, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(saved)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_garage_from_file(path: &Path) -> Result<SavedVehicles> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn export_vehicle_json(vehicle: &VehicleConfiguration) -> Result<String> {
    Ok(serde_json::to_string_pretty(vehicle)?)
}

pub fn import_vehicle_json(json: &str) -> Result<VehicleConfiguration> {
    Ok(serde_json::from_str(json)?)
}
