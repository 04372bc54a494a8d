use crate::scene::VehicleConfiguration;
use crate::validation::is_known_id;
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../assets/catalog.json");

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AddonOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AddonSlot {
    #[serde(default)]
    pub name: String,
    pub options: BTreeMap<String, AddonOption>,
}

/// One entry of the vehicle model catalog; decides which addon slots exist.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VehicleModel {
    pub name: String,
    pub make: String,
    pub wheelbase: f64,
    pub default_addons: BTreeMap<String, String>,
    pub addons: BTreeMap<String, AddonSlot>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WheelPart {
    pub name: String,
    #[serde(default)]
    pub make: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WheelCatalog {
    pub rims: BTreeMap<String, WheelPart>,
    pub tires: BTreeMap<String, WheelPart>,
}

/// Read-only static catalog: vehicle models, wheel parts and factory defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Catalog {
    pub vehicles: BTreeMap<String, VehicleModel>,
    pub wheels: WheelCatalog,
    pub defaults: VehicleConfiguration,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog is inconsistent: {0}")]
    Inconsistent(String),
}

impl Catalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.check_consistency()?;
        Ok(catalog)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Every default must resolve inside the catalog itself, otherwise resets
    /// would write values the setters reject.
    fn check_consistency(&self) -> Result<(), CatalogError> {
        for (id, model) in &self.vehicles {
            for (slot, value) in &model.default_addons {
                if !self.is_addon_option(id, slot, value) {
                    return Err(CatalogError::Inconsistent(format!(
                        "default addon {}={} is not an option of {}",
                        slot, value, id
                    )));
                }
            }
        }
        let defaults = &self.defaults;
        if !is_known_id(&defaults.body, &self.vehicles) {
            return Err(CatalogError::Inconsistent(format!(
                "default body '{}' is not a catalog vehicle",
                defaults.body
            )));
        }
        if !is_known_id(&defaults.rim, &self.wheels.rims) {
            return Err(CatalogError::Inconsistent(format!(
                "default rim '{}' is not a catalog rim",
                defaults.rim
            )));
        }
        if !is_known_id(&defaults.tire, &self.wheels.tires) {
            return Err(CatalogError::Inconsistent(format!(
                "default tire '{}' is not a catalog tire",
                defaults.tire
            )));
        }
        Ok(())
    }

    pub fn vehicle(&self, id: &str) -> Option<&VehicleModel> {
        self.vehicles.get(id)
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.vehicles.keys().cloned().collect()
    }

    pub fn rim_ids(&self) -> Vec<String> {
        self.wheels.rims.keys().cloned().collect()
    }

    pub fn tire_ids(&self) -> Vec<String> {
        self.wheels.tires.keys().cloned().collect()
    }

    pub fn default_addons(&self, body: &str) -> BTreeMap<String, String> {
        self.vehicle(body)
            .map(|model| model.default_addons.clone())
            .unwrap_or_default()
    }

    pub fn addon_slot(&self, body: &str, slot: &str) -> Option<&AddonSlot> {
        self.vehicle(body).and_then(|model| model.addons.get(slot))
    }

    pub fn slot_names(&self, body: &str) -> Vec<String> {
        self.vehicle(body)
            .map(|model| model.addons.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_addon_option(&self, body: &str, slot: &str, value: &str) -> bool {
        self.addon_slot(body, slot)
            .map(|entry| entry.options.contains_key(value))
            .unwrap_or(false)
    }

    /// Factory defaults with the given body's default addon set applied.
    pub fn defaults_for_body(&self, body: &str) -> VehicleConfiguration {
        let mut config = self.defaults.clone();
        if self.vehicles.contains_key(body) {
            config.body = body.to_string();
            config.addons = self.default_addons(body);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses_and_is_consistent() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.vehicle("jeep_jku").is_some());
        assert!(catalog.wheels.rims.contains_key("xd_grenade"));
        assert!(catalog.wheels.tires.contains_key("bfg_km3"));
        assert_eq!(catalog.defaults.body, "toyota_4runner");
    }

    #[test]
    fn addon_lookup_is_per_body() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.is_addon_option("jeep_jku", "rack", "gobi_stealth"));
        assert!(!catalog.is_addon_option("ford_bronco", "rack", "gobi_stealth"));
        assert!(!catalog.is_addon_option("jeep_jku", "rack", "nope"));
        assert!(catalog.addon_slot("toyota_tacoma", "bed_rack").is_some());
    }

    #[test]
    fn defaults_for_body_swaps_addon_set() {
        let catalog = Catalog::builtin().unwrap();
        let config = catalog.defaults_for_body("jeep_jku");
        assert_eq!(config.body, "jeep_jku");
        assert_eq!(config.addons.get("bumper_r").map(String::as_str), Some("stock"));
        assert_eq!(config.color, catalog.defaults.color);
    }

    #[test]
    fn inconsistent_default_is_rejected() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.defaults.rim = "missing_rim".to_string();
        let json = serde_json::to_string(&catalog).unwrap();
        let err = Catalog::from_json_str(&json).unwrap_err();
        assert!(matches!(err, CatalogError::Inconsistent(_)));
    }

    #[test]
    fn missing_catalog_file_reports_path() {
        let err = Catalog::load_from_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
