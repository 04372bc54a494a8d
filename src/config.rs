use crate::catalog::{Catalog, CatalogError};
use crate::decals::DecalSettings;
use crate::handlers::DEFAULT_NOTIFICATION_MS;
use crate::validation::OPACITY_RANGE;
use std::path::{Path, PathBuf};

/// Runtime settings. Every field has a default, so an empty `{}` file (or no
/// file at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConfiguratorConfig {
    /// Replaces the built-in catalog when set.
    pub catalog_path: Option<PathBuf>,
    pub notification_duration_ms: u64,
    pub decal_base_size: f32,
    pub decal_depth_factor: f32,
    pub decal_default_opacity: f32,
    pub reject_backfaces: bool,
}

impl Default for ConfiguratorConfig {
    fn default() -> Self {
        let decals = DecalSettings::default();
        Self {
            catalog_path: None,
            notification_duration_ms: DEFAULT_NOTIFICATION_MS,
            decal_base_size: decals.base_size,
            decal_depth_factor: decals.depth_factor,
            decal_default_opacity: decals.default_opacity,
            reject_backfaces: decals.reject_backfaces,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfiguratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.decal_base_size.is_finite() && self.decal_base_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "decal_base_size must be positive (got {})",
                self.decal_base_size
            )));
        }
        if !(self.decal_depth_factor.is_finite() && self.decal_depth_factor >= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "decal_depth_factor must be at least 1 (got {})",
                self.decal_depth_factor
            )));
        }
        OPACITY_RANGE
            .check(f64::from(self.decal_default_opacity))
            .map_err(ConfigError::Invalid)?;
        Ok(())
    }

    pub fn decal_settings(&self) -> DecalSettings {
        DecalSettings {
            base_size: self.decal_base_size,
            depth_factor: self.decal_depth_factor,
            default_opacity: self.decal_default_opacity,
            reject_backfaces: self.reject_backfaces,
        }
    }

    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => Catalog::load_from_file(path),
            None => Catalog::builtin(),
        }
    }
}
