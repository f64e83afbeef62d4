//! Config - Application Configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{DEFAULT_MAP_HEIGHT_PX, DEFAULT_MAP_WIDTH_PX};
use crate::domain::viewport::ZoomLimits;
use crate::error::{Error, Result};
use crate::helpers::get_or_create_config_dir;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SMARTBIN_CONFIG";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Document store configuration
    pub store: StoreConfig,
    /// Map view configuration
    pub map: MapConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot used to seed the in-memory store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

/// Map view configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    /// Unscaled map image width (px)
    pub width_px: f64,
    /// Unscaled map image height (px)
    pub height_px: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        let limits = ZoomLimits::default();
        Self {
            min_zoom: limits.min,
            max_zoom: limits.max,
            zoom_step: limits.step,
            width_px: DEFAULT_MAP_WIDTH_PX,
            height_px: DEFAULT_MAP_HEIGHT_PX,
        }
    }
}

impl MapConfig {
    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.min_zoom,
            max: self.max_zoom,
            step: self.zoom_step,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.zoom_limits().validate()?;
        if self.width_px <= 0.0 || self.height_px <= 0.0 {
            return Err(Error::Invalid {
                message: format!(
                    "map size must be positive (got {}x{})",
                    self.width_px, self.height_px
                ),
            });
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Directory for daily-rolling log files (console only when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl AppConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AppConfig = toml::from_str(content)?;
        config.map.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `$SMARTBIN_CONFIG` or the platform config directory
    pub fn load() -> Result<Self> {
        let path = default_config_path()?;
        #[cfg(debug_assertions)]
        info!("Config file: {}", path.display());
        Self::load_from(&path)
    }

    /// Write as pretty TOML
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Resolve the config file path
pub fn default_config_path() -> Result<PathBuf> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(get_or_create_config_dir()?.join(CONFIG_FILE_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = AppConfig::from_toml_str("").expect("config");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.map.zoom_limits(), ZoomLimits::default());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [store]
            snapshot_path = "/tmp/fleet.json"

            [map]
            max_zoom = 4.0
            "#,
        )
        .expect("config");
        assert_eq!(config.store.snapshot_path, Some(PathBuf::from("/tmp/fleet.json")));
        assert_eq!(config.map.max_zoom, 4.0);
        assert_eq!(config.map.min_zoom, 0.5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn invalid_map_is_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [map]
            width_px = 0.0
            "#,
        );
        assert!(matches!(result, Err(Error::Invalid { .. })));
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("smartbin-config-{}.toml", uuid::Uuid::new_v4()));
        let mut config = AppConfig::default();
        config.logging.level = "debug".to_string();
        config.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);

        let missing = AppConfig::load_from(&path).expect("defaults");
        assert_eq!(missing, AppConfig::default());
    }
}
