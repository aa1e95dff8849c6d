//! Demo configuration loading from demo.toml.
//!
//! ```text
//! ~/.config/flowvm/
//! ├── demo.toml         # Optional, defaults apply when missing
//! └── catalog.json      # Optional catalog fixture referenced from demo.toml
//! ```
//!
//! Example:
//! ```toml
//! latency_ms = 300
//! timeout_ms = 2000
//! catalog = "/home/me/.config/flowvm/catalog.json"
//!
//! [container]
//! name = "album-search"
//! enable_effects = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use flowvm_core::ContainerConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::service::{sample_catalog, CatalogEntry, CatalogService};

/// Settings of the album-search demo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub container: ContainerConfig,

    /// Simulated service latency.
    pub latency_ms: u64,

    /// Service timeout. No timeout when absent.
    pub timeout_ms: Option<u64>,

    /// JSON file holding a list of catalog entries. The built-in catalog is
    /// used when absent.
    pub catalog: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            container: ContainerConfig::named("album-search"),
            latency_ms: 200,
            timeout_ms: Some(2_000),
            catalog: None,
        }
    }
}

/// Get the config directory path.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("flowvm"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Get the path to demo.toml.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("demo.toml"))
}

impl DemoConfig {
    /// Load demo.toml from the config directory, or defaults if it doesn't
    /// exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match config_path() {
            Ok(path) => path,
            Err(ConfigError::NoConfigDir) => {
                tracing::info!("No config directory, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e),
        };

        if !path.exists() {
            tracing::info!("No demo.toml found at {:?}", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load a config file. Missing keys keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("Loading config from {:?}", path);
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Catalog entries from the configured fixture, or the built-in catalog.
    pub fn load_catalog(&self) -> Result<Vec<CatalogEntry>, ConfigError> {
        let Some(path) = &self.catalog else {
            return Ok(sample_catalog());
        };

        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let entries: Vec<CatalogEntry> = serde_json::from_str(&text)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Loaded {} catalog entries from {:?}", entries.len(), path);
        Ok(entries)
    }

    /// Build the catalog service described by this config.
    pub fn service(&self) -> Result<CatalogService, ConfigError> {
        let service = CatalogService::new(self.load_catalog()?).with_latency(self.latency());
        Ok(match self.timeout() {
            Some(timeout) => service.with_timeout(timeout),
            None => service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_defaults() {
        let config = DemoConfig::default();
        assert_eq!(config.container.name, "album-search");
        assert_eq!(config.latency(), Duration::from_millis(200));
        assert_eq!(config.timeout(), Some(Duration::from_secs(2)));
        assert!(config.catalog.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
latency_ms = 5

[container]
default_merge_limit = 8
enable_events = false
"#
        )
        .unwrap();

        let config = DemoConfig::load_from(file.path()).unwrap();
        assert_eq!(config.latency_ms, 5);
        assert_eq!(config.timeout_ms, Some(2_000));
        assert_eq!(config.container.default_merge_limit, 8);
        assert!(!config.container.enable_events);
        assert!(config.container.enable_effects);
        // Sections given in the file start from the section defaults
        assert_eq!(config.container.name, "container");
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "latency_ms = \"soon\"").unwrap();

        let result = DemoConfig::load_from(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = DemoConfig::load_from(&dir.path().join("demo.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_catalog_fixture() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let entries = vec![CatalogEntry::new("album/7", "Fixture Album", &["thumb.jpg"])];
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let config = DemoConfig {
            catalog: Some(path),
            ..DemoConfig::default()
        };
        assert_eq!(config.load_catalog().unwrap(), entries);
        assert_eq!(config.service().unwrap().len(), 1);
    }

    #[test]
    fn test_builtin_catalog() {
        let config = DemoConfig::default();
        assert_eq!(config.load_catalog().unwrap(), sample_catalog());
    }
}
