//! Global Configuration (~/.tribridge/config.toml)
//!
//! Handles user-level configuration stored in `~/.tribridge/config.toml`.
//! It carries the same sections as a project config and is overridden by it.

use crate::project::{LibraryConfig, TriangulateConfig};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.tribridge/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub triangulate: Option<TriangulateConfig>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(library) = &self.library {
            library.validate()?;
        }
        if let Some(triangulate) = &self.triangulate {
            triangulate.validate()?;
        }
        Ok(())
    }

    /// Get the global config directory (~/.tribridge)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".tribridge"))
    }

    /// Get the global config file path (~/.tribridge/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        Ok(Self::global_config_dir()?.join("config.toml"))
    }

    /// Merge another global config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &GlobalConfig) {
        if other.library.is_some() {
            self.library = other.library.clone();
        }
        if other.triangulate.is_some() {
            self.triangulate = other.triangulate.clone();
        }
    }
}
