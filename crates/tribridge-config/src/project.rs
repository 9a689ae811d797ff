//! Project Configuration (tribridge.toml)
//!
//! Handles project-level configuration stored in `tribridge.toml` at the
//! project root. The `[library]` and `[triangulate]` section types are shared
//! with the global configuration.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name searched for when walking up from the working directory
pub const PROJECT_CONFIG_FILE: &str = "tribridge.toml";

/// Project configuration from tribridge.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Where to find the native library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryConfig>,

    /// Defaults for triangulation runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triangulate: Option<TriangulateConfig>,
}

/// `[library]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Explicit path to the shared library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Base name to search for (e.g. "triangle" for libtriangle.so)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Extra directories searched before the system ones
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,
}

/// `[triangulate]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TriangulateConfig {
    /// Run Triangle with `V` instead of `Q`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Default switches, e.g. "pq30"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switches: Option<String>,
}

impl ProjectConfig {
    /// Load project configuration from a file
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

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(library) = &self.library {
            library.validate()?;
        }
        if let Some(triangulate) = &self.triangulate {
            triangulate.validate()?;
        }
        Ok(())
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.library.as_ref().and_then(|l| l.path.as_deref())
    }

    pub fn library_name(&self) -> Option<&str> {
        self.library.as_ref().and_then(|l| l.name.as_deref())
    }

    pub fn verbose(&self) -> Option<bool> {
        self.triangulate.as_ref().and_then(|t| t.verbose)
    }

    pub fn switches(&self) -> Option<&str> {
        self.triangulate.as_ref().and_then(|t| t.switches.as_deref())
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if other.library.is_some() {
            self.library = other.library.clone();
        }
        if other.triangulate.is_some() {
            self.triangulate = other.triangulate.clone();
        }
    }
}

impl LibraryConfig {
    pub(crate) fn validate(&self) -> ConfigResult<()> {
        if let Some(name) = &self.name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(ConfigError::InvalidValue {
                    field: "library.name".to_string(),
                    reason: format!("'{}' is not a bare library name; use library.path", name),
                });
            }
        }
        if self.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "library.path".to_string(),
                reason: "path cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl TriangulateConfig {
    pub(crate) fn validate(&self) -> ConfigResult<()> {
        if let Some(switches) = &self.switches {
            validate_switches(switches)?;
        }
        Ok(())
    }
}

/// Check that a switch string only holds Triangle flags and numbers
///
/// `V` and `Q` are refused: verbosity has its own setting.
pub(crate) fn validate_switches(switches: &str) -> ConfigResult<()> {
    match switches
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '.') || matches!(c, 'V' | 'Q'))
    {
        Some(c) => Err(ConfigError::InvalidValue {
            field: "triangulate.switches".to_string(),
            reason: format!("unexpected character '{}' in '{}'", c, switches),
        }),
        None => Ok(()),
    }
}
