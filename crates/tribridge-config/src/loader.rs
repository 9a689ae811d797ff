//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{validate_switches, ProjectConfig, PROJECT_CONFIG_FILE};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Overrides `[library] path`
pub const ENV_LIBRARY: &str = "TRIBRIDGE_LIBRARY";
/// Overrides `[triangulate] verbose`
pub const ENV_VERBOSE: &str = "TRIBRIDGE_VERBOSE";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.tribridge/config.toml) - lowest priority
/// 2. Project config (./tribridge.toml) - overrides global
/// 3. Environment variables (TRIBRIDGE_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration, with environment overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where tribridge.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read the global config from `path` instead of the home directory
    pub fn with_global_config_path(path: PathBuf) -> Self {
        Self {
            global_config_path: Some(path),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tribridge.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        let global_config = self.global_config_or_default();

        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.global_config_or_default();
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); a missing file yields defaults
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Global config is optional: a broken one is reported and skipped
    fn global_config_or_default(&mut self) -> GlobalConfig {
        match self.load_global_config() {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, "ignoring unreadable global config");
                GlobalConfig::default()
            }
        }
    }

    /// Load global configuration from ~/.tribridge/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(library) = env::var(ENV_LIBRARY) {
            if library.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_LIBRARY.to_string(),
                    reason: "path cannot be empty".to_string(),
                });
            }
            config.library.get_or_insert_with(Default::default).path = Some(PathBuf::from(library));
        }

        if let Ok(verbose) = env::var(ENV_VERBOSE) {
            let verbose = parse_bool(ENV_VERBOSE, &verbose)?;
            config.triangulate.get_or_insert_with(Default::default).verbose = Some(verbose);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a boolean, got '{}'", value),
        }),
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has tribridge.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Explicit library path (project > global)
    ///
    /// Relative project paths are resolved against the project root.
    pub fn library_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.project.library_path() {
            return Some(self.resolve(path));
        }
        self.global
            .library
            .as_ref()
            .and_then(|l| l.path.clone())
    }

    /// Library base name to search for (project > global)
    pub fn library_name(&self) -> Option<&str> {
        self.project.library_name().or_else(|| {
            self.global
                .library
                .as_ref()
                .and_then(|l| l.name.as_deref())
        })
    }

    /// Extra search directories, project ones first
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let project = self
            .project
            .library
            .iter()
            .flat_map(|l| l.search_paths.iter())
            .map(|p| self.resolve(p));
        let global = self
            .global
            .library
            .iter()
            .flat_map(|l| l.search_paths.iter().cloned());
        project.chain(global).collect()
    }

    /// Effective verbosity (project > global > false)
    pub fn verbose(&self) -> bool {
        self.project
            .verbose()
            .or_else(|| self.global.triangulate.as_ref().and_then(|t| t.verbose))
            .unwrap_or(false)
    }

    /// Effective default switches (project > global > none)
    pub fn switches(&self) -> &str {
        self.project
            .switches()
            .or_else(|| {
                self.global
                    .triangulate
                    .as_ref()
                    .and_then(|t| t.switches.as_deref())
            })
            .unwrap_or("")
    }

    /// Check a switch string from another source (e.g. a CLI flag)
    pub fn validate_switches(switches: &str) -> ConfigResult<()> {
        validate_switches(switches)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
