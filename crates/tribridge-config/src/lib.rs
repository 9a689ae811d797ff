//! Tribridge Configuration System
//!
//! Provides configuration for locating and driving the Triangle library:
//! - Project configuration (tribridge.toml)
//! - Global user configuration (~/.tribridge/config.toml)
//! - Environment overrides (TRIBRIDGE_*)
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.tribridge/config.toml)
//! 2. Project config (./tribridge.toml, searched upwards)
//! 3. Environment variables (TRIBRIDGE_LIBRARY, TRIBRIDGE_VERBOSE)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use tribridge_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("verbose: {}", config.verbose());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{LibraryConfig, ProjectConfig, TriangulateConfig};
