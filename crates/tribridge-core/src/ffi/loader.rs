//! Locating and opening the Triangle shared library
//!
//! Handles platform-specific library naming conventions and search paths,
//! and caches opened libraries so repeated sessions share one handle.

use crate::ffi::library::DynamicTriangle;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Library base names tried when none is given, in priority order
pub const DEFAULT_LIBRARY_NAMES: [&str; 2] = ["triangle_lib", "triangle"];

/// Library loading errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Library file not found in search paths
    #[error("Triangle library '{name}' not found in {searched} search paths")]
    LibraryNotFound { name: String, searched: usize },

    /// Symbol not found in library
    #[error("symbol '{symbol}' not found in {}", library.display())]
    SymbolNotFound {
        library: PathBuf,
        symbol: &'static str,
    },

    /// Failed to load library
    #[error("failed to load {}: {reason}", path.display())]
    LoadFailed { path: PathBuf, reason: String },
}

/// Triangle library locator with caching
///
/// Search order: configured paths (most recently added first), the current
/// working directory, then the platform's standard library directories.
pub struct LibraryLoader {
    loaded: HashMap<PathBuf, Arc<DynamicTriangle>>,
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    /// Create a loader with default search paths
    pub fn new() -> Self {
        Self {
            loaded: HashMap::new(),
            search_paths: Self::default_search_paths(),
        }
    }

    /// Platform-specific default search paths
    ///
    /// - Linux: /usr/lib, /usr/local/lib, /lib (+ lib64 variants)
    /// - macOS: /usr/lib, /usr/local/lib, /opt/homebrew/lib
    /// - Windows: System32
    /// - All platforms: current working directory first
    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(target_os = "linux")]
        {
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/lib"));

            if cfg!(target_pointer_width = "64") {
                paths.push(PathBuf::from("/usr/lib64"));
                paths.push(PathBuf::from("/lib64"));
            }
        }

        #[cfg(target_os = "macos")]
        {
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/opt/homebrew/lib"));
        }

        #[cfg(target_os = "windows")]
        {
            paths.push(PathBuf::from("C:\\Windows\\System32"));
            if let Ok(system_root) = std::env::var("SystemRoot") {
                paths.push(PathBuf::from(format!("{}\\System32", system_root)));
            }
        }

        if let Ok(cwd) = std::env::current_dir() {
            paths.insert(0, cwd);
        }

        paths
    }

    /// File names a library base name may have on this platform
    ///
    /// - Linux: lib{name}.so, {name}.so
    /// - macOS: lib{name}.dylib, lib{name}.so, ...
    /// - Windows: {name}.dll, lib{name}.dll
    pub fn candidate_file_names(name: &str) -> Vec<String> {
        let extensions: &[&str] = if cfg!(target_os = "windows") {
            &["dll"]
        } else if cfg!(target_os = "macos") {
            &["dylib", "so"]
        } else {
            &["so"]
        };

        let prefixes: &[&str] = if cfg!(target_os = "windows") {
            &["", "lib"]
        } else {
            &["lib", ""]
        };

        let mut names = Vec::new();
        for prefix in prefixes {
            for ext in extensions {
                names.push(format!("{}{}.{}", prefix, name, ext));
            }
        }
        names
    }

    /// Resolve a library name or path to an existing file
    ///
    /// `name` may be a path to a file (absolute or relative) or a base name
    /// such as `triangle_lib`.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.components().count() > 1 || path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }

        for search_path in &self.search_paths {
            for filename in Self::candidate_file_names(name) {
                let full_path = search_path.join(&filename);
                if full_path.is_file() {
                    return Some(full_path);
                }
            }
        }

        None
    }

    /// Resolve the first of [`DEFAULT_LIBRARY_NAMES`] that exists
    pub fn resolve_default(&self) -> Option<PathBuf> {
        DEFAULT_LIBRARY_NAMES
            .iter()
            .find_map(|name| self.resolve(name))
    }

    /// Open a library by name or path
    ///
    /// Returns the cached handle if the same file was opened before.
    ///
    /// # Safety
    ///
    /// Loading a dynamic library executes its initialisation code. The
    /// library must be a trusted Triangle build exporting `triangulate` and
    /// `trifree` with the expected signatures.
    pub unsafe fn open(&mut self, name: &str) -> Result<Arc<DynamicTriangle>, LoadError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| LoadError::LibraryNotFound {
                name: name.to_string(),
                searched: self.search_paths.len(),
            })?;
        self.open_resolved(path)
    }

    /// Open the first library found under [`DEFAULT_LIBRARY_NAMES`]
    ///
    /// # Safety
    ///
    /// Same contract as [`LibraryLoader::open`].
    pub unsafe fn open_default(&mut self) -> Result<Arc<DynamicTriangle>, LoadError> {
        let path = self
            .resolve_default()
            .ok_or_else(|| LoadError::LibraryNotFound {
                name: DEFAULT_LIBRARY_NAMES.join("|"),
                searched: self.search_paths.len(),
            })?;
        self.open_resolved(path)
    }

    unsafe fn open_resolved(&mut self, path: PathBuf) -> Result<Arc<DynamicTriangle>, LoadError> {
        if let Some(library) = self.loaded.get(&path) {
            return Ok(Arc::clone(library));
        }

        let library = Arc::new(DynamicTriangle::open(&path)?);
        self.loaded.insert(path, Arc::clone(&library));
        Ok(library)
    }

    /// Add a custom search path (prepended to search list)
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.insert(0, path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Number of distinct libraries opened so far
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}
