//! Locate command - find the Triangle shared library

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tribridge_config::Config;
use tribridge_core::{DynamicTriangle, LibraryLoader, TriangleLibrary};

/// Resolve the library path
///
/// Order: explicit flag, configured path (TRIBRIDGE_LIBRARY included),
/// configured name, then the default names, searching configured
/// directories before system ones.
pub fn resolve(explicit: Option<&Path>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = explicit.map(Path::to_path_buf).or_else(|| config.library_path()) {
        if !path.is_file() {
            bail!("Triangle library not found: {}", path.display());
        }
        return Ok(path);
    }

    let mut loader = LibraryLoader::new();
    // add_search_path prepends, so add in reverse to keep configured order
    for path in config.search_paths().into_iter().rev() {
        loader.add_search_path(path);
    }

    let found = match config.library_name() {
        Some(name) => loader.resolve(name),
        None => loader.resolve_default(),
    };
    found.with_context(|| {
        format!(
            "Triangle library '{}' not found in {} search paths; set TRIBRIDGE_LIBRARY or [library] path",
            config.library_name().unwrap_or("triangle_lib"),
            loader.search_paths().len()
        )
    })
}

/// Resolve and open the library
pub fn open_library(explicit: Option<&Path>, config: &Config) -> Result<Arc<dyn TriangleLibrary>> {
    let path = resolve(explicit, config)?;
    tracing::debug!(path = %path.display(), "opening Triangle library");
    // Safety: the user pointed us at this file as a Triangle build.
    let library = unsafe { DynamicTriangle::open(&path) }
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Arc::new(library))
}

pub fn run(explicit: Option<&Path>, config: &Config) -> Result<()> {
    let path = resolve(explicit, config)?;
    println!("{}", path.display());
    Ok(())
}
