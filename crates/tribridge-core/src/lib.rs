//! Tribridge Core - ownership-safe bridge to Shewchuk's Triangle
//!
//! This library provides:
//! - The `struct triangulateio` foreign record and its field table
//! - Record building from validated geometry
//! - A single-shot call dispatcher over a loaded Triangle library
//! - Harvesting of outputs, telling caller-owned aliases from native blocks
//! - Deterministic release of native blocks through `trifree`
//!
//! ```no_run
//! use std::sync::Arc;
//! use tribridge_core::{triangulate, Geometry, LibraryLoader, Switches};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut loader = LibraryLoader::new();
//! let library = unsafe { loader.open_default()? };
//! let geometry = Geometry::from_vertices([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
//!     .with_segments([[0, 1], [1, 2], [2, 3], [3, 0]]);
//! let mesh = triangulate(library, &geometry, &Switches::new().pslg().quality(Some(30.0)))?;
//! println!("{} triangles", mesh.triangles.len());
//! # Ok(())
//! # }
//! ```

/// Tribridge core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod buffer;
mod dispatch;
pub mod error;
pub mod ffi;
pub mod geometry;
mod harvest;
pub mod io;
pub mod ledger;
mod release;
pub mod session;
pub mod switches;

pub use buffer::ManagedBuffer;
pub use error::{Result, TriangleError};
pub use ffi::{
    ArrayField, DynamicTriangle, ElementKind, LibraryLoader, LoadError, TriangleLibrary,
    TriangulateIo,
};
pub use geometry::{Geometry, Region, Triangulation};
pub use io::{RecordState, TriangleIo};
pub use ledger::{Ownership, OwnershipLedger};
pub use release::ReleaseSummary;
pub use session::{triangulate, Triangulator};
pub use switches::Switches;
