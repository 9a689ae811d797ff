//! Foreign Function Interface (FFI) layer
//!
//! Everything that touches Triangle's ABI lives here:
//! - `record`: the `struct triangulateio` layout and its field table
//! - `library`: the `triangulate`/`trifree` entry points
//! - `loader`: locating and opening the shared library
//!
//! # Safety
//!
//! The raw record is only ever handed to native code by the dispatcher.
//! Ownership of the buffers its pointers refer to is tracked outside this
//! module, by `TriangleIo` and its ledger.

pub mod library;
pub mod loader;
pub mod record;

pub use library::{DynamicTriangle, TriangleLibrary, TriangulateFn, TrifreeFn};
pub use loader::{LibraryLoader, LoadError, DEFAULT_LIBRARY_NAMES};
pub use record::{ArrayField, ElementKind, TriangulateIo};
