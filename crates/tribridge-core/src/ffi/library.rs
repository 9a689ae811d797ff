//! Native entry points
//!
//! `TriangleLibrary` is the seam between the bridge and the native code. The
//! production implementation, [`DynamicTriangle`], resolves `triangulate` and
//! `trifree` from a shared library at runtime. Tests substitute an in-process
//! implementation.

use crate::ffi::loader::LoadError;
use crate::ffi::record::TriangulateIo;
use libloading::Library;
use std::os::raw::{c_char, c_int, c_void};
use std::path::{Path, PathBuf};

/// `int triangulate(char *, struct triangulateio *, struct triangulateio *, struct triangulateio *)`
pub type TriangulateFn = unsafe extern "C" fn(
    *mut c_char,
    *mut TriangulateIo,
    *mut TriangulateIo,
    *mut TriangulateIo,
) -> c_int;

/// `void trifree(void *)`
pub type TrifreeFn = unsafe extern "C" fn(*mut c_void);

/// The two native entry points the bridge depends on
///
/// # Safety
///
/// Implementors must behave like Triangle:
/// - `triangulate` reads the input record, may write pointer and count fields
///   of the output records, and returns 0 on success
/// - `trifree` accepts any address previously written into an output record
///   by `triangulate` that did not come from the input record
pub unsafe trait TriangleLibrary: Send + Sync {
    /// Run the native routine
    ///
    /// # Safety
    ///
    /// `switches` must be a NUL-terminated string and all three records must
    /// be valid for the duration of the call.
    unsafe fn triangulate(
        &self,
        switches: *mut c_char,
        input: *mut TriangulateIo,
        output: *mut TriangulateIo,
        voronoi: *mut TriangulateIo,
    ) -> c_int;

    /// Return a natively allocated block to the native allocator
    ///
    /// # Safety
    ///
    /// `address` must have been allocated by this library and not freed yet.
    unsafe fn trifree(&self, address: *mut c_void);
}

/// Triangle loaded from a shared library
///
/// The function pointers are only valid while `_library` is alive, which is
/// why both live in the same struct.
pub struct DynamicTriangle {
    triangulate: TriangulateFn,
    trifree: TrifreeFn,
    path: PathBuf,
    _library: Library,
}

impl DynamicTriangle {
    /// Open a shared library and resolve `triangulate` and `trifree`
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers. The library must export
    /// symbols with the signatures of [`TriangulateFn`] and [`TrifreeFn`].
    pub unsafe fn open(path: &Path) -> Result<Self, LoadError> {
        let library = Library::new(path).map_err(|e| LoadError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let triangulate = *library
            .get::<TriangulateFn>(b"triangulate\0")
            .map_err(|_| LoadError::SymbolNotFound {
                library: path.to_path_buf(),
                symbol: "triangulate",
            })?;
        let trifree = *library
            .get::<TrifreeFn>(b"trifree\0")
            .map_err(|_| LoadError::SymbolNotFound {
                library: path.to_path_buf(),
                symbol: "trifree",
            })?;

        tracing::debug!(path = %path.display(), "loaded Triangle library");

        Ok(Self {
            triangulate,
            trifree,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    /// Path the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for DynamicTriangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicTriangle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// Safety: the struct only holds plain function pointers into a library that
// stays loaded for the struct's lifetime. Triangle keeps no global state
// between calls that two threads could race on through these pointers other
// than what the caller serializes per session.
unsafe impl TriangleLibrary for DynamicTriangle {
    unsafe fn triangulate(
        &self,
        switches: *mut c_char,
        input: *mut TriangulateIo,
        output: *mut TriangulateIo,
        voronoi: *mut TriangulateIo,
    ) -> c_int {
        (self.triangulate)(switches, input, output, voronoi)
    }

    unsafe fn trifree(&self, address: *mut c_void) {
        (self.trifree)(address)
    }
}
