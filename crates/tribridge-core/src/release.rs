//! Release protocol
//!
//! Native blocks adopted by a record's ledger go back through `trifree`
//! either explicitly, via [`TriangleIo::release`], or when the record is
//! dropped. Both paths drain the ledger, so no address is freed twice.

use crate::error::{Result, TriangleError};
use crate::ffi::TriangulateIo;
use crate::io::{RecordState, TriangleIo};

impl TriangleIo {
    /// Free every native block this record owns
    ///
    /// Only a harvested record can be released. Returns the number of blocks
    /// freed. Afterwards every pointer in the record is null and the record
    /// is `Released`; releasing again is an error.
    pub fn release(&mut self) -> Result<usize> {
        match self.state {
            RecordState::Harvested => {}
            state => {
                return Err(TriangleError::Lifecycle {
                    operation: "release",
                    state,
                })
            }
        }

        let freed = self.free_native();
        tracing::debug!(freed, "released output record");
        Ok(freed)
    }

    fn free_native(&mut self) -> usize {
        let freed = match &self.library {
            // Safety: the ledger only holds addresses the bound library wrote
            // into this record during dispatch, and draining it means none
            // of them is freed twice.
            Some(library) => unsafe { self.ledger.release_all(library.as_ref()) },
            None => 0,
        };
        self.raw = TriangulateIo::empty();
        self.state = RecordState::Released;
        freed
    }
}

impl Drop for TriangleIo {
    fn drop(&mut self) {
        if self.ledger.is_empty() {
            return;
        }
        if self.library.is_none() {
            tracing::warn!(
                blocks = self.ledger.len(),
                "dropping record with native blocks but no library to free them"
            );
            return;
        }
        let freed = self.free_native();
        tracing::trace!(freed, "released output record on drop");
    }
}

/// Blocks freed when a `Triangulator` is closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    pub output: usize,
    pub voronoi: usize,
}

impl ReleaseSummary {
    pub fn total(&self) -> usize {
        self.output + self.voronoi
    }
}
