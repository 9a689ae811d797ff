//! Ownership ledger for natively allocated blocks
//!
//! One ledger belongs to one output record. It holds every address the
//! native routine allocated for that record and nothing else:
//! - addresses backed by a `ManagedBuffer` are refused at registration
//! - an address is recorded at most once, however many fields point at it
//! - `release_all` drains the ledger, so each address is freed exactly once

use crate::ffi::TriangleLibrary;
use std::collections::HashSet;
use std::os::raw::c_void;

/// How an output address was classified during harvesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Points at a caller-owned buffer; must not be freed natively
    Alias,
    /// Newly recorded as native-allocated
    Native,
    /// Already recorded by an earlier field or harvest
    AlreadyOwned,
}

/// Native addresses awaiting `trifree`
#[derive(Debug, Default)]
pub struct OwnershipLedger {
    // insertion order, for deterministic release
    order: Vec<usize>,
    members: HashSet<usize>,
}

impl OwnershipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `address` and record it if it is native-allocated
    ///
    /// `managed` is the set of addresses backed by caller-owned buffers of
    /// the input and output records.
    pub fn adopt(&mut self, address: *mut c_void, managed: &HashSet<usize>) -> Ownership {
        let address = address as usize;
        if managed.contains(&address) {
            return Ownership::Alias;
        }
        if !self.members.insert(address) {
            return Ownership::AlreadyOwned;
        }
        self.order.push(address);
        tracing::trace!("ledger adopted native block {:#x}", address);
        Ownership::Native
    }

    pub fn contains(&self, address: usize) -> bool {
        self.members.contains(&address)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Addresses in registration order
    pub fn addresses(&self) -> &[usize] {
        &self.order
    }

    /// Free every recorded address through `library` and clear the ledger
    ///
    /// Returns the number of blocks freed.
    ///
    /// # Safety
    ///
    /// Every recorded address must have been allocated by `library` and
    /// still be live.
    pub unsafe fn release_all(&mut self, library: &dyn TriangleLibrary) -> usize {
        let addresses = std::mem::take(&mut self.order);
        self.members.clear();
        for &address in &addresses {
            tracing::trace!("trifree {:#x}", address);
            library.trifree(address as *mut c_void);
        }
        addresses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::TriangulateIo;
    use std::os::raw::{c_char, c_int};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FreeLog(Mutex<Vec<usize>>);

    unsafe impl TriangleLibrary for FreeLog {
        unsafe fn triangulate(
            &self,
            _switches: *mut c_char,
            _input: *mut TriangulateIo,
            _output: *mut TriangulateIo,
            _voronoi: *mut TriangulateIo,
        ) -> c_int {
            0
        }

        unsafe fn trifree(&self, address: *mut c_void) {
            self.0.lock().unwrap().push(address as usize);
        }
    }

    fn addr(n: usize) -> *mut c_void {
        n as *mut c_void
    }

    #[test]
    fn test_alias_is_never_recorded() {
        let mut ledger = OwnershipLedger::new();
        let managed: HashSet<usize> = [0x1000].into_iter().collect();

        assert_eq!(ledger.adopt(addr(0x1000), &managed), Ownership::Alias);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_duplicate_address_recorded_once() {
        let mut ledger = OwnershipLedger::new();
        let managed = HashSet::new();

        assert_eq!(ledger.adopt(addr(0x2000), &managed), Ownership::Native);
        assert_eq!(ledger.adopt(addr(0x2000), &managed), Ownership::AlreadyOwned);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(0x2000));
    }

    #[test]
    fn test_release_all_frees_each_address_once_in_order() {
        let mut ledger = OwnershipLedger::new();
        let managed = HashSet::new();
        for a in [0x30, 0x10, 0x20, 0x10] {
            ledger.adopt(addr(a), &managed);
        }

        let log = FreeLog::default();
        let freed = unsafe { ledger.release_all(&log) };
        assert_eq!(freed, 3);
        assert_eq!(*log.0.lock().unwrap(), vec![0x30, 0x10, 0x20]);
        assert!(ledger.is_empty());

        let freed_again = unsafe { ledger.release_all(&log) };
        assert_eq!(freed_again, 0);
        assert_eq!(log.0.lock().unwrap().len(), 3);
    }
}
