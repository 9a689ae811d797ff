//! Caller-owned buffers handed to the native routine
//!
//! A `ManagedBuffer` owns a boxed slice. Moving the buffer (or the record
//! that holds it) never moves the heap block, so the address written into a
//! `TriangulateIo` stays valid until the buffer is dropped.

use crate::ffi::ElementKind;
use std::os::raw::{c_int, c_void};

/// Contiguous block of scalars owned by the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum ManagedBuffer {
    Real(Box<[f64]>),
    Int(Box<[c_int]>),
}

impl ManagedBuffer {
    pub fn kind(&self) -> ElementKind {
        match self {
            ManagedBuffer::Real(_) => ElementKind::Real,
            ManagedBuffer::Int(_) => ElementKind::Int,
        }
    }

    /// Number of scalars in the block
    pub fn len(&self) -> usize {
        match self {
            ManagedBuffer::Real(data) => data.len(),
            ManagedBuffer::Int(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address to store in the foreign record
    ///
    /// Native code only reads through this pointer; it is `*mut` because
    /// that is what `struct triangulateio` declares.
    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        match self {
            ManagedBuffer::Real(data) => data.as_mut_ptr().cast(),
            ManagedBuffer::Int(data) => data.as_mut_ptr().cast(),
        }
    }

    /// Address of the block, for membership checks
    pub fn address(&self) -> usize {
        match self {
            ManagedBuffer::Real(data) => data.as_ptr() as usize,
            ManagedBuffer::Int(data) => data.as_ptr() as usize,
        }
    }
}

impl From<Vec<f64>> for ManagedBuffer {
    fn from(data: Vec<f64>) -> Self {
        ManagedBuffer::Real(data.into_boxed_slice())
    }
}

impl From<Vec<c_int>> for ManagedBuffer {
    fn from(data: Vec<c_int>) -> Self {
        ManagedBuffer::Int(data.into_boxed_slice())
    }
}
