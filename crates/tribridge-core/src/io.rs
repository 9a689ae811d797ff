//! `TriangleIo` - one foreign record plus everything that keeps it sound
//!
//! A `TriangleIo` owns:
//! - the raw `TriangulateIo` handed to native code
//! - the `ManagedBuffer`s its input pointers refer to
//! - the `OwnershipLedger` of native blocks written into it by a call
//! - the library handle needed to free those blocks
//!
//! # Lifecycle
//!
//! ```text
//! Empty -> Populated -> Submitted -> Harvested -> Released
//!            (setters)   (dispatch)   (harvest)    (release / drop)
//! ```
//!
//! Setters are only accepted while `Empty` or `Populated`: once a record has
//! been submitted, output records may alias its buffers, so they must never
//! be replaced.

use crate::buffer::ManagedBuffer;
use crate::error::{Result, TriangleError};
use crate::ffi::{ArrayField, TriangleLibrary, TriangulateIo};
use crate::geometry::{Geometry, Region};
use crate::ledger::OwnershipLedger;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::os::raw::c_int;
use std::sync::Arc;

/// Position of a record in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordState {
    /// No fields set
    Empty,
    /// At least one field set by a setter
    Populated,
    /// Passed to the native routine
    Submitted,
    /// Output pointers classified and adopted by the ledger
    Harvested,
    /// Native blocks returned; terminal
    Released,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordState::Empty => "empty",
            RecordState::Populated => "populated",
            RecordState::Submitted => "submitted",
            RecordState::Harvested => "harvested",
            RecordState::Released => "released",
        };
        f.write_str(name)
    }
}

/// A foreign record and the ownership bookkeeping around it
pub struct TriangleIo {
    pub(crate) raw: TriangulateIo,
    pub(crate) buffers: HashMap<ArrayField, ManagedBuffer>,
    pub(crate) ledger: OwnershipLedger,
    pub(crate) state: RecordState,
    pub(crate) library: Option<Arc<dyn TriangleLibrary>>,
}

// Safety: every address in `raw` is either owned by `buffers`, owned by
// `ledger`, or an alias into the input record of the same session, which
// moves together with it. Nothing is shared, so moving the record to another
// thread is sound. It is deliberately not `Sync`.
unsafe impl Send for TriangleIo {}

impl TriangleIo {
    /// An empty record: every pointer null, every count zero
    pub fn new() -> Self {
        Self {
            raw: TriangulateIo::empty(),
            buffers: HashMap::new(),
            ledger: OwnershipLedger::new(),
            state: RecordState::Empty,
            library: None,
        }
    }

    /// Build an input record from mapping-shaped geometry
    ///
    /// `vertices` is required. Setters run in dependency order. If any of
    /// them fails, the partially built record is dropped and only the error
    /// is returned.
    pub fn from_geometry(geometry: &Geometry) -> Result<Self> {
        let vertices = geometry
            .vertices
            .as_ref()
            .ok_or_else(|| TriangleError::validation("vertices", "required"))?;

        let mut io = Self::new();
        io.set_vertices(vertices)?;
        if let Some(attributes) = &geometry.vertex_attributes {
            io.set_vertex_attributes(attributes)?;
        }
        if let Some(markers) = &geometry.vertex_markers {
            io.set_vertex_markers(markers)?;
        }
        if let Some(triangles) = &geometry.triangles {
            io.set_triangles(triangles)?;
        }
        if let Some(attributes) = &geometry.triangle_attributes {
            io.set_triangle_attributes(attributes)?;
        }
        if let Some(areas) = &geometry.triangle_max_area {
            io.set_triangle_max_area(areas)?;
        }
        if let Some(segments) = &geometry.segments {
            io.set_segments(segments)?;
        }
        if let Some(markers) = &geometry.segment_markers {
            io.set_segment_markers(markers)?;
        }
        if let Some(holes) = &geometry.holes {
            io.set_holes(holes)?;
        }
        if let Some(regions) = &geometry.regions {
            io.set_regions(regions)?;
        }

        Ok(io)
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    /// The raw foreign record
    pub fn raw(&self) -> &TriangulateIo {
        &self.raw
    }

    /// Native blocks currently awaiting release
    pub fn ledger(&self) -> &OwnershipLedger {
        &self.ledger
    }

    /// Addresses backed by this record's managed buffers
    ///
    /// Empty buffers are never written into the record and are skipped.
    pub fn managed_addresses(&self) -> HashSet<usize> {
        self.buffers
            .values()
            .filter(|buffer| !buffer.is_empty())
            .map(ManagedBuffer::address)
            .collect()
    }

    /// Whether a setter has established `field`
    pub fn has_field(&self, field: ArrayField) -> bool {
        self.buffers.contains_key(&field)
    }

    pub fn point_count(&self) -> usize {
        self.raw.numberofpoints.max(0) as usize
    }

    pub fn triangle_count(&self) -> usize {
        self.raw.numberoftriangles.max(0) as usize
    }

    pub fn segment_count(&self) -> usize {
        self.raw.numberofsegments.max(0) as usize
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    /// Set the (N, 2) vertex coordinates
    pub fn set_vertices(&mut self, vertices: &[Vec<f64>]) -> Result<()> {
        self.ensure_mutable()?;
        let (data, n, _) = flatten("vertices", vertices, Some(2))?;
        check_finite("vertices", &data)?;
        let count = to_count("vertices", n)?;

        let dependents = [
            ArrayField::PointAttributeList,
            ArrayField::PointMarkerList,
            ArrayField::TriangleList,
            ArrayField::SegmentList,
        ];
        if n != self.point_count() {
            if let Some(dependent) = dependents.into_iter().find(|f| self.has_field(*f)) {
                return Err(TriangleError::validation(
                    "vertices",
                    format!(
                        "{} rows, but {} was built for {} points",
                        n,
                        dependent,
                        self.point_count()
                    ),
                ));
            }
        }

        self.install(ArrayField::PointList, data.into());
        self.raw.numberofpoints = count;
        Ok(())
    }

    /// Set the (N, k) per-vertex attributes
    pub fn set_vertex_attributes(&mut self, attributes: &[Vec<f64>]) -> Result<()> {
        self.ensure_mutable()?;
        self.require("vertex_attributes", ArrayField::PointList, "vertices")?;
        let (data, n, k) = flatten("vertex_attributes", attributes, None)?;
        expect_rows("vertex_attributes", n, self.point_count(), "vertices")?;
        let k = to_count("vertex_attributes", k)?;

        self.install(ArrayField::PointAttributeList, data.into());
        self.raw.numberofpointattributes = k;
        Ok(())
    }

    /// Set the length-N vertex markers
    pub fn set_vertex_markers(&mut self, markers: &[i32]) -> Result<()> {
        self.ensure_mutable()?;
        self.require("vertex_markers", ArrayField::PointList, "vertices")?;
        expect_rows("vertex_markers", markers.len(), self.point_count(), "vertices")?;

        self.install(ArrayField::PointMarkerList, markers.to_vec().into());
        Ok(())
    }

    /// Set the (M, c) triangle corner indices of a pre-existing mesh
    ///
    /// `c` must be 3 (linear) or 6 (quadratic). Indices are zero-based.
    pub fn set_triangles(&mut self, triangles: &[Vec<i32>]) -> Result<()> {
        self.ensure_mutable()?;
        self.require("triangles", ArrayField::PointList, "vertices")?;
        let (data, m, corners) = flatten("triangles", triangles, None)?;
        if m > 0 && corners != 3 && corners != 6 {
            return Err(TriangleError::validation(
                "triangles",
                format!("expected 3 or 6 corners per triangle, got {}", corners),
            ));
        }
        check_indices("triangles", &data, self.point_count())?;
        let count = to_count("triangles", m)?;

        let dependents = [ArrayField::TriangleAttributeList, ArrayField::TriangleAreaList];
        if m != self.triangle_count() {
            if let Some(dependent) = dependents.into_iter().find(|f| self.has_field(*f)) {
                return Err(TriangleError::validation(
                    "triangles",
                    format!(
                        "{} rows, but {} was built for {} triangles",
                        m,
                        dependent,
                        self.triangle_count()
                    ),
                ));
            }
        }

        self.install(ArrayField::TriangleList, data.into());
        self.raw.numberoftriangles = count;
        self.raw.numberofcorners = if m > 0 { corners as c_int } else { 3 };
        Ok(())
    }

    /// Set the (M, k) per-triangle attributes
    pub fn set_triangle_attributes(&mut self, attributes: &[Vec<f64>]) -> Result<()> {
        self.ensure_mutable()?;
        self.require("triangle_attributes", ArrayField::TriangleList, "triangles")?;
        let (data, m, k) = flatten("triangle_attributes", attributes, None)?;
        expect_rows("triangle_attributes", m, self.triangle_count(), "triangles")?;
        let k = to_count("triangle_attributes", k)?;

        self.install(ArrayField::TriangleAttributeList, data.into());
        self.raw.numberoftriangleattributes = k;
        Ok(())
    }

    /// Set the length-M per-triangle maximum area constraints
    pub fn set_triangle_max_area(&mut self, areas: &[f64]) -> Result<()> {
        self.ensure_mutable()?;
        self.require("triangle_max_area", ArrayField::TriangleList, "triangles")?;
        expect_rows("triangle_max_area", areas.len(), self.triangle_count(), "triangles")?;

        self.install(ArrayField::TriangleAreaList, areas.to_vec().into());
        Ok(())
    }

    /// Set the (S, 2) segment endpoint indices
    pub fn set_segments(&mut self, segments: &[Vec<i32>]) -> Result<()> {
        self.ensure_mutable()?;
        self.require("segments", ArrayField::PointList, "vertices")?;
        let (data, s, _) = flatten("segments", segments, Some(2))?;
        check_indices("segments", &data, self.point_count())?;
        let count = to_count("segments", s)?;

        if s != self.segment_count() && self.has_field(ArrayField::SegmentMarkerList) {
            return Err(TriangleError::validation(
                "segments",
                format!(
                    "{} rows, but segment_markers was built for {} segments",
                    s,
                    self.segment_count()
                ),
            ));
        }

        self.install(ArrayField::SegmentList, data.into());
        self.raw.numberofsegments = count;
        Ok(())
    }

    /// Set the length-S segment markers
    pub fn set_segment_markers(&mut self, markers: &[i32]) -> Result<()> {
        self.ensure_mutable()?;
        self.require("segment_markers", ArrayField::SegmentList, "segments")?;
        expect_rows("segment_markers", markers.len(), self.segment_count(), "segments")?;

        self.install(ArrayField::SegmentMarkerList, markers.to_vec().into());
        Ok(())
    }

    /// Set the (H, 2) hole points
    pub fn set_holes(&mut self, holes: &[Vec<f64>]) -> Result<()> {
        self.ensure_mutable()?;
        let (data, h, _) = flatten("holes", holes, Some(2))?;
        check_finite("holes", &data)?;
        let count = to_count("holes", h)?;

        self.install(ArrayField::HoleList, data.into());
        self.raw.numberofholes = count;
        Ok(())
    }

    /// Set the region constraints, flattened to (R, 4) `x, y, marker, max_area`
    pub fn set_regions(&mut self, regions: &[Region]) -> Result<()> {
        self.ensure_mutable()?;
        let data: Vec<f64> = regions.iter().flat_map(Region::to_row).collect();
        for region in regions {
            check_finite("regions", &region.vertex)?;
        }
        let count = to_count("regions", regions.len())?;

        self.install(ArrayField::RegionList, data.into());
        self.raw.numberofregions = count;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_mutable(&self) -> Result<()> {
        match self.state {
            RecordState::Empty | RecordState::Populated => Ok(()),
            state => Err(TriangleError::Lifecycle {
                operation: "modify",
                state,
            }),
        }
    }

    fn require(&self, field: &'static str, needed: ArrayField, needed_name: &str) -> Result<()> {
        if self.has_field(needed) {
            Ok(())
        } else {
            Err(TriangleError::validation(
                field,
                format!("{} must be set first", needed_name),
            ))
        }
    }

    /// Store `buffer` as the backing of `field`, replacing any earlier one
    ///
    /// Empty buffers are kept (the field counts as established) but a null
    /// pointer is written, so a zero length never pairs with a live address.
    fn install(&mut self, field: ArrayField, mut buffer: ManagedBuffer) {
        debug_assert_eq!(buffer.kind(), field.kind());
        let address = if buffer.is_empty() {
            std::ptr::null_mut()
        } else {
            buffer.as_mut_ptr()
        };
        field.set_address(&mut self.raw, address);
        self.buffers.insert(field, buffer);
        self.state = RecordState::Populated;
    }
}

impl Default for TriangleIo {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TriangleIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriangleIo")
            .field("state", &self.state)
            .field("raw", &self.raw)
            .field("managed", &self.buffers.len())
            .field("native", &self.ledger.len())
            .finish()
    }
}

/// Flatten rectangular rows into one contiguous block
///
/// Returns `(data, rows, columns)`. With `columns` given, every row must
/// have exactly that many entries; otherwise all rows must match the first.
fn flatten<T: Copy>(
    field: &'static str,
    rows: &[Vec<T>],
    columns: Option<usize>,
) -> Result<(Vec<T>, usize, usize)> {
    let width = columns.or_else(|| rows.first().map(Vec::len)).unwrap_or(0);

    let mut data = Vec::with_capacity(rows.len() * width);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            let reason = match columns {
                Some(expected) => format!(
                    "expected {} columns, got {} in row {}",
                    expected,
                    row.len(),
                    i
                ),
                None => format!(
                    "ragged rows: row {} has {} columns, row 0 has {}",
                    i,
                    row.len(),
                    width
                ),
            };
            return Err(TriangleError::validation(field, reason));
        }
        data.extend_from_slice(row);
    }

    Ok((data, rows.len(), width))
}

fn to_count(field: &'static str, n: usize) -> Result<c_int> {
    c_int::try_from(n)
        .map_err(|_| TriangleError::validation(field, format!("{} exceeds the native count range", n)))
}

fn expect_rows(field: &'static str, got: usize, expected: usize, against: &str) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(TriangleError::validation(
            field,
            format!("{} rows, but {} has {}", got, against, expected),
        ))
    }
}

fn check_finite(field: &'static str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(TriangleError::validation(
            field,
            format!("non-finite value {} at flat index {}", values[i], i),
        )),
        None => Ok(()),
    }
}

fn check_indices(field: &'static str, indices: &[i32], points: usize) -> Result<()> {
    match indices
        .iter()
        .find(|&&i| i < 0 || i as usize >= points)
    {
        Some(bad) => Err(TriangleError::validation(
            field,
            format!("vertex index {} out of range 0..{}", bad, points),
        )),
        None => Ok(()),
    }
}
