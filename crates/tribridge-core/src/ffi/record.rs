//! Foreign record descriptor - the `struct triangulateio` contract
//!
//! Defines:
//! - `TriangulateIo`: byte-exact mirror of Triangle's `struct triangulateio`
//! - `ArrayField`: table of every pointer field with its element kind and shape
//!
//! Field order and widths are fixed by the compiled native library. Do not
//! reorder fields, and do not add `#[derive]`s that could change the layout.
//!
//! Shape table:
//! - pointlist → numberofpoints × 2
//! - pointattributelist → numberofpoints × numberofpointattributes
//! - trianglelist → numberoftriangles × numberofcorners
//! - neighborlist → numberoftriangles × 3
//! - regionlist → numberofregions × 4 (x, y, marker, max_area)
//! - normlist → numberofedges × 2

use std::os::raw::{c_int, c_void};
use std::ptr;

/// Mirror of Triangle's `struct triangulateio`
///
/// Every pointer field is either null (logical length zero) or points at a
/// block of at least `rows × columns` elements, where rows and columns are
/// read from the count fields listed in [`ArrayField`].
#[repr(C)]
#[derive(Debug)]
pub struct TriangulateIo {
    pub pointlist: *mut f64,
    pub pointattributelist: *mut f64,
    pub pointmarkerlist: *mut c_int,
    pub numberofpoints: c_int,
    pub numberofpointattributes: c_int,

    pub trianglelist: *mut c_int,
    pub triangleattributelist: *mut f64,
    pub trianglearealist: *mut f64,
    pub neighborlist: *mut c_int,
    pub numberoftriangles: c_int,
    pub numberofcorners: c_int,
    pub numberoftriangleattributes: c_int,

    pub segmentlist: *mut c_int,
    pub segmentmarkerlist: *mut c_int,
    pub numberofsegments: c_int,

    pub holelist: *mut f64,
    pub numberofholes: c_int,

    pub regionlist: *mut f64,
    pub numberofregions: c_int,

    pub edgelist: *mut c_int,
    pub edgemarkerlist: *mut c_int,
    pub normlist: *mut f64,
    pub numberofedges: c_int,
}

// Layout check against the native header on LP64/LLP64 targets.
#[cfg(target_pointer_width = "64")]
const _: () = {
    assert!(std::mem::size_of::<TriangulateIo>() == 168);
    assert!(std::mem::offset_of!(TriangulateIo, numberofpoints) == 24);
    assert!(std::mem::offset_of!(TriangulateIo, trianglelist) == 32);
    assert!(std::mem::offset_of!(TriangulateIo, numberoftriangleattributes) == 72);
    assert!(std::mem::offset_of!(TriangulateIo, segmentlist) == 80);
    assert!(std::mem::offset_of!(TriangulateIo, holelist) == 104);
    assert!(std::mem::offset_of!(TriangulateIo, regionlist) == 120);
    assert!(std::mem::offset_of!(TriangulateIo, edgelist) == 136);
    assert!(std::mem::offset_of!(TriangulateIo, numberofedges) == 160);
};

impl TriangulateIo {
    /// A record with every pointer null and every count zero
    pub const fn empty() -> Self {
        Self {
            pointlist: ptr::null_mut(),
            pointattributelist: ptr::null_mut(),
            pointmarkerlist: ptr::null_mut(),
            numberofpoints: 0,
            numberofpointattributes: 0,
            trianglelist: ptr::null_mut(),
            triangleattributelist: ptr::null_mut(),
            trianglearealist: ptr::null_mut(),
            neighborlist: ptr::null_mut(),
            numberoftriangles: 0,
            numberofcorners: 0,
            numberoftriangleattributes: 0,
            segmentlist: ptr::null_mut(),
            segmentmarkerlist: ptr::null_mut(),
            numberofsegments: 0,
            holelist: ptr::null_mut(),
            numberofholes: 0,
            regionlist: ptr::null_mut(),
            numberofregions: 0,
            edgelist: ptr::null_mut(),
            edgemarkerlist: ptr::null_mut(),
            normlist: ptr::null_mut(),
            numberofedges: 0,
        }
    }
}

impl Default for TriangulateIo {
    fn default() -> Self {
        Self::empty()
    }
}

/// Scalar type stored behind a pointer field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// C `REAL` (compiled as double)
    Real,
    /// C `int`
    Int,
}

/// Where a field takes its column count from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Columns {
    Fixed(usize),
    PointAttributes,
    Corners,
    TriangleAttributes,
}

/// Every pointer field of [`TriangulateIo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayField {
    PointList,
    PointAttributeList,
    PointMarkerList,
    TriangleList,
    TriangleAttributeList,
    TriangleAreaList,
    NeighborList,
    SegmentList,
    SegmentMarkerList,
    HoleList,
    RegionList,
    EdgeList,
    EdgeMarkerList,
    NormList,
}

impl ArrayField {
    /// All pointer fields in record order
    pub const ALL: [ArrayField; 14] = [
        ArrayField::PointList,
        ArrayField::PointAttributeList,
        ArrayField::PointMarkerList,
        ArrayField::TriangleList,
        ArrayField::TriangleAttributeList,
        ArrayField::TriangleAreaList,
        ArrayField::NeighborList,
        ArrayField::SegmentList,
        ArrayField::SegmentMarkerList,
        ArrayField::HoleList,
        ArrayField::RegionList,
        ArrayField::EdgeList,
        ArrayField::EdgeMarkerList,
        ArrayField::NormList,
    ];

    /// C field name, as in `triangle.h`
    pub fn name(self) -> &'static str {
        match self {
            ArrayField::PointList => "pointlist",
            ArrayField::PointAttributeList => "pointattributelist",
            ArrayField::PointMarkerList => "pointmarkerlist",
            ArrayField::TriangleList => "trianglelist",
            ArrayField::TriangleAttributeList => "triangleattributelist",
            ArrayField::TriangleAreaList => "trianglearealist",
            ArrayField::NeighborList => "neighborlist",
            ArrayField::SegmentList => "segmentlist",
            ArrayField::SegmentMarkerList => "segmentmarkerlist",
            ArrayField::HoleList => "holelist",
            ArrayField::RegionList => "regionlist",
            ArrayField::EdgeList => "edgelist",
            ArrayField::EdgeMarkerList => "edgemarkerlist",
            ArrayField::NormList => "normlist",
        }
    }

    pub fn kind(self) -> ElementKind {
        match self {
            ArrayField::PointList
            | ArrayField::PointAttributeList
            | ArrayField::TriangleAttributeList
            | ArrayField::TriangleAreaList
            | ArrayField::HoleList
            | ArrayField::RegionList
            | ArrayField::NormList => ElementKind::Real,
            ArrayField::PointMarkerList
            | ArrayField::TriangleList
            | ArrayField::NeighborList
            | ArrayField::SegmentList
            | ArrayField::SegmentMarkerList
            | ArrayField::EdgeList
            | ArrayField::EdgeMarkerList => ElementKind::Int,
        }
    }

    fn columns(self) -> Columns {
        match self {
            ArrayField::PointList
            | ArrayField::SegmentList
            | ArrayField::HoleList
            | ArrayField::EdgeList
            | ArrayField::NormList => Columns::Fixed(2),
            ArrayField::PointMarkerList
            | ArrayField::TriangleAreaList
            | ArrayField::SegmentMarkerList
            | ArrayField::EdgeMarkerList => Columns::Fixed(1),
            ArrayField::NeighborList => Columns::Fixed(3),
            ArrayField::RegionList => Columns::Fixed(4),
            ArrayField::PointAttributeList => Columns::PointAttributes,
            ArrayField::TriangleList => Columns::Corners,
            ArrayField::TriangleAttributeList => Columns::TriangleAttributes,
        }
    }

    /// Raw address currently stored in this field (null if absent)
    pub fn address(self, io: &TriangulateIo) -> *mut c_void {
        match self {
            ArrayField::PointList => io.pointlist.cast(),
            ArrayField::PointAttributeList => io.pointattributelist.cast(),
            ArrayField::PointMarkerList => io.pointmarkerlist.cast(),
            ArrayField::TriangleList => io.trianglelist.cast(),
            ArrayField::TriangleAttributeList => io.triangleattributelist.cast(),
            ArrayField::TriangleAreaList => io.trianglearealist.cast(),
            ArrayField::NeighborList => io.neighborlist.cast(),
            ArrayField::SegmentList => io.segmentlist.cast(),
            ArrayField::SegmentMarkerList => io.segmentmarkerlist.cast(),
            ArrayField::HoleList => io.holelist.cast(),
            ArrayField::RegionList => io.regionlist.cast(),
            ArrayField::EdgeList => io.edgelist.cast(),
            ArrayField::EdgeMarkerList => io.edgemarkerlist.cast(),
            ArrayField::NormList => io.normlist.cast(),
        }
    }

    /// Store an address in this field
    ///
    /// The caller is responsible for the element type behind `address`
    /// matching [`ArrayField::kind`].
    pub(crate) fn set_address(self, io: &mut TriangulateIo, address: *mut c_void) {
        match self {
            ArrayField::PointList => io.pointlist = address.cast(),
            ArrayField::PointAttributeList => io.pointattributelist = address.cast(),
            ArrayField::PointMarkerList => io.pointmarkerlist = address.cast(),
            ArrayField::TriangleList => io.trianglelist = address.cast(),
            ArrayField::TriangleAttributeList => io.triangleattributelist = address.cast(),
            ArrayField::TriangleAreaList => io.trianglearealist = address.cast(),
            ArrayField::NeighborList => io.neighborlist = address.cast(),
            ArrayField::SegmentList => io.segmentlist = address.cast(),
            ArrayField::SegmentMarkerList => io.segmentmarkerlist = address.cast(),
            ArrayField::HoleList => io.holelist = address.cast(),
            ArrayField::RegionList => io.regionlist = address.cast(),
            ArrayField::EdgeList => io.edgelist = address.cast(),
            ArrayField::EdgeMarkerList => io.edgemarkerlist = address.cast(),
            ArrayField::NormList => io.normlist = address.cast(),
        }
    }

    /// Raw row count as written in the record (may be negative if corrupt)
    pub fn raw_rows(self, io: &TriangulateIo) -> c_int {
        match self {
            ArrayField::PointList | ArrayField::PointAttributeList | ArrayField::PointMarkerList => {
                io.numberofpoints
            }
            ArrayField::TriangleList
            | ArrayField::TriangleAttributeList
            | ArrayField::TriangleAreaList
            | ArrayField::NeighborList => io.numberoftriangles,
            ArrayField::SegmentList | ArrayField::SegmentMarkerList => io.numberofsegments,
            ArrayField::HoleList => io.numberofholes,
            ArrayField::RegionList => io.numberofregions,
            ArrayField::EdgeList | ArrayField::EdgeMarkerList | ArrayField::NormList => {
                io.numberofedges
            }
        }
    }

    /// Raw column count as written in the record (may be negative if corrupt)
    pub fn raw_columns(self, io: &TriangulateIo) -> c_int {
        match self.columns() {
            Columns::Fixed(n) => n as c_int,
            Columns::PointAttributes => io.numberofpointattributes,
            Columns::Corners => io.numberofcorners,
            Columns::TriangleAttributes => io.numberoftriangleattributes,
        }
    }

    /// Whether this field is a flat per-row list (markers, areas)
    pub fn is_flat(self) -> bool {
        self.columns() == Columns::Fixed(1)
    }
}

impl std::fmt::Display for ArrayField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
