//! Caller-facing geometry schemas
//!
//! `Geometry` is the mapping-shaped input (`vertices`, `segments`, `holes`,
//! ...). Arrays are row lists so that shape errors surface as validation
//! errors instead of being impossible to express. Unknown keys are ignored
//! and absent keys leave the corresponding record field null.
//!
//! `Triangulation` is the harvested output. Every array is an owned copy;
//! empty fields are omitted when serialized.

use crate::error::{Result, TriangleError};
use serde::{Deserialize, Serialize};

/// A region attribute/area constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Representative interior point
    pub vertex: [f64; 2],
    /// Regional attribute copied onto every triangle of the region
    pub marker: f64,
    /// Maximum triangle area inside the region
    pub max_area: f64,
}

impl Region {
    pub fn new(vertex: [f64; 2], marker: f64, max_area: f64) -> Self {
        Self {
            vertex,
            marker,
            max_area,
        }
    }

    /// Row layout used by Triangle's `regionlist`
    pub(crate) fn to_row(&self) -> [f64; 4] {
        [self.vertex[0], self.vertex[1], self.marker, self.max_area]
    }

    pub(crate) fn from_row(row: &[f64]) -> Self {
        Self::new([row[0], row[1]], row[2], row[3])
    }
}

/// Input geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex_attributes: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex_markers: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triangles: Option<Vec<Vec<i32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triangle_attributes: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triangle_max_area: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Vec<i32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_markers: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holes: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<Region>>,
}

fn rows<T, R: Into<Vec<T>>>(rows: impl IntoIterator<Item = R>) -> Vec<Vec<T>> {
    rows.into_iter().map(Into::into).collect()
}

impl Geometry {
    /// Geometry with only vertices set
    pub fn from_vertices<R: Into<Vec<f64>>>(vertices: impl IntoIterator<Item = R>) -> Self {
        Self {
            vertices: Some(rows(vertices)),
            ..Self::default()
        }
    }

    /// Parse the mapping-shaped JSON schema
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TriangleError::validation("geometry", e.to_string()))
    }

    pub fn with_vertex_attributes<R: Into<Vec<f64>>>(
        mut self,
        attributes: impl IntoIterator<Item = R>,
    ) -> Self {
        self.vertex_attributes = Some(rows(attributes));
        self
    }

    pub fn with_vertex_markers(mut self, markers: impl IntoIterator<Item = i32>) -> Self {
        self.vertex_markers = Some(markers.into_iter().collect());
        self
    }

    pub fn with_triangles<R: Into<Vec<i32>>>(mut self, triangles: impl IntoIterator<Item = R>) -> Self {
        self.triangles = Some(rows(triangles));
        self
    }

    pub fn with_triangle_attributes<R: Into<Vec<f64>>>(
        mut self,
        attributes: impl IntoIterator<Item = R>,
    ) -> Self {
        self.triangle_attributes = Some(rows(attributes));
        self
    }

    pub fn with_triangle_max_area(mut self, areas: impl IntoIterator<Item = f64>) -> Self {
        self.triangle_max_area = Some(areas.into_iter().collect());
        self
    }

    pub fn with_segments<R: Into<Vec<i32>>>(mut self, segments: impl IntoIterator<Item = R>) -> Self {
        self.segments = Some(rows(segments));
        self
    }

    pub fn with_segment_markers(mut self, markers: impl IntoIterator<Item = i32>) -> Self {
        self.segment_markers = Some(markers.into_iter().collect());
        self
    }

    pub fn with_holes<R: Into<Vec<f64>>>(mut self, holes: impl IntoIterator<Item = R>) -> Self {
        self.holes = Some(rows(holes));
        self
    }

    pub fn with_regions(mut self, regions: impl IntoIterator<Item = Region>) -> Self {
        self.regions = Some(regions.into_iter().collect());
        self
    }
}

/// Harvested output of one native call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Triangulation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vertices: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vertex_attributes: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vertex_markers: Vec<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triangles: Vec<Vec<i32>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triangle_attributes: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triangle_max_area: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub neighbors: Vec<[i32; 3]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<[i32; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segment_markers: Vec<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Region>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<[i32; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edge_markers: Vec<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub normals: Vec<[f64; 2]>,
}

impl Triangulation {
    /// Feed this result back in as a pre-existing triangulation
    ///
    /// Carries vertices, triangles and segments (with their markers), which
    /// is what refinement mode needs.
    pub fn to_geometry(&self) -> Geometry {
        let mut geometry = Geometry::from_vertices(self.vertices.iter().copied());
        if !self.triangles.is_empty() {
            geometry = geometry.with_triangles(self.triangles.iter().cloned());
        }
        if !self.vertex_markers.is_empty() {
            geometry = geometry.with_vertex_markers(self.vertex_markers.iter().copied());
        }
        if !self.segments.is_empty() {
            geometry = geometry.with_segments(self.segments.iter().copied());
            if !self.segment_markers.is_empty() {
                geometry = geometry.with_segment_markers(self.segment_markers.iter().copied());
            }
        }
        geometry
    }

    /// Whether the native call produced nothing at all
    pub fn is_empty(&self) -> bool {
        *self == Triangulation::default()
    }
}
