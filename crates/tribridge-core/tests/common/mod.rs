//! Shared test utilities
//!
//! `MockTriangle` stands in for the native library. It behaves like Triangle
//! where ownership is concerned:
//! - every output array it produces is a fresh heap allocation
//! - `holelist` and `regionlist` are copied through from the input as
//!   aliases of the caller's buffers
//! - `trifree` must be called exactly once per allocation
//!
//! The geometry it produces is deliberately simple (a fan around vertex 0).

#![allow(dead_code)]

use std::alloc::{alloc, dealloc, Layout};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::sync::{Arc, Mutex};
use tribridge_core::{Geometry, TriangleLibrary, TriangulateIo};

#[derive(Default)]
struct Heap {
    live: HashMap<usize, Layout>,
    freed: Vec<usize>,
    invalid_frees: Vec<usize>,
    switches: Vec<String>,
}

/// In-process Triangle substitute with allocation tracking
pub struct MockTriangle {
    status: c_int,
    heap: Mutex<Heap>,
}

impl MockTriangle {
    pub fn new() -> Arc<Self> {
        Self::failing(0)
    }

    /// A library whose every call returns `status`
    pub fn failing(status: c_int) -> Arc<Self> {
        Arc::new(Self {
            status,
            heap: Mutex::new(Heap::default()),
        })
    }

    /// Native blocks allocated and not yet freed
    pub fn live_count(&self) -> usize {
        self.heap.lock().unwrap().live.len()
    }

    pub fn live_addresses(&self) -> BTreeSet<usize> {
        self.heap.lock().unwrap().live.keys().copied().collect()
    }

    /// Addresses passed to `trifree`, in call order
    pub fn freed(&self) -> Vec<usize> {
        self.heap.lock().unwrap().freed.clone()
    }

    /// Addresses passed to `trifree` that were never allocated or already freed
    pub fn invalid_frees(&self) -> Vec<usize> {
        self.heap.lock().unwrap().invalid_frees.clone()
    }

    pub fn call_count(&self) -> usize {
        self.heap.lock().unwrap().switches.len()
    }

    pub fn last_switches(&self) -> Option<String> {
        self.heap.lock().unwrap().switches.last().cloned()
    }

    unsafe fn copy<T: Copy>(&self, data: &[T]) -> *mut T {
        if data.is_empty() {
            return ptr::null_mut();
        }
        let layout = Layout::array::<T>(data.len()).unwrap();
        let block = alloc(layout).cast::<T>();
        assert!(!block.is_null(), "allocation failed");
        ptr::copy_nonoverlapping(data.as_ptr(), block, data.len());
        self.heap.lock().unwrap().live.insert(block as usize, layout);
        block
    }

    /// Fill `out` and `vor` the way `triangulate()` does
    ///
    /// Counts are always written, as Triangle writes them: `numberofedges`
    /// is the mesh edge count, `numberofsegments` is the hull size unless
    /// `p` is given, and the Voronoi counts are set even without `v`. The
    /// lists behind them only appear when the matching switch asks for them.
    unsafe fn run(&self, switches: &str, input: &TriangulateIo, out: &mut TriangulateIo, vor: &mut TriangulateIo) {
        let n = input.numberofpoints.max(0) as usize;
        let attributes = input.numberofpointattributes.max(0) as usize;
        let refine = switches.contains('r');
        let quality = switches.contains('q');
        let pslg = switches.contains('p');

        let mut points = view(input.pointlist, n * 2).to_vec();
        let mut point_attributes = view(input.pointattributelist, n * attributes).to_vec();
        let mut markers = if input.pointmarkerlist.is_null() {
            vec![0; n]
        } else {
            view(input.pointmarkerlist, n).to_vec()
        };

        let mut triangles: Vec<c_int> = if refine {
            let m = input.numberoftriangles.max(0) as usize;
            let corners = input.numberofcorners.max(0) as usize;
            view(input.trianglelist, m * corners)
                .chunks_exact(corners.max(1))
                .flat_map(|t| [t[0], t[1], t[2]])
                .collect()
        } else {
            (1..n.saturating_sub(1))
                .flat_map(|i| [0, i as c_int, i as c_int + 1])
                .collect()
        };

        // quality refinement: split every triangle at its centroid
        if quality {
            let mut split = Vec::with_capacity(triangles.len() * 3);
            for t in triangles.chunks_exact(3) {
                let k = (points.len() / 2) as c_int;
                let [a, b, c] = [t[0] as usize, t[1] as usize, t[2] as usize];
                points.push((points[2 * a] + points[2 * b] + points[2 * c]) / 3.0);
                points.push((points[2 * a + 1] + points[2 * b + 1] + points[2 * c + 1]) / 3.0);
                point_attributes.extend(std::iter::repeat(0.0).take(attributes));
                markers.push(0);
                split.extend_from_slice(&[t[0], t[1], k, t[1], t[2], k, t[2], t[0], k]);
            }
            triangles = split;
        }

        let n_out = points.len() / 2;
        let m = triangles.len() / 3;
        out.pointlist = self.copy(&points);
        out.numberofpoints = n_out as c_int;
        out.pointattributelist = self.copy(&point_attributes);
        out.numberofpointattributes = attributes as c_int;
        out.pointmarkerlist = self.copy(&markers);

        out.trianglelist = self.copy(&triangles);
        out.numberoftriangles = m as c_int;
        out.numberofcorners = 3;

        let edges = unique_edges(&triangles);
        let hull = hull_edges(&triangles);
        out.numberofedges = edges.len() as c_int;

        let s = input.numberofsegments.max(0) as usize;
        let input_segments = view(input.segmentlist, s * 2).to_vec();
        if pslg {
            let mut segments = input_segments;
            if switches.contains('c') && segments.is_empty() {
                segments = hull.iter().flat_map(|&(a, b)| [a, b]).collect();
            }
            let segment_count = segments.len() / 2;
            let segment_markers = if input.segmentmarkerlist.is_null() || s != segment_count {
                vec![1; segment_count]
            } else {
                view(input.segmentmarkerlist, segment_count).to_vec()
            };
            out.segmentlist = self.copy(&segments);
            out.segmentmarkerlist = self.copy(&segment_markers);
            out.numberofsegments = segment_count as c_int;
        } else {
            out.numberofsegments = hull.len() as c_int;
            if switches.contains('c') {
                let segments: Vec<c_int> = hull.iter().flat_map(|&(a, b)| [a, b]).collect();
                out.segmentlist = self.copy(&segments);
                out.segmentmarkerlist = self.copy(&vec![1 as c_int; hull.len()]);
            }
        }

        if !refine {
            out.holelist = input.holelist;
            out.numberofholes = input.numberofholes;
            out.regionlist = input.regionlist;
            out.numberofregions = input.numberofregions;
        }

        if switches.contains('n') {
            out.neighborlist = self.copy(&vec![-1 as c_int; m * 3]);
        }

        if switches.contains('e') {
            let flat: Vec<c_int> = edges.iter().flat_map(|&(a, b)| [a, b]).collect();
            out.edgelist = self.copy(&flat);
            out.edgemarkerlist = self.copy(&vec![0 as c_int; edges.len()]);
        }

        vor.numberofpoints = m as c_int;
        vor.numberofpointattributes = 0;
        vor.numberofedges = edges.len() as c_int;
        if switches.contains('v') {
            let centroids: Vec<f64> = triangles
                .chunks_exact(3)
                .flat_map(|t| {
                    let [a, b, c] = [t[0] as usize, t[1] as usize, t[2] as usize];
                    [
                        (points[2 * a] + points[2 * b] + points[2 * c]) / 3.0,
                        (points[2 * a + 1] + points[2 * b + 1] + points[2 * c + 1]) / 3.0,
                    ]
                })
                .collect();
            // one Voronoi edge per mesh edge: between the two adjacent
            // triangles, or a ray (second end -1) with a normal on the hull
            let mut vor_edges = Vec::with_capacity(edges.len() * 2);
            let mut normals = Vec::with_capacity(edges.len() * 2);
            for &(a, b) in &edges {
                let adjacent: Vec<c_int> = triangles
                    .chunks_exact(3)
                    .enumerate()
                    .filter(|(_, t)| t.contains(&a) && t.contains(&b))
                    .map(|(i, _)| i as c_int)
                    .collect();
                match adjacent.as_slice() {
                    [left, right, ..] => {
                        vor_edges.extend_from_slice(&[*left, *right]);
                        normals.extend_from_slice(&[0.0, 0.0]);
                    }
                    [only] => {
                        let (a, b) = (a as usize, b as usize);
                        vor_edges.extend_from_slice(&[*only, -1]);
                        normals.extend_from_slice(&[
                            points[2 * b + 1] - points[2 * a + 1],
                            points[2 * a] - points[2 * b],
                        ]);
                    }
                    [] => {
                        vor_edges.extend_from_slice(&[-1, -1]);
                        normals.extend_from_slice(&[0.0, 0.0]);
                    }
                }
            }
            vor.pointlist = self.copy(&centroids);
            vor.edgelist = self.copy(&vor_edges);
            vor.normlist = self.copy(&normals);
        }
    }
}

unsafe impl TriangleLibrary for MockTriangle {
    unsafe fn triangulate(
        &self,
        switches: *mut c_char,
        input: *mut TriangulateIo,
        output: *mut TriangulateIo,
        voronoi: *mut TriangulateIo,
    ) -> c_int {
        let switches = CStr::from_ptr(switches).to_string_lossy().into_owned();
        self.heap.lock().unwrap().switches.push(switches.clone());
        if self.status != 0 {
            return self.status;
        }
        self.run(&switches, &*input, &mut *output, &mut *voronoi);
        0
    }

    unsafe fn trifree(&self, address: *mut c_void) {
        let mut heap = self.heap.lock().unwrap();
        match heap.live.remove(&(address as usize)) {
            Some(layout) => {
                dealloc(address.cast(), layout);
                heap.freed.push(address as usize);
            }
            None => heap.invalid_frees.push(address as usize),
        }
    }
}

impl Drop for MockTriangle {
    fn drop(&mut self) {
        let heap = self.heap.get_mut().unwrap();
        for (address, layout) in heap.live.drain() {
            unsafe { dealloc(address as *mut u8, layout) };
        }
    }
}

unsafe fn view<'a, T>(data: *const T, len: usize) -> &'a [T] {
    if data.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(data, len)
    }
}

/// Distinct undirected edges, smaller index first
fn unique_edges(triangles: &[c_int]) -> Vec<(c_int, c_int)> {
    edge_use(triangles).into_keys().collect()
}

/// Edges used by exactly one triangle
fn hull_edges(triangles: &[c_int]) -> Vec<(c_int, c_int)> {
    edge_use(triangles)
        .into_iter()
        .filter(|&(_, uses)| uses == 1)
        .map(|(edge, _)| edge)
        .collect()
}

fn edge_use(triangles: &[c_int]) -> BTreeMap<(c_int, c_int), usize> {
    let mut edges = BTreeMap::new();
    for t in triangles.chunks_exact(3) {
        for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
            *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }
    edges
}

/// Unit square with its four boundary segments
pub fn unit_square() -> Geometry {
    Geometry::from_vertices([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
        .with_segments([[0, 1], [1, 2], [2, 3], [3, 0]])
}

/// Three points, the smallest triangulable input
pub fn unit_triangle() -> Geometry {
    Geometry::from_vertices([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]])
}
