//! Triangle option string
//!
//! Every call runs with zero-based indexing (`z`) and either verbose (`V`) or
//! quiet (`Q`) output. `r` is derived from the input record: it is appended
//! whenever the input carries triangles, and refused otherwise.

use crate::error::{Result, TriangleError};
use std::ffi::CString;
use std::fmt;

/// Builder for the switch string passed to `triangulate`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Switches {
    verbose: bool,
    flags: String,
}

impl Switches {
    pub fn new() -> Self {
        Self::default()
    }

    /// `V` instead of `Q`
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Append caller flags verbatim, e.g. `"pq30a0.1"`
    pub fn raw(mut self, flags: &str) -> Self {
        self.flags.push_str(flags);
        self
    }

    /// `c`: enclose the convex hull with segments
    pub fn convex_hull(self) -> Self {
        self.raw("c")
    }

    /// `v`: also produce the Voronoi diagram
    pub fn voronoi(self) -> Self {
        self.raw("v")
    }

    /// `p`: triangulate a planar straight line graph
    pub fn pslg(self) -> Self {
        self.raw("p")
    }

    /// `q`: quality mesh, optionally with a minimum angle in degrees
    pub fn quality(self, min_angle: Option<f64>) -> Self {
        match min_angle {
            Some(angle) => self.raw(&format!("q{}", angle)),
            None => self.raw("q"),
        }
    }

    /// `a`: global maximum triangle area
    pub fn max_area(self, area: f64) -> Self {
        self.raw(&format!("a{}", area))
    }

    /// `n`: output triangle neighbors
    pub fn neighbors(self) -> Self {
        self.raw("n")
    }

    /// `e`: output the edge list
    pub fn edges(self) -> Self {
        self.raw("e")
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Caller flags, without the implied prefix
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Whether a Voronoi diagram will be written to the secondary output
    pub fn has_voronoi(&self) -> bool {
        self.flags.contains('v')
    }

    /// Compose the final NUL-terminated string
    ///
    /// `has_triangles` is whether the input record carries a triangulation to
    /// refine.
    pub fn render(&self, has_triangles: bool) -> Result<CString> {
        if let Some(bad) = self.flags.chars().find(|c| matches!(c, 'V' | 'Q')) {
            return Err(TriangleError::validation(
                "switches",
                format!("'{}' is controlled by the verbose setting", bad),
            ));
        }
        let refine = self.flags.contains('r');
        if refine && !has_triangles {
            return Err(TriangleError::validation(
                "switches",
                "'r' requires input triangles",
            ));
        }

        let mut rendered = String::with_capacity(self.flags.len() + 3);
        rendered.push(if self.verbose { 'V' } else { 'Q' });
        rendered.push('z');
        rendered.push_str(&self.flags);
        if has_triangles && !refine {
            rendered.push('r');
        }

        CString::new(rendered)
            .map_err(|_| TriangleError::validation("switches", "contains a NUL byte"))
    }
}

impl fmt::Display for Switches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}z{}", if self.verbose { 'V' } else { 'Q' }, self.flags)
    }
}

impl From<&str> for Switches {
    fn from(flags: &str) -> Self {
        Switches::new().raw(flags)
    }
}
