//! Call session
//!
//! A `Triangulator` owns the input record and the two output records of one
//! native call, plus the library that produced the outputs. Output records
//! may alias the input's buffers (Triangle copies `holelist` and
//! `regionlist` through), so the three are only ever handed out together
//! and by shared reference.

use crate::dispatch::dispatch;
use crate::error::Result;
use crate::ffi::TriangleLibrary;
use crate::geometry::{Geometry, Triangulation};
use crate::io::{RecordState, TriangleIo};
use crate::release::ReleaseSummary;
use crate::switches::Switches;
use std::fmt;
use std::sync::Arc;

/// Input, primary output and Voronoi output of a triangulation
pub struct Triangulator {
    // outputs are declared first so they drop before the input they alias
    output: TriangleIo,
    voronoi: TriangleIo,
    input: TriangleIo,
    library: Arc<dyn TriangleLibrary>,
}

impl Triangulator {
    /// Build the input record from `geometry`
    ///
    /// Validation happens here; nothing is passed to native code yet.
    pub fn new(library: Arc<dyn TriangleLibrary>, geometry: &Geometry) -> Result<Self> {
        Ok(Self::from_input(library, TriangleIo::from_geometry(geometry)?))
    }

    /// Wrap an input record populated through the setters
    pub fn from_input(library: Arc<dyn TriangleLibrary>, input: TriangleIo) -> Self {
        Self {
            output: TriangleIo::new(),
            voronoi: TriangleIo::new(),
            input,
            library,
        }
    }

    /// Run Triangle with `switches` and harvest the primary output
    ///
    /// Outputs of an earlier run are released first. The Voronoi output is
    /// harvested as well, so its native blocks are owned even when only the
    /// primary result is used; read it with [`Triangulator::voronoi_diagram`].
    pub fn triangulate(&mut self, switches: &Switches) -> Result<Triangulation> {
        self.reset_outputs();

        dispatch(
            &self.library,
            switches,
            &mut self.input,
            &mut self.output,
            &mut self.voronoi,
        )?;

        // classify both before reporting either error
        let primary = self.output.harvest(&self.input);
        let secondary = self.voronoi.harvest(&self.input);
        let result = primary?;
        secondary?;
        Ok(result)
    }

    /// Delaunay triangulation of the input vertices
    pub fn delaunay(&mut self, verbose: bool) -> Result<Triangulation> {
        self.triangulate(&Switches::new().verbose(verbose))
    }

    /// Triangulation with the convex hull enclosed by segments
    pub fn convex_hull(&mut self, verbose: bool) -> Result<Triangulation> {
        self.triangulate(&Switches::new().verbose(verbose).convex_hull())
    }

    /// Triangulation plus Voronoi diagram
    ///
    /// Returns the primary output; the diagram itself is available from
    /// [`Triangulator::voronoi_diagram`].
    pub fn voronoi(&mut self, verbose: bool) -> Result<Triangulation> {
        self.triangulate(&Switches::new().verbose(verbose).voronoi())
    }

    /// Copy of the Voronoi output of the last run
    pub fn voronoi_diagram(&mut self) -> Result<Triangulation> {
        self.voronoi.harvest(&self.input)
    }

    pub fn input(&self) -> &TriangleIo {
        &self.input
    }

    pub fn output(&self) -> &TriangleIo {
        &self.output
    }

    pub fn voronoi_output(&self) -> &TriangleIo {
        &self.voronoi
    }

    /// Release both outputs and consume the session
    pub fn close(mut self) -> Result<ReleaseSummary> {
        let mut summary = ReleaseSummary::default();
        if is_live(&self.output) {
            summary.output = self.output.release()?;
        }
        if is_live(&self.voronoi) {
            summary.voronoi = self.voronoi.release()?;
        }
        tracing::debug!(
            output = summary.output,
            voronoi = summary.voronoi,
            "closed triangulator"
        );
        Ok(summary)
    }

    fn reset_outputs(&mut self) {
        // dropping the old records returns their native blocks
        self.output = TriangleIo::new();
        self.voronoi = TriangleIo::new();
    }
}

fn is_live(record: &TriangleIo) -> bool {
    record.state() == RecordState::Harvested
}

impl fmt::Debug for Triangulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Triangulator")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("voronoi", &self.voronoi)
            .finish_non_exhaustive()
    }
}

/// One-shot triangulation of `geometry`
///
/// Native blocks are released before this returns.
pub fn triangulate(
    library: Arc<dyn TriangleLibrary>,
    geometry: &Geometry,
    switches: &Switches,
) -> Result<Triangulation> {
    let mut session = Triangulator::new(library, geometry)?;
    let result = session.triangulate(switches)?;
    session.close()?;
    Ok(result)
}
