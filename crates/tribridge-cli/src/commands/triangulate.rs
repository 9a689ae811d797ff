//! Triangulate command - run Triangle over a JSON geometry file

use crate::commands::locate;
use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tribridge_config::Config;
use tribridge_core::{Geometry, Switches, TriangleIo, Triangulator};

/// Options for one `tribridge triangulate` invocation
#[derive(Debug, Clone, Default)]
pub struct TriangulateArgs {
    pub file: PathBuf,
    pub switches: Option<String>,
    pub convex_hull: bool,
    pub voronoi: bool,
    pub verbose: bool,
    pub library: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub pretty: bool,
}

pub fn run(args: TriangulateArgs, config: &Config) -> Result<()> {
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read geometry file: {}", args.file.display()))?;
    let geometry = Geometry::from_json(&source)
        .with_context(|| format!("Invalid geometry in {}", args.file.display()))?;

    // Everything that can be checked without native code is checked first
    let input = TriangleIo::from_geometry(&geometry)
        .with_context(|| format!("Invalid geometry in {}", args.file.display()))?;
    let switches = build_switches(&args, config);
    switches
        .render(input.triangle_count() > 0)
        .context("Invalid switches")?;

    let library = locate::open_library(args.library.as_deref(), config)?;
    let mut session = Triangulator::from_input(library, input);
    let mesh = session
        .triangulate(&switches)
        .with_context(|| format!("Triangulation of {} failed", args.file.display()))?;

    let document = if switches.has_voronoi() {
        json!({
            "triangulation": mesh,
            "voronoi": session.voronoi_diagram()?,
        })
    } else {
        serde_json::to_value(&mesh)?
    };

    let summary = session.close()?;
    tracing::debug!(freed = summary.total(), "released native output");

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };

    match &args.output {
        Some(path) => fs::write(path, rendered + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Flags take precedence over `[triangulate] switches`
fn build_switches(args: &TriangulateArgs, config: &Config) -> Switches {
    let flags = args.switches.as_deref().unwrap_or(config.switches());
    let mut switches = Switches::new().verbose(args.verbose).raw(flags);
    if args.convex_hull {
        switches = switches.convex_hull();
    }
    if args.voronoi && !switches.has_voronoi() {
        switches = switches.voronoi();
    }
    switches
}
