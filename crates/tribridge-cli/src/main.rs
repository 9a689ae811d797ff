use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tribridge_config::ConfigLoader;

mod commands;
mod logging;

/// Drive Shewchuk's Triangle from the command line.
///
/// Reads mapping-shaped geometry as JSON, runs Triangle through the
/// tribridge bridge and prints the harvested triangulation as JSON.
///
/// EXAMPLES:
///     tribridge triangulate square.json -s pq30      Quality mesh of a PSLG
///     tribridge triangulate points.json --voronoi    Delaunay + Voronoi
///     tribridge locate                               Show which library is used
///
/// ENVIRONMENT VARIABLES:
///     TRIBRIDGE_LIBRARY   Path to the Triangle shared library
///     TRIBRIDGE_VERBOSE   Set to '1' to run Triangle verbosely
///     RUST_LOG            Log filter (default: warn)
#[derive(Parser)]
#[command(name = "tribridge")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Triangulate a geometry file
    ///
    /// The geometry is validated before the native library is loaded.
    /// Switches come from --switches, else from [triangulate] switches in
    /// tribridge.toml; `z` and `V`/`Q` are always managed by tribridge.
    ///
    /// EXAMPLES:
    ///     tribridge triangulate square.json --switches pq30
    ///     tribridge triangulate mesh.json -s q -o refined.json --pretty
    #[command(visible_alias = "t")]
    Triangulate {
        /// Path to the geometry JSON file
        file: PathBuf,
        /// Triangle switches, e.g. "pq30a0.1"
        #[arg(long, short = 's')]
        switches: Option<String>,
        /// Enclose the convex hull with segments (`c`)
        #[arg(long)]
        convex_hull: bool,
        /// Also output the Voronoi diagram (`v`)
        #[arg(long)]
        voronoi: bool,
        /// Run Triangle verbosely and log at debug level
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Path to the Triangle shared library
        #[arg(long, short = 'l')]
        library: Option<PathBuf>,
        /// Write JSON here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the path of the Triangle library that would be loaded
    Locate {
        /// Check this path instead of searching
        #[arg(long, short = 'l')]
        library: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load_from_directory(&std::env::current_dir()?)
        .context("Failed to load tribridge configuration")?;

    match cli.command {
        Commands::Triangulate {
            file,
            switches,
            convex_hull,
            voronoi,
            verbose,
            library,
            output,
            pretty,
        } => {
            // Command-line flag overrides configuration
            let verbose = verbose || config.verbose();
            logging::init(verbose);
            let args = commands::triangulate::TriangulateArgs {
                file,
                switches,
                convex_hull,
                voronoi,
                verbose,
                library,
                output,
                pretty,
            };
            commands::triangulate::run(args, &config)?;
        }
        Commands::Locate { library } => {
            logging::init(false);
            commands::locate::run(library.as_deref(), &config)?;
        }
    }

    Ok(())
}
