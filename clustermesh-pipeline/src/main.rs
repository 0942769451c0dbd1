//! clustermesh: Command-line interface for hierarchical clustering mesh
//! simplification.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=clustermesh_pipeline=info` - Pipeline task progress
//! - `RUST_LOG=clustermesh::clustering=info` - Output of the clustering process
//! - `RUST_LOG=clustermesh_simplification=trace` - Per-cluster collapse progress
//!
//! # Example
//!
//! ```bash
//! clustermesh -v simplify bunny.obj -o out --cluster-command python3 --arg main.py --percent 25
//! clustermesh collapse bunny.obj --merge-log result.csv -o bunny_low.obj
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clustermesh_pipeline::{Affinity, Linkage};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{collapse, export_vertices, inspect, simplify};

/// clustermesh - Simplify meshes by collapsing hierarchical clusters.
#[derive(Parser)]
#[command(name = "clustermesh")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: export, cluster, collapse and save
    Simplify(SimplifyArgs),

    /// Collapse a mesh along an existing merge log
    Collapse {
        /// Input mesh file
        input: PathBuf,

        /// Merge log written by the clustering stage
        #[arg(long)]
        merge_log: PathBuf,

        /// Output mesh file
        #[arg(short, long)]
        output: PathBuf,

        /// Keep the averaged normals instead of recomputing them
        #[arg(long)]
        keep_normals: bool,
    },

    /// Print statistics of the cluster forest described by a merge log
    Inspect {
        /// Merge log written by the clustering stage
        #[arg(long)]
        merge_log: PathBuf,

        /// Number of vertices of the clustered mesh (defaults to one more
        /// than the number of merge records)
        #[arg(long)]
        vertices: Option<usize>,
    },

    /// Write the vertex CSV consumed by the clustering stage
    ExportVertices {
        /// Input mesh file
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
pub struct SimplifyArgs {
    /// Input mesh file
    pub input: PathBuf,

    /// Directory the simplified mesh is saved to
    #[arg(short, long)]
    pub output: PathBuf,

    /// Program running the clustering stage
    #[arg(long)]
    pub cluster_command: PathBuf,

    /// Argument passed to the clustering program (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub cluster_args: Vec<String>,

    /// Directory for the exchanged files (defaults to the output directory)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Percentage of vertices to keep
    #[arg(long, conflicts_with_all = ["clusters", "distance"])]
    pub percent: Option<f32>,

    /// Number of clusters to stop at
    #[arg(long, conflicts_with = "distance")]
    pub clusters: Option<u64>,

    /// Linkage distance to stop at
    #[arg(long)]
    pub distance: Option<u64>,

    /// Clustering affinity (euclidean, l1, l2, manhattan, cosine)
    #[arg(long, default_value = "euclidean")]
    pub affinity: Affinity,

    /// Clustering linkage (ward, complete, average, single)
    #[arg(long, default_value = "ward")]
    pub linkage: Linkage,

    /// Custom name for the simplified mesh
    #[arg(long)]
    pub name: Option<String>,

    /// Save under the input mesh name, replacing an existing file
    #[arg(long)]
    pub overwrite: bool,

    /// Keep the averaged normals instead of recomputing them
    #[arg(long)]
    pub keep_normals: bool,

    /// Ask the clustering stage to display its charts
    #[arg(long)]
    pub show_charts: bool,
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Simplify(args) => simplify::run(args, &cli),
        Commands::Collapse {
            input,
            merge_log,
            output,
            keep_normals,
        } => collapse::run(input, merge_log, output, *keep_normals, &cli),
        Commands::Inspect {
            merge_log,
            vertices,
        } => inspect::run(merge_log, *vertices, &cli),
        Commands::ExportVertices { input, output } => export_vertices::run(input, output, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
