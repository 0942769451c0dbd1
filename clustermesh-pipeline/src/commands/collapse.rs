//! clustermesh collapse command - collapse a mesh along an existing merge log.

use std::path::Path;

use anyhow::{Context, Result};
use clustermesh_io::{read_mesh, write_mesh};
use clustermesh_pipeline::finish_mesh;
use clustermesh_simplification::{build_forest, collapse_with_stats, MergeLog};

use crate::Cli;

pub fn run(
    input: &Path,
    merge_log: &Path,
    output: &Path,
    keep_normals: bool,
    cli: &Cli,
) -> Result<()> {
    let mesh = read_mesh(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;
    let log = MergeLog::from_file(merge_log)
        .with_context(|| format!("Failed to read merge log {:?}", merge_log))?;

    let forest = build_forest(mesh.vertex_count(), &log)
        .context("Merge log does not describe a valid cluster forest for this mesh")?;
    let (mut simplified, stats) = collapse_with_stats(&mesh, &forest)?;
    finish_mesh(&mut simplified, !keep_normals);

    write_mesh(&simplified, output)
        .with_context(|| format!("Failed to save simplified mesh to {:?}", output))?;

    if !cli.quiet {
        println!(
            "Collapsed {:?}: {} -> {} vertices, {} -> {} faces ({} degenerate removed)",
            input,
            stats.vertices_before,
            stats.vertices_after,
            stats.faces_before,
            stats.faces_after,
            stats.degenerate_faces_removed
        );
        println!("Saved to {:?}", output);
    }
    Ok(())
}
