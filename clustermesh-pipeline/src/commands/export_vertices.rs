//! clustermesh export-vertices command - write the clustering-stage input.

use std::path::Path;

use anyhow::{Context, Result};
use clustermesh_io::{read_mesh, VertexCsvWriter};

use crate::Cli;

pub fn run(input: &Path, output: &Path, cli: &Cli) -> Result<()> {
    let mesh = read_mesh(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;
    VertexCsvWriter::write_vertices(&mesh.vertices, output)
        .with_context(|| format!("Failed to write vertices to {:?}", output))?;

    if !cli.quiet {
        println!("Wrote {} vertices to {:?}", mesh.vertex_count(), output);
    }
    Ok(())
}
