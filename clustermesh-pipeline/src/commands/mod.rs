//! Subcommand implementations

pub mod collapse;
pub mod export_vertices;
pub mod inspect;
pub mod simplify;

use std::path::Path;

/// Mesh name used for output naming: the input file stem.
pub fn mesh_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
