//! Cluster-based mesh simplification
//!
//! This crate turns the output of an agglomerative clustering run into a
//! simplified mesh:
//! - Merge log parsing
//! - Dendrogram (cluster forest) reconstruction
//! - Collapse of each cluster tree into a single averaged vertex

pub mod merge_log;
pub mod dendrogram;
pub mod collapse;

pub use merge_log::*;
pub use dendrogram::*;
pub use collapse::*;

use std::path::Path;

use clustermesh_core::{Result, TriangleMesh};

/// Simplify a mesh into a coarser one
pub trait MeshSimplifier {
    /// Produce the simplified mesh; the input is left untouched
    fn simplify(&self, mesh: &TriangleMesh) -> Result<TriangleMesh>;
}

impl MeshSimplifier for ClusterForest {
    fn simplify(&self, mesh: &TriangleMesh) -> Result<TriangleMesh> {
        collapse(mesh, self)
    }
}

/// Simplifier driven by a merge log; the forest is rebuilt for each mesh.
#[derive(Debug, Clone)]
pub struct MergeLogSimplifier {
    log: MergeLog,
}

impl MergeLogSimplifier {
    pub fn new(log: MergeLog) -> Self {
        Self { log }
    }

    /// Load the merge log written by the clustering stage.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(MergeLog::from_file(path)?))
    }

    pub fn log(&self) -> &MergeLog {
        &self.log
    }
}

impl MeshSimplifier for MergeLogSimplifier {
    fn simplify(&self, mesh: &TriangleMesh) -> Result<TriangleMesh> {
        let forest = build_forest(mesh.vertex_count(), &self.log)?;
        forest.simplify(mesh)
    }
}
