//! Hierarchical clustering mesh simplification pipeline
//!
//! This crate connects a mesh to an external agglomerative clustering stage
//! and turns the clustering result back into a simplified mesh:
//! - Clustering parameters record and file locations
//! - Clustering runner boundary and a child-process implementation
//! - The six-task simplification pipeline

pub mod parameters;
pub mod paths;
pub mod runner;
pub mod pipeline;

pub use parameters::*;
pub use paths::*;
pub use runner::*;
pub use pipeline::*;
