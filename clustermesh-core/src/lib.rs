//! Core data structures and traits for clustermesh
//!
//! This crate provides the fundamental types shared by the simplification,
//! I/O and pipeline crates: the triangle mesh, vertex attribute aliases,
//! the growable attribute buffer and the common error type.

pub mod point;
pub mod mesh;
pub mod growable;
pub mod traits;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use growable::*;
pub use traits::*;
pub use error::*;
