//! Mesh data structures and functionality

use crate::point::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A triangle mesh with per-vertex positions and optional normals and UVs.
///
/// Every present attribute has one entry per vertex; faces index into that
/// shared vertex index space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub uvs: Option<Vec<UV>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
            uvs: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
            uvs: None,
        }
    }

    /// Create a mesh from a flat, stride-3 triangle index list
    pub fn from_flat_indices(vertices: Vec<Point3f>, indices: &[usize]) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "triangle index list length {} is not a multiple of 3",
                indices.len()
            )));
        }
        let faces = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Ok(Self::from_vertices_and_faces(vertices, faces))
    }

    /// Flatten the faces into a stride-3 index list
    pub fn flat_indices(&self) -> Vec<usize> {
        self.faces.iter().flatten().copied().collect()
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Calculate face normals
    ///
    /// Zero-area faces yield a zero vector.
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                edge1
                    .cross(&edge2)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3f::zeros)
            })
            .collect()
    }

    /// Compute smooth vertex normals from the current geometry.
    ///
    /// Each vertex accumulates the area-weighted normals of its incident faces.
    /// Vertices without a usable neighbourhood get +Z.
    pub fn compute_vertex_normals(&self) -> Vec<Vector3f> {
        let mut accumulated = vec![Vector3f::zeros(); self.vertices.len()];
        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];
            // Unnormalized cross product is proportional to the face area
            let weighted = (v1 - v0).cross(&(v2 - v0));
            for &vi in face {
                accumulated[vi] += weighted;
            }
        }

        accumulated
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::z))
            .collect()
    }

    /// Replace the normals with ones computed from the geometry
    pub fn recalculate_normals(&mut self) {
        self.normals = Some(self.compute_vertex_normals());
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Set vertex texture coordinates
    pub fn set_uvs(&mut self, uvs: Vec<UV>) {
        if uvs.len() == self.vertices.len() {
            self.uvs = Some(uvs);
        }
    }

    /// Check attribute lengths and face index bounds
    pub fn validate(&self) -> Result<()> {
        let count = self.vertices.len();
        if let Some(normals) = &self.normals {
            if normals.len() != count {
                return Err(Error::InvalidData(format!(
                    "mesh has {} vertices but {} normals",
                    count,
                    normals.len()
                )));
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != count {
                return Err(Error::InvalidData(format!(
                    "mesh has {} vertices but {} UVs",
                    count,
                    uvs.len()
                )));
            }
        }
        for (fi, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&vi| vi >= count) {
                return Err(Error::InvalidData(format!(
                    "face {} references vertex {} but the mesh has {} vertices",
                    fi, bad, count
                )));
            }
        }
        Ok(())
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.normals = None;
        self.uvs = None;
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
