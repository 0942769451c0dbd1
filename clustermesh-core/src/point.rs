//! Vertex attribute types and averaging

use bytemuck::Zeroable;
use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Texture coordinates (UV mapping)
pub type UV = [f32; 2];

/// A per-vertex attribute that can be folded into a cluster representative.
///
/// `average` is the unweighted arithmetic mean of `values`. A single value is
/// returned unchanged and an empty slice yields the zero value.
pub trait VertexAttribute: Copy + Zeroable {
    fn average(values: &[Self]) -> Self;
}

impl VertexAttribute for Point3f {
    fn average(values: &[Self]) -> Self {
        match values {
            [] => Point3f::origin(),
            [single] => *single,
            _ => {
                let sum = values
                    .iter()
                    .fold(Vector3f::zeros(), |acc, p| acc + p.coords);
                Point3f::from(sum / values.len() as f32)
            }
        }
    }
}

impl VertexAttribute for Vector3f {
    fn average(values: &[Self]) -> Self {
        match values {
            [] => Vector3f::zeros(),
            [single] => *single,
            _ => {
                let sum = values.iter().fold(Vector3f::zeros(), |acc, v| acc + v);
                sum / values.len() as f32
            }
        }
    }
}

impl VertexAttribute for UV {
    fn average(values: &[Self]) -> Self {
        match values {
            [] => [0.0, 0.0],
            [single] => *single,
            _ => {
                let n = values.len() as f32;
                let (u, v) = values
                    .iter()
                    .fold((0.0f32, 0.0f32), |(u, v), uv| (u + uv[0], v + uv[1]));
                [u / n, v / n]
            }
        }
    }
}
