//! Mesh vertex.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mesh vertex: a position and, once computed or loaded, a unit normal.
///
/// STL and STEP tessellations carry no per-vertex normals; they are filled in
/// by [`IndexedMesh::compute_vertex_normals`](crate::IndexedMesh::compute_vertex_normals)
/// before GLB export so viewers can shade smoothly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Position in model space.
    pub position: Point3<f64>,
    /// Unit normal, if known.
    pub normal: Option<Vector3<f64>>,
}

impl Vertex {
    /// Create a vertex without a normal.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
        }
    }

    /// Create a vertex from raw coordinates.
    ///
    /// ```
    /// use cad_types::Vertex;
    ///
    /// let v = Vertex::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(v.position.y, 2.0);
    /// assert!(v.normal.is_none());
    /// ```
    #[inline]
    #[must_use]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Create a vertex carrying a normal.
    #[inline]
    #[must_use]
    pub const fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal: Some(normal),
        }
    }

    /// Position as single-precision components, the layout STL and glTF use.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn position_f32(&self) -> [f32; 3] {
        [
            self.position.x as f32,
            self.position.y as f32,
            self.position.z as f32,
        ]
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::from_coords(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_array() {
        let v = Vertex::from([1.0, -2.0, 0.5]);
        assert_eq!(v.position, Point3::new(1.0, -2.0, 0.5));
    }

    #[test]
    fn with_normal_keeps_normal() {
        let v = Vertex::with_normal(Point3::origin(), Vector3::z());
        assert_eq!(v.normal, Some(Vector3::z()));
    }

    #[test]
    fn position_f32_narrowing() {
        let v = Vertex::from_coords(0.1, 2.0, -3.5);
        let p = v.position_f32();
        assert!((p[0] - 0.1).abs() < 1e-7);
        assert_eq!(p[1], 2.0);
        assert_eq!(p[2], -3.5);
    }
}
