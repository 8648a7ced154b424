//! Read-only views over mesh storage.

use nalgebra::Point3;

use crate::{Aabb, Triangle, Vertex};

/// Counting and iteration over a triangle mesh.
pub trait MeshTopology {
    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of triangles.
    fn face_count(&self) -> usize;

    /// `true` when there is nothing to draw.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }

    /// Triangle `index` with resolved positions, or `None` when out of range.
    fn triangle(&self, index: usize) -> Option<Triangle>;

    /// All vertices.
    fn vertices(&self) -> impl Iterator<Item = &Vertex>;

    /// All faces as index triples.
    fn faces(&self) -> impl Iterator<Item = [u32; 3]>;

    /// All faces with resolved positions.
    fn triangles(&self) -> impl Iterator<Item = Triangle>;
}

/// Bounding box queries.
pub trait MeshBounds {
    /// Box around every vertex; empty for a mesh without vertices.
    fn bounds(&self) -> Aabb;

    /// Like [`bounds`](Self::bounds) but `None` instead of the empty box.
    fn bounds_opt(&self) -> Option<Aabb> {
        let b = self.bounds();
        if b.is_empty() { None } else { Some(b) }
    }

    /// Centre of the bounding box.
    fn center(&self) -> Point3<f64> {
        self.bounds().center()
    }
}
