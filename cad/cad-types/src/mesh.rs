//! Indexed triangle mesh.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Aabb, MeshBounds, MeshTopology, Triangle, Vertex};

/// Triangle mesh with shared vertices.
///
/// `faces` index into `vertices`; each face winds counter-clockwise when
/// viewed from outside. Loaders may produce unwelded "triangle soup" (three
/// fresh vertices per face), which is still a valid `IndexedMesh`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex buffer.
    pub vertices: Vec<Vertex>,
    /// Index triples into `vertices`.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Empty mesh with room for the given number of vertices and faces.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Mesh from already-built buffers.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Mesh from flat `[x, y, z, ...]` positions and `[a, b, c, ...]` indices.
    ///
    /// Returns an empty mesh when either slice length is not a multiple of 3.
    ///
    /// ```
    /// use cad_types::{IndexedMesh, MeshTopology};
    ///
    /// let mesh = IndexedMesh::from_raw(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2]);
    /// assert_eq!(mesh.face_count(), 1);
    ///
    /// let broken = IndexedMesh::from_raw(&[0.0, 1.0], &[0, 1, 2]);
    /// assert!(broken.is_empty());
    /// ```
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        if positions.len() % 3 != 0 || indices.len() % 3 != 0 {
            return Self::new();
        }
        let vertices = positions
            .chunks_exact(3)
            .map(|c| Vertex::from_coords(c[0], c[1], c[2]))
            .collect();
        let faces = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        Self { vertices, faces }
    }

    /// Whether every face index points into the vertex buffer.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.vertices.len();
        self.faces
            .iter()
            .flatten()
            .all(|&i| (i as usize) < n)
    }

    /// First face index that does not point into the vertex buffer.
    #[must_use]
    pub fn first_invalid_index(&self) -> Option<u32> {
        let n = self.vertices.len();
        self.faces
            .iter()
            .flatten()
            .copied()
            .find(|&i| i as usize >= n)
    }

    /// Enclosed volume by the divergence theorem.
    ///
    /// Positive for a closed mesh with outward winding, negative when inside
    /// out. Meaningless for open surfaces.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.triangles().map(|t| t.signed_volume()).sum()
    }

    /// Absolute value of [`signed_volume`](Self::signed_volume).
    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Negative signed volume.
    #[inline]
    #[must_use]
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume() < 0.0
    }

    /// Sum of triangle areas.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|t| t.area()).sum()
    }

    /// Area-weighted mean of the triangle centroids.
    ///
    /// Falls back to the bounding-box centre when the surface has no area.
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        let mut weighted = Vector3::zeros();
        let mut total = 0.0;
        for tri in self.triangles() {
            let a = tri.area();
            weighted += tri.centroid().coords * a;
            total += a;
        }
        if total > f64::EPSILON {
            Point3::from(weighted / total)
        } else {
            self.bounds().center()
        }
    }

    /// Reverse the winding of every face and negate stored normals.
    pub fn flip_normals(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
        for normal in self.vertices.iter_mut().filter_map(|v| v.normal.as_mut()) {
            *normal = -*normal;
        }
    }

    /// Fill every vertex normal with the area-weighted average of the
    /// adjacent face normals.
    ///
    /// Vertices not used by any non-degenerate face get `+Z` so that
    /// exporters can rely on every normal being present.
    pub fn compute_vertex_normals(&mut self) {
        let mut sums = vec![Vector3::zeros(); self.vertices.len()];
        for &[a, b, c] in &self.faces {
            let (Some(p0), Some(p1), Some(p2)) = (
                self.vertices.get(a as usize),
                self.vertices.get(b as usize),
                self.vertices.get(c as usize),
            ) else {
                continue;
            };
            // Unnormalized cross product weights by area.
            let n = Triangle::new(p0.position, p1.position, p2.position).normal_unnormalized();
            for i in [a, b, c] {
                sums[i as usize] += n;
            }
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = Some(sum.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z));
        }
    }

    /// Remove all vertex normals.
    pub fn clear_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = None;
        }
    }

    /// Append `other`, offsetting its indices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn merge(&mut self, other: &Self) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend(other.vertices.iter().cloned());
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    /// Move every vertex by `offset`.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for v in &mut self.vertices {
            v.position += offset;
        }
    }

    /// Scale uniformly about the origin.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.vertices {
            v.position.coords *= factor;
        }
    }
}

impl MeshTopology for IndexedMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn triangle(&self, index: usize) -> Option<Triangle> {
        let &[a, b, c] = self.faces.get(index)?;
        Some(Triangle::new(
            self.vertices.get(a as usize)?.position,
            self.vertices.get(b as usize)?.position,
            self.vertices.get(c as usize)?.position,
        ))
    }

    fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    fn faces(&self) -> impl Iterator<Item = [u32; 3]> {
        self.faces.iter().copied()
    }

    /// Faces with an out-of-range index are skipped.
    fn triangles(&self) -> impl Iterator<Item = Triangle> {
        (0..self.faces.len()).filter_map(|i| self.triangle(i))
    }
}

impl MeshBounds for IndexedMesh {
    fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }
}

/// Unit cube from `(0, 0, 0)` to `(1, 1, 1)`: 8 vertices, 12 outward-facing
/// triangles.
///
/// ```
/// use cad_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!((cube.vertex_count(), cube.face_count()), (8, 12));
/// assert!((cube.volume() - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn unit_cube() -> IndexedMesh {
    let corners = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let faces = vec![
        // bottom (-Z)
        [0, 2, 1],
        [0, 3, 2],
        // top (+Z)
        [4, 5, 6],
        [4, 6, 7],
        // front (-Y)
        [0, 1, 5],
        [0, 5, 4],
        // right (+X)
        [1, 2, 6],
        [1, 6, 5],
        // back (+Y)
        [2, 3, 7],
        [2, 7, 6],
        // left (-X)
        [3, 0, 4],
        [3, 4, 7],
    ];
    IndexedMesh::from_parts(corners.into_iter().map(Vertex::from).collect(), faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cube_measures() {
        let cube = unit_cube();
        assert_relative_eq!(cube.signed_volume(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(cube.surface_area(), 6.0, epsilon = 1e-12);
        let c = cube.centroid();
        assert_relative_eq!(c.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(c.y, 0.5, epsilon = 1e-12);
        assert_relative_eq!(c.z, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn flipped_cube_is_inside_out() {
        let mut cube = unit_cube();
        assert!(!cube.is_inside_out());
        cube.flip_normals();
        assert!(cube.is_inside_out());
        assert_relative_eq!(cube.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn merge_offsets_indices() {
        let mut a = unit_cube();
        let b = unit_cube();
        a.merge(&b);
        assert_eq!(a.vertex_count(), 16);
        assert_eq!(a.face_count(), 24);
        assert_eq!(a.faces[12], [8, 10, 9]);
    }

    #[test]
    fn scale_and_translate() {
        let mut cube = unit_cube();
        cube.scale(2.0);
        cube.translate(Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(cube.volume(), 8.0, epsilon = 1e-12);
        let b = cube.bounds();
        assert_eq!(b.min, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(b.max, Point3::new(3.0, 2.0, 2.0));
    }

    #[test]
    fn vertex_normals_point_outward() {
        let mut cube = unit_cube();
        cube.compute_vertex_normals();
        for v in &cube.vertices {
            let n = v.normal.unwrap_or_else(Vector3::zeros);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
            let outward = v.position - Point3::new(0.5, 0.5, 0.5);
            assert!(n.dot(&outward) > 0.0);
        }
    }

    #[test]
    fn invalid_index_detected() {
        let mut mesh = unit_cube();
        assert!(mesh.has_valid_indices());
        mesh.faces.push([0, 1, 42]);
        assert!(!mesh.has_valid_indices());
        assert_eq!(mesh.first_invalid_index(), Some(42));
        // Bad face is skipped rather than panicking.
        assert_eq!(mesh.triangles().count(), 12);
    }

    #[test]
    fn centroid_of_flat_mesh_falls_back_to_bounds() {
        let mesh = IndexedMesh::from_raw(&[0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 4.0, 0.0, 0.0], &[0, 1, 2]);
        assert_eq!(mesh.centroid(), Point3::new(2.0, 0.0, 0.0));
    }
}
