//! Vertex welding.
//!
//! STL stores every facet with its own three corners, so a loaded cube has
//! 36 vertices and no shared edges. Welding merges coincident corners back
//! into shared vertices; without it every STL looks like a pile of
//! disconnected triangles to the topology checks.

use cad_types::{IndexedMesh, Point3};
use hashbrown::HashMap;
use tracing::debug;

/// Merge vertices closer than `epsilon`, drop faces that collapse, and
/// compact the vertex buffer.
///
/// Returns the number of vertices merged away. Faces with an out-of-range
/// index are left untouched.
///
/// ```
/// use cad_analysis::weld_vertices;
/// use cad_types::{IndexedMesh, MeshTopology, Vertex};
///
/// let mut mesh = IndexedMesh::new();
/// for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0],
///           [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
///     mesh.vertices.push(Vertex::from(p));
/// }
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([3, 4, 5]);
///
/// assert_eq!(weld_vertices(&mut mesh, 1e-9), 2);
/// assert_eq!(mesh.vertex_count(), 4);
/// ```
#[allow(clippy::cast_possible_truncation)]
pub fn weld_vertices(mesh: &mut IndexedMesh, epsilon: f64) -> usize {
    let n = mesh.vertices.len();
    if n == 0 || mesh.vertices.len() > u32::MAX as usize {
        return 0;
    }

    let cell_size = (epsilon * 2.0).max(f64::MIN_POSITIVE);
    let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    let mut remap: Vec<u32> = (0..n as u32).collect();
    let mut merged = 0;

    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let idx = idx as u32;
        let cell = cell_of(&vertex.position, cell_size);

        let mut target = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = grid.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz))
                    else {
                        continue;
                    };
                    for &other in candidates {
                        let d = (mesh.vertices[other as usize].position - vertex.position).norm();
                        if d <= epsilon {
                            target = Some(other);
                            break 'search;
                        }
                    }
                }
            }
        }

        match target {
            Some(other) => {
                remap[idx as usize] = other;
                merged += 1;
            }
            None => grid.entry(cell).or_default().push(idx),
        }
    }

    if merged == 0 {
        return 0;
    }

    for face in &mut mesh.faces {
        for i in face.iter_mut() {
            if let Some(&r) = remap.get(*i as usize) {
                *i = r;
            }
        }
    }
    let before = mesh.faces.len();
    mesh.faces.retain(|&[a, b, c]| a != b && b != c && a != c);
    let collapsed = before - mesh.faces.len();
    let removed = remove_unreferenced_vertices(mesh);

    debug!(merged, collapsed, removed, "welded vertices");
    merged
}

/// Drop vertices no face references and renumber the rest.
///
/// Returns the number removed.
#[allow(clippy::cast_possible_truncation)]
pub fn remove_unreferenced_vertices(mesh: &mut IndexedMesh) -> usize {
    let n = mesh.vertices.len();
    let mut used = vec![false; n];
    for &i in mesh.faces.iter().flatten() {
        if let Some(u) = used.get_mut(i as usize) {
            *u = true;
        }
    }
    if used.iter().all(|&u| u) {
        return 0;
    }

    let mut new_index = vec![u32::MAX; n];
    let mut kept = Vec::with_capacity(n);
    for (old, vertex) in mesh.vertices.drain(..).enumerate() {
        if used[old] {
            new_index[old] = kept.len() as u32;
            kept.push(vertex);
        }
    }
    for i in mesh.faces.iter_mut().flatten() {
        if let Some(&r) = new_index.get(*i as usize) {
            *i = r;
        }
    }
    mesh.vertices = kept;
    n - mesh.vertices.len()
}

#[allow(clippy::cast_possible_truncation)]
fn cell_of(p: &Point3<f64>, size: f64) -> (i64, i64, i64) {
    (
        (p.x / size).floor() as i64,
        (p.y / size).floor() as i64,
        (p.z / size).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_types::{MeshTopology, Vertex, unit_cube};

    /// Unit cube as triangle soup, the way an STL loader returns it.
    fn soup_cube() -> IndexedMesh {
        let cube = unit_cube();
        let mut soup = IndexedMesh::new();
        for tri in cube.triangles() {
            let base = soup.vertices.len() as u32;
            soup.vertices.extend([tri.v0, tri.v1, tri.v2].map(Vertex::new));
            soup.faces.push([base, base + 1, base + 2]);
        }
        soup
    }

    #[test]
    fn soup_cube_welds_to_eight_vertices() {
        let mut mesh = soup_cube();
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(weld_vertices(&mut mesh, 1e-9), 28);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 12);
        assert!((mesh.volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn distant_vertices_untouched() {
        let mut mesh = unit_cube();
        assert_eq!(weld_vertices(&mut mesh, 1e-6), 0);
        assert_eq!(mesh, unit_cube());
    }

    #[test]
    fn collapsed_faces_removed() {
        let mut mesh = IndexedMesh::from_raw(
            &[0.0, 0.0, 0.0, 1e-9, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
            &[0, 1, 2, 0, 3, 2],
        );
        assert_eq!(weld_vertices(&mut mesh, 1e-6), 1);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn unreferenced_vertices_compacted() {
        let mut mesh = IndexedMesh::from_raw(
            &[9.0, 9.0, 9.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[1, 2, 3],
        );
        assert_eq!(remove_unreferenced_vertices(&mut mesh), 1);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_eq!(mesh.vertices[0].position, Point3::origin());
    }

    #[test]
    fn empty_mesh_is_noop() {
        let mut mesh = IndexedMesh::new();
        assert_eq!(weld_vertices(&mut mesh, 1.0), 0);
    }
}
