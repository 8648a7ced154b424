//! Edge adjacency for triangle meshes.

use hashbrown::HashMap;

/// Edge-to-face lookup built from a face list.
///
/// Edges are stored undirected (`v0 < v1`). Directed half-edges are counted
/// separately so that winding consistency can be checked: on a consistently
/// oriented surface two faces sharing an edge traverse it in opposite
/// directions.
#[derive(Debug, Clone, Default)]
pub struct MeshAdjacency {
    edge_to_faces: HashMap<(u32, u32), Vec<usize>>,
    half_edges: HashMap<(u32, u32), u32>,
    vertex_count: usize,
}

impl MeshAdjacency {
    /// Build adjacency for `faces`.
    ///
    /// ```
    /// use cad_analysis::MeshAdjacency;
    ///
    /// let adj = MeshAdjacency::build(&[[0, 1, 2], [1, 3, 2]]);
    /// assert_eq!(adj.edge_count(), 5);
    /// assert_eq!(adj.boundary_edge_count(), 4);
    /// assert!(adj.is_winding_consistent());
    /// ```
    #[must_use]
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        let mut half_edges: HashMap<(u32, u32), u32> = HashMap::new();
        let mut vertices = hashbrown::HashSet::new();

        for (face_idx, &[a, b, c]) in faces.iter().enumerate() {
            vertices.extend([a, b, c]);
            for (from, to) in [(a, b), (b, c), (c, a)] {
                edge_to_faces
                    .entry(undirected(from, to))
                    .or_default()
                    .push(face_idx);
                *half_edges.entry((from, to)).or_default() += 1;
            }
        }

        Self {
            edge_to_faces,
            half_edges,
            vertex_count: vertices.len(),
        }
    }

    /// Faces using the edge between `v0` and `v1`, in either direction.
    #[must_use]
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[usize]> {
        self.edge_to_faces.get(&undirected(v0, v1)).map(Vec::as_slice)
    }

    /// Undirected edges with their adjacent faces.
    pub fn edges(&self) -> impl Iterator<Item = ((u32, u32), &[usize])> + '_ {
        self.edge_to_faces.iter().map(|(&e, f)| (e, f.as_slice()))
    }

    /// Number of distinct undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    /// Number of distinct vertices referenced by faces.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Edges with exactly one adjacent face.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces.values().filter(|f| f.len() == 1).count()
    }

    /// Edges with more than two adjacent faces.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces.values().filter(|f| f.len() > 2).count()
    }

    /// No edge is shared by more than two faces.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|f| f.len() <= 2)
    }

    /// Every edge is shared by exactly two faces.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        !self.edge_to_faces.is_empty() && self.edge_to_faces.values().all(|f| f.len() == 2)
    }

    /// No directed edge is traversed by more than one face.
    #[must_use]
    pub fn is_winding_consistent(&self) -> bool {
        self.half_edges.values().all(|&n| n == 1)
    }
}

#[inline]
const fn undirected(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 { (v0, v1) } else { (v1, v0) }
}
