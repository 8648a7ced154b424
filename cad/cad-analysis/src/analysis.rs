//! Geometric and topological mesh analysis.

use std::fmt;

use cad_types::{IndexedMesh, MeshBounds, MeshTopology, Point3, Triangle};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::adjacency::MeshAdjacency;
use crate::error::{AnalysisError, AnalysisResult};
use crate::params::AnalysisParams;
use crate::weld::{remove_unreferenced_vertices, weld_vertices};

/// Everything `cadview analyze` reports about a mesh.
///
/// Counts describe the mesh after welding. Edges are undirected and
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshAnalysis {
    /// Vertices after welding.
    pub vertex_count: usize,
    /// Triangles after welding.
    pub face_count: usize,
    /// Distinct undirected edges.
    pub edge_count: usize,

    /// Enclosed volume, always non-negative.
    pub volume: f64,
    /// Signed volume; negative when the surface is inside-out.
    pub signed_volume: f64,
    /// Total triangle area.
    pub surface_area: f64,
    /// Minimum corner of the axis-aligned bounds.
    pub bounds_min: [f64; 3],
    /// Maximum corner of the axis-aligned bounds.
    pub bounds_max: [f64; 3],
    /// Extent along X, Y and Z.
    pub dimensions: [f64; 3],
    /// Area-weighted surface centroid.
    pub centroid: [f64; 3],

    /// `V - E + F`, counting only vertices referenced by faces.
    pub euler_number: i64,
    /// Number of handles. Only defined for closed surfaces.
    pub genus: Option<i64>,

    /// Every edge is shared by exactly two faces.
    pub is_watertight: bool,
    /// No edge is shared by more than two faces.
    pub is_manifold: bool,
    /// Neighbouring faces traverse their shared edge in opposite directions.
    pub is_winding_consistent: bool,
    /// Watertight, consistently wound, and encloses positive volume.
    pub is_volume: bool,
    /// Closed, outward-facing, and bends the same way at every edge.
    pub is_convex: bool,

    /// Edges with one adjacent face.
    pub boundary_edge_count: usize,
    /// Edges with more than two adjacent faces.
    pub non_manifold_edge_count: usize,
    /// Faces whose area is below the degenerate threshold.
    pub degenerate_face_count: usize,

    /// Volume of the axis-aligned bounds.
    pub bounding_box_volume: f64,
    /// Percentage of the bounding box filled by the solid, when it is one.
    pub fill_ratio: Option<f64>,
}

impl MeshAnalysis {
    /// Whether any defect counter is non-zero.
    #[must_use]
    pub const fn has_issues(&self) -> bool {
        self.boundary_edge_count > 0
            || self.non_manifold_edge_count > 0
            || self.degenerate_face_count > 0
            || !self.is_winding_consistent
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

impl fmt::Display for MeshAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Analysis:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(f, "  Volume: {:.4} cubic units", self.volume)?;
        writeln!(f, "  Surface Area: {:.4} square units", self.surface_area)?;
        writeln!(f, "  Euler Number: {}", self.euler_number)?;
        if let Some(genus) = self.genus {
            writeln!(f, "  Genus (holes): {genus}")?;
        }

        let [cx, cy, cz] = self.centroid;
        writeln!(f, "  Centroid: ({cx:.4}, {cy:.4}, {cz:.4})")?;

        writeln!(f)?;
        writeln!(f, "  Dimensions:")?;
        writeln!(f, "    X: {:.4}", self.dimensions[0])?;
        writeln!(f, "    Y: {:.4}", self.dimensions[1])?;
        writeln!(f, "    Z: {:.4}", self.dimensions[2])?;
        writeln!(f, "    Bounding box volume: {:.4}", self.bounding_box_volume)?;

        if let Some(ratio) = self.fill_ratio {
            writeln!(f)?;
            writeln!(f, "  Space Utilization:")?;
            writeln!(f, "    Model fills {ratio:.2}% of bounding box")?;
        }

        writeln!(f)?;
        writeln!(f, "  Quality Checks:")?;
        writeln!(f, "    Watertight: {}", yes_no(self.is_watertight))?;
        writeln!(f, "    Manifold: {}", yes_no(self.is_manifold))?;
        writeln!(
            f,
            "    Winding: {}",
            if !self.is_winding_consistent {
                "Inconsistent"
            } else if self.signed_volume < 0.0 {
                "Inside-out"
            } else {
                "Consistent"
            }
        )?;
        writeln!(f, "    Solid volume: {}", yes_no(self.is_volume))?;
        writeln!(f, "    Convex: {}", yes_no(self.is_convex))?;

        if self.has_issues() {
            writeln!(f)?;
            writeln!(f, "  Issues:")?;
            if self.boundary_edge_count > 0 {
                writeln!(f, "    Boundary edges: {}", self.boundary_edge_count)?;
            }
            if self.non_manifold_edge_count > 0 {
                writeln!(f, "    Non-manifold edges: {}", self.non_manifold_edge_count)?;
            }
            if self.degenerate_face_count > 0 {
                writeln!(f, "    Degenerate faces: {}", self.degenerate_face_count)?;
            }
        }

        Ok(())
    }
}

/// Analyze a mesh with default tolerances.
///
/// # Errors
///
/// [`AnalysisError::EmptyMesh`] when there are no faces and
/// [`AnalysisError::InvalidIndex`] when a face points past the vertex buffer.
///
/// # Example
///
/// ```
/// use cad_analysis::analyze;
/// use cad_types::unit_cube;
///
/// let report = analyze(&unit_cube()).unwrap();
/// assert_eq!(report.euler_number, 2);
/// assert_eq!(report.genus, Some(0));
/// assert!(report.is_convex);
/// ```
pub fn analyze(mesh: &IndexedMesh) -> AnalysisResult<MeshAnalysis> {
    analyze_with_params(mesh, &AnalysisParams::default())
}

/// Analyze a mesh with explicit tolerances.
///
/// A copy of the mesh is welded with `params.weld_epsilon` first (skipped
/// when it is zero), so triangle soup from STL files is measured as a
/// connected surface. Vertices no face uses are dropped from the copy
/// before anything is measured.
///
/// # Errors
///
/// Same as [`analyze`].
#[instrument(skip_all, fields(faces = mesh.faces.len()))]
pub fn analyze_with_params(
    mesh: &IndexedMesh,
    params: &AnalysisParams,
) -> AnalysisResult<MeshAnalysis> {
    if mesh.faces.is_empty() {
        return Err(AnalysisError::EmptyMesh);
    }
    if let Some(index) = mesh.first_invalid_index() {
        return Err(AnalysisError::InvalidIndex {
            index,
            vertex_count: mesh.vertices.len(),
        });
    }

    let mut working = mesh.clone();
    if params.weld_epsilon > 0.0 {
        weld_vertices(&mut working, params.weld_epsilon);
    }
    remove_unreferenced_vertices(&mut working);
    let mesh = &working;
    if mesh.faces.is_empty() {
        return Err(AnalysisError::EmptyMesh);
    }

    let adjacency = MeshAdjacency::build(&mesh.faces);
    let bounds = mesh.bounds();
    let size = bounds.size();

    let signed_volume = mesh.signed_volume();
    let volume = signed_volume.abs();
    let is_watertight = adjacency.is_watertight();
    let is_winding_consistent = adjacency.is_winding_consistent();
    let is_volume = is_watertight && is_winding_consistent && signed_volume > 0.0;

    let euler_number = euler_number(&adjacency, mesh.faces.len());
    let genus = is_watertight.then(|| genus_from_euler(euler_number));

    let is_convex = is_volume
        && euler_number == 2
        && is_locally_convex(mesh, &adjacency, params.convexity_tolerance * bounds.diagonal());

    let bounding_box_volume = bounds.volume();
    let fill_ratio = (is_volume && bounding_box_volume > 0.0)
        .then(|| volume / bounding_box_volume * 100.0);

    let degenerate_face_count = mesh
        .triangles()
        .filter(|t| t.area() < params.degenerate_area)
        .count();

    debug!(
        edges = adjacency.edge_count(),
        euler_number, is_watertight, is_convex, "analysis complete"
    );

    Ok(MeshAnalysis {
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        edge_count: adjacency.edge_count(),
        volume,
        signed_volume,
        surface_area: mesh.surface_area(),
        bounds_min: point_array(&bounds.min),
        bounds_max: point_array(&bounds.max),
        dimensions: [size.x, size.y, size.z],
        centroid: point_array(&mesh.centroid()),
        euler_number,
        genus,
        is_watertight,
        is_manifold: adjacency.is_manifold(),
        is_winding_consistent,
        is_volume,
        is_convex,
        boundary_edge_count: adjacency.boundary_edge_count(),
        non_manifold_edge_count: adjacency.non_manifold_edge_count(),
        degenerate_face_count,
        bounding_box_volume,
        fill_ratio,
    })
}

#[allow(clippy::cast_possible_wrap)]
fn euler_number(adjacency: &MeshAdjacency, face_count: usize) -> i64 {
    adjacency.vertex_count() as i64 - adjacency.edge_count() as i64 + face_count as i64
}

/// `1 - χ/2`, truncated toward zero for odd χ.
const fn genus_from_euler(euler_number: i64) -> i64 {
    (2 - euler_number) / 2
}

/// Check that at every interior edge the neighbouring face's far corner
/// lies on or below this face's plane.
///
/// On a closed, outward-wound sphere-like surface this local condition is
/// equivalent to every vertex lying inside every face plane.
fn is_locally_convex(mesh: &IndexedMesh, adjacency: &MeshAdjacency, tolerance: f64) -> bool {
    let corner = |i: u32| mesh.vertices[i as usize].position;
    let triangle = |face: usize| {
        let [a, b, c] = mesh.faces[face];
        Triangle::new(corner(a), corner(b), corner(c))
    };
    let far_corner = |face: usize, (e0, e1): (u32, u32)| {
        mesh.faces[face]
            .into_iter()
            .find(|&v| v != e0 && v != e1)
            .map(corner)
    };

    adjacency.edges().all(|(edge, faces)| {
        let &[f0, f1] = faces else {
            return false;
        };
        [(f0, f1), (f1, f0)].into_iter().all(|(face, other)| {
            let tri = triangle(face);
            let Some(normal) = tri.normal() else {
                return true;
            };
            far_corner(other, edge).is_none_or(|p| normal.dot(&(p - tri.v0)) <= tolerance)
        })
    })
}

fn point_array(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cad_types::{Vector3, Vertex, unit_cube};

    /// Square-based pyramid, outward wound.
    fn pyramid() -> IndexedMesh {
        IndexedMesh::from_raw(
            &[
                0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 2.0, 2.0, 0.0, 0.0, 2.0, 0.0, 1.0, 1.0, 3.0,
            ],
            &[0, 2, 1, 0, 3, 2, 0, 1, 4, 1, 2, 4, 2, 3, 4, 3, 0, 4],
        )
    }

    /// L-shaped prism; the inner corner is a concave edge.
    fn l_shape() -> IndexedMesh {
        let outline = [
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 2.0],
            [0.0, 2.0],
        ];
        extrude(&outline, 1.0)
    }

    /// Extrude a counter-clockwise simple polygon along +Z. The cap is
    /// fan-triangulated from vertex 0, which must see every other vertex.
    fn extrude(outline: &[[f64; 2]], height: f64) -> IndexedMesh {
        let n = outline.len() as u32;
        let mut mesh = IndexedMesh::new();
        for z in [0.0, height] {
            for &[x, y] in outline {
                mesh.vertices.push(Vertex::from_coords(x, y, z));
            }
        }
        for i in 1..n - 1 {
            mesh.faces.push([0, i + 1, i]);
            mesh.faces.push([n, n + i, n + i + 1]);
        }
        for i in 0..n {
            let j = (i + 1) % n;
            mesh.faces.push([i, j, n + j]);
            mesh.faces.push([i, n + j, n + i]);
        }
        mesh
    }

    #[test]
    fn cube_report() {
        let r = analyze(&unit_cube()).unwrap();
        assert_eq!(r.vertex_count, 8);
        assert_eq!(r.face_count, 12);
        assert_eq!(r.edge_count, 18);
        assert_eq!(r.euler_number, 2);
        assert_eq!(r.genus, Some(0));
        assert_relative_eq!(r.volume, 1.0, epsilon = 1e-12);
        assert_relative_eq!(r.surface_area, 6.0, epsilon = 1e-12);
        assert_eq!(r.dimensions, [1.0, 1.0, 1.0]);
        assert_relative_eq!(r.centroid[0], 0.5, epsilon = 1e-12);
        assert!(r.is_watertight && r.is_manifold && r.is_winding_consistent);
        assert!(r.is_volume);
        assert!(r.is_convex);
        assert_relative_eq!(r.fill_ratio.unwrap(), 100.0, epsilon = 1e-9);
        assert!(!r.has_issues());
    }

    #[test]
    fn pyramid_is_convex_and_partly_fills_box() {
        let r = analyze(&pyramid()).unwrap();
        assert!(r.is_convex);
        assert_relative_eq!(r.volume, 4.0, epsilon = 1e-12);
        assert_relative_eq!(r.fill_ratio.unwrap(), 100.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn l_shape_is_closed_but_concave() {
        let r = analyze(&l_shape()).unwrap();
        assert!(r.is_watertight, "{r}");
        assert!(r.is_volume);
        assert!(!r.is_convex);
        assert_relative_eq!(r.volume, 3.0, epsilon = 1e-12);
        assert_relative_eq!(r.fill_ratio.unwrap(), 75.0, epsilon = 1e-9);
    }

    #[test]
    fn inside_out_cube_is_not_a_volume() {
        let mut cube = unit_cube();
        cube.flip_normals();
        let r = analyze(&cube).unwrap();
        assert!(r.is_watertight);
        assert!(r.is_winding_consistent);
        assert!(r.signed_volume < 0.0);
        assert_relative_eq!(r.volume, 1.0, epsilon = 1e-12);
        assert!(!r.is_volume);
        assert!(!r.is_convex);
        assert!(r.fill_ratio.is_none());
        assert!(r.to_string().contains("Inside-out"));
    }

    #[test]
    fn open_surface_has_no_genus() {
        let mut cube = unit_cube();
        cube.faces.truncate(10);
        let r = analyze(&cube).unwrap();
        assert!(!r.is_watertight);
        assert_eq!(r.genus, None);
        assert_eq!(r.boundary_edge_count, 4);
        assert!(r.fill_ratio.is_none());
        assert!(r.has_issues());
    }

    #[test]
    fn two_separate_cubes_are_not_convex() {
        let mut mesh = unit_cube();
        let mut other = unit_cube();
        other.translate(Vector3::new(5.0, 0.0, 0.0));
        mesh.merge(&other);
        let r = analyze(&mesh).unwrap();
        assert!(r.is_volume);
        assert_eq!(r.euler_number, 4);
        assert!(!r.is_convex);
    }

    #[test]
    fn triangle_soup_is_welded_before_counting() {
        let cube = unit_cube();
        let mut soup = IndexedMesh::new();
        for tri in cube.triangles() {
            let base = soup.vertices.len() as u32;
            soup.vertices.extend([tri.v0, tri.v1, tri.v2].map(Vertex::new));
            soup.faces.push([base, base + 1, base + 2]);
        }
        let r = analyze(&soup).unwrap();
        assert_eq!(r.vertex_count, 8);
        assert!(r.is_watertight);

        let raw = analyze_with_params(&soup, &AnalysisParams::default().with_weld_epsilon(0.0))
            .unwrap();
        assert_eq!(raw.vertex_count, 36);
        assert!(!raw.is_watertight);
    }

    #[test]
    fn stray_vertex_does_not_stretch_bounds() {
        let mut cube = unit_cube();
        cube.vertices.push(Vertex::new(Point3::new(10.0, 10.0, 10.0)));
        let r = analyze(&cube).unwrap();
        assert_eq!(r.vertex_count, 8);
        assert_eq!(r.euler_number, 2);
        assert_eq!(r.dimensions, [1.0, 1.0, 1.0]);
        assert_relative_eq!(r.fill_ratio.unwrap(), 100.0, epsilon = 1e-9);

        let unwelded =
            analyze_with_params(&cube, &AnalysisParams::default().with_weld_epsilon(0.0)).unwrap();
        assert_eq!(unwelded.vertex_count, 8);
        assert_eq!(unwelded.bounds_max, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn genus_truncates_toward_zero() {
        assert_eq!(genus_from_euler(2), 0);
        assert_eq!(genus_from_euler(0), 1);
        assert_eq!(genus_from_euler(-2), 2);
        assert_eq!(genus_from_euler(4), -1);
        assert_eq!(genus_from_euler(1), 0);
        assert_eq!(genus_from_euler(-1), 1);
        assert_eq!(genus_from_euler(3), 0);
    }

    #[test]
    fn degenerate_faces_counted() {
        let mesh = IndexedMesh::from_raw(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[0, 1, 2, 0, 1, 3],
        );
        let r = analyze(&mesh).unwrap();
        assert_eq!(r.degenerate_face_count, 1);
        assert!(r.to_string().contains("Degenerate faces: 1"));
    }

    #[test]
    fn empty_and_invalid_rejected() {
        assert!(matches!(
            analyze(&IndexedMesh::new()),
            Err(AnalysisError::EmptyMesh)
        ));
        let bad = IndexedMesh::from_raw(&[0.0; 9], &[0, 1, 5]);
        assert!(matches!(
            analyze(&bad),
            Err(AnalysisError::InvalidIndex { index: 5, vertex_count: 3 })
        ));
    }

    #[test]
    fn report_text_and_json() {
        let r = analyze(&unit_cube()).unwrap();
        let text = r.to_string();
        assert!(text.contains("Vertices: 8"));
        assert!(text.contains("Genus (holes): 0"));
        assert!(text.contains("Model fills 100.00% of bounding box"));
        assert!(text.contains("Convex: Yes"));

        let json: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert_eq!(json["face_count"], 12);
        assert_eq!(json["genus"], 0);
        assert_eq!(json["is_watertight"], true);
        assert_eq!(json["bounds_max"][2], 1.0);
    }
}
