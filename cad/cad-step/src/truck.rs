//! Native backend built on the truck B-rep kernel.
//!
//! Needs no external install, but truck only understands a subset of
//! AP203/AP214 geometry. Files it cannot read fall through to the
//! external backends.

use std::path::Path;

use cad_types::{IndexedMesh, Vertex};
use tracing::{debug, info};
use truck_meshalgo::prelude::*;
use truck_polymesh::{PolygonMesh, StandardVertex};
use truck_stepio::r#in::Table;

use crate::backend::StepBackend;
use crate::error::{StepError, StepResult};
use crate::params::StepParams;

/// Chord tolerance as a fraction of the bounding-box diagonal.
const RELATIVE_TOLERANCE: f64 = 0.001;

/// Coarse first pass used only to size the real tolerance.
const PROBE_TOLERANCE: f64 = 0.01;

/// Tessellates STEP shells in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct TruckBackend;

impl StepBackend for TruckBackend {
    fn name(&self) -> &'static str {
        "truck"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn convert(&self, step: &Path, _params: &StepParams) -> StepResult<IndexedMesh> {
        let text = std::fs::read_to_string(step)?;
        let exchange = truck_stepio::r#in::ruststep::parser::parse(&text)
            .map_err(|e| StepError::Parse(e.to_string()))?;
        let Some(data) = exchange.data.first() else {
            return Err(StepError::Parse("no DATA section".into()));
        };

        let table = Table::from_data_section(data);
        let mut mesh = IndexedMesh::new();
        let mut skipped = 0usize;

        for holder in table.shell.values() {
            let Ok(shell) = table.to_compressed_shell(holder) else {
                skipped += 1;
                continue;
            };
            let diagonal = shell
                .robust_triangulation(PROBE_TOLERANCE)
                .to_polygon()
                .bounding_box()
                .diameter();
            let tolerance = (diagonal * RELATIVE_TOLERANCE).max(f64::EPSILON);
            let poly = shell.robust_triangulation(tolerance).to_polygon();
            append_polygon_mesh(&poly, &mut mesh);
        }

        debug!(shells = table.shell.len(), skipped, "tessellated STEP shells");
        if mesh.faces.is_empty() {
            return Err(StepError::EmptyOutput {
                backend: self.name(),
            });
        }
        info!(faces = mesh.faces.len(), "truck conversion succeeded");
        Ok(mesh)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn append_polygon_mesh(poly: &PolygonMesh, mesh: &mut IndexedMesh) {
    let base = mesh.vertices.len() as u32;
    mesh.vertices.extend(
        poly.positions()
            .iter()
            .map(|p| Vertex::from_coords(p.x, p.y, p.z)),
    );
    let at = |v: &StandardVertex| v.pos as u32 + base;
    for tri in poly.tri_faces() {
        mesh.faces.push([at(&tri[0]), at(&tri[1]), at(&tri[2])]);
    }
    for quad in poly.quad_faces() {
        mesh.faces.push([at(&quad[0]), at(&quad[1]), at(&quad[2])]);
        mesh.faces.push([at(&quad[0]), at(&quad[2]), at(&quad[3])]);
    }
    for poly_face in poly.other_faces() {
        if let Some((first, rest)) = poly_face.split_first() {
            for pair in rest.windows(2) {
                mesh.faces.push([at(first), at(&pair[0]), at(&pair[1])]);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.step");
        std::fs::write(&path, "this is not ISO-10303-21").unwrap();
        assert!(TruckBackend.convert(&path, &StepParams::default()).is_err());
    }
}
