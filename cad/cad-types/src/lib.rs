//! Triangle mesh data model for cadview.
//!
//! Every converter and analysis pass in the workspace speaks these types:
//!
//! - [`Vertex`] - a position with an optional normal
//! - [`IndexedMesh`] - shared vertices plus index triples
//! - [`Triangle`] - resolved positions of one face
//! - [`Aabb`] - axis-aligned bounding box
//!
//! # Conventions
//!
//! Coordinates are unit-agnostic `f64`. CAD exports are usually millimetres,
//! GLB consumers usually assume metres; no scaling is applied implicitly.
//!
//! Faces wind **counter-clockwise when viewed from outside**, so a closed,
//! correctly oriented mesh has positive signed volume.
//!
//! # Example
//!
//! ```
//! use cad_types::{IndexedMesh, MeshTopology, Vertex};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!((mesh.surface_area() - 0.5).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod mesh;
mod traits;
mod triangle;
mod vertex;

pub use bounds::Aabb;
pub use mesh::{IndexedMesh, unit_cube};
pub use traits::{MeshBounds, MeshTopology};
pub use triangle::Triangle;
pub use vertex::Vertex;

pub use nalgebra::{Point3, Vector3};
