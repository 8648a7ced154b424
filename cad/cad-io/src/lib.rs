//! Mesh file I/O for cadview.
//!
//! Formats:
//!
//! - **STL** - ASCII and binary, read and write
//! - **OBJ** - geometry subset, read and write
//! - **GLB** - binary glTF 2.0, single triangle primitive, read and write
//! - **STEP** - recognized by extension only; tessellation lives in `cad-step`
//!
//! # Example
//!
//! ```no_run
//! use cad_io::{load_mesh, save_mesh};
//!
//! let mut mesh = load_mesh("bracket.stl").unwrap();
//! mesh.compute_vertex_normals();
//! save_mesh(&mesh, "bracket.glb").unwrap();
//! ```

#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod glb;
mod obj;
mod stl;

pub use error::{IoError, IoResult};
pub use glb::{load_glb, read_glb, save_glb, write_glb};
pub use obj::{load_obj, read_obj, save_obj, write_obj};
pub use stl::{load_stl, read_stl, save_stl, write_stl};

use std::path::Path;

use cad_types::IndexedMesh;

/// File formats known to cadview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// Stereolithography, ASCII or binary.
    Stl,
    /// Wavefront OBJ.
    Obj,
    /// Binary glTF 2.0.
    Glb,
    /// ISO 10303 CAD exchange; tessellated by `cad-step`.
    Step,
}

impl MeshFormat {
    /// Detect the format from a path's extension, ignoring case.
    ///
    /// ```
    /// use cad_io::MeshFormat;
    ///
    /// assert_eq!(MeshFormat::from_path("COUPLER.STP"), Some(MeshFormat::Step));
    /// assert_eq!(MeshFormat::from_path("model.glb"), Some(MeshFormat::Glb));
    /// assert_eq!(MeshFormat::from_path("notes.txt"), None);
    /// ```
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            "glb" => Some(Self::Glb),
            "step" | "stp" => Some(Self::Step),
            _ => None,
        }
    }

    /// Canonical extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Obj => "obj",
            Self::Glb => "glb",
            Self::Step => "step",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stl => "STL",
            Self::Obj => "OBJ",
            Self::Glb => "GLB",
            Self::Step => "STEP",
        }
    }

    /// Whether [`load_mesh`] can read this format.
    #[must_use]
    pub const fn can_read(self) -> bool {
        !matches!(self, Self::Step)
    }

    /// Whether [`save_mesh`] can write this format.
    #[must_use]
    pub const fn can_write(self) -> bool {
        !matches!(self, Self::Step)
    }
}

impl std::fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve the format of `path` or fail with [`IoError::UnknownFormat`].
pub fn detect_format<P: AsRef<Path>>(path: P) -> IoResult<MeshFormat> {
    let path = path.as_ref();
    MeshFormat::from_path(path).ok_or_else(|| IoError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh, choosing the reader by extension.
///
/// STEP input is refused with [`IoError::UnsupportedOperation`]; use
/// `cad_step::StepConverter` for it.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    match detect_format(path)? {
        MeshFormat::Stl => load_stl(path),
        MeshFormat::Obj => load_obj(path),
        MeshFormat::Glb => load_glb(path),
        MeshFormat::Step => Err(IoError::UnsupportedOperation {
            format: "STEP",
            operation: "read",
        }),
    }
}

/// Save a mesh, choosing the writer by extension. STL is written binary.
pub fn save_mesh<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    let path = path.as_ref();
    match detect_format(path)? {
        MeshFormat::Stl => save_stl(mesh, path, true),
        MeshFormat::Obj => save_obj(mesh, path),
        MeshFormat::Glb => save_glb(mesh, path),
        MeshFormat::Step => Err(IoError::UnsupportedOperation {
            format: "STEP",
            operation: "written",
        }),
    }
}
