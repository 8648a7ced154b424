//! File-level conversion chain: STL -> OBJ -> GLB, then back.
//!
//! Mirrors what `cadview sample` does with the generated cube.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use approx::assert_relative_eq;
use cad_io::{MeshFormat, load_mesh, save_mesh, save_stl};
use cad_types::{MeshBounds, MeshTopology, unit_cube};
use tempfile::tempdir;

#[test]
fn stl_obj_glb_chain_preserves_geometry() {
    let dir = tempdir().expect("tempdir");
    let stl = dir.path().join("sample_cube.stl");
    let obj = stl.with_extension("obj");
    let glb = stl.with_extension("glb");

    save_stl(&unit_cube(), &stl, true).unwrap();

    let from_stl = load_mesh(&stl).unwrap();
    save_mesh(&from_stl, &obj).unwrap();
    let from_obj = load_mesh(&obj).unwrap();
    save_mesh(&from_obj, &glb).unwrap();
    let from_glb = load_mesh(&glb).unwrap();

    assert_eq!(from_glb.face_count(), 12);
    assert_relative_eq!(from_glb.volume(), 1.0, epsilon = 1e-6);
    assert_relative_eq!(from_glb.surface_area(), 6.0, epsilon = 1e-6);
    let b = from_glb.bounds();
    assert_relative_eq!(b.size().x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(b.size().z, 1.0, epsilon = 1e-6);
}

#[test]
fn every_writable_format_round_trips() {
    let dir = tempdir().expect("tempdir");
    for format in [MeshFormat::Stl, MeshFormat::Obj, MeshFormat::Glb] {
        assert!(format.can_write());
        let path = dir.path().join(format!("cube.{}", format.extension()));
        save_mesh(&unit_cube(), &path).unwrap();
        let loaded = load_mesh(&path).unwrap();
        assert_eq!(loaded.face_count(), 12, "{format}");
    }
}

#[test]
fn saving_to_step_is_refused() {
    let dir = tempdir().expect("tempdir");
    assert!(save_mesh(&unit_cube(), dir.path().join("cube.step")).is_err());
}
