#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("cadview").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("CADVIEW_FREECAD")
        .env_remove("CADVIEW_PYTHON");
    cmd
}

fn sample(dir: &Path) {
    cmd()
        .args(["sample", "--dir"])
        .arg(dir)
        .assert()
        .success();
}

#[test]
fn help_lists_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("stl2glb"))
        .stdout(contains("step2glb"))
        .stdout(contains("doctor"));
}

#[test]
fn sample_runs_whole_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .args(["sample", "--dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("Vertices: 8"))
        .stdout(contains("Watertight: Yes"))
        .stdout(contains("Convex: Yes"))
        .stdout(contains("Model fills 100.00% of bounding box"));

    for name in ["sample_cube.stl", "sample_cube.obj", "sample_cube.glb"] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }
}

#[test]
fn stl2glb_reports_counts_and_size() {
    let dir = tempfile::tempdir().unwrap();
    sample(dir.path());
    let out = dir.path().join("cube.glb");

    cmd()
        .arg("stl2glb")
        .arg(dir.path().join("sample_cube.stl"))
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("Vertices: 8"))
        .stdout(contains("Faces: 12"))
        .stdout(contains("MB"));

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[..4], b"glTF");
}

#[test]
fn stl2glb_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .arg("stl2glb")
        .arg(dir.path().join("nope.stl"))
        .arg(dir.path().join("out.glb"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("not found"));
}

#[test]
fn convert_between_formats() {
    let dir = tempfile::tempdir().unwrap();
    sample(dir.path());
    let ascii = dir.path().join("roundtrip.stl");

    cmd()
        .arg("convert")
        .arg(dir.path().join("sample_cube.obj"))
        .arg(&ascii)
        .arg("--ascii")
        .assert()
        .success()
        .stdout(contains("OBJ -> STL"));

    let text = std::fs::read_to_string(&ascii).unwrap();
    assert!(text.starts_with("solid"));
}

#[test]
fn convert_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    sample(dir.path());
    cmd()
        .arg("convert")
        .arg(dir.path().join("sample_cube.stl"))
        .arg(dir.path().join("cube.ply"))
        .assert()
        .failure()
        .stderr(contains("unknown file format"));
}

#[test]
fn analyze_json() {
    let dir = tempfile::tempdir().unwrap();
    sample(dir.path());

    let output = cmd()
        .arg("analyze")
        .arg(dir.path().join("sample_cube.glb"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["face_count"], 12);
    assert_eq!(report["euler_number"], 2);
    assert_eq!(report["is_convex"], true);
}

#[test]
fn analyze_text() {
    let dir = tempfile::tempdir().unwrap();
    sample(dir.path());
    cmd()
        .arg("analyze")
        .arg(dir.path().join("sample_cube.stl"))
        .assert()
        .success()
        .stdout(contains("Euler Number: 2"))
        .stdout(contains("Genus (holes): 0"));
}

#[test]
fn step2glb_rejects_non_step_input() {
    let dir = tempfile::tempdir().unwrap();
    sample(dir.path());
    cmd()
        .arg("step2glb")
        .arg(dir.path().join("sample_cube.stl"))
        .arg(dir.path().join("out.glb"))
        .assert()
        .failure()
        .stderr(contains("not a STEP file"));
}

#[test]
fn step2glb_without_backends_suggests_alternatives() {
    let dir = tempfile::tempdir().unwrap();
    let step = dir.path().join("part.step");
    std::fs::write(&step, "not really ISO-10303-21").unwrap();

    cmd()
        .arg("step2glb")
        .arg(&step)
        .arg(dir.path().join("part.glb"))
        .args(["--timeout", "20"])
        .env("CADVIEW_PYTHON", "cadview-no-such-python")
        .assert()
        .failure()
        .code(1)
        .stdout(contains("STEP to GLB Direct Conversion"))
        .stderr(contains("anyconv.com"))
        .stderr(contains("no STEP backend could convert the file"));

    assert!(!dir.path().join("part.glb").exists());
}

#[test]
fn analyze_json_keeps_stdout_clean_when_step_fails() {
    let dir = tempfile::tempdir().unwrap();
    let step = dir.path().join("part.step");
    std::fs::write(&step, "not really ISO-10303-21").unwrap();

    cmd()
        .arg("analyze")
        .arg(&step)
        .arg("--json")
        .env("CADVIEW_PYTHON", "cadview-no-such-python")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(contains("CONVERSION FAILED"))
        .stderr(contains("no STEP backend could convert the file"));
}

#[test]
fn doctor_lists_backends() {
    cmd()
        .arg("doctor")
        .env("CADVIEW_PYTHON", "cadview-no-such-python")
        .assert()
        .success()
        .stdout(contains("freecad-cli"))
        .stdout(contains("cadquery").and(contains("conda install")));
}
