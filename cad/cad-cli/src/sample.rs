//! `cadview sample`: a self-contained run of the STL -> OBJ -> GLB pipeline.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cad_analysis::analyze;
use cad_step::StepParams;
use cad_types::unit_cube;
use owo_colors::OwoColorize;

use crate::convert::{load_any, save_any};
use crate::output::{banner, done, rule, step};

pub const SAMPLE_NAME: &str = "sample_cube.stl";

pub fn run(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let stl = dir.join(SAMPLE_NAME);
    let obj = stl.with_extension("obj");
    let glb = stl.with_extension("glb");

    banner("3D File Conversion Pipeline Test");
    cad_io::save_stl(&unit_cube(), &stl, true)
        .with_context(|| format!("cannot write {}", stl.display()))?;
    done(&format!("Created sample STL: {}", stl.display()));

    println!();
    step("Loading STL file...");
    let mut mesh = load_any(&stl, &StepParams::default())?;
    println!("   Vertices: {}", mesh.vertices.len());
    println!("   Faces: {}", mesh.faces.len());

    step("Converting to OBJ...");
    save_any(&mut mesh, &obj, false)?;
    done(&format!("Saved: {}", obj.display()));

    step("Converting to GLB...");
    save_any(&mut mesh, &glb, false)?;
    done(&format!("Saved: {}", glb.display()));

    step("Extracting geometric data...");
    let report = analyze(&mesh)?;
    println!();
    print!("{report}");

    println!();
    rule();
    println!("{}", "Test completed successfully!".bright_green().bold());
    rule();
    println!("Generated files:");
    println!("  - {} (STL)", stl.display());
    println!("  - {} (OBJ)", obj.display());
    println!("  - {} (GLB)", glb.display());
    Ok(())
}
