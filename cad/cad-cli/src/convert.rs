//! `cadview stl2glb` and `cadview convert`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use cad_analysis::{AnalysisParams, weld_vertices};
use cad_io::MeshFormat;
use cad_step::StepParams;
use cad_types::IndexedMesh;
use owo_colors::OwoColorize;
use tracing::debug;

use crate::output::{banner, done, file_size_mb, rule, step, thousands};

/// Load any supported input, welding STL soup and tessellating STEP.
pub fn load_any(input: &Path, step_params: &StepParams) -> Result<IndexedMesh> {
    let format = cad_io::detect_format(input)?;
    if format == MeshFormat::Step {
        return Ok(crate::step::load(input, step_params)?.mesh);
    }

    let mut mesh =
        cad_io::load_mesh(input).with_context(|| format!("cannot read {}", input.display()))?;
    if format == MeshFormat::Stl {
        let merged = weld_vertices(&mut mesh, AnalysisParams::default().weld_epsilon);
        debug!(merged, "welded STL vertices");
    }
    Ok(mesh)
}

/// Write `mesh` by extension, adding normals for GLB.
pub fn save_any(mesh: &mut IndexedMesh, output: &Path, ascii_stl: bool) -> Result<()> {
    let format = cad_io::detect_format(output)?;
    if !format.can_write() {
        bail!("cannot write {format} files");
    }
    let written = match format {
        MeshFormat::Stl => cad_io::save_stl(mesh, output, !ascii_stl),
        MeshFormat::Glb => {
            mesh.compute_vertex_normals();
            cad_io::save_glb(mesh, output)
        }
        _ => cad_io::save_mesh(mesh, output),
    };
    written.with_context(|| format!("cannot write {}", output.display()))
}

pub fn stl2glb(input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        bail!("input file not found: {}", input.display());
    }
    if cad_io::detect_format(input)? != MeshFormat::Stl {
        bail!("input must be an .stl file: {}", input.display());
    }

    banner("STL to GLB Conversion");
    println!("Input:  {}", input.display());
    println!("Output: {}", output.display());
    rule();
    println!();

    step(&format!("Loading STL file: {}", input.display()));
    let mut mesh = load_any(input, &StepParams::default())?;
    println!("   Vertices: {}", thousands(mesh.vertices.len()));
    println!("   Faces: {}", thousands(mesh.faces.len()));

    step(&format!("Exporting to GLB: {}", output.display()));
    save_any(&mut mesh, output, false)?;
    done("Conversion successful");

    println!();
    rule();
    println!("{} GLB file created: {}", "✓".bright_green(), output.display());
    println!("   Size: {:.2} MB", file_size_mb(output)?);
    rule();
    Ok(())
}

pub fn run(input: &Path, output: &Path, ascii: bool, step_params: &StepParams) -> Result<()> {
    let from = cad_io::detect_format(input)?;
    let to = cad_io::detect_format(output)?;
    if ascii && to != MeshFormat::Stl {
        bail!("--ascii only applies to STL output");
    }

    let mut mesh = load_any(input, step_params)?;
    save_any(&mut mesh, output, ascii)?;

    println!(
        "{} {} -> {}: {} vertices, {} faces ({:.2} MB)",
        "✓".bright_green(),
        from,
        to,
        thousands(mesh.vertices.len()),
        thousands(mesh.faces.len()),
        file_size_mb(output)?
    );
    Ok(())
}
