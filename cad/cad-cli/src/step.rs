//! `cadview step2glb` and STEP input for the other commands.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use cad_step::{StepConverter, StepError, StepOutcome, StepParams};
use owo_colors::OwoColorize;

use crate::BackendArgs;
use crate::output::{banner, file_size_mb, rule, rule_line, thousands};

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Browser-based fallback for machines with no CAD kernel.
pub const ONLINE_CONVERTER: &str = "https://anyconv.com/step-to-stl-converter/";

impl BackendArgs {
    pub fn params(&self, timeout_secs: u64) -> StepParams {
        let mut params = StepParams::default()
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_python_command(&self.python);
        params.freecad_command.clone_from(&self.freecad);
        params
    }
}

/// Tessellate a STEP file, printing install help when no backend works.
pub fn load(input: &Path, params: &StepParams) -> Result<StepOutcome> {
    match StepConverter::from_params(params).convert(input, params) {
        Ok(outcome) => Ok(outcome),
        Err(e @ StepError::NoBackendAvailable { .. }) => {
            print_install_help();
            Err(e.into())
        }
        Err(e) => Err(e).with_context(|| format!("cannot convert {}", input.display())),
    }
}

pub fn step2glb(input: &Path, output: &Path, params: &StepParams) -> Result<()> {
    cad_step::validate_step_path(input)?;

    banner("STEP to GLB Direct Conversion");
    println!("Input:  {}", input.display());
    println!("Output: {}", output.display());
    println!("Size:   {:.2} MB", file_size_mb(input)?);
    rule();
    println!();

    let StepOutcome { mut mesh, backend } = load(input, params)?;
    println!(
        "{} converted with {}",
        "✓".bright_green(),
        backend.bright_cyan()
    );
    println!("   Vertices: {}", thousands(mesh.vertices.len()));
    println!("   Faces: {}", thousands(mesh.faces.len()));

    mesh.compute_vertex_normals();
    cad_io::save_glb(&mesh, output)
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!();
    rule();
    println!("{}", "✓ CONVERSION COMPLETE".bright_green().bold());
    rule();
    println!("GLB file created: {}", output.display());
    println!("File size: {:.2} MB", file_size_mb(output)?);
    Ok(())
}

/// Written to stderr so `analyze --json` keeps stdout parseable.
fn print_install_help() {
    eprintln!();
    eprintln!("{}", rule_line());
    eprintln!("{}", "✗ CONVERSION FAILED".bright_red().bold());
    eprintln!("{}", rule_line());
    eprintln!("No suitable converter found. Install one of:");
    eprintln!("  1. FreeCAD:  brew install --cask freecad   (Linux: sudo apt install freecad)");
    eprintln!("  2. CadQuery: conda install -c conda-forge cadquery");
    eprintln!();
    eprintln!("Or use an online converter:");
    eprintln!("  - {ONLINE_CONVERTER}");
    eprintln!("  - then: cadview stl2glb input.stl output.glb");
    eprintln!();
}
