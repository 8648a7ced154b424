//! `cadview analyze`.

use std::path::Path;

use anyhow::{Context, Result};
use cad_analysis::{AnalysisParams, analyze_with_params};
use cad_io::MeshFormat;
use cad_step::StepParams;

use crate::convert::load_any;

pub fn run(input: &Path, json: bool, step_params: &StepParams) -> Result<()> {
    let mesh = load_any(input, step_params)?;

    let params = if MeshFormat::from_path(input) == Some(MeshFormat::Step) {
        AnalysisParams::for_cad()
    } else {
        AnalysisParams::default()
    };
    let report = analyze_with_params(&mesh, &params)
        .with_context(|| format!("cannot analyze {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File: {}", input.display());
        print!("{report}");
    }
    Ok(())
}
