//! `cadview doctor`.

use cad_step::{StepConverter, StepParams};
use owo_colors::OwoColorize;

use crate::step::ONLINE_CONVERTER;

pub fn run(params: &StepParams) {
    println!("{}", "→ Checking STEP conversion backends...".bright_blue());

    let status = StepConverter::from_params(params).status();
    for backend in &status {
        if backend.available {
            println!("  ✓ {}", backend.name.bright_green());
        } else {
            println!("  ✗ {} - not found", backend.name.bright_red());
            if !backend.install_hint.is_empty() {
                println!("      install: {}", backend.install_hint);
            }
        }
    }

    println!();
    if status.iter().any(|b| b.available) {
        println!("{}", "step2glb is ready.".bright_green());
    } else {
        println!(
            "{}",
            "No STEP backend found; step2glb will fail until one is installed.".bright_yellow()
        );
        println!("Online alternative: {ONLINE_CONVERTER}");
    }
    println!("STL, OBJ and GLB conversion need no external tools.");
}
