//! cadview: turn CAD and mesh files into GLB for web viewers.
//!
//! # Commands
//!
//! - `cadview stl2glb <in.stl> <out.glb>` - STL to binary glTF
//! - `cadview step2glb <in.step> <out.glb>` - STEP to binary glTF via an installed CAD kernel
//! - `cadview convert <in> <out>` - any supported format to any other, by extension
//! - `cadview analyze <in>` - volume, area, topology and quality checks
//! - `cadview sample` - write a sample cube and run the whole pipeline on it
//! - `cadview doctor` - report which STEP backends are installed
//!
//! Logging goes to stderr. `-v` shows progress, `-vv` shows detail, and
//! `RUST_LOG` overrides both.

mod analyze;
mod convert;
mod doctor;
mod output;
mod sample;
mod step;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Convert CAD and mesh files to GLB
#[derive(Parser)]
#[command(name = "cadview")]
#[command(about = "Convert CAD and mesh files to GLB for web viewers", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (repeat for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where to find the external STEP backends.
#[derive(Args, Clone)]
struct BackendArgs {
    /// FreeCAD command to try before the usual install locations
    #[arg(long, env = "CADVIEW_FREECAD", value_name = "PATH")]
    freecad: Option<PathBuf>,

    /// Python interpreter with CadQuery installed
    #[arg(long, env = "CADVIEW_PYTHON", value_name = "PATH", default_value = "python3")]
    python: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an STL file to GLB
    Stl2glb {
        /// Input STL file
        input: PathBuf,
        /// Output GLB file
        output: PathBuf,
    },

    /// Convert a STEP file to GLB using FreeCAD, CadQuery or the built-in kernel
    Step2glb {
        /// Input STEP file (.step or .stp)
        input: PathBuf,
        /// Output GLB file
        output: PathBuf,

        /// Seconds each backend may run before it is killed
        #[arg(long, default_value_t = 120, value_name = "SECS")]
        timeout: u64,

        #[command(flatten)]
        backends: BackendArgs,
    },

    /// Convert between STL, OBJ, GLB (and from STEP) by file extension
    Convert {
        /// Input file
        input: PathBuf,
        /// Output file
        output: PathBuf,

        /// Write ASCII instead of binary STL
        #[arg(long)]
        ascii: bool,

        #[command(flatten)]
        backends: BackendArgs,
    },

    /// Print geometry and quality statistics for a mesh
    Analyze {
        /// Input file
        input: PathBuf,

        /// Emit JSON instead of a text report
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        backends: BackendArgs,
    },

    /// Write sample_cube.stl and run STL -> OBJ -> GLB plus analysis on it
    Sample {
        /// Directory for the generated files
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Check which STEP conversion backends are installed
    Doctor {
        #[command(flatten)]
        backends: BackendArgs,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Stl2glb { input, output } => convert::stl2glb(&input, &output),
        Commands::Step2glb {
            input,
            output,
            timeout,
            backends,
        } => step::step2glb(&input, &output, &backends.params(timeout)),
        Commands::Convert {
            input,
            output,
            ascii,
            backends,
        } => convert::run(&input, &output, ascii, &backends.params(step::DEFAULT_TIMEOUT_SECS)),
        Commands::Analyze {
            input,
            json,
            backends,
        } => analyze::run(&input, json, &backends.params(step::DEFAULT_TIMEOUT_SECS)),
        Commands::Sample { dir } => sample::run(&dir),
        Commands::Doctor { backends } => {
            doctor::run(&backends.params(step::DEFAULT_TIMEOUT_SECS));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
