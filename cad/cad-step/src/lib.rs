//! STEP to triangle mesh conversion.
//!
//! STEP files describe exact B-rep geometry; turning them into triangles
//! needs a CAD kernel. This crate drives whichever kernel is at hand:
//!
//! | Backend | Needs |
//! |---------|-------|
//! | [`TruckBackend`] | nothing (feature `truck`) |
//! | [`FreeCadCliBackend`] | FreeCAD's `freecadcmd` |
//! | [`CadQueryBackend`] | Python with `cadquery` |
//!
//! [`StepConverter`] tries them in that order and welds the result.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use cad_step::{StepConverter, StepParams};
//!
//! let params = StepParams::default().with_timeout(Duration::from_secs(300));
//! let outcome = StepConverter::new().convert("5X8_COUPLER.STEP", &params)?;
//! cad_io::save_glb(&outcome.mesh, "5X8_COUPLER.glb")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod backend;
mod cadquery;
mod converter;
mod error;
mod freecad;
mod params;
#[cfg(feature = "truck")]
mod truck;

pub use backend::StepBackend;
pub use cadquery::{CADQUERY_SCRIPT, CadQueryBackend};
pub use converter::{BackendStatus, StepConverter, StepOutcome, detect_backends, validate_step_path};
pub use error::{BackendAttempt, StepError, StepResult};
pub use freecad::{FREECAD_COMMANDS, FreeCadCliBackend, freecad_script};
pub use params::StepParams;
#[cfg(feature = "truck")]
pub use truck::TruckBackend;
