//! FreeCAD command-line backend.
//!
//! FreeCAD ships a headless interpreter (`freecadcmd`, spelled differently
//! per platform) that runs a Python script and exits. The script imports
//! the STEP document and exports every shape through FreeCAD's mesher.

use std::fs;
use std::path::{Path, PathBuf};

use cad_types::IndexedMesh;
use tracing::{debug, info, warn};

use crate::backend::{StepBackend, python_literal, read_output_stl, resolve_command, run_with_timeout};
use crate::error::{StepError, StepResult};
use crate::params::StepParams;

/// Command names and install locations tried in order.
pub const FREECAD_COMMANDS: &[&str] = &[
    "freecadcmd",
    "FreeCADCmd",
    "/Applications/FreeCAD.app/Contents/MacOS/FreeCAD",
    "freecad",
];

/// Tessellates through a FreeCAD installation.
#[derive(Debug, Clone, Default)]
pub struct FreeCadCliBackend {
    command: Option<PathBuf>,
}

impl FreeCadCliBackend {
    /// Backend that searches the usual command names.
    #[must_use]
    pub const fn new() -> Self {
        Self { command: None }
    }

    /// Backend that tries `command` before the usual names.
    #[must_use]
    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }

    /// Executables that exist on this machine, override first, deduplicated.
    fn candidates(&self, params: &StepParams) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = Vec::new();
        let overrides = self.command.iter().chain(params.freecad_command.iter());
        let defaults = FREECAD_COMMANDS.iter().map(|c| PathBuf::from(*c));
        for name in overrides.cloned().chain(defaults) {
            if let Some(path) = resolve_command(&name) {
                if !found.contains(&path) {
                    found.push(path);
                }
            }
        }
        found
    }
}

/// Script handed to `freecadcmd`.
#[must_use]
pub fn freecad_script(step: &Path, stl: &Path) -> String {
    format!(
        r#"import FreeCAD
import Import
import Mesh

doc = FreeCAD.newDocument("cadview")
Import.insert({step}, doc.Name)
shapes = [obj for obj in doc.Objects if hasattr(obj, "Shape")]
Mesh.export(shapes, {stl})
FreeCAD.closeDocument(doc.Name)
"#,
        step = python_literal(step),
        stl = python_literal(stl),
    )
}

impl StepBackend for FreeCadCliBackend {
    fn name(&self) -> &'static str {
        "freecad-cli"
    }

    fn is_available(&self) -> bool {
        !self.candidates(&StepParams::default()).is_empty()
    }

    fn convert(&self, step: &Path, params: &StepParams) -> StepResult<IndexedMesh> {
        let candidates = self.candidates(params);
        if candidates.is_empty() {
            return Err(StepError::BackendMissing {
                backend: self.name(),
            });
        }

        let step = step.canonicalize()?;
        let workdir = tempfile::Builder::new().prefix("cadview-freecad").tempdir()?;
        let script = workdir.path().join("convert.py");
        let stl = workdir.path().join("out.stl");
        let log = workdir.path().join("stderr.log");
        fs::write(&script, freecad_script(&step, &stl))?;

        let mut last_error = None;
        for command in candidates {
            debug!(command = %command.display(), "trying FreeCAD");
            let _ = fs::remove_file(&stl);
            let outcome = run_with_timeout(&command, [&script], params.timeout, &log)
                .and_then(|()| read_output_stl(self.name(), &stl));
            match outcome {
                Ok(mesh) => {
                    info!(command = %command.display(), faces = mesh.faces.len(), "FreeCAD conversion succeeded");
                    return Ok(mesh);
                }
                Err(e) => {
                    warn!(command = %command.display(), error = %e, "FreeCAD attempt failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(StepError::BackendMissing {
            backend: self.name(),
        }))
    }

    fn install_hint(&self) -> &'static str {
        "macOS: brew install --cask freecad | Linux: sudo apt install freecad | Windows: https://www.freecad.org/downloads.php"
    }
}
