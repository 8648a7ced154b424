//! CadQuery backend: OpenCascade through a Python interpreter that has the
//! `cadquery` package installed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cad_types::IndexedMesh;
use tracing::{debug, info};

use crate::backend::{StepBackend, read_output_stl, resolve_command, run_with_timeout};
use crate::error::{StepError, StepResult};
use crate::params::StepParams;

/// Import probes are given this long; loading OpenCascade is slow on a cold
/// cache.
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Reads the STEP path and output path from `argv`.
pub const CADQUERY_SCRIPT: &str = "\
import sys
import cadquery as cq

shape = cq.importers.importStep(sys.argv[1])
cq.exporters.export(shape, sys.argv[2])
";

/// Tessellates with CadQuery.
#[derive(Debug, Clone)]
pub struct CadQueryBackend {
    python: PathBuf,
}

impl Default for CadQueryBackend {
    fn default() -> Self {
        Self::new(StepParams::default().python_command)
    }
}

impl CadQueryBackend {
    /// Backend probing `python` for the `cadquery` module.
    #[must_use]
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// The interpreter `params` asks for, or the one this backend was built with.
    fn interpreter<'a>(&'a self, params: &'a StepParams) -> &'a Path {
        if params.python_command == StepParams::default().python_command {
            &self.python
        } else {
            &params.python_command
        }
    }

    fn import_probe(python: &Path) -> StepResult<()> {
        let workdir = tempfile::Builder::new().prefix("cadview-probe").tempdir()?;
        run_with_timeout(
            python,
            ["-c", "import cadquery"],
            PROBE_TIMEOUT,
            &workdir.path().join("stderr.log"),
        )
    }
}

impl StepBackend for CadQueryBackend {
    fn name(&self) -> &'static str {
        "cadquery"
    }

    fn is_available(&self) -> bool {
        resolve_command(&self.python).is_some_and(|python| Self::import_probe(&python).is_ok())
    }

    fn convert(&self, step: &Path, params: &StepParams) -> StepResult<IndexedMesh> {
        let Some(python) = resolve_command(self.interpreter(params)) else {
            return Err(StepError::BackendMissing {
                backend: self.name(),
            });
        };

        let workdir = tempfile::Builder::new().prefix("cadview-cadquery").tempdir()?;
        let script = workdir.path().join("convert.py");
        let stl = workdir.path().join("out.stl");
        fs::write(&script, CADQUERY_SCRIPT)?;

        debug!(python = %python.display(), "running CadQuery");
        run_with_timeout(
            &python,
            [script.as_os_str(), step.as_os_str(), stl.as_os_str()],
            params.timeout,
            &workdir.path().join("stderr.log"),
        )?;

        let mesh = read_output_stl(self.name(), &stl)?;
        info!(faces = mesh.faces.len(), "CadQuery conversion succeeded");
        Ok(mesh)
    }

    fn install_hint(&self) -> &'static str {
        "conda install -c conda-forge cadquery"
    }
}
