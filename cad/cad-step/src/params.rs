//! Settings shared by the STEP backends.

use std::path::PathBuf;
use std::time::Duration;

/// Options for [`StepConverter`](crate::StepConverter) and its backends.
#[derive(Debug, Clone, PartialEq)]
pub struct StepParams {
    /// Wall-clock limit for each external process.
    /// Default: 120 seconds
    pub timeout: Duration,

    /// FreeCAD command tried before the usual install locations.
    pub freecad_command: Option<PathBuf>,

    /// Interpreter used for the CadQuery backend.
    /// Default: `python3`
    pub python_command: PathBuf,

    /// Distance below which tessellated vertices are merged.
    /// Default: `1e-6`
    pub weld_epsilon: f64,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            freecad_command: None,
            python_command: PathBuf::from("python3"),
            weld_epsilon: 1e-6,
        }
    }
}

impl StepParams {
    /// Set the per-process time limit.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Prefer a specific FreeCAD executable.
    #[must_use]
    pub fn with_freecad_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.freecad_command = Some(command.into());
        self
    }

    /// Use a specific Python interpreter for CadQuery.
    #[must_use]
    pub fn with_python_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.python_command = command.into();
        self
    }

    /// Set the weld distance; zero disables welding.
    #[must_use]
    pub const fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }
}
