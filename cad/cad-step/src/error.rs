//! Error types for STEP conversion.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for STEP conversion.
pub type StepResult<T> = Result<T, StepError>;

/// One failed backend in a conversion chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAttempt {
    /// Backend name, as returned by `StepBackend::name`.
    pub backend: &'static str,
    /// Why it did not produce a mesh.
    pub reason: String,
}

impl fmt::Display for BackendAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)
    }
}

/// Errors raised while turning a STEP file into a mesh.
#[derive(Debug, Error)]
pub enum StepError {
    /// Input file does not exist.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Input does not carry a `.step` or `.stp` extension.
    #[error("not a STEP file (expected .step or .stp): {path}")]
    NotAStepFile {
        /// Offending path.
        path: PathBuf,
    },

    /// The backend's executable or module could not be found.
    #[error("{backend} is not installed")]
    BackendMissing {
        /// Backend name.
        backend: &'static str,
    },

    /// External process exceeded the time limit and was killed.
    #[error("{command} timed out after {}s", .limit.as_secs())]
    Timeout {
        /// Command line that was killed.
        command: String,
        /// Configured limit.
        limit: Duration,
    },

    /// External process exited unsuccessfully.
    #[error("{command} failed ({status}){}", stderr_suffix(.stderr))]
    ProcessFailed {
        /// Command line that ran.
        command: String,
        /// Exit status description.
        status: String,
        /// Last lines of standard error.
        stderr: String,
    },

    /// The process reported success but wrote no mesh.
    #[error("{backend} produced no mesh output")]
    EmptyOutput {
        /// Backend name.
        backend: &'static str,
    },

    /// The native kernel rejected the file.
    #[error("STEP parse error: {0}")]
    Parse(String),

    /// Every backend in the chain failed.
    #[error("no STEP backend could convert the file ({})", join_attempts(.attempts))]
    NoBackendAvailable {
        /// Per-backend failure reasons, in the order tried.
        attempts: Vec<BackendAttempt>,
    },

    /// Reading the intermediate mesh failed.
    #[error("mesh error: {0}")]
    Mesh(#[from] cad_io::IoError),

    /// I/O error from temp files or process spawning.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

fn join_attempts(attempts: &[BackendAttempt]) -> String {
    if attempts.is_empty() {
        return "no backends configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_failure_lists_every_attempt() {
        let err = StepError::NoBackendAvailable {
            attempts: vec![
                BackendAttempt {
                    backend: "freecad-cli",
                    reason: "FreeCAD CLI is not installed".into(),
                },
                BackendAttempt {
                    backend: "cadquery",
                    reason: "python3 failed (exit status: 1)".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("freecad-cli: FreeCAD CLI is not installed"));
        assert!(msg.contains("; cadquery: python3 failed"));
    }

    #[test]
    fn timeout_reports_seconds() {
        let err = StepError::Timeout {
            command: "freecadcmd".into(),
            limit: Duration::from_secs(120),
        };
        assert_eq!(err.to_string(), "freecadcmd timed out after 120s");
    }

    #[test]
    fn process_failure_without_stderr() {
        let err = StepError::ProcessFailed {
            command: "python3".into(),
            status: "exit status: 2".into(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "python3 failed (exit status: 2)");
    }
}
