//! The backend trait and the process plumbing the external backends share.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use cad_types::IndexedMesh;
use tracing::{debug, warn};

use crate::error::{StepError, StepResult};
use crate::params::StepParams;

/// Something that can tessellate a STEP file.
pub trait StepBackend {
    /// Short stable identifier, used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Whether the backend can run on this machine right now.
    fn is_available(&self) -> bool;

    /// Convert `step` into a triangle mesh.
    ///
    /// # Errors
    ///
    /// Backend-specific; see [`StepError`].
    fn convert(&self, step: &Path, params: &StepParams) -> StepResult<IndexedMesh>;

    /// How to install whatever the backend depends on.
    fn install_hint(&self) -> &'static str {
        ""
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_TAIL_LINES: usize = 5;

/// Run `command` with `args`, killing it once `limit` has passed.
///
/// Standard output is discarded. Standard error goes to `stderr_log` so a
/// chatty child cannot fill a pipe and stall; its tail is attached to
/// [`StepError::ProcessFailed`].
pub(crate) fn run_with_timeout<I, S>(
    command: &Path,
    args: I,
    limit: Duration,
    stderr_log: &Path,
) -> StepResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let label = command.display().to_string();
    let log = File::create(stderr_log)?;

    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(log)
        .spawn()?;
    debug!(command = %label, pid = child.id(), "spawned");

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= limit {
            warn!(command = %label, seconds = limit.as_secs(), "timed out, killing");
            child.kill()?;
            child.wait()?;
            return Err(StepError::Timeout {
                command: label,
                limit,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    if status.success() {
        debug!(command = %label, elapsed_ms = started.elapsed().as_millis(), "finished");
        return Ok(());
    }
    Err(StepError::ProcessFailed {
        command: label,
        status: status.to_string(),
        stderr: stderr_tail(stderr_log),
    })
}

fn stderr_tail(path: &Path) -> String {
    let text = fs::read_to_string(path).unwrap_or_default();
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join(" | ")
}

/// Load the STL a backend wrote, treating a missing or empty file as failure.
pub(crate) fn read_output_stl(backend: &'static str, path: &Path) -> StepResult<IndexedMesh> {
    let written = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if written == 0 {
        return Err(StepError::EmptyOutput { backend });
    }
    let mesh = cad_io::load_stl(path)?;
    if mesh.faces.is_empty() {
        return Err(StepError::EmptyOutput { backend });
    }
    Ok(mesh)
}

/// Resolve a command name or path to an executable on this machine.
///
/// Bare names go through `PATH`; anything with a separator must exist.
pub(crate) fn resolve_command(command: &Path) -> Option<PathBuf> {
    if command.components().count() > 1 {
        return command.is_file().then(|| command.to_path_buf());
    }
    which::which(command).ok()
}

/// Render a path as a double-quoted Python string literal.
pub(crate) fn python_literal(path: &Path) -> String {
    let mut out = String::from("\"");
    for c in path.to_string_lossy().chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}


/// Stand-in executables for exercising the external backends.
#[cfg(all(test, unix))]
pub(crate) mod fake_tools {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// One facet, enough for the STL reader to return a non-empty mesh.
    pub(crate) const TRIANGLE_STL: &str = "\
solid fake
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid fake
";

    /// Write `body` as an executable `/bin/sh` script.
    pub(crate) fn shell_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// A STEP file the fakes never actually parse.
    pub(crate) fn step_file(dir: &Path) -> PathBuf {
        let path = dir.join("part.step");
        fs::write(&path, "ISO-10303-21;\nEND-ISO-10303-21;\n").unwrap();
        path
    }
}
