//! Backend chain.

use std::path::Path;

use cad_analysis::weld_vertices;
use cad_io::MeshFormat;
use cad_types::IndexedMesh;
use tracing::{info, instrument, warn};

use crate::backend::StepBackend;
use crate::cadquery::CadQueryBackend;
use crate::error::{BackendAttempt, StepError, StepResult};
use crate::freecad::FreeCadCliBackend;
use crate::params::StepParams;

/// A tessellated STEP file and the backend that produced it.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Welded triangle mesh.
    pub mesh: IndexedMesh,
    /// Name of the backend that succeeded.
    pub backend: &'static str,
}

/// Whether a backend is usable, for `cadview doctor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStatus {
    /// Backend name.
    pub name: &'static str,
    /// Result of [`StepBackend::is_available`].
    pub available: bool,
    /// Install instructions.
    pub install_hint: &'static str,
}

/// Tries backends in order until one produces a mesh.
///
/// The default chain is the native truck kernel (when built with the
/// `truck` feature), then the FreeCAD command line, then CadQuery.
///
/// ```no_run
/// use cad_step::{StepConverter, StepParams};
///
/// let outcome = StepConverter::new()
///     .convert("coupler.step", &StepParams::default())
///     .unwrap();
/// println!("{} faces via {}", outcome.mesh.faces.len(), outcome.backend);
/// ```
pub struct StepConverter {
    backends: Vec<Box<dyn StepBackend>>,
}

impl Default for StepConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StepConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.backends.iter().map(|b| b.name()))
            .finish()
    }
}

impl StepConverter {
    /// The default chain.
    #[must_use]
    pub fn new() -> Self {
        Self::from_params(&StepParams::default())
    }

    /// The default chain, with the executables `params` names baked in so
    /// that [`status`](Self::status) reflects them.
    #[must_use]
    pub fn from_params(params: &StepParams) -> Self {
        let mut backends: Vec<Box<dyn StepBackend>> = Vec::new();
        #[cfg(feature = "truck")]
        backends.push(Box::new(crate::truck::TruckBackend));
        backends.push(Box::new(match &params.freecad_command {
            Some(command) => FreeCadCliBackend::with_command(command),
            None => FreeCadCliBackend::new(),
        }));
        backends.push(Box::new(CadQueryBackend::new(&params.python_command)));
        Self { backends }
    }

    /// A chain of exactly `backends`, in order.
    #[must_use]
    pub fn with_backends(backends: Vec<Box<dyn StepBackend>>) -> Self {
        Self { backends }
    }

    /// Append a backend to the end of the chain.
    pub fn push(&mut self, backend: Box<dyn StepBackend>) {
        self.backends.push(backend);
    }

    /// Backend names in the order they are tried.
    #[must_use]
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Availability of every backend in the chain.
    #[must_use]
    pub fn status(&self) -> Vec<BackendStatus> {
        self.backends
            .iter()
            .map(|b| BackendStatus {
                name: b.name(),
                available: b.is_available(),
                install_hint: b.install_hint(),
            })
            .collect()
    }

    /// Convert `path`, returning the first backend's success.
    ///
    /// # Errors
    ///
    /// [`StepError::FileNotFound`] or [`StepError::NotAStepFile`] for bad
    /// input, otherwise [`StepError::NoBackendAvailable`] listing why each
    /// backend failed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn convert<P: AsRef<Path>>(&self, path: P, params: &StepParams) -> StepResult<StepOutcome> {
        let path = path.as_ref();
        validate_step_path(path)?;

        let mut attempts = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            info!(backend = backend.name(), "attempting conversion");
            match backend.convert(path, params) {
                Ok(mut mesh) => {
                    if params.weld_epsilon > 0.0 {
                        weld_vertices(&mut mesh, params.weld_epsilon);
                    }
                    info!(
                        backend = backend.name(),
                        vertices = mesh.vertices.len(),
                        faces = mesh.faces.len(),
                        "STEP converted"
                    );
                    return Ok(StepOutcome {
                        mesh,
                        backend: backend.name(),
                    });
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "backend failed");
                    attempts.push(BackendAttempt {
                        backend: backend.name(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Err(StepError::NoBackendAvailable { attempts })
    }
}

/// Check that `path` exists and looks like a STEP file.
///
/// # Errors
///
/// [`StepError::FileNotFound`] or [`StepError::NotAStepFile`].
pub fn validate_step_path(path: &Path) -> StepResult<()> {
    if !path.is_file() {
        return Err(StepError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if MeshFormat::from_path(path) != Some(MeshFormat::Step) {
        return Err(StepError::NotAStepFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Availability of the default chain.
#[must_use]
pub fn detect_backends() -> Vec<BackendStatus> {
    StepConverter::new().status()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cad_types::{MeshTopology, Vertex, unit_cube};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Failing(&'static str);

    impl StepBackend for Failing {
        fn name(&self) -> &'static str {
            self.0
        }
        fn is_available(&self) -> bool {
            false
        }
        fn convert(&self, _: &Path, _: &StepParams) -> StepResult<IndexedMesh> {
            Err(StepError::BackendMissing { backend: self.0 })
        }
    }

    /// Returns triangle soup of the unit cube and counts calls.
    struct Soup(Rc<Cell<usize>>);

    impl StepBackend for Soup {
        fn name(&self) -> &'static str {
            "soup"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn convert(&self, _: &Path, _: &StepParams) -> StepResult<IndexedMesh> {
            self.0.set(self.0.get() + 1);
            let mut soup = IndexedMesh::new();
            for tri in unit_cube().triangles() {
                let base = soup.vertices.len() as u32;
                soup.vertices.extend([tri.v0, tri.v1, tri.v2].map(Vertex::new));
                soup.faces.push([base, base + 1, base + 2]);
            }
            Ok(soup)
        }
    }

    fn step_file(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "ISO-10303-21;\nEND-ISO-10303-21;\n").unwrap();
        path
    }

    #[test]
    fn falls_through_to_first_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = step_file(&dir, "part.STEP");
        let calls = Rc::new(Cell::new(0));
        let converter = StepConverter::with_backends(vec![
            Box::new(Failing("first")),
            Box::new(Soup(Rc::clone(&calls))),
            Box::new(Soup(Rc::clone(&calls))),
        ]);

        let outcome = converter.convert(&path, &StepParams::default()).unwrap();
        assert_eq!(outcome.backend, "soup");
        assert_eq!(calls.get(), 1);
        assert_eq!(outcome.mesh.vertex_count(), 8);
        assert_eq!(outcome.mesh.face_count(), 12);
    }

    #[test]
    fn weld_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = step_file(&dir, "part.stp");
        let converter =
            StepConverter::with_backends(vec![Box::new(Soup(Rc::new(Cell::new(0))))]);
        let params = StepParams::default().with_weld_epsilon(0.0);
        let outcome = converter.convert(&path, &params).unwrap();
        assert_eq!(outcome.mesh.vertex_count(), 36);
    }

    #[test]
    fn all_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = step_file(&dir, "part.step");
        let converter =
            StepConverter::with_backends(vec![Box::new(Failing("a")), Box::new(Failing("b"))]);

        match converter.convert(&path, &StepParams::default()) {
            Err(StepError::NoBackendAvailable { attempts }) => {
                let names: Vec<_> = attempts.iter().map(|a| a.backend).collect();
                assert_eq!(names, ["a", "b"]);
                assert!(attempts[0].reason.contains("not installed"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_chain_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = step_file(&dir, "part.step");
        let err = StepConverter::with_backends(Vec::new())
            .convert(&path, &StepParams::default())
            .unwrap_err();
        assert!(err.to_string().contains("no backends configured"));
    }

    #[test]
    fn input_validation() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_step_path(&dir.path().join("missing.step")),
            Err(StepError::FileNotFound { .. })
        ));
        let stl = step_file(&dir, "part.stl");
        assert!(matches!(
            validate_step_path(&stl),
            Err(StepError::NotAStepFile { .. })
        ));
        assert!(validate_step_path(&step_file(&dir, "PART.Stp")).is_ok());
        assert!(matches!(
            validate_step_path(dir.path()),
            Err(StepError::FileNotFound { .. })
        ));
    }

    #[test]
    fn default_chain_order() {
        let names = StepConverter::new().backend_names();
        let tail = &names[names.len() - 2..];
        assert_eq!(tail, ["freecad-cli", "cadquery"]);
        #[cfg(feature = "truck")]
        assert_eq!(names[0], "truck");
    }

    #[test]
    fn params_reach_the_backends() {
        let params = StepParams::default()
            .with_freecad_command("/nonexistent/freecadcmd")
            .with_python_command("cadview-no-such-python");
        let status = StepConverter::from_params(&params).status();
        let cadquery = status.iter().find(|s| s.name == "cadquery").unwrap();
        assert!(!cadquery.available);
        assert!(!cadquery.install_hint.is_empty());
    }

    #[test]
    fn stub_status() {
        let converter = StepConverter::with_backends(vec![Box::new(Failing("x"))]);
        assert_eq!(
            converter.status(),
            vec![BackendStatus {
                name: "x",
                available: false,
                install_hint: "",
            }]
        );
    }
}
