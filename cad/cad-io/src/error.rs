//! Error types for mesh file I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for mesh file I/O.
pub type IoResult<T> = Result<T, IoError>;

/// Errors raised while reading or writing mesh files.
#[derive(Debug, Error)]
pub enum IoError {
    /// Input path does not exist.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// Extension not recognized.
    #[error("unknown file format: .{extension}")]
    UnknownFormat {
        /// Extension as given, or `(none)`.
        extension: String,
    },

    /// The format is known but this crate cannot perform the operation.
    #[error("{format} files cannot be {operation} by cad-io")]
    UnsupportedOperation {
        /// Format name.
        format: &'static str,
        /// `read` or `written`.
        operation: &'static str,
    },

    /// Structurally invalid content.
    #[error("invalid file content: {message}")]
    InvalidContent {
        /// What was wrong.
        message: String,
    },

    /// Header shorter than the format requires.
    #[error("invalid header: expected {expected} bytes, got {got}")]
    InvalidHeader {
        /// Required length.
        expected: usize,
        /// Available length.
        got: usize,
    },

    /// Binary STL ended before the declared number of triangles.
    #[error("invalid face count: header declares {expected}, file holds {got}")]
    InvalidFaceCount {
        /// Count from the header.
        expected: u32,
        /// Complete triangles actually read.
        got: u32,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad float literal in a text format.
    #[error("float parsing error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// Bad integer literal in a text format.
    #[error("integer parsing error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// GLB JSON chunk could not be (de)serialized.
    #[error("glTF JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IoError {
    /// Shorthand for [`IoError::InvalidContent`].
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }

    /// Map an open failure on `path`, turning `NotFound` into [`IoError::FileNotFound`].
    pub(crate) fn from_open(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}
