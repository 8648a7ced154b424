//! Error types for mesh analysis.

use thiserror::Error;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors raised when a mesh cannot be analyzed.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No faces to analyze.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A face points past the vertex buffer.
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidIndex {
        /// Offending index.
        index: u32,
        /// Vertex buffer length.
        vertex_count: usize,
    },
}
