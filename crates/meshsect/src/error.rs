//! Error types for mesh sectioning.

use thiserror::Error;

/// Errors that can occur while sectioning a mesh.
///
/// Geometric degeneracies (no crossing triangles, unmatched segments,
/// collinear arc candidates) are not errors; they produce empty or
/// unsimplified output instead. Only malformed input buffers and invalid
/// settings are reported here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SectionError {
    /// Vertex buffer length is not a multiple of 3.
    #[error("vertex buffer length {0} is not a multiple of 3")]
    MalformedVertices(usize),

    /// Index buffer length is not a multiple of 3.
    #[error("index buffer length {0} is not a multiple of 3")]
    MalformedIndices(usize),

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        /// Triangle number.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Invalid section settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type for sectioning operations.
pub type Result<T> = std::result::Result<T, SectionError>;
