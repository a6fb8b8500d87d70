//! Error types for meshlens.
//!
//! Every fallible operation in the library returns [`Result`], which uses
//! [`MeshError`] as its error type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while loading, processing or displaying a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices (degenerate triangle).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// The same directed edge is used by two faces.
    ///
    /// This happens for edges shared by more than two faces, or for two
    /// neighboring faces with inconsistent orientation.
    #[error("edge ({v0}, {v1}) is used by more than one face in the same direction")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Faces around a vertex do not form a single fan.
    #[error("non-manifold mesh: {details}")]
    NonManifold {
        /// Description of the non-manifold condition.
        details: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// The mesh is closed, but the operation needs a boundary.
    #[error("mesh has no boundary")]
    NoBoundary,

    /// Algorithm failed to converge.
    #[error("algorithm failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// A per-vertex quantity does not match the number of vertices.
    #[error("quantity \"{name}\" has {actual} entries, expected {expected}")]
    QuantityLength {
        /// Quantity name.
        name: String,
        /// Number of vertices of the structure.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },

    /// No structure with this name is registered in the scene.
    #[error("no structure named \"{0}\" is registered")]
    UnknownStructure(String),
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn load<P: Into<PathBuf>, M: ToString>(path: P, message: M) -> Self {
        MeshError::LoadError {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn save<P: Into<PathBuf>, M: ToString>(path: P, message: M) -> Self {
        MeshError::SaveError {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = MeshError::InvalidVertexIndex { face: 3, vertex: 10 };
        assert_eq!(e.to_string(), "face 3 references invalid vertex index 10");

        let e = MeshError::invalid_param("source", 42, "vertex index out of range");
        assert_eq!(
            e.to_string(),
            "invalid parameter: source = 42 (vertex index out of range)"
        );

        assert_eq!(MeshError::NoBoundary.to_string(), "mesh has no boundary");
    }
}
