//! Error types for meshwork.
//!
//! Every fallible operation in the crate returns [`Result`]. Preconditions are
//! checked before any mutation, so an `Err` always leaves the mesh untouched.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A numeric argument is outside its valid range.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// A vertex position has a non-finite component.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The requested edit is structurally impossible.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A deletion is blocked by live references to the primitive.
    #[error("{what} is still referenced by {count} face(s)")]
    DependentData {
        /// The primitive that could not be removed.
        what: String,
        /// Number of faces still referencing it.
        count: usize,
    },

    /// A numeric formula hit a zero-length or zero-area configuration.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A vertex key is not present in the mesh.
    #[error("vertex {0} does not exist")]
    VertexNotFound(usize),

    /// A face key is not present in the mesh.
    #[error("face {0} does not exist")]
    FaceNotFound(usize),

    /// A directed half-edge is not present in the mesh.
    #[error("edge ({u}, {v}) does not exist")]
    EdgeNotFound {
        /// Origin vertex.
        u: usize,
        /// Destination vertex.
        v: usize,
    },

    /// A mesh snapshot could not be encoded or decoded.
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
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

    /// Create an invalid topology error.
    pub fn topology(message: impl Into<String>) -> Self {
        MeshError::InvalidTopology(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_message() {
        let e = MeshError::invalid_param("t", 1.5, "must lie strictly between 0 and 1");
        assert_eq!(
            e.to_string(),
            "invalid parameter: t = 1.5 (must lie strictly between 0 and 1)"
        );
    }

    #[test]
    fn test_dependent_data_message() {
        let e = MeshError::DependentData {
            what: "vertex V(2)".to_string(),
            count: 3,
        };
        assert_eq!(e.to_string(), "vertex V(2) is still referenced by 3 face(s)");
    }
}
