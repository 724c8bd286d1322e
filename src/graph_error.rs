//! GraphError: Unified error type for spatial-graph public APIs
//!
//! Structural operations (editor, edit buffer) fail fast with one of these
//! variants and leave their input untouched. Validation entry points return
//! diagnostics instead; see [`crate::graph::validation`].

use crate::data::domain::Domain;
use crate::data::field::ScalarType;
use thiserror::Error;

/// Unified error type for spatial-graph operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// A field's row count disagrees with its bound domain size.
    #[error("Shape mismatch for field `{name}` ({domain}): expected {expected} rows, found {found}")]
    ShapeMismatch {
        name: String,
        domain: Domain,
        expected: usize,
        found: usize,
    },
    /// A node/edge/point index argument is outside current domain bounds.
    #[error("Index {index} out of range for {domain} domain of size {len}")]
    IndexOutOfRange {
        domain: Domain,
        index: usize,
        len: usize,
    },
    /// The requested edit would produce, or operate on, degenerate structure.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
    /// An attribute required by the operation is absent.
    #[error("Missing required field: {0}")]
    MissingField(String),
    /// A traversal exceeded its bounded-iteration guard.
    #[error("Iteration limit of {limit} exceeded in {context}")]
    IterationLimitExceeded { context: &'static str, limit: usize },
    /// Lookup of a field name that is not declared in the store.
    #[error("Field `{0}` not found")]
    FieldNotFound(String),
    /// Declaring a field whose name is already in use.
    #[error("Field `{0}` is already declared")]
    DuplicateField(String),
    /// Data of one scalar type supplied for a field of another.
    #[error("Field `{name}` holds {expected} data, got {found}")]
    FieldTypeMismatch {
        name: String,
        expected: ScalarType,
        found: ScalarType,
    },
}

impl GraphError {
    /// Shorthand for an out-of-range vertex index.
    pub(crate) fn node_out_of_range(index: usize, len: usize) -> Self {
        GraphError::IndexOutOfRange {
            domain: Domain::Vertex,
            index,
            len,
        }
    }

    /// Shorthand for an out-of-range edge index.
    pub(crate) fn edge_out_of_range(index: usize, len: usize) -> Self {
        GraphError::IndexOutOfRange {
            domain: Domain::Edge,
            index,
            len,
        }
    }
}
