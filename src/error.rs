//! Error types for the layout engine.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors raised by the graph model, the simulation engine and the drag
/// controller.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A node with this id is already present.
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    /// An edge endpoint or interaction target does not exist.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// A registered force failed; the tick was aborted before any node moved.
    #[error("force '{force}' failed: {source}")]
    ForceEvaluation {
        /// Registry name of the failing force.
        force: String,
        /// What went wrong inside the force.
        #[source]
        source: ForceError,
    },

    /// A configuration value or edge parameter is out of range.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfiguration {
        /// Name of the offending option.
        field: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },
}

impl LayoutError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure reported by a single force contributor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForceError {
    /// The force produced a NaN or infinite delta for a node.
    #[error("non-finite contribution for node {node}")]
    NonFinite {
        /// Node that received the bad delta.
        node: NodeId,
    },

    /// Custom force implementations report their own failures here.
    #[error("{0}")]
    Failed(String),
}

/// Result alias used across the crate.
pub type LayoutResult<T> = Result<T, LayoutError>;
