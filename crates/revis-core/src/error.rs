//! Error types.

use thiserror::Error;

/// Errors raised while reconciling a declarative graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),
    #[error("Duplicate edge id: {0}")]
    DuplicateEdgeId(String),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised while merging options.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by a layouter when it cannot start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Layout failed: {0}")]
    Failed(String),
}
