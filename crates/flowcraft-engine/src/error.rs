//! Error types for the workflow engine

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while preparing or running a workflow
#[derive(Debug, Error)]
pub enum EngineError {
    /// The edge set contains a directed cycle
    #[error("Circular dependency detected at node '{0}'")]
    CircularDependency(String),

    /// A node references a type with no registry entry
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A processor failed during execution
    #[error("Node execution failed: {0}")]
    ExecutionFailed(String),

    /// An operation exceeded its time budget
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// The run was cancelled via its cancellation token
    #[error("Workflow cancelled")]
    Cancelled,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}
