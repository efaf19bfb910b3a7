//! Flowcraft Engine - Graph-based workflow execution
//!
//! This crate turns a node/edge graph plus per-node configuration into
//! an ordered, validated execution with per-node results, context
//! propagation, and failure isolation. It provides:
//!
//! - The [`NodeProcessor`] contract every node type implements
//! - Schema-driven config validation shared by the properties form and
//!   the execution path
//! - A link-time populated [`NodeRegistry`] of node types
//! - The [`WorkflowEngine`] orchestrator: topological ordering,
//!   strictly sequential execution, context merging, per-call logs
//!
//! Node implementations live in the `flowcraft-nodes` crate and
//! register themselves via `inventory`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flowcraft_engine::{NodeRegistry, WorkflowEngine};
//!
//! let registry = Arc::new(NodeRegistry::from_inventory());
//! let engine = WorkflowEngine::new(registry);
//! let report = engine.execute_workflow(&nodes, &edges, inputs).await;
//! assert!(report.execution.status == flowcraft_engine::ExecutionStatus::Completed);
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod execution;
pub mod interpolate;
pub mod processor;
pub mod registry;
pub mod schema;
pub mod timeout;
pub mod topo;
pub mod types;

// Re-export key types
pub use context::ExecutionContext;
pub use engine::{EngineConfig, MergePolicy, WorkflowEngine};
pub use error::{EngineError, Result};
pub use execution::{
    ExecutionLog, ExecutionReport, ExecutionStatus, LogStatus, NodeOutput, OutputMetadata,
    WorkflowExecution,
};
pub use processor::{node_config, NodeProcessor, CONFIG_KEY};
pub use registry::{NodeCategory, NodeDefinition, NodeRegistration, NodeRegistry};
pub use schema::{
    coerce_bool, coerce_number, validate_config, ConfigField, FieldType, NodeSchema,
    ValidationResult,
};
pub use types::{GraphEdge, GraphNode, NodeData, NodeId, NodeStatus, Position};

// Re-export the cancellation token consumers will need
pub use tokio_util::sync::CancellationToken;
