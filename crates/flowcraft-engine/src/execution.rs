//! Execution records: per-node outputs, run aggregates, and logs
//!
//! `NodeOutput` is the programmatic per-node contract; `ExecutionLog`
//! entries are the human-facing observability stream. Both are
//! returned per call — the engine keeps no cross-run state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::NodeId;

/// Metadata attached to a node output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMetadata {
    /// Wall-clock time the processor spent executing, in milliseconds
    pub execution_time_ms: u64,
    /// Tokens consumed by an LLM call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Estimated cost of an LLM call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Size of the produced output in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u64>,
}

/// Result of exactly one processor invocation. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutput {
    /// Whether the node completed successfully
    pub success: bool,
    /// Output data; merged into context variables on success
    pub data: Value,
    /// Error description when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<OutputMetadata>,
}

impl NodeOutput {
    /// Successful output with data and timing
    pub fn success(data: Value, execution_time_ms: u64) -> Self {
        let output_size = serde_json::to_vec(&data).map(|v| v.len() as u64).ok();
        Self {
            success: true,
            data,
            error: None,
            metadata: Some(OutputMetadata {
                execution_time_ms,
                output_size,
                ..Default::default()
            }),
        }
    }

    /// Failed output with an error message and timing
    pub fn failure(error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
            metadata: Some(OutputMetadata {
                execution_time_ms,
                ..Default::default()
            }),
        }
    }

    /// Attach LLM token/cost metadata
    pub fn with_usage(mut self, tokens_used: u64, cost: f64) -> Self {
        let meta = self.metadata.get_or_insert_with(OutputMetadata::default);
        meta.tokens_used = Some(tokens_used);
        meta.cost = Some(cost);
        self
    }
}

/// Lifecycle of a workflow execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Aggregate record of one full run across all nodes.
///
/// One instance per `execute_workflow` call; finalized (status and
/// end time) when the run ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    /// Unique execution id
    pub id: String,
    /// Identifier of the workflow that was run
    pub workflow_id: String,
    /// Current lifecycle status
    pub status: ExecutionStatus,
    /// When the run started
    pub start_time: DateTime<Utc>,
    /// When the run finished, once finalized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Initial inputs the run was seeded with
    pub inputs: HashMap<String, Value>,
    /// Final variable bag, set on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<HashMap<String, Value>>,
    /// Per-node results, keyed by node id
    pub node_results: HashMap<NodeId, NodeOutput>,
    /// Run-level error, set on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowExecution {
    /// Create a fresh running execution
    pub fn start(
        id: impl Into<String>,
        workflow_id: impl Into<String>,
        inputs: HashMap<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_id: workflow_id.into(),
            status: ExecutionStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            inputs,
            outputs: None,
            node_results: HashMap::new(),
            error: None,
        }
    }
}

/// Severity/status of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Idle,
    Running,
    Success,
    Error,
    Warning,
}

/// One entry in the execution log stream. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLog {
    /// Unique entry id
    pub id: String,
    /// Workflow the entry belongs to
    pub workflow_id: String,
    /// Node the entry concerns ("workflow" for run-level entries)
    pub node_id: String,
    /// Entry status
    pub status: LogStatus,
    /// Human-readable message
    pub message: String,
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Structured payload, e.g. the node's output data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error text for error entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionLog {
    /// Create a log entry
    pub fn new(
        workflow_id: impl Into<String>,
        node_id: impl Into<String>,
        status: LogStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("log-{}", uuid::Uuid::new_v4()),
            workflow_id: workflow_id.into(),
            node_id: node_id.into(),
            status,
            message: message.into(),
            timestamp: Utc::now(),
            data: None,
            error: None,
        }
    }

    /// Attach a structured payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach an error message
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Everything one `execute_workflow` call produces: the execution
/// record plus the log stream for that call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub execution: WorkflowExecution,
    pub logs: Vec<ExecutionLog>,
}
