//! Execution context threaded through one workflow run
//!
//! The context owns the workflow-scoped variable bag. Each successful
//! node's output data is shallow-merged into `variables` after that
//! node completes; this is the sole inter-node data-passing mechanism.
//! Edges determine order, not data routing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Mutable state for a single `execute_workflow` call.
///
/// Owned exclusively by the run that created it; never shared across
/// concurrent executions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Workflow-scoped variables; keys unique, last writer wins
    pub variables: HashMap<String, Value>,
    /// Global state available to processors but not auto-merged
    pub global_state: HashMap<String, Value>,
    /// Identifier of the owning execution
    pub execution_id: String,
    /// When the execution started
    pub timestamp: DateTime<Utc>,
    /// Cancellation token for this run; processors hand it to the
    /// timeout wrapper so long operations stop cooperatively
    #[serde(skip, default)]
    pub cancellation: CancellationToken,
}

impl ExecutionContext {
    /// Create a context seeded with the run's initial inputs
    pub fn new(execution_id: impl Into<String>, inputs: HashMap<String, Value>) -> Self {
        Self {
            variables: inputs,
            global_state: HashMap::new(),
            execution_id: execution_id.into(),
            timestamp: Utc::now(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Attach the run's cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Shallow-merge a node's output data into the variable bag.
    ///
    /// Only object outputs contribute variables; scalar outputs have
    /// no key to merge under and are ignored here (they remain in the
    /// node's recorded result).
    pub fn merge_output(&mut self, data: &Value) {
        if let Value::Object(map) = data {
            for (key, value) in map {
                self.variables.insert(key.clone(), value.clone());
            }
        }
    }

    /// Look up a variable by name
    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_output_overwrites() {
        let mut ctx = ExecutionContext::new("exec-1", HashMap::new());
        ctx.merge_output(&json!({"x": 1, "y": "a"}));
        ctx.merge_output(&json!({"x": 2}));

        assert_eq!(ctx.get_variable("x"), Some(&json!(2)));
        assert_eq!(ctx.get_variable("y"), Some(&json!("a")));
    }

    #[test]
    fn test_merge_output_ignores_scalars() {
        let mut ctx = ExecutionContext::new("exec-1", HashMap::new());
        ctx.merge_output(&json!(42));
        assert!(ctx.variables.is_empty());
    }

    #[test]
    fn test_initial_inputs_visible() {
        let mut inputs = HashMap::new();
        inputs.insert("score".to_string(), json!(75));
        let ctx = ExecutionContext::new("exec-1", inputs);
        assert_eq!(ctx.get_variable("score"), Some(&json!(75)));
    }
}
