//! Node processor contract
//!
//! Every node type implements [`NodeProcessor`]: an async `execute`, a
//! pure `validate` derived from the type's config schema, and the
//! schema itself. Separating validation from execution lets the
//! properties form pre-validate before a run while the engine
//! re-validates defensively at execution time without duplicating
//! rules.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::context::ExecutionContext;
use crate::execution::NodeOutput;
use crate::schema::{validate_config, NodeSchema, ValidationResult};

/// The uniform unit of work bound to a node type.
#[async_trait]
pub trait NodeProcessor: Send + Sync {
    /// Static config schema for this node type.
    fn schema(&self) -> NodeSchema;

    /// Validate a config map against the schema.
    ///
    /// Pure and synchronous; collects all violations. The default
    /// implementation derives every rule from [`NodeProcessor::schema`].
    fn validate(&self, config: &Map<String, Value>) -> ValidationResult {
        validate_config(&self.schema(), config)
    }

    /// Execute one unit of work.
    ///
    /// Must never panic past its own boundary: internal failures are
    /// returned as `NodeOutput { success: false, .. }`.
    async fn execute(
        &self,
        input: &HashMap<String, Value>,
        context: &ExecutionContext,
    ) -> NodeOutput;
}

impl std::fmt::Debug for dyn NodeProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NodeProcessor")
    }
}

/// Key under which the engine injects the node's config into its input.
pub const CONFIG_KEY: &str = "config";

/// Extract the node's config map from its prepared input.
pub fn node_config(input: &HashMap<String, Value>) -> Map<String, Value> {
    input
        .get(CONFIG_KEY)
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default()
}

/// Fetch a config string, falling back to a schema default.
pub fn config_str<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    config.get(key).and_then(|v| v.as_str())
}
