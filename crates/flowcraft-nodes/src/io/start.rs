//! Start node
//!
//! Terminal marker for workflow entry. Stamps a timestamp and a
//! boolean flag; has no input edges semantically.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_engine::{
    ExecutionContext, NodeCategory, NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration,
    NodeSchema,
};
use serde_json::{json, Map, Value};

pub struct StartProcessor;

#[async_trait]
impl NodeProcessor for StartProcessor {
    fn schema(&self) -> NodeSchema {
        NodeSchema::default()
    }

    async fn execute(
        &self,
        _input: &HashMap<String, Value>,
        _context: &ExecutionContext,
    ) -> NodeOutput {
        NodeOutput::success(
            json!({
                "started": true,
                "startedAt": Utc::now().to_rfc3339(),
            }),
            0,
        )
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "start",
        definition: || NodeDefinition {
            node_type: "start".to_string(),
            category: NodeCategory::InputOutput,
            label: "Start".to_string(),
            description: "Entry point of the workflow".to_string(),
            color: "#22c55e".to_string(),
            schema: NodeSchema::default(),
            default_config: Map::new(),
        },
        factory: || Box::new(StartProcessor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_stamps_flag() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let output = StartProcessor.execute(&HashMap::new(), &ctx).await;
        assert!(output.success);
        assert_eq!(output.data["started"], json!(true));
        assert!(output.data["startedAt"].is_string());
    }
}
