//! End node
//!
//! Terminal marker for workflow completion. Stamps a timestamp and a
//! boolean flag; has no outputs consumed downstream.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_engine::{
    ExecutionContext, NodeCategory, NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration,
    NodeSchema,
};
use serde_json::{json, Map, Value};

pub struct EndProcessor;

#[async_trait]
impl NodeProcessor for EndProcessor {
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
                "completed": true,
                "finishedAt": Utc::now().to_rfc3339(),
            }),
            0,
        )
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "end",
        definition: || NodeDefinition {
            node_type: "end".to_string(),
            category: NodeCategory::InputOutput,
            label: "End".to_string(),
            description: "Exit point of the workflow".to_string(),
            color: "#ef4444".to_string(),
            schema: NodeSchema::default(),
            default_config: Map::new(),
        },
        factory: || Box::new(EndProcessor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_end_stamps_flag() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let output = EndProcessor.execute(&HashMap::new(), &ctx).await;
        assert!(output.success);
        assert_eq!(output.data["completed"], json!(true));
    }
}
