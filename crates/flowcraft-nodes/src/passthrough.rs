//! Shared pass-through processor
//!
//! Node types whose real backends are out of scope (file upload,
//! database, agent, retrieval, classification, loop, iteration,
//! webhook, screen capture) share one processor: echo the non-config
//! input, stamp `processed` and a timestamp. They stay registered so
//! palettes and workflows referencing them keep executing.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use flowcraft_engine::{
    ExecutionContext, NodeCategory, NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration,
    NodeSchema, CONFIG_KEY,
};
use serde_json::{json, Map, Value};

pub struct DefaultProcessor;

#[async_trait]
impl NodeProcessor for DefaultProcessor {
    fn schema(&self) -> NodeSchema {
        NodeSchema::default()
    }

    async fn execute(
        &self,
        input: &HashMap<String, Value>,
        _context: &ExecutionContext,
    ) -> NodeOutput {
        let started = Instant::now();

        let mut data = Map::new();
        for (key, value) in input {
            if key != CONFIG_KEY {
                data.insert(key.clone(), value.clone());
            }
        }
        data.insert("processed".to_string(), json!(true));
        data.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));

        NodeOutput::success(Value::Object(data), started.elapsed().as_millis() as u64)
    }
}

macro_rules! passthrough_registration {
    ($node_type:literal, $category:expr, $label:literal, $description:literal, $color:literal) => {
        inventory::submit! {
            NodeRegistration {
                node_type: $node_type,
                definition: || NodeDefinition {
                    node_type: $node_type.to_string(),
                    category: $category,
                    label: $label.to_string(),
                    description: $description.to_string(),
                    color: $color.to_string(),
                    schema: NodeSchema::default(),
                    default_config: Map::new(),
                },
                factory: || Box::new(DefaultProcessor),
            }
        }
    };
}

passthrough_registration!(
    "fileUpload",
    NodeCategory::InputOutput,
    "File Upload",
    "Accepts an uploaded file",
    "#f97316"
);
passthrough_registration!(
    "database",
    NodeCategory::InputOutput,
    "Database",
    "Runs a database query",
    "#0891b2"
);
passthrough_registration!(
    "agent",
    NodeCategory::AiLlm,
    "Agent",
    "Runs a multi-step agent",
    "#a855f7"
);
passthrough_registration!(
    "knowledgeRetrieval",
    NodeCategory::AiLlm,
    "Knowledge Retrieval",
    "Retrieves documents from a knowledge base",
    "#a855f7"
);
passthrough_registration!(
    "questionClassification",
    NodeCategory::AiLlm,
    "Question Classification",
    "Routes a question by category",
    "#a855f7"
);
passthrough_registration!(
    "loop",
    NodeCategory::Logic,
    "Loop",
    "Repeats a section of the workflow",
    "#f59e0b"
);
passthrough_registration!(
    "iteration",
    NodeCategory::Logic,
    "Iteration",
    "Iterates over a collection",
    "#f59e0b"
);
passthrough_registration!(
    "webhook",
    NodeCategory::Utilities,
    "Webhook",
    "Posts results to a webhook",
    "#94a3b8"
);
passthrough_registration!(
    "screenCapture",
    NodeCategory::Utilities,
    "Screen Capture",
    "Captures the current screen",
    "#94a3b8"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_input_without_config() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let mut input = HashMap::new();
        input.insert("config".to_string(), json!({"secret": true}));
        input.insert("payload".to_string(), json!("data"));

        let output = DefaultProcessor.execute(&input, &ctx).await;
        assert!(output.success);
        assert_eq!(output.data["payload"], json!("data"));
        assert_eq!(output.data["processed"], json!(true));
        assert!(output.data.get("config").is_none());
    }
}
