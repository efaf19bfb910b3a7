//! Delay node
//!
//! Sleeps for a configured duration, waking early if the run is
//! cancelled. Useful for pacing simulated workflows and for exercising
//! the cancellation path in tests.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use flowcraft_engine::{
    coerce_number, node_config, ConfigField, ExecutionContext, FieldType, NodeCategory,
    NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration, NodeSchema,
};
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

fn delay_schema() -> NodeSchema {
    NodeSchema::new(vec![ConfigField::new(
        "duration",
        "Duration (ms)",
        FieldType::Number,
    )
    .required()
    .with_range(0.0, 300_000.0)
    .with_default(json!(1_000))])
}

pub struct DelayProcessor;

#[async_trait]
impl NodeProcessor for DelayProcessor {
    fn schema(&self) -> NodeSchema {
        delay_schema()
    }

    async fn execute(
        &self,
        input: &HashMap<String, Value>,
        context: &ExecutionContext,
    ) -> NodeOutput {
        let started = Instant::now();
        let config = node_config(input);

        let validation = self.validate(&config);
        if !validation.is_valid {
            return NodeOutput::failure(
                validation.errors.join("; "),
                started.elapsed().as_millis() as u64,
            );
        }

        let duration_ms = config
            .get("duration")
            .and_then(coerce_number)
            .unwrap_or(1_000.0) as u64;

        tokio::select! {
            _ = context.cancellation.cancelled() => {
                return NodeOutput::failure(
                    "Delay interrupted by cancellation",
                    started.elapsed().as_millis() as u64,
                );
            }
            _ = sleep(Duration::from_millis(duration_ms)) => {}
        }

        NodeOutput::success(
            json!({"delayed": true, "durationMs": duration_ms}),
            started.elapsed().as_millis() as u64,
        )
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "delay",
        definition: || NodeDefinition {
            node_type: "delay".to_string(),
            category: NodeCategory::Utilities,
            label: "Delay".to_string(),
            description: "Pauses the workflow for a duration".to_string(),
            color: "#94a3b8".to_string(),
            schema: delay_schema(),
            default_config: delay_schema().default_config(),
        },
        factory: || Box::new(DelayProcessor),
    }
}
