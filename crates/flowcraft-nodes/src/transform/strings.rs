//! String processor node
//!
//! Single-operation string transforms over an interpolated input
//! value. `split` and `length` change the output type (array, number);
//! everything else maps string to string.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use flowcraft_engine::{
    interpolate, node_config, ConfigField, ExecutionContext, FieldType, NodeCategory,
    NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration, NodeSchema,
};
use serde_json::{json, Value};

fn string_schema() -> NodeSchema {
    NodeSchema::new(vec![
        ConfigField::new("operation", "Operation", FieldType::Select)
            .required()
            .with_options(&[
                "uppercase", "lowercase", "trim", "reverse", "length", "split", "replace",
            ])
            .with_default(json!("trim")),
        ConfigField::new("input", "Input", FieldType::Text).required(),
        ConfigField::new("separator", "Separator", FieldType::Text).with_default(json!(",")),
        ConfigField::new("search", "Search", FieldType::Text),
        ConfigField::new("replacement", "Replacement", FieldType::Text),
        ConfigField::new("outputVariable", "Output Variable", FieldType::Text)
            .with_pattern("^[A-Za-z_][A-Za-z0-9_]*$")
            .with_default(json!("result")),
    ])
}

pub struct StringProcessor;

#[async_trait]
impl NodeProcessor for StringProcessor {
    fn schema(&self) -> NodeSchema {
        string_schema()
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

        let operation = config
            .get("operation")
            .and_then(|v| v.as_str())
            .unwrap_or("trim");
        let raw = config.get("input").and_then(|v| v.as_str()).unwrap_or("");
        let text = interpolate::render(raw, input, &context.variables);
        let output_variable = config
            .get("outputVariable")
            .and_then(|v| v.as_str())
            .unwrap_or("result");

        let result: Value = match operation {
            "uppercase" => json!(text.to_uppercase()),
            "lowercase" => json!(text.to_lowercase()),
            "trim" => json!(text.trim()),
            "reverse" => json!(text.chars().rev().collect::<String>()),
            "length" => json!(text.chars().count()),
            "split" => {
                let separator = config
                    .get("separator")
                    .and_then(|v| v.as_str())
                    .unwrap_or(",");
                json!(text.split(separator).map(|s| s.trim()).collect::<Vec<_>>())
            }
            "replace" => {
                let search = config.get("search").and_then(|v| v.as_str()).unwrap_or("");
                let replacement = config
                    .get("replacement")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                if search.is_empty() {
                    json!(text)
                } else {
                    json!(text.replace(search, replacement))
                }
            }
            other => {
                return NodeOutput::failure(
                    format!("Unknown string operation '{other}'"),
                    started.elapsed().as_millis() as u64,
                );
            }
        };

        NodeOutput::success(
            json!({ output_variable: result }),
            started.elapsed().as_millis() as u64,
        )
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "stringProcessor",
        definition: || NodeDefinition {
            node_type: "stringProcessor".to_string(),
            category: NodeCategory::Transform,
            label: "String Processor".to_string(),
            description: "Transforms a string value".to_string(),
            color: "#14b8a6".to_string(),
            schema: string_schema(),
            default_config: string_schema().default_config(),
        },
        factory: || Box::new(StringProcessor),
    }
}
