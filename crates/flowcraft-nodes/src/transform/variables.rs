//! Variable assignment and aggregation nodes
//!
//! `variableAssign` writes a list of name/value pairs (values may be
//! interpolated) into the bag via its output. `variableAggregator`
//! collects several existing variables under one key, as an object or
//! an array.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use flowcraft_engine::{
    interpolate, node_config, ConfigField, ExecutionContext, FieldType, NodeCategory,
    NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration, NodeSchema,
};
use serde_json::{json, Map, Value};

fn assign_schema() -> NodeSchema {
    NodeSchema::new(vec![ConfigField::new(
        "assignments",
        "Assignments",
        FieldType::Json,
    )
    .required()])
}

fn aggregator_schema() -> NodeSchema {
    NodeSchema::new(vec![
        ConfigField::new("variables", "Variables", FieldType::Json).required(),
        ConfigField::new("outputVariable", "Output Variable", FieldType::Text)
            .with_pattern("^[A-Za-z_][A-Za-z0-9_]*$")
            .with_default(json!("aggregated")),
        ConfigField::new("mode", "Mode", FieldType::Select)
            .with_options(&["object", "array"])
            .with_default(json!("object")),
    ])
}

pub struct VariableAssignProcessor;

#[async_trait]
impl NodeProcessor for VariableAssignProcessor {
    fn schema(&self) -> NodeSchema {
        assign_schema()
    }

    async fn execute(
        &self,
        input: &HashMap<String, Value>,
        context: &ExecutionContext,
    ) -> NodeOutput {
        let started = Instant::now();
        let config = node_config(input);

        let assignments = match config.get("assignments").and_then(|v| v.as_array()) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => {
                return NodeOutput::failure(
                    "Field 'Assignments' must be a non-empty array",
                    started.elapsed().as_millis() as u64,
                );
            }
        };

        let mut data = Map::new();
        for assignment in &assignments {
            let Some(name) = assignment.get("name").and_then(|v| v.as_str()) else {
                return NodeOutput::failure(
                    "Each assignment needs a 'name'",
                    started.elapsed().as_millis() as u64,
                );
            };
            let value = assignment.get("value").cloned().unwrap_or(Value::Null);
            // String values are templates; everything else passes through
            let resolved = match &value {
                Value::String(s) => {
                    let rendered = interpolate::render(s, input, &context.variables);
                    // A lone placeholder keeps the referenced value's type
                    let trimmed = s.trim();
                    if let Some(inner) = trimmed
                        .strip_prefix("{{")
                        .and_then(|t| t.strip_suffix("}}"))
                    {
                        interpolate::resolve_name(inner.trim(), input, &context.variables)
                            .cloned()
                            .unwrap_or(json!(rendered))
                    } else {
                        json!(rendered)
                    }
                }
                other => other.clone(),
            };
            data.insert(name.to_string(), resolved);
        }

        NodeOutput::success(Value::Object(data), started.elapsed().as_millis() as u64)
    }
}

pub struct VariableAggregatorProcessor;

#[async_trait]
impl NodeProcessor for VariableAggregatorProcessor {
    fn schema(&self) -> NodeSchema {
        aggregator_schema()
    }

    async fn execute(
        &self,
        input: &HashMap<String, Value>,
        context: &ExecutionContext,
    ) -> NodeOutput {
        let started = Instant::now();
        let config = node_config(input);

        let names: Vec<String> = match config.get("variables").and_then(|v| v.as_array()) {
            Some(list) if !list.is_empty() => list
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => {
                return NodeOutput::failure(
                    "Field 'Variables' must be a non-empty array of names",
                    started.elapsed().as_millis() as u64,
                );
            }
        };
        let output_variable = config
            .get("outputVariable")
            .and_then(|v| v.as_str())
            .unwrap_or("aggregated");
        let mode = config.get("mode").and_then(|v| v.as_str()).unwrap_or("object");

        let aggregated: Value = match mode {
            "array" => {
                let values: Vec<Value> = names
                    .iter()
                    .map(|name| {
                        interpolate::resolve_name(name, input, &context.variables)
                            .cloned()
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                json!(values)
            }
            _ => {
                let mut map = Map::new();
                for name in &names {
                    let value = interpolate::resolve_name(name, input, &context.variables)
                        .cloned()
                        .unwrap_or(Value::Null);
                    map.insert(name.clone(), value);
                }
                Value::Object(map)
            }
        };

        NodeOutput::success(
            json!({ output_variable: aggregated }),
            started.elapsed().as_millis() as u64,
        )
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "variableAssign",
        definition: || NodeDefinition {
            node_type: "variableAssign".to_string(),
            category: NodeCategory::Transform,
            label: "Variable Assign".to_string(),
            description: "Writes named values into the workflow context".to_string(),
            color: "#6366f1".to_string(),
            schema: assign_schema(),
            default_config: assign_schema().default_config(),
        },
        factory: || Box::new(VariableAssignProcessor),
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "variableAggregator",
        definition: || NodeDefinition {
            node_type: "variableAggregator".to_string(),
            category: NodeCategory::Transform,
            label: "Variable Aggregator".to_string(),
            description: "Collects variables under a single key".to_string(),
            color: "#6366f1".to_string(),
            schema: aggregator_schema(),
            default_config: aggregator_schema().default_config(),
        },
        factory: || Box::new(VariableAggregatorProcessor),
    }
}
