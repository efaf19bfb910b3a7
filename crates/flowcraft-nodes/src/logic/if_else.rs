//! Conditional branching node
//!
//! Evaluates a list of comparisons over the variable bag and emits the
//! branch handle downstream edges select on. Operands resolve in order:
//! `{{name}}` placeholder, direct variable name, dot-path, then literal.
//! Both sides are coerced to numbers when either parses as one, so
//! `"75" > 50` compares numerically.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use flowcraft_engine::{
    interpolate, node_config, ConfigField, ExecutionContext, FieldType, NodeCategory,
    NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration, NodeSchema,
};
use regex::Regex;
use serde_json::{json, Value};

fn if_else_schema() -> NodeSchema {
    NodeSchema::new(vec![
        ConfigField::new("conditions", "Conditions", FieldType::Json).required(),
        ConfigField::new("combinator", "Combinator", FieldType::Select)
            .with_options(&["AND", "OR"])
            .with_default(json!("AND")),
    ])
}

/// Resolve one operand to a concrete value.
fn resolve_operand(
    raw: &Value,
    input: &HashMap<String, Value>,
    variables: &HashMap<String, Value>,
) -> Value {
    let text = match raw {
        Value::String(s) => s,
        other => return other.clone(),
    };

    // {{name}} placeholder dereferences directly, preserving the type
    let trimmed = text.trim();
    if let Some(inner) = trimmed
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
    {
        let name = inner.trim();
        if let Some(value) = interpolate::resolve_name(name, input, variables) {
            return value.clone();
        }
        return Value::String(text.clone());
    }

    // Bare variable names and dot-paths resolve next; anything that
    // does not name a known variable is a literal
    if let Some(value) = interpolate::resolve_name(trimmed, input, variables) {
        return value.clone();
    }

    Value::String(text.clone())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    interpolate::stringify(value)
}

/// Evaluate one comparison. Unknown operators evaluate to false.
fn evaluate_condition(
    left: &Value,
    operator: &str,
    right: &Value,
) -> bool {
    // Numeric comparison whenever both sides coerce
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        match operator {
            "==" => return l == r,
            "!=" => return l != r,
            ">" => return l > r,
            "<" => return l < r,
            ">=" => return l >= r,
            "<=" => return l <= r,
            _ => {}
        }
    }

    let l = as_text(left);
    let r = as_text(right);
    match operator {
        "==" => l == r,
        "!=" => l != r,
        ">" => l > r,
        "<" => l < r,
        ">=" => l >= r,
        "<=" => l <= r,
        "contains" => l.contains(&r),
        "startsWith" => l.starts_with(&r),
        "endsWith" => l.ends_with(&r),
        "regex" => Regex::new(&r).map(|re| re.is_match(&l)).unwrap_or(false),
        other => {
            log::warn!("IfElse: unknown operator '{other}'");
            false
        }
    }
}

pub struct IfElseProcessor;

#[async_trait]
impl NodeProcessor for IfElseProcessor {
    fn schema(&self) -> NodeSchema {
        if_else_schema()
    }

    async fn execute(
        &self,
        input: &HashMap<String, Value>,
        context: &ExecutionContext,
    ) -> NodeOutput {
        let started = Instant::now();
        let config = node_config(input);

        let conditions = match config.get("conditions").and_then(|v| v.as_array()) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => {
                return NodeOutput::failure(
                    "Field 'Conditions' must be a non-empty array",
                    started.elapsed().as_millis() as u64,
                );
            }
        };
        let combinator = config
            .get("combinator")
            .and_then(|v| v.as_str())
            .unwrap_or("AND");

        let mut results = Vec::with_capacity(conditions.len());
        for condition in &conditions {
            let left_raw = condition.get("left").cloned().unwrap_or(Value::Null);
            let right_raw = condition.get("right").cloned().unwrap_or(Value::Null);
            let operator = condition
                .get("operator")
                .and_then(|v| v.as_str())
                .unwrap_or("==");

            let left = resolve_operand(&left_raw, input, &context.variables);
            let right = resolve_operand(&right_raw, input, &context.variables);
            results.push(evaluate_condition(&left, operator, &right));
        }

        let condition_result = match combinator {
            "OR" => results.iter().any(|r| *r),
            _ => results.iter().all(|r| *r),
        };
        let branch = if condition_result { "true" } else { "false" };

        log::debug!(
            "IfElse: {} conditions combined with {combinator} -> {branch}",
            results.len()
        );

        NodeOutput::success(
            json!({
                "condition_result": condition_result,
                "branch": branch,
            }),
            started.elapsed().as_millis() as u64,
        )
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "ifElse",
        definition: || NodeDefinition {
            node_type: "ifElse".to_string(),
            category: NodeCategory::Logic,
            label: "If/Else".to_string(),
            description: "Branches on a combined set of comparisons".to_string(),
            color: "#f59e0b".to_string(),
            schema: if_else_schema(),
            default_config: if_else_schema().default_config(),
        },
        factory: || Box::new(IfElseProcessor),
    }
}
