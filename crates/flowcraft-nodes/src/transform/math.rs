//! Math calculator node
//!
//! Binary and unary arithmetic over two coerced operands. Division by
//! zero and square roots of negatives are explicit failures rather
//! than NaN/Infinity leaking into the variable bag.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use flowcraft_engine::{
    coerce_number, interpolate, node_config, ConfigField, ExecutionContext, FieldType,
    NodeCategory, NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration, NodeSchema,
};
use serde_json::{json, Value};

fn math_schema() -> NodeSchema {
    NodeSchema::new(vec![
        ConfigField::new("operation", "Operation", FieldType::Select)
            .required()
            .with_options(&[
                "add", "subtract", "multiply", "divide", "power", "modulo", "sqrt",
            ])
            .with_default(json!("add")),
        ConfigField::new("a", "Operand A", FieldType::Text).required(),
        ConfigField::new("b", "Operand B", FieldType::Text),
        ConfigField::new("outputVariable", "Output Variable", FieldType::Text)
            .with_pattern("^[A-Za-z_][A-Za-z0-9_]*$")
            .with_default(json!("result")),
    ])
}

/// Resolve an operand: interpolate placeholders, then coerce to f64.
fn resolve_operand(
    raw: Option<&Value>,
    input: &HashMap<String, Value>,
    variables: &HashMap<String, Value>,
) -> Option<f64> {
    let raw = raw?;
    if let Some(n) = coerce_number(raw) {
        return Some(n);
    }
    let rendered = interpolate::render(raw.as_str()?, input, variables);
    rendered.trim().parse::<f64>().ok()
}

fn apply(operation: &str, a: f64, b: Option<f64>) -> Result<f64, String> {
    match operation {
        "add" => Ok(a + b.unwrap_or(0.0)),
        "subtract" => Ok(a - b.unwrap_or(0.0)),
        "multiply" => Ok(a * b.unwrap_or(1.0)),
        "divide" => {
            let b = b.ok_or("Operation 'divide' requires operand B")?;
            if b == 0.0 {
                Err("division by zero".to_string())
            } else {
                Ok(a / b)
            }
        }
        "power" => Ok(a.powf(b.unwrap_or(1.0))),
        "modulo" => {
            let b = b.ok_or("Operation 'modulo' requires operand B")?;
            if b == 0.0 {
                Err("division by zero".to_string())
            } else {
                Ok(a % b)
            }
        }
        "sqrt" => {
            if a < 0.0 {
                Err("square root of a negative number".to_string())
            } else {
                Ok(a.sqrt())
            }
        }
        other => Err(format!("Unknown operation '{other}'")),
    }
}

pub struct MathCalculatorProcessor;

#[async_trait]
impl NodeProcessor for MathCalculatorProcessor {
    fn schema(&self) -> NodeSchema {
        math_schema()
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
            .unwrap_or("add");
        let output_variable = config
            .get("outputVariable")
            .and_then(|v| v.as_str())
            .unwrap_or("result");

        let Some(a) = resolve_operand(config.get("a"), input, &context.variables) else {
            return NodeOutput::failure(
                "Operand A is not a number",
                started.elapsed().as_millis() as u64,
            );
        };
        let b = resolve_operand(config.get("b"), input, &context.variables);

        let elapsed = started.elapsed().as_millis() as u64;
        match apply(operation, a, b) {
            Ok(result) => {
                let value = if result.fract() == 0.0 && result.abs() < 9e15 {
                    json!(result as i64)
                } else {
                    json!(result)
                };
                NodeOutput::success(json!({ output_variable: value }), elapsed)
            }
            Err(err) => NodeOutput::failure(format!("Math error: {err}"), elapsed),
        }
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "mathCalculator",
        definition: || NodeDefinition {
            node_type: "mathCalculator".to_string(),
            category: NodeCategory::Transform,
            label: "Math Calculator".to_string(),
            description: "Applies an arithmetic operation to operands".to_string(),
            color: "#0ea5e9".to_string(),
            schema: math_schema(),
            default_config: math_schema().default_config(),
        },
        factory: || Box::new(MathCalculatorProcessor),
    }
}
