//! Code execution node
//!
//! Runs a restricted expression against the node's variable scope
//! inside a sandbox: a deny-list rejects host-reaching constructs, the
//! rest is handed to the expression evaluator. Only the final `return`
//! expression (or the sole expression) is evaluated; the result lands
//! under the configured output variable.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use flowcraft_engine::{
    coerce_number, node_config, timeout::run_with_timeout, ConfigField, EngineError,
    ExecutionContext, FieldType, NodeCategory, NodeDefinition, NodeOutput, NodeProcessor,
    NodeRegistration, NodeSchema, CONFIG_KEY,
};
use serde_json::{json, Value};

use super::expr;

/// Constructs that would reach outside the sandbox.
const DENIED: &[&str] = &[
    "require(",
    "import(",
    "import ",
    "eval(",
    "Function(",
    "process.",
    "globalThis",
    "child_process",
    "XMLHttpRequest",
    "fetch(",
    "fs.",
    "__proto__",
];

fn code_schema() -> NodeSchema {
    NodeSchema::new(vec![
        ConfigField::new("language", "Language", FieldType::Select)
            .with_options(&["javascript", "python"])
            .with_default(json!("javascript")),
        ConfigField::new("code", "Code", FieldType::Textarea).required(),
        ConfigField::new("timeout", "Timeout (ms)", FieldType::Number)
            .with_range(1.0, 60_000.0)
            .with_default(json!(5_000)),
        ConfigField::new("outputVariable", "Output Variable", FieldType::Text)
            .with_pattern("^[A-Za-z_][A-Za-z0-9_]*$")
            .with_default(json!("result")),
        ConfigField::new("inputVariables", "Input Variables", FieldType::Json),
    ])
}

/// Extract the expression to evaluate: the last `return` statement if
/// present, otherwise the last non-empty line.
fn extract_expression(code: &str) -> Option<String> {
    let mut expression = None;
    for line in code.lines() {
        let line = line.trim().trim_end_matches(';');
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }
        expression = Some(match line.strip_prefix("return ") {
            Some(rest) => rest.to_string(),
            None => line.to_string(),
        });
    }
    expression
}

pub struct CodeProcessor;

#[async_trait]
impl NodeProcessor for CodeProcessor {
    fn schema(&self) -> NodeSchema {
        code_schema()
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

        let code = config.get("code").and_then(|v| v.as_str()).unwrap_or("");
        let timeout_ms = config
            .get("timeout")
            .and_then(coerce_number)
            .unwrap_or(5_000.0) as u64;
        let output_variable = config
            .get("outputVariable")
            .and_then(|v| v.as_str())
            .unwrap_or("result")
            .to_string();

        for denied in DENIED {
            if code.contains(denied) {
                return NodeOutput::failure(
                    format!("Code rejected: '{}' is not allowed in the sandbox", denied.trim_end_matches('(')),
                    started.elapsed().as_millis() as u64,
                );
            }
        }

        let Some(expression) = extract_expression(code) else {
            return NodeOutput::failure(
                "Code contains no expression to evaluate",
                started.elapsed().as_millis() as u64,
            );
        };

        // Scope: node input (minus config) layered over context
        // variables, optionally restricted to the configured names
        let mut scope: HashMap<String, Value> = context.variables.clone();
        for (key, value) in input {
            if key != CONFIG_KEY {
                scope.insert(key.clone(), value.clone());
            }
        }
        if let Some(names) = config.get("inputVariables").and_then(|v| v.as_array()) {
            let allowed: Vec<&str> = names.iter().filter_map(|n| n.as_str()).collect();
            scope.retain(|key, _| allowed.contains(&key.as_str()));
        }

        let evaluated = run_with_timeout(timeout_ms, &context.cancellation, async move {
            expr::evaluate(&expression, &scope).map_err(EngineError::failed)
        })
        .await;

        let elapsed = started.elapsed().as_millis() as u64;
        match evaluated {
            Ok(value) => {
                log::debug!("Code: evaluated into '{output_variable}'");
                NodeOutput::success(json!({ output_variable: value }), elapsed)
            }
            Err(err) => NodeOutput::failure(format!("Code execution failed: {err}"), elapsed),
        }
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "code",
        definition: || NodeDefinition {
            node_type: "code".to_string(),
            category: NodeCategory::Transform,
            label: "Code".to_string(),
            description: "Evaluates a sandboxed expression".to_string(),
            color: "#64748b".to_string(),
            schema: code_schema(),
            default_config: code_schema().default_config(),
        },
        factory: || Box::new(CodeProcessor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with(config: Value) -> HashMap<String, Value> {
        let mut input = HashMap::new();
        input.insert("config".to_string(), config);
        input
    }

    #[tokio::test]
    async fn test_return_expression() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let input = input_with(json!({
            "code": "return 2 + 2",
            "outputVariable": "sum",
        }));
        let output = CodeProcessor.execute(&input, &ctx).await;
        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.data["sum"], json!(4));
    }

    #[tokio::test]
    async fn test_scope_sees_context_variables() {
        let mut vars = HashMap::new();
        vars.insert("price".to_string(), json!(20));
        vars.insert("quantity".to_string(), json!(3));
        let ctx = ExecutionContext::new("exec-1", vars);
        let input = input_with(json!({
            "code": "return price * quantity",
            "outputVariable": "total",
        }));
        let output = CodeProcessor.execute(&input, &ctx).await;
        assert_eq!(output.data["total"], json!(60));
    }

    #[tokio::test]
    async fn test_input_shadows_context() {
        let mut vars = HashMap::new();
        vars.insert("x".to_string(), json!(1));
        let ctx = ExecutionContext::new("exec-1", vars);
        let mut input = input_with(json!({"code": "return x"}));
        input.insert("x".to_string(), json!(99));
        let output = CodeProcessor.execute(&input, &ctx).await;
        assert_eq!(output.data["result"], json!(99));
    }

    #[tokio::test]
    async fn test_input_variables_restrict_scope() {
        let mut vars = HashMap::new();
        vars.insert("allowed".to_string(), json!(5));
        vars.insert("hidden".to_string(), json!(7));
        let ctx = ExecutionContext::new("exec-1", vars);
        let input = input_with(json!({
            "code": "return hidden + 1",
            "inputVariables": ["allowed"],
        }));
        let output = CodeProcessor.execute(&input, &ctx).await;
        assert!(!output.success);
        assert!(output.error.unwrap().contains("hidden"));
    }

    #[tokio::test]
    async fn test_denied_construct_rejected() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let input = input_with(json!({
            "code": "require('fs'); return 1",
        }));
        let output = CodeProcessor.execute(&input, &ctx).await;
        assert!(!output.success);
        assert!(output.error.unwrap().contains("not allowed"));
    }

    #[tokio::test]
    async fn test_division_by_zero_surfaces() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let input = input_with(json!({"code": "return 1 / 0"}));
        let output = CodeProcessor.execute(&input, &ctx).await;
        assert!(!output.success);
        assert!(output.error.unwrap().contains("division by zero"));
    }

    #[tokio::test]
    async fn test_missing_code_is_config_error() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let input = input_with(json!({}));
        let output = CodeProcessor.execute(&input, &ctx).await;
        assert!(!output.success);
        assert!(output.error.unwrap().contains("Code"));
    }

    #[test]
    fn test_extract_last_return() {
        let code = "// setup\nconst a = 1;\nreturn a + 1";
        assert_eq!(extract_expression(code).unwrap(), "a + 1");
    }
}
