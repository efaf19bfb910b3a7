//! Template rendering node
//!
//! Renders a `{{placeholder}}` template against the variable bag and
//! stores the result under the configured output variable. Unresolved
//! placeholders stay literal, matching interpolation everywhere else.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use flowcraft_engine::{
    interpolate, node_config, ConfigField, ExecutionContext, FieldType, NodeCategory,
    NodeDefinition, NodeOutput, NodeProcessor, NodeRegistration, NodeSchema,
};
use serde_json::{json, Value};

fn template_schema() -> NodeSchema {
    NodeSchema::new(vec![
        ConfigField::new("template", "Template", FieldType::Textarea).required(),
        ConfigField::new("outputVariable", "Output Variable", FieldType::Text)
            .with_pattern("^[A-Za-z_][A-Za-z0-9_]*$")
            .with_default(json!("rendered")),
    ])
}

pub struct TemplateProcessor;

#[async_trait]
impl NodeProcessor for TemplateProcessor {
    fn schema(&self) -> NodeSchema {
        template_schema()
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

        let template = config
            .get("template")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        let output_variable = config
            .get("outputVariable")
            .and_then(|v| v.as_str())
            .unwrap_or("rendered");

        let rendered = interpolate::render(template, input, &context.variables);

        NodeOutput::success(
            json!({ output_variable: rendered }),
            started.elapsed().as_millis() as u64,
        )
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "template",
        definition: || NodeDefinition {
            node_type: "template".to_string(),
            category: NodeCategory::Transform,
            label: "Template".to_string(),
            description: "Renders a placeholder template".to_string(),
            color: "#8b5cf6".to_string(),
            schema: template_schema(),
            default_config: template_schema().default_config(),
        },
        factory: || Box::new(TemplateProcessor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_renders_against_variables() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), json!("Ada"));
        vars.insert("count".to_string(), json!(3));
        let ctx = ExecutionContext::new("exec-1", vars);

        let mut input = HashMap::new();
        input.insert(
            "config".to_string(),
            json!({"template": "{{name}} has {{count}} items"}),
        );

        let output = TemplateProcessor.execute(&input, &ctx).await;
        assert!(output.success);
        assert_eq!(output.data["rendered"], json!("Ada has 3 items"));
    }

    #[tokio::test]
    async fn test_unresolved_stays_literal() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let mut input = HashMap::new();
        input.insert(
            "config".to_string(),
            json!({"template": "hi {{missing}}", "outputVariable": "out"}),
        );
        let output = TemplateProcessor.execute(&input, &ctx).await;
        assert_eq!(output.data["out"], json!("hi {{missing}}"));
    }

    #[tokio::test]
    async fn test_missing_template_fails() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let mut input = HashMap::new();
        input.insert("config".to_string(), json!({}));
        let output = TemplateProcessor.execute(&input, &ctx).await;
        assert!(!output.success);
    }
}
