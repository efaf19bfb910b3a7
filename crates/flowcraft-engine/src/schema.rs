//! Config schemas and schema-driven validation
//!
//! Each node type publishes a static `NodeSchema` describing the shape
//! of its config map. The same schema drives both the properties form
//! and the validation performed before and during execution.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Data type of a config field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free-form string
    Text,
    /// Multi-line string
    Textarea,
    /// Numeric value (accepts numeric strings)
    Number,
    /// Boolean value (accepts "true"/"false" strings)
    Boolean,
    /// One of a fixed set of options
    Select,
    /// Arbitrary JSON value
    Json,
}

/// Descriptor for a single config field. Immutable after definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigField {
    /// Key in the node's config map
    pub key: String,
    /// Human-readable label for the properties form
    pub label: String,
    /// Field data type
    pub field_type: FieldType,
    /// Whether the field must be present and non-empty
    pub required: bool,
    /// Allowed values for `Select` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Minimum value for `Number` fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum value for `Number` fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regex pattern for string fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Default value used when the field is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ConfigField {
    /// Create a field descriptor
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required: false,
            options: Vec::new(),
            min: None,
            max: None,
            pattern: None,
            default: None,
        }
    }

    /// Mark the field required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the allowed options (implies `Select`)
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the numeric range
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Set a minimum without a maximum
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set a regex pattern constraint
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Static schema for a node type's config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchema {
    /// Config field descriptors
    pub config: Vec<ConfigField>,
}

impl NodeSchema {
    /// Create a schema from field descriptors
    pub fn new(config: Vec<ConfigField>) -> Self {
        Self { config }
    }

    /// Build the default config map from field defaults
    pub fn default_config(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for field in &self.config {
            if let Some(default) = &field.default {
                map.insert(field.key.clone(), default.clone());
            }
        }
        map
    }
}

/// Outcome of validating a config map against a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// A passing result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Build a result from collected errors
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Whether a value counts as "present" for required-field checks
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Coerce a value to a number, accepting numeric strings
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Coerce a value to a boolean, accepting "true"/"false" strings
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Validate a config map against a schema.
///
/// Pure and synchronous; collects one human-readable error per
/// violation instead of short-circuiting on the first.
pub fn validate_config(schema: &NodeSchema, config: &Map<String, Value>) -> ValidationResult {
    let mut errors = Vec::new();

    for field in &schema.config {
        let value = config.get(&field.key);

        if !is_present(value) {
            if field.required {
                errors.push(format!("Field '{}' is required", field.label));
            }
            continue;
        }
        let value = value.expect("presence checked above");

        match field.field_type {
            FieldType::Number => match coerce_number(value) {
                Some(n) => {
                    if let Some(min) = field.min {
                        if n < min {
                            errors.push(format!("Field '{}' must be at least {}", field.label, min));
                        }
                    }
                    if let Some(max) = field.max {
                        if n > max {
                            errors.push(format!("Field '{}' must be at most {}", field.label, max));
                        }
                    }
                }
                None => errors.push(format!("Field '{}' must be a number", field.label)),
            },
            FieldType::Boolean => {
                if coerce_bool(value).is_none() {
                    errors.push(format!("Field '{}' must be a boolean", field.label));
                }
            }
            FieldType::Select => {
                let as_str = value.as_str().map(|s| s.to_string()).unwrap_or_else(|| value.to_string());
                if !field.options.iter().any(|opt| opt == &as_str) {
                    errors.push(format!(
                        "Field '{}' must be one of: {}",
                        field.label,
                        field.options.join(", ")
                    ));
                }
            }
            FieldType::Text | FieldType::Textarea => {
                if let (Some(pattern), Some(s)) = (&field.pattern, value.as_str()) {
                    match Regex::new(pattern) {
                        Ok(re) => {
                            if !re.is_match(s) {
                                errors.push(format!(
                                    "Field '{}' does not match pattern {}",
                                    field.label, pattern
                                ));
                            }
                        }
                        Err(_) => errors.push(format!(
                            "Field '{}' has an invalid pattern rule",
                            field.label
                        )),
                    }
                }
            }
            FieldType::Json => {}
        }
    }

    ValidationResult::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> NodeSchema {
        NodeSchema::new(vec![
            ConfigField::new("model", "Model", FieldType::Text).required(),
            ConfigField::new("temperature", "Temperature", FieldType::Number)
                .with_range(0.0, 2.0)
                .with_default(json!(0.7)),
            ConfigField::new("format", "Format", FieldType::Select)
                .with_options(&["text", "json"]),
            ConfigField::new("stream", "Stream", FieldType::Boolean),
            ConfigField::new("name", "Name", FieldType::Text)
                .with_pattern("^[a-z_][a-z0-9_]*$"),
        ])
    }

    #[test]
    fn test_valid_config() {
        let mut config = Map::new();
        config.insert("model".to_string(), json!("gpt-4"));
        config.insert("temperature".to_string(), json!(1.0));
        let result = validate_config(&sample_schema(), &config);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_collects_all_violations() {
        let mut config = Map::new();
        config.insert("temperature".to_string(), json!(5.0));
        config.insert("format".to_string(), json!("xml"));
        config.insert("stream".to_string(), json!("maybe"));

        let result = validate_config(&sample_schema(), &config);
        assert!(!result.is_valid);
        // Missing required model + range + enum + boolean = 4 errors
        assert_eq!(result.errors.len(), 4);
    }

    #[test]
    fn test_number_coercion_from_string() {
        let mut config = Map::new();
        config.insert("model".to_string(), json!("m"));
        config.insert("temperature".to_string(), json!("1.5"));
        let result = validate_config(&sample_schema(), &config);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_pattern_violation() {
        let mut config = Map::new();
        config.insert("model".to_string(), json!("m"));
        config.insert("name".to_string(), json!("Bad Name"));
        let result = validate_config(&sample_schema(), &config);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("pattern"));
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let mut config = Map::new();
        config.insert("model".to_string(), json!("   "));
        let result = validate_config(&sample_schema(), &config);
        assert!(result.errors.iter().any(|e| e.contains("required")));
    }

    #[test]
    fn test_default_config_from_schema() {
        let defaults = sample_schema().default_config();
        assert_eq!(defaults.get("temperature"), Some(&json!(0.7)));
        assert!(!defaults.contains_key("model"));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut config = Map::new();
        config.insert("temperature".to_string(), json!(3.0));
        let schema = sample_schema();
        let first = validate_config(&schema, &config);
        let second = validate_config(&schema, &config);
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.is_valid, second.is_valid);
    }
}
