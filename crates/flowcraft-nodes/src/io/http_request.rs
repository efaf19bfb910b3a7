//! HTTP request node
//!
//! Renders url and body against the variable bag, merges auth-derived
//! headers, and executes with retry and exponential backoff. Client
//! errors (4xx) are never retried. The transport is simulated: no real
//! network traffic leaves the process.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use flowcraft_engine::{
    coerce_number, interpolate, node_config, timeout::run_with_timeout, ConfigField,
    EngineError, ExecutionContext, FieldType, NodeCategory, NodeDefinition, NodeOutput,
    NodeProcessor, NodeRegistration, NodeSchema,
};
use serde_json::{json, Map, Value};

/// Base delay for exponential backoff between retries.
const BACKOFF_BASE_MS: u64 = 50;

fn http_schema() -> NodeSchema {
    NodeSchema::new(vec![
        ConfigField::new("method", "Method", FieldType::Select)
            .required()
            .with_options(&["GET", "POST", "PUT", "DELETE", "PATCH"])
            .with_default(json!("GET")),
        ConfigField::new("url", "URL", FieldType::Text).required(),
        ConfigField::new("body", "Request Body", FieldType::Textarea),
        ConfigField::new("headers", "Headers", FieldType::Json),
        ConfigField::new("timeout", "Timeout (ms)", FieldType::Number)
            .with_range(1.0, 120_000.0)
            .with_default(json!(10_000)),
        ConfigField::new("retries", "Retries", FieldType::Number)
            .with_range(0.0, 5.0)
            .with_default(json!(2)),
        ConfigField::new("authType", "Auth Type", FieldType::Select)
            .with_options(&["none", "bearer", "basic", "apiKey"])
            .with_default(json!("none")),
        ConfigField::new("authToken", "Auth Token", FieldType::Text),
        ConfigField::new("username", "Username", FieldType::Text),
        ConfigField::new("password", "Password", FieldType::Text),
        ConfigField::new("apiKeyHeader", "API Key Header", FieldType::Text)
            .with_default(json!("X-API-Key")),
    ])
}

/// Simulated response from the mock transport.
struct MockResponse {
    status: u16,
    body: Value,
}

/// Simulated HTTP failure. Client errors fail fast; server errors are
/// retried.
enum MockHttpError {
    Client(u16, String),
    Server(u16, String),
}

/// Send one simulated request. Behavior is keyed off the url so tests
/// and demos can exercise every path deterministically.
async fn mock_send(
    method: &str,
    url: &str,
    headers: &Map<String, Value>,
    body: Option<&str>,
) -> Result<MockResponse, MockHttpError> {
    // Simulated network latency
    tokio::time::sleep(Duration::from_millis(5)).await;

    if url.contains("404") || url.contains("missing") {
        return Err(MockHttpError::Client(
            404,
            format!("404 Not Found: {url}"),
        ));
    }
    if url.contains("403") {
        return Err(MockHttpError::Client(403, format!("403 Forbidden: {url}")));
    }
    if url.contains("error") {
        return Err(MockHttpError::Server(
            500,
            format!("500 Internal Server Error: {url}"),
        ));
    }

    let parsed_body: Value = match body {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(raw).unwrap_or_else(|_| json!(raw))
        }
        _ => Value::Null,
    };

    Ok(MockResponse {
        status: 200,
        body: json!({
            "url": url,
            "method": method,
            "headers": headers,
            "echo": parsed_body,
        }),
    })
}

pub struct HttpRequestProcessor;

impl HttpRequestProcessor {
    /// Merge auth-derived headers into the request header map.
    fn apply_auth(config: &Map<String, Value>, headers: &mut Map<String, Value>) {
        let auth_type = config
            .get("authType")
            .and_then(|v| v.as_str())
            .unwrap_or("none");

        match auth_type {
            "bearer" => {
                if let Some(token) = config.get("authToken").and_then(|v| v.as_str()) {
                    headers.insert(
                        "Authorization".to_string(),
                        json!(format!("Bearer {token}")),
                    );
                }
            }
            "basic" => {
                let username = config.get("username").and_then(|v| v.as_str()).unwrap_or("");
                let password = config.get("password").and_then(|v| v.as_str()).unwrap_or("");
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                headers.insert("Authorization".to_string(), json!(format!("Basic {encoded}")));
            }
            "apiKey" => {
                let header = config
                    .get("apiKeyHeader")
                    .and_then(|v| v.as_str())
                    .unwrap_or("X-API-Key");
                if let Some(token) = config.get("authToken").and_then(|v| v.as_str()) {
                    headers.insert(header.to_string(), json!(token));
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl NodeProcessor for HttpRequestProcessor {
    fn schema(&self) -> NodeSchema {
        http_schema()
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

        let method = config
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("GET")
            .to_string();
        let url_template = config.get("url").and_then(|v| v.as_str()).unwrap_or("");
        let url = interpolate::render(url_template, input, &context.variables);
        let body = config
            .get("body")
            .and_then(|v| v.as_str())
            .map(|b| interpolate::render(b, input, &context.variables));
        let timeout_ms = config
            .get("timeout")
            .and_then(coerce_number)
            .unwrap_or(10_000.0) as u64;
        let retries = config.get("retries").and_then(coerce_number).unwrap_or(2.0) as u32;

        let mut headers = config
            .get("headers")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();
        Self::apply_auth(&config, &mut headers);

        let mut last_error = String::new();
        for attempt in 0..=retries {
            if attempt > 0 {
                let delay = BACKOFF_BASE_MS * 2u64.pow(attempt - 1);
                log::debug!("HttpRequest: retry {attempt}/{retries} after {delay}ms");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let result = run_with_timeout(timeout_ms, &context.cancellation, async {
                mock_send(&method, &url, &headers, body.as_deref())
                    .await
                    .map_err(|e| match e {
                        MockHttpError::Client(status, msg) => {
                            EngineError::failed(format!("client:{status}:{msg}"))
                        }
                        MockHttpError::Server(status, msg) => {
                            EngineError::failed(format!("server:{status}:{msg}"))
                        }
                    })
            })
            .await;

            match result {
                Ok(response) => {
                    let elapsed = started.elapsed().as_millis() as u64;
                    return NodeOutput::success(
                        json!({
                            "status": response.status,
                            "response": response.body,
                            "url": url,
                            "attempts": attempt + 1,
                        }),
                        elapsed,
                    );
                }
                Err(EngineError::ExecutionFailed(msg)) if msg.starts_with("client:") => {
                    // 4xx: fail fast, never retry
                    let text = msg.splitn(3, ':').nth(2).unwrap_or(&msg).to_string();
                    return NodeOutput::failure(text, started.elapsed().as_millis() as u64);
                }
                Err(err) => {
                    last_error = match err {
                        EngineError::ExecutionFailed(msg) => {
                            msg.splitn(3, ':').nth(2).unwrap_or(&msg).to_string()
                        }
                        other => other.to_string(),
                    };
                }
            }
        }

        NodeOutput::failure(
            format!("Request failed after {} attempts: {last_error}", retries + 1),
            started.elapsed().as_millis() as u64,
        )
    }
}

inventory::submit! {
    NodeRegistration {
        node_type: "httpRequest",
        definition: || NodeDefinition {
            node_type: "httpRequest".to_string(),
            category: NodeCategory::InputOutput,
            label: "HTTP Request".to_string(),
            description: "Calls an HTTP endpoint with retry and backoff".to_string(),
            color: "#3b82f6".to_string(),
            schema: http_schema(),
            default_config: http_schema().default_config(),
        },
        factory: || Box::new(HttpRequestProcessor),
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
    async fn test_successful_request() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let input = input_with(json!({
            "method": "GET",
            "url": "https://api.example.com/items",
        }));
        let output = HttpRequestProcessor.execute(&input, &ctx).await;
        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.data["status"], json!(200));
        assert_eq!(output.data["attempts"], json!(1));
    }

    #[tokio::test]
    async fn test_url_interpolation() {
        let mut vars = HashMap::new();
        vars.insert("user_id".to_string(), json!(7));
        let ctx = ExecutionContext::new("exec-1", vars);
        let input = input_with(json!({
            "method": "GET",
            "url": "https://api.example.com/users/{{user_id}}",
        }));
        let output = HttpRequestProcessor.execute(&input, &ctx).await;
        assert!(output.success);
        assert_eq!(output.data["url"], json!("https://api.example.com/users/7"));
    }

    #[tokio::test]
    async fn test_server_error_exhausts_retries() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let input = input_with(json!({
            "method": "GET",
            "url": "https://api.example.com/error",
            "retries": 2,
        }));
        let output = HttpRequestProcessor.execute(&input, &ctx).await;
        assert!(!output.success);
        let error = output.error.unwrap();
        assert!(error.contains("3 attempts"), "{error}");
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let input = input_with(json!({
            "method": "GET",
            "url": "https://api.example.com/404",
            "retries": 5,
        }));
        let started = Instant::now();
        let output = HttpRequestProcessor.execute(&input, &ctx).await;
        assert!(!output.success);
        assert!(output.error.unwrap().contains("404"));
        // No backoff sleeps means a fast failure
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_bearer_auth_header() {
        let mut headers = Map::new();
        let config: Map<String, Value> = serde_json::from_value(json!({
            "authType": "bearer",
            "authToken": "secret",
        }))
        .unwrap();
        HttpRequestProcessor::apply_auth(&config, &mut headers);
        assert_eq!(headers["Authorization"], json!("Bearer secret"));
    }

    #[tokio::test]
    async fn test_basic_auth_header_encoded() {
        let mut headers = Map::new();
        let config: Map<String, Value> = serde_json::from_value(json!({
            "authType": "basic",
            "username": "user",
            "password": "pass",
        }))
        .unwrap();
        HttpRequestProcessor::apply_auth(&config, &mut headers);
        assert_eq!(headers["Authorization"], json!("Basic dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn test_missing_url_is_config_error() {
        let ctx = ExecutionContext::new("exec-1", HashMap::new());
        let input = input_with(json!({"method": "GET"}));
        let output = HttpRequestProcessor.execute(&input, &ctx).await;
        assert!(!output.success);
        assert!(output.error.unwrap().contains("URL"));
    }
}
