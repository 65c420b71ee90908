//! Tool trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::ToolError;
use super::context::ToolContext;

/// A tool that can be called by the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the model's tool-call name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Argument names left out when a call is summarized for display
    fn hidden_args(&self) -> &'static [&'static str] {
        &[]
    }

    /// Optional one-line rendering of a result for display
    fn render(&self, _result: &ToolResult) -> Option<String> {
        None
    }

    /// Execute the tool with arguments already checked against `input_schema`
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// A model's request to run one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlation id echoed back with the result
    #[serde(default = "new_call_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: Value,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, input: Value) -> Self {
        Self {
            id: new_call_id(),
            name: name.into(),
            input,
        }
    }
}

fn new_call_id() -> String {
    format!("call_{}", uuid::Uuid::now_v7().simple())
}

/// Result of a tool execution
///
/// `payload` is the JSON object handed back to the model. It always carries
/// a `success` field; failures also carry `error` and `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub payload: Value,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result from a serializable output
    pub fn success(output: impl Serialize) -> Self {
        debug!("ToolResult::success: called");
        Self::from_output(output, true)
    }

    /// Create a result from a tool-specific output that already knows whether it succeeded
    pub fn from_output(output: impl Serialize, success: bool) -> Self {
        let payload = match serde_json::to_value(output) {
            Ok(Value::Object(mut map)) => {
                map.entry("success").or_insert(Value::Bool(success));
                Value::Object(map)
            }
            Ok(other) => json!({ "success": success, "result": other }),
            Err(e) => {
                debug!(%e, "ToolResult::from_output: serialization failed");
                return Self::error(ToolError::invalid(format!("unserializable tool output: {}", e)));
            }
        };
        Self {
            payload,
            is_error: !success,
        }
    }

    /// Create an error result
    pub fn error(err: ToolError) -> Self {
        debug!(kind = err.kind(), "ToolResult::error: called");
        Self {
            payload: json!({
                "success": false,
                "error": err.to_string(),
                "kind": err.kind(),
            }),
            is_error: true,
        }
    }

    /// Create an error result that keeps tool-specific context fields next to the error
    pub fn error_with(context: impl Serialize, err: ToolError) -> Self {
        let mut result = Self::error(err);
        if let (Ok(Value::Object(ctx)), Value::Object(map)) = (serde_json::to_value(context), &mut result.payload) {
            for (key, value) in ctx {
                map.entry(key).or_insert(value);
            }
        }
        result
    }

    /// Error message, if this is a failed result
    pub fn error_message(&self) -> Option<&str> {
        self.payload["error"].as_str()
    }

    /// Error category, if this is a failed result
    pub fn error_kind(&self) -> Option<&str> {
        self.payload["kind"].as_str()
    }

    /// Serialized payload as sent back to the model
    pub fn content(&self) -> String {
        self.payload.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success(json!({ "file": "a.txt", "contentLength": 13 }));
        assert!(!result.is_error);
        assert_eq!(result.payload["success"], true);
        assert_eq!(result.payload["contentLength"], 13);
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error(ToolError::NoMatches);
        assert!(result.is_error);
        assert_eq!(result.error_message(), Some("No matches found"));
        assert_eq!(result.error_kind(), Some("no_matches"));
    }

    #[test]
    fn test_error_with_keeps_context_fields() {
        let result = ToolResult::error_with(json!({ "file": "a.txt", "matches": 0 }), ToolError::NoMatches);
        assert_eq!(result.payload["file"], "a.txt");
        assert_eq!(result.payload["matches"], 0);
        assert_eq!(result.payload["success"], false);
    }

    #[test]
    fn test_invocation_gets_generated_id() {
        let call: ToolInvocation = serde_json::from_value(json!({ "name": "read_file" })).unwrap();
        assert!(call.id.starts_with("call_"));
        assert!(call.input.is_null());
        assert_ne!(call.id, ToolInvocation::new("read_file", Value::Null).id);
    }

    #[test]
    fn test_from_output_respects_explicit_success_field() {
        let result = ToolResult::from_output(json!({ "success": false, "exitCode": 2 }), false);
        assert!(result.is_error);
        assert_eq!(result.payload["exitCode"], 2);
    }
}
