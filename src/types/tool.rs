//! Tool invocation requests and results exchanged with the model.

use serde::{Deserialize, Serialize};

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocationRequest {
    /// Correlates the call with the result replayed to the model.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolInvocationRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of a single tool execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { value: serde_json::Value },
    Error { message: String },
}

/// A tool execution result, always correlated to its request id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocationResult {
    pub id: String,
    pub name: String,
    pub outcome: ToolOutcome,
}

impl ToolInvocationResult {
    /// Successful result for `request`.
    pub fn success(request: &ToolInvocationRequest, value: serde_json::Value) -> Self {
        Self {
            id: request.id.clone(),
            name: request.name.clone(),
            outcome: ToolOutcome::Success { value },
        }
    }

    /// Error result for `request`.
    pub fn error(request: &ToolInvocationRequest, message: impl Into<String>) -> Self {
        Self {
            id: request.id.clone(),
            name: request.name.clone(),
            outcome: ToolOutcome::Error {
                message: message.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Error { .. })
    }

    /// Payload the model reads back for this call.
    pub fn response_payload(&self) -> serde_json::Value {
        match &self.outcome {
            ToolOutcome::Success { value } => serde_json::json!({ "result": value }),
            ToolOutcome::Error { message } => {
                serde_json::json!({ "result": { "error": message } })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn results_keep_request_correlation() {
        let request = ToolInvocationRequest::new("call-7", "addHabit", json!({}));

        let ok = ToolInvocationResult::success(&request, json!({ "status": "success" }));
        let err = ToolInvocationResult::error(&request, "boom");

        assert_eq!(ok.id, "call-7");
        assert_eq!(err.name, "addHabit");
        assert!(!ok.is_error());
        assert!(err.is_error());
    }

    #[test]
    fn error_payload_wraps_message_under_result() {
        let request = ToolInvocationRequest::new("1", "removeHabit", json!({}));
        let err = ToolInvocationResult::error(&request, "User denied action");

        assert_eq!(
            err.response_payload(),
            json!({ "result": { "error": "User denied action" } })
        );
    }

    #[test]
    fn request_arguments_default_to_null_when_absent() {
        let request: ToolInvocationRequest =
            serde_json::from_value(json!({ "id": "a", "name": "getAppState" })).unwrap();
        assert!(request.arguments.is_null());
    }
}
