//! MCP types and protocol definitions
//!
//! Some types here are defined for future MCP protocol support but not yet used.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// MCP error codes (JSON-RPC 2.0 compatible)
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

/// MCP error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MCP Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for McpError {}

impl From<std::io::Error> for McpError {
    fn from(e: std::io::Error) -> Self {
        Self {
            code: ErrorCode::InternalError as i32,
            message: e.to_string(),
            data: None,
        }
    }
}

impl From<serde_json::Error> for McpError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            code: ErrorCode::ParseError as i32,
            message: e.to_string(),
            data: None,
        }
    }
}

impl McpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, msg)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, msg)
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, msg)
    }
}

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl McpRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl McpResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, error: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn error_with_code(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self::error(
            id,
            McpError {
                code,
                message: message.into(),
                data: None,
            },
        )
    }
}

/// JSON-RPC 2.0 notification (request without id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Incoming message: either a request or a notification
#[derive(Debug, Clone)]
pub enum McpMessage {
    Request(McpRequest),
    Notification(McpNotification),
}

// An untagged enum would resolve every notification to `Request` with
// `id: None` (the `Option` fields tolerate the missing key), so dispatch
// on the presence of the `id` field instead. Per JSON-RPC 2.0, a message
// without an `id` member is a notification and must never be answered.
impl<'de> Deserialize<'de> for McpMessage {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let value = Value::deserialize(deserializer)?;
        if value.get("id").is_some() {
            McpRequest::deserialize(&value)
                .map(McpMessage::Request)
                .map_err(D::Error::custom)
        } else {
            McpNotification::deserialize(&value)
                .map(McpMessage::Notification)
                .map_err(D::Error::custom)
        }
    }
}

/// Result of a tool call, in MCP content form
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub content: Vec<Value>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![serde_json::json!({
                "type": "text",
                "text": text.into()
            })],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![serde_json::json!({
                "type": "text",
                "text": text.into()
            })],
            is_error: true,
        }
    }

    /// Serialize a JSON value as pretty text content
    pub fn json(value: &Value) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(format!("Failed to serialize result: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_parses_request() {
        let line = r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;
        let message: McpMessage = serde_json::from_str(line).unwrap();
        match message {
            McpMessage::Request(req) => {
                assert_eq!(req.method, "tools/list");
                assert_eq!(req.id, Some(json!(1)));
            }
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn test_message_parses_notification() {
        let line = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let message: McpMessage = serde_json::from_str(line).unwrap();
        match message {
            McpMessage::Notification(notif) => {
                assert_eq!(notif.method, "notifications/initialized");
            }
            McpMessage::Request(req) => {
                panic!("notification misparsed as request with id={:?}", req.id)
            }
        }
    }

    #[test]
    fn test_notification_with_params_stays_notification() {
        let line = r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":7}}"#;
        let message: McpMessage = serde_json::from_str(line).unwrap();
        assert!(matches!(message, McpMessage::Notification(_)));
    }

    #[test]
    fn test_null_id_is_still_a_request() {
        let line = r#"{"jsonrpc":"2.0","id":null,"method":"tools/list"}"#;
        let message: McpMessage = serde_json::from_str(line).unwrap();
        assert!(matches!(message, McpMessage::Request(_)));
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let response = McpResponse::success(Some(json!(3)), json!({"ok": true}));
        let text = serde_json::to_string(&response).unwrap();
        assert!(!text.contains("error"));
    }

    #[test]
    fn test_tool_result_json_pretty() {
        let result = ToolResult::json(&json!({"found": true}));
        assert!(!result.is_error);
        let text = result.content[0]["text"].as_str().unwrap();
        assert!(text.contains("\"found\": true"));
    }
}
