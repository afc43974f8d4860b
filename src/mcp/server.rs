//! MCP stdio server implementation

use super::tools::{get_tool_definitions, handle_tool_call};
use super::types::{McpMessage, McpNotification, McpRequest, McpResponse};
use crate::config::Config;
use crate::error::Result;
use crate::llm::create_completion_model;
use crate::search::{ApiDocSearch, GuideSearch};
use crate::tools::{EndpointFinder, IntegrationAssistant};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// MCP Server implementation
pub struct McpServer {
    api_search: Option<ApiDocSearch>,
    guide_search: Option<GuideSearch>,
    finder: EndpointFinder,
    assistant: IntegrationAssistant,
}

impl McpServer {
    /// Wire up the tool backends.
    ///
    /// Search facades are optional: when the search or embedding backend
    /// cannot be configured the two search tools report that per call,
    /// while the recommendation tools stay usable.
    pub fn new(config: Config, docs_dir: PathBuf) -> Result<Self> {
        let api_search = match ApiDocSearch::open(&config) {
            Ok(search) => Some(search),
            Err(e) => {
                warn!("API documentation search unavailable: {}", e);
                None
            }
        };
        let guide_search = match GuideSearch::open(&config) {
            Ok(search) => Some(search),
            Err(e) => {
                warn!("Integration guide search unavailable: {}", e);
                None
            }
        };

        let finder_model = match create_completion_model(&config.completion) {
            Ok(model) => Some(model),
            Err(e) => {
                warn!("Completion model unavailable, using rule-based selection: {}", e);
                None
            }
        };
        let assistant_model = create_completion_model(&config.completion).ok();

        Ok(Self {
            api_search,
            guide_search,
            finder: EndpointFinder::new(docs_dir.clone(), finder_model),
            assistant: IntegrationAssistant::new(docs_dir, assistant_model),
        })
    }

    pub(super) fn api_search(&self) -> Option<&ApiDocSearch> {
        self.api_search.as_ref()
    }

    pub(super) fn guide_search(&self) -> Option<&GuideSearch> {
        self.guide_search.as_ref()
    }

    pub(super) fn finder(&self) -> &EndpointFinder {
        &self.finder
    }

    pub(super) fn assistant(&self) -> &IntegrationAssistant {
        &self.assistant
    }

    /// Run the MCP server loop over stdio
    pub async fn run(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        info!("MCP server starting on stdio");

        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    error!("Failed to read line: {}", e);
                    continue;
                }
            };

            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let message: McpMessage = match serde_json::from_str(&line) {
                Ok(m) => m,
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    let error_response = json!({
                        "jsonrpc": "2.0",
                        "id": null,
                        "error": {
                            "code": -32700,
                            "message": format!("Parse error: {}", e)
                        }
                    });
                    writeln!(stdout, "{}", error_response)?;
                    stdout.flush()?;
                    continue;
                }
            };

            match message {
                McpMessage::Request(req) => {
                    let response = self.handle_request(req).await;
                    let response_str = serde_json::to_string(&response)?;
                    debug!("Sending: {}", response_str);
                    writeln!(stdout, "{}", response_str)?;
                    stdout.flush()?;
                }
                McpMessage::Notification(notif) => {
                    self.handle_notification(notif).await;
                }
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle an MCP request
    async fn handle_request(&self, request: McpRequest) -> McpResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "tools/list" => self.handle_tools_list(id).await,
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => self.handle_resources_list(id).await,
            "prompts/list" => self.handle_prompts_list(id).await,
            _ => McpResponse::error_with_code(
                id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    /// Handle notifications (fire-and-forget)
    async fn handle_notification(&self, notification: McpNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => {
                info!("Client initialized");
            }
            "notifications/cancelled" => {
                info!("Request cancelled");
            }
            _ => {
                debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, id: Option<Value>, _params: Option<Value>) -> McpResponse {
        McpResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    },
                    "resources": {
                        "subscribe": false,
                        "listChanged": false
                    },
                    "prompts": {
                        "listChanged": false
                    }
                },
                "serverInfo": {
                    "name": "paydocs",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    /// Handle tools/list request
    async fn handle_tools_list(&self, id: Option<Value>) -> McpResponse {
        let tools = get_tool_definitions();
        McpResponse::success(id, json!({ "tools": tools }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error_with_code(id, -32602, "Missing params"),
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => return McpResponse::error_with_code(id, -32602, "Missing tool name"),
        };

        let arguments: HashMap<String, Value> = params
            .get("arguments")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        debug!("Calling tool: {} with args: {:?}", name, arguments);

        let result = handle_tool_call(&name, &arguments, self).await;

        McpResponse::success(
            id,
            json!({
                "content": result.content,
                "isError": result.is_error
            }),
        )
    }

    /// Handle resources/list request
    async fn handle_resources_list(&self, id: Option<Value>) -> McpResponse {
        McpResponse::success(id, json!({ "resources": [] }))
    }

    /// Handle prompts/list request
    async fn handle_prompts_list(&self, id: Option<Value>) -> McpResponse {
        McpResponse::success(id, json!({ "prompts": [] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_server() -> McpServer {
        let mut config = Config::default();
        config.completion.url = "http://127.0.0.1:1".to_string();
        McpServer::new(config, PathBuf::from("/nonexistent")).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_reports_protocol_version() {
        let server = test_server();
        let response = server.handle_initialize(Some(json!(1)), None);
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "paydocs");
    }

    #[tokio::test]
    async fn test_unknown_method_is_rejected() {
        let server = test_server();
        let request = McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(2)),
            method: "tools/destroy".to_string(),
            params: None,
        };
        let response = server.handle_request(request).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_tools_list_returns_all_tools() {
        let server = test_server();
        let response = server.handle_tools_list(Some(json!(3))).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 4);
    }

    #[tokio::test]
    async fn test_tools_call_requires_name() {
        let server = test_server();
        let response = server
            .handle_tools_call(Some(json!(4)), Some(json!({"arguments": {}})))
            .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_result() {
        let server = test_server();
        let params = json!({"name": "summon_dragons", "arguments": {}});
        let response = server.handle_tools_call(Some(json!(5)), Some(params)).await;
        let result = response.result.unwrap();
        assert_eq!(result["isError"], json!(true));
    }
}
