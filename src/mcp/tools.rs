//! MCP tool definitions and dispatch

use super::server::McpServer;
use super::types::ToolResult;
use crate::store::DocType;
use crate::tools::{EndpointQuery, TaskType};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

/// A tool definition in MCP format
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Get all available tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "find_api_endpoint".to_string(),
            description: "Find the best PayerMax API endpoint for a payment task. \
                          Returns the recommended API document with reasoning, \
                          alternatives, and optionally sample code."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_type": {
                        "type": "string",
                        "description": "The payment task to accomplish",
                        "enum": TaskType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>()
                    },
                    "payment_type": {
                        "type": "string",
                        "description": "Payment method involved (e.g. card, applepay, apm)"
                    },
                    "integration_mode": {
                        "type": "string",
                        "description": "Integration mode in use (e.g. cashier, pure_api, drop_in)"
                    },
                    "additional_requirements": {
                        "type": "string",
                        "description": "Any extra requirements to consider during selection"
                    },
                    "include_samples": {
                        "type": "boolean",
                        "description": "Include sample code from the matching sample file",
                        "default": false
                    }
                },
                "required": ["task_type"]
            }),
        },
        ToolDefinition {
            name: "get_integration_recommendation".to_string(),
            description: "Analyze a merchant's integration requirements described in \
                          natural language and recommend a PayerMax integration method \
                          with reasoning, relevant guides, and required APIs."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "user_description": {
                        "type": "string",
                        "description": "Natural-language description of the merchant's needs"
                    }
                },
                "required": ["user_description"]
            }),
        },
        ToolDefinition {
            name: "search_api_documentation".to_string(),
            description: "Semantic search over PayerMax API specifications and code \
                          samples. Returns ranked chunks with section context."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural-language search query"
                    },
                    "top_k": {
                        "type": "integer",
                        "description": "Number of results to return",
                        "default": 5,
                        "minimum": 1,
                        "maximum": 50
                    },
                    "doc_type_filter": {
                        "type": "string",
                        "description": "Restrict to one document type",
                        "enum": ["api_doc", "api_sample"]
                    },
                    "category_filter": {
                        "type": "string",
                        "description": "Restrict to one API category"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "search_integration_guides".to_string(),
            description: "Semantic search over PayerMax integration guides and product \
                          documentation. Returns ranked chunks with section context."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural-language search query"
                    },
                    "top_k": {
                        "type": "integer",
                        "description": "Number of results to return",
                        "default": 5,
                        "minimum": 1,
                        "maximum": 50
                    },
                    "doc_type_filter": {
                        "type": "string",
                        "description": "Restrict to one document type",
                        "enum": ["integration_guide", "payermax_doc"]
                    },
                    "category_filter": {
                        "type": "string",
                        "description": "Restrict to one guide category"
                    }
                },
                "required": ["query"]
            }),
        },
    ]
}

/// Handle a tool call by name
pub async fn handle_tool_call(
    name: &str,
    arguments: &HashMap<String, Value>,
    server: &McpServer,
) -> ToolResult {
    debug!("Handling tool call: {}", name);

    match name {
        "find_api_endpoint" => handle_find_api_endpoint(arguments, server).await,
        "get_integration_recommendation" => {
            handle_get_integration_recommendation(arguments, server).await
        }
        "search_api_documentation" => handle_search_api_documentation(arguments, server).await,
        "search_integration_guides" => handle_search_integration_guides(arguments, server).await,
        _ => ToolResult::error(format!("Unknown tool: {}", name)),
    }
}

fn string_arg(arguments: &HashMap<String, Value>, key: &str) -> Option<String> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn doc_type_arg(arguments: &HashMap<String, Value>) -> Result<Option<DocType>, ToolResult> {
    match arguments.get("doc_type_filter").and_then(|v| v.as_str()) {
        Some(raw) => match raw.parse::<DocType>() {
            Ok(doc_type) => Ok(Some(doc_type)),
            Err(e) => Err(ToolResult::error(e.to_string())),
        },
        None => Ok(None),
    }
}

fn top_k_arg(arguments: &HashMap<String, Value>) -> Option<usize> {
    arguments
        .get("top_k")
        .and_then(|v| v.as_u64())
        .map(|k| k as usize)
}

async fn handle_find_api_endpoint(
    arguments: &HashMap<String, Value>,
    server: &McpServer,
) -> ToolResult {
    let task_type = match string_arg(arguments, "task_type") {
        Some(raw) => match raw.parse::<TaskType>() {
            Ok(task_type) => task_type,
            Err(e) => return ToolResult::error(e.to_string()),
        },
        None => return ToolResult::error("Missing required parameter: task_type"),
    };

    let query = EndpointQuery {
        task_type,
        payment_type: string_arg(arguments, "payment_type"),
        integration_mode: string_arg(arguments, "integration_mode"),
        additional_requirements: string_arg(arguments, "additional_requirements"),
        include_samples: arguments
            .get("include_samples")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    };

    let result = server.finder().find_endpoint(&query).await;
    ToolResult::json(&result)
}

async fn handle_get_integration_recommendation(
    arguments: &HashMap<String, Value>,
    server: &McpServer,
) -> ToolResult {
    let user_description = match string_arg(arguments, "user_description") {
        Some(d) if !d.trim().is_empty() => d,
        _ => return ToolResult::error("Missing required parameter: user_description"),
    };

    let result = server
        .assistant()
        .analyze_requirements(&user_description)
        .await;
    ToolResult::json(&result)
}

async fn handle_search_api_documentation(
    arguments: &HashMap<String, Value>,
    server: &McpServer,
) -> ToolResult {
    let search = match server.api_search() {
        Some(search) => search,
        None => return search_unavailable("search_api_documentation"),
    };

    let query = match string_arg(arguments, "query") {
        Some(q) if !q.trim().is_empty() => q,
        _ => return ToolResult::error("Missing required parameter: query"),
    };
    let doc_type = match doc_type_arg(arguments) {
        Ok(doc_type) => doc_type,
        Err(result) => return result,
    };

    let result = search
        .search(
            &query,
            top_k_arg(arguments),
            doc_type,
            string_arg(arguments, "category_filter"),
        )
        .await;
    ToolResult::json(&result)
}

async fn handle_search_integration_guides(
    arguments: &HashMap<String, Value>,
    server: &McpServer,
) -> ToolResult {
    let search = match server.guide_search() {
        Some(search) => search,
        None => return search_unavailable("search_integration_guides"),
    };

    let query = match string_arg(arguments, "query") {
        Some(q) if !q.trim().is_empty() => q,
        _ => return ToolResult::error("Missing required parameter: query"),
    };
    let doc_type = match doc_type_arg(arguments) {
        Ok(doc_type) => doc_type,
        Err(result) => return result,
    };

    let result = search
        .search(
            &query,
            top_k_arg(arguments),
            doc_type,
            string_arg(arguments, "category_filter"),
        )
        .await;
    ToolResult::json(&result)
}

fn search_unavailable(tool: &str) -> ToolResult {
    ToolResult::json(&json!({
        "error": format!(
            "Search backend is not configured; '{}' is unavailable. \
             Check the search_url and embedding settings in the configuration.",
            tool
        ),
        "results": []
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definitions_cover_all_tools() {
        let tools = get_tool_definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "find_api_endpoint",
                "get_integration_recommendation",
                "search_api_documentation",
                "search_integration_guides"
            ]
        );
    }

    #[test]
    fn test_schema_uses_mcp_field_name() {
        let tools = get_tool_definitions();
        let serialized = serde_json::to_value(&tools[0]).unwrap();
        assert!(serialized.get("inputSchema").is_some());
        assert!(serialized.get("input_schema").is_none());
    }

    #[test]
    fn test_task_type_enum_is_complete() {
        let tools = get_tool_definitions();
        let schema = &tools[0].input_schema;
        let variants = schema["properties"]["task_type"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(variants.len(), TaskType::ALL.len());
    }

    #[test]
    fn test_doc_type_arg_rejects_unknown() {
        let mut arguments = HashMap::new();
        arguments.insert("doc_type_filter".to_string(), json!("spreadsheet"));
        assert!(doc_type_arg(&arguments).is_err());
    }

    #[test]
    fn test_top_k_arg_ignores_non_integers() {
        let mut arguments = HashMap::new();
        arguments.insert("top_k".to_string(), json!("five"));
        assert_eq!(top_k_arg(&arguments), None);
    }
}
