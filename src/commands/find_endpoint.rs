//! Find-endpoint command implementation

use crate::config::Config;
use crate::error::Result;
use crate::llm::create_completion_model;
use crate::tools::{EndpointFinder, EndpointQuery};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

/// Look up the best API document for a task
pub async fn cmd_find_endpoint(
    config: &Config,
    docs_dir: PathBuf,
    query: EndpointQuery,
) -> Result<Value> {
    info!("Finding endpoint for task_type: {}", query.task_type);

    let model = match create_completion_model(&config.completion) {
        Ok(model) => Some(model),
        Err(e) => {
            warn!("Completion model unavailable, using rule-based selection: {}", e);
            None
        }
    };

    let finder = EndpointFinder::new(docs_dir, model);
    Ok(finder.find_endpoint(&query).await)
}

/// Print endpoint selection to console
pub fn print_endpoint_result(result: &Value) {
    if let Some(error) = result.get("error").and_then(|v| v.as_str()) {
        println!("✗ {}", error);
        if let Some(types) = result.get("available_task_types").and_then(|v| v.as_array()) {
            println!("\nAvailable task types:");
            for t in types {
                println!("  • {}", t.as_str().unwrap_or("?"));
            }
        }
        return;
    }

    let selected = &result["selected_api"];
    println!("\n🎯 Recommended API\n");
    println!("  API:      {}", selected["api_name"].as_str().unwrap_or("?"));
    println!("  Category: {}", selected["category"].as_str().unwrap_or("?"));
    println!("  Document: {}", selected["doc_path"].as_str().unwrap_or("?"));
    println!("\nReasoning: {}", result["reasoning"].as_str().unwrap_or(""));

    if let Some(notes) = result["integration_notes"].as_str() {
        if !notes.is_empty() {
            println!("Notes: {}", notes);
        }
    }

    if let Some(alternatives) = result["alternative_apis"].as_array() {
        if !alternatives.is_empty() {
            println!("\nAlternatives:");
            for alt in alternatives {
                println!(
                    "  • {} [{}]",
                    alt["api_name"].as_str().unwrap_or("?"),
                    alt["category"].as_str().unwrap_or("?")
                );
            }
        }
    }

    if !result["llm_powered"].as_bool().unwrap_or(false) {
        println!("\n(rule-based selection; configure a completion backend for better results)");
    }
}
