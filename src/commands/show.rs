//! Show command implementation
//!
//! Fetches every chunk for one named API or integration workflow,
//! reassembled in document order.

use crate::config::{Collection, Config};
use crate::error::Result;
use crate::search::{ApiDocSearch, GuideSearch};
use serde_json::Value;
use tracing::info;

/// Fetch a complete API specification (and optionally its samples) by name
pub async fn cmd_show_api(config: &Config, name: &str, include_samples: bool) -> Result<Value> {
    info!("Fetching API documentation for '{}'", name);
    Ok(ApiDocSearch::open(config)?
        .search_by_api_name(name, include_samples)
        .await)
}

/// Fetch a complete integration workflow by name
pub async fn cmd_show_workflow(config: &Config, name: &str) -> Result<Value> {
    info!("Fetching integration workflow '{}'", name);
    Ok(GuideSearch::open(config)?
        .get_integration_workflow(name)
        .await)
}

/// Dispatch a show request to the right collection
pub async fn cmd_show(
    config: &Config,
    collection: Collection,
    name: &str,
    include_samples: bool,
) -> Result<Value> {
    match collection {
        Collection::ApiDocs => cmd_show_api(config, name, include_samples).await,
        Collection::Guides => cmd_show_workflow(config, name).await,
    }
}

/// Print a show result to console
pub fn print_show_result(result: &Value) {
    if let Some(error) = result.get("error").and_then(|v| v.as_str()) {
        println!("✗ Lookup failed: {}", error);
        return;
    }

    if !result["found"].as_bool().unwrap_or(false) {
        let name = result
            .get("api_name")
            .or_else(|| result.get("workflow_name"))
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        println!("Nothing found for '{}'.", name);
        return;
    }

    if let Some(name) = result.get("api_name").and_then(|v| v.as_str()) {
        println!("\n📄 {}\n", name);
        print_chunk_group(&result["specification"], "Specification");
        if !result["samples"].is_null() {
            print_chunk_group(&result["samples"], "Samples");
        }
        return;
    }

    let name = result["workflow_name"].as_str().unwrap_or("?");
    println!("\n📄 Workflow: {}\n", name);
    if let Some(workflows) = result["workflows"].as_array() {
        for workflow in workflows {
            println!(
                "── {} [{}]",
                workflow["file_path"].as_str().unwrap_or("?"),
                workflow["doc_type"].as_str().unwrap_or("?")
            );
            if let Some(chunks) = workflow["chunks"].as_array() {
                for chunk in chunks {
                    if let Some(section) = chunk["section"].as_str() {
                        println!("§ {}", section);
                    }
                    println!("{}\n", chunk["content"].as_str().unwrap_or(""));
                }
            }
        }
    }
}

fn print_chunk_group(group: &Value, label: &str) {
    let total = group["total_chunks"].as_u64().unwrap_or(0);
    if total == 0 {
        return;
    }
    println!("── {} ({} chunks)", label, total);
    if let Some(chunks) = group["chunks"].as_array() {
        for chunk in chunks {
            if let Some(section) = chunk["section"].as_str() {
                println!("§ {}", section);
            }
            println!("{}\n", chunk["content"].as_str().unwrap_or(""));
        }
    }
}
