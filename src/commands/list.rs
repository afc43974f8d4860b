//! List command implementation

use crate::config::{Collection, Config};
use crate::error::Result;
use crate::search::{ApiDocSearch, GuideSearch};
use crate::store::DocType;
use serde_json::Value;
use tracing::info;

/// List indexed APIs or guides with their categories and document types
pub async fn cmd_list(
    config: &Config,
    collection: Collection,
    category: Option<&str>,
    doc_type: Option<DocType>,
) -> Result<Value> {
    info!("Listing {:?}", collection);

    let result = match collection {
        Collection::ApiDocs => {
            ApiDocSearch::open(config)?
                .list_available_apis(category)
                .await
        }
        Collection::Guides => GuideSearch::open(config)?.list_available_guides(doc_type).await,
    };
    Ok(result)
}

/// Print listing to console
pub fn print_listing(result: &Value) {
    if let Some(error) = result.get("error").and_then(|v| v.as_str()) {
        println!("✗ Listing failed: {}", error);
        return;
    }

    let empty = Vec::new();
    let entries = result
        .get("apis")
        .or_else(|| result.get("guides"))
        .and_then(|v| v.as_array())
        .unwrap_or(&empty);

    if entries.is_empty() {
        println!("Nothing indexed yet. Run 'paydocs index' first.");
        return;
    }

    println!("\n📚 {} entries\n", entries.len());
    for entry in entries {
        let name = entry
            .get("api_name")
            .or_else(|| entry.get("guide_name"))
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        let count = entry["document_count"].as_u64().unwrap_or(0);
        let categories: Vec<&str> = entry["categories"]
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        println!("• {} ({} chunks) [{}]", name, count, categories.join(", "));

        if entry.get("has_specification").is_some() {
            let mut material = Vec::new();
            if entry["has_specification"].as_bool().unwrap_or(false) {
                material.push("spec");
            }
            if entry["has_samples"].as_bool().unwrap_or(false) {
                material.push("samples");
            }
            println!("    available: {}", material.join(" + "));
        }
    }
}
