//! Search command implementation

use crate::config::{Collection, Config};
use crate::error::Result;
use crate::search::{ApiDocSearch, GuideSearch};
use crate::store::DocType;
use serde_json::Value;
use tracing::info;

/// Search options
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Number of results to return
    pub top_k: Option<usize>,
    /// Restrict to one document type
    pub doc_type: Option<DocType>,
    /// Restrict to one category
    pub category: Option<String>,
}

/// Execute a semantic search against one collection
pub async fn cmd_search(
    config: &Config,
    collection: Collection,
    query: &str,
    options: SearchOptions,
) -> Result<Value> {
    info!("Searching {:?} for: {}", collection, query);

    let result = match collection {
        Collection::ApiDocs => {
            ApiDocSearch::open(config)?
                .search(query, options.top_k, options.doc_type, options.category)
                .await
        }
        Collection::Guides => {
            GuideSearch::open(config)?
                .search(query, options.top_k, options.doc_type, options.category)
                .await
        }
    };
    Ok(result)
}

/// Search guides using the curated bilingual query for an integration mode
pub async fn cmd_search_by_mode(config: &Config, mode: &str) -> Result<Value> {
    info!("Searching guides for integration mode: {}", mode);
    Ok(GuideSearch::open(config)?
        .search_by_integration_mode(mode)
        .await)
}

/// Search product docs using the curated query for a payment method
pub async fn cmd_search_by_payment_method(config: &Config, method: &str) -> Result<Value> {
    info!("Searching product docs for payment method: {}", method);
    Ok(GuideSearch::open(config)?
        .search_by_payment_method(method)
        .await)
}

/// Print search results to console
pub fn print_search_results(result: &Value) {
    if let Some(error) = result.get("error").and_then(|v| v.as_str()) {
        println!("✗ Search failed: {}", error);
        return;
    }

    let query = result["query"].as_str().unwrap_or("");
    let total = result["total_results"].as_u64().unwrap_or(0);
    let empty = Vec::new();
    let results = result["results"].as_array().unwrap_or(&empty);

    println!("\n🔍 Results for '{}' ({} matched)\n", query, total);

    if results.is_empty() {
        println!("No results.");
        return;
    }

    for (i, hit) in results.iter().enumerate() {
        let name = hit
            .get("api_name")
            .or_else(|| hit.get("guide_name"))
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        let score = hit["relevance_score"].as_f64().unwrap_or(0.0);
        println!("{}. {} (score: {:.4})", i + 1, name, score);
        println!(
            "   {} [{}] — chunk {}",
            hit["file_path"].as_str().unwrap_or(""),
            hit["doc_type"].as_str().unwrap_or(""),
            hit["chunk_info"].as_str().unwrap_or("")
        );
        if let Some(section) = hit["section"].as_str() {
            println!("   § {}", section);
        }
        let content = hit["content"].as_str().unwrap_or("");
        let preview: String = content.chars().take(200).collect();
        println!("   {}", preview.replace('\n', " "));
        println!();
    }
}
