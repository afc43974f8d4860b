//! Status command implementation

use crate::config::{Collection, Config};
use crate::error::Result;
use crate::store::{IndexStats, SearchStore};
use serde::Serialize;
use tracing::info;

/// Status of one chunk index
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub index: String,
    pub exists: bool,
    pub stats: Option<IndexStats>,
}

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub search_url: String,
    pub search_connected: bool,
    pub embedding_backend: String,
    pub embedding_model: String,
    pub completion_backend: String,
    pub completion_model: String,
    pub indices: Vec<IndexStatus>,
}

/// Get system status
pub async fn cmd_status(config: &Config) -> Result<StatusInfo> {
    info!("Getting status");

    let mut search_connected = false;
    let mut indices = Vec::new();

    for collection in [Collection::ApiDocs, Collection::Guides] {
        let store = SearchStore::connect(config, collection)?;
        let name = store.index_name().to_string();

        match store.index_exists().await {
            Ok(true) => {
                search_connected = true;
                let stats = match store.stats().await {
                    Ok(stats) => stats,
                    Err(e) => {
                        tracing::debug!("Stats error for {}: {:?}", name, e);
                        None
                    }
                };
                indices.push(IndexStatus {
                    index: name,
                    exists: true,
                    stats,
                });
            }
            Ok(false) => {
                search_connected = true;
                indices.push(IndexStatus {
                    index: name,
                    exists: false,
                    stats: None,
                });
            }
            Err(e) => {
                tracing::debug!("Search cluster connection error: {:?}", e);
                indices.push(IndexStatus {
                    index: name,
                    exists: false,
                    stats: None,
                });
            }
        }
    }

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        search_url: config.search_url.clone(),
        search_connected,
        embedding_backend: config.embedding.url.clone(),
        embedding_model: config.embedding.model.clone(),
        completion_backend: config.completion.url.clone(),
        completion_model: config.completion.model.clone(),
        indices,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 paydocs Status\n");
    println!("Configuration: {}", status.config_path);
    println!("\nSearch cluster:");
    println!("  URL: {}", status.search_url);
    println!(
        "  Status: {}",
        if status.search_connected {
            "✓ Connected"
        } else {
            "✗ Not connected"
        }
    );

    for index in &status.indices {
        if let Some(stats) = &index.stats {
            println!("  {}: {} documents", index.index, stats.total_documents);
            for (doc_type, count) in &stats.documents_by_type {
                println!("    {}: {}", doc_type, count);
            }
        } else if index.exists {
            println!("  {}: exists (no stats)", index.index);
        } else {
            println!("  {}: not created (run 'paydocs index')", index.index);
        }
    }

    println!("\nEmbedding:");
    println!("  Backend: {}", status.embedding_backend);
    println!("  Model: {}", status.embedding_model);
    println!("\nCompletion:");
    println!("  Backend: {}", status.completion_backend);
    println!("  Model: {}", status.completion_model);
}
