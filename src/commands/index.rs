//! Index command implementation

use crate::config::Config;
use crate::error::Result;
use crate::index::{IndexOptions, IndexRunStats, Indexer};
use crate::store::IndexStats;
use std::path::PathBuf;
use tracing::info;

/// Run an indexing pass over the documentation tree
pub async fn cmd_index(
    config: &Config,
    docs_dir: PathBuf,
    options: IndexOptions,
) -> Result<IndexRunStats> {
    info!("Indexing documentation from {:?}", docs_dir);
    let indexer = Indexer::new(config.clone(), docs_dir);
    indexer.run(&options).await
}

/// Report per-index statistics for both collections
pub async fn cmd_verify(
    config: &Config,
    docs_dir: PathBuf,
) -> Result<Vec<(String, Option<IndexStats>)>> {
    let indexer = Indexer::new(config.clone(), docs_dir);
    indexer.verify().await
}

/// Delete both chunk indices
pub async fn cmd_delete_indices(config: &Config, docs_dir: PathBuf) -> Result<Vec<String>> {
    let indexer = Indexer::new(config.clone(), docs_dir);
    indexer.delete_indices().await
}

/// Print indexing stats to console
pub fn print_index_stats(stats: &IndexRunStats) {
    println!("\n📖 Indexing complete\n");
    println!("  Documents indexed: {}", stats.documents_indexed);
    println!("  Chunks written:    {}", stats.chunks_indexed);
    println!("  Skipped (already indexed or empty): {}", stats.skipped);
    if stats.failed > 0 {
        println!("  Failed: {} (see log for details)", stats.failed);
    }
}

/// Print verification report to console
pub fn print_verify_report(reports: &[(String, Option<IndexStats>)]) {
    println!("\n📖 Index verification\n");
    for (name, stats) in reports {
        match stats {
            Some(stats) => {
                println!("• {} — {} documents", name, stats.total_documents);
                for (doc_type, count) in &stats.documents_by_type {
                    println!("    {}: {}", doc_type, count);
                }
                if let Some(bytes) = stats.size_bytes {
                    println!("    size: {} bytes", bytes);
                }
            }
            None => println!("• {} — missing", name),
        }
    }
}

/// Print deletion report to console
pub fn print_deleted_indices(deleted: &[String]) {
    if deleted.is_empty() {
        println!("No indices to delete.");
    } else {
        for name in deleted {
            println!("✓ Deleted index '{}'", name);
        }
    }
}
