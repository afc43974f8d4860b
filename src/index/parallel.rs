//! Parallel indexing worker pool
//!
//! Documents are chunked and embedded by a fixed pool of workers, each
//! owning its own embedding client. Writes happen in a single-threaded
//! phase afterwards so dedup probes and bulk writes never race.

use super::{prepare_document, DocSource, IndexOptions, IndexRunStats, Indexer, PreparedDocument};
use crate::config::Collection;
use crate::embed::create_embedder;
use crate::error::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

/// One unit of work: a single markdown file
#[derive(Debug, Clone)]
struct IndexJob {
    path: PathBuf,
    source: DocSource,
}

/// What a worker produced for one job
struct JobOutcome {
    path: PathBuf,
    result: Result<Option<PreparedDocument>>,
}

impl Indexer {
    pub(super) async fn run_parallel(&self, options: &IndexOptions) -> Result<IndexRunStats> {
        let mut jobs = Vec::new();
        for source in self.selected_sources(options.collection) {
            let dir = self.base_path.join(source.dir);
            if !dir.exists() {
                warn!("Skipping missing source directory {}", dir.display());
                continue;
            }
            for path in super::discover_markdown(&dir) {
                jobs.push(IndexJob { path, source });
            }
        }

        let workers = options.workers;
        info!("Processing {} documents with {} workers", jobs.len(), workers);

        let (job_tx, job_rx) = mpsc::channel::<IndexJob>(workers * 2);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<JobOutcome>(workers * 2);

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let base_path = self.base_path.clone();
            let embedding_config = self.config.embedding.clone();
            let max_chars = self.config.chunk.max_chars;

            handles.push(tokio::spawn(async move {
                // Each worker owns its own backend client
                let embedder = match create_embedder(&embedding_config) {
                    Ok(e) => e,
                    Err(e) => {
                        warn!("Worker failed to start: {}", e);
                        return;
                    }
                };

                loop {
                    let job = {
                        let mut rx = job_rx.lock().await;
                        rx.recv().await
                    };
                    let Some(job) = job else { break };

                    let result = prepare_document(
                        &base_path,
                        &job.path,
                        &job.source,
                        max_chars,
                        embedder.as_ref(),
                    )
                    .await;

                    let outcome = JobOutcome {
                        path: job.path,
                        result,
                    };
                    if result_tx.send(outcome).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(result_tx);

        let feeder = tokio::spawn(async move {
            for job in jobs {
                if job_tx.send(job).await.is_err() {
                    break;
                }
            }
        });

        let mut prepared = Vec::new();
        let mut stats = IndexRunStats::default();
        while let Some(outcome) = result_rx.recv().await {
            match outcome.result {
                Ok(Some(doc)) => prepared.push(doc),
                Ok(None) => stats.skipped += 1,
                Err(e) => {
                    warn!("Failed to process {}: {}", outcome.path.display(), e);
                    stats.failed += 1;
                }
            }
        }

        let _ = feeder.await;
        for handle in handles {
            let _ = handle.await;
        }

        // Single-threaded write phase
        let api_store = self.store_for(Collection::ApiDocs)?;
        let guide_store = self.store_for(Collection::Guides)?;

        for doc in prepared {
            let store = match doc.collection {
                Collection::ApiDocs => &api_store,
                Collection::Guides => &guide_store,
            };

            if store.is_indexed(&doc.doc_id, &doc.content_hash).await? {
                stats.skipped += 1;
                continue;
            }

            match store.bulk_index(&doc.chunks).await {
                Ok(()) => {
                    stats.documents_indexed += 1;
                    stats.chunks_indexed += doc.chunks.len();
                }
                Err(e) => {
                    warn!("Failed to write {}: {}", doc.relative_path, e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            "Parallel indexing complete: {} documents, {} chunks, {} skipped, {} failed",
            stats.documents_indexed, stats.chunks_indexed, stats.skipped, stats.failed
        );
        Ok(stats)
    }
}
