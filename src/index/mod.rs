//! Document indexing orchestration
//!
//! Walks the documentation tree, chunks each markdown file, embeds the
//! chunks, and writes them to the search cluster. Two collections are
//! maintained: API reference material and integration guides. Indexing
//! is append-only; `--recreate` rebuilds an index from scratch.

mod parallel;

pub use parallel::*;

use crate::chunk::{chunk_id, chunk_markdown, content_hash, doc_id, ChunkFragment};
use crate::config::{Collection, Config};
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::store::{ChunkDocument, ChunkMetadata, DocType, IndexStats, SearchStore};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// One documentation source directory
#[derive(Debug, Clone, Copy)]
pub struct DocSource {
    pub dir: &'static str,
    pub doc_type: DocType,
    pub collection: Collection,
}

/// The four documentation trees and where they are indexed
pub const SOURCES: [DocSource; 4] = [
    DocSource {
        dir: "api-docs",
        doc_type: DocType::ApiDoc,
        collection: Collection::ApiDocs,
    },
    DocSource {
        dir: "api-samples",
        doc_type: DocType::ApiSample,
        collection: Collection::ApiDocs,
    },
    DocSource {
        dir: "integration_process",
        doc_type: DocType::IntegrationGuide,
        collection: Collection::Guides,
    },
    DocSource {
        dir: "payermax_doc",
        doc_type: DocType::PayermaxDoc,
        collection: Collection::Guides,
    },
];

/// A fully prepared document: chunked, embedded, ready to write
#[derive(Debug)]
pub struct PreparedDocument {
    pub relative_path: String,
    pub doc_id: String,
    pub content_hash: String,
    pub collection: Collection,
    pub chunks: Vec<ChunkDocument>,
}

/// Counters accumulated over an indexing run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IndexRunStats {
    pub documents_indexed: usize,
    pub chunks_indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IndexRunStats {
    pub fn merge(&mut self, other: IndexRunStats) {
        self.documents_indexed += other.documents_indexed;
        self.chunks_indexed += other.chunks_indexed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Options for an indexing run
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Delete and recreate the target indices before indexing
    pub recreate: bool,
    /// Restrict the run to one collection
    pub collection: Option<Collection>,
    /// Worker count; 1 runs the sequential path
    pub workers: usize,
}

/// Find all markdown files under a directory, in stable path order
pub fn discover_markdown(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == "md")
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Normalize a path relative to the documentation root
fn relative_path(base: &Path, path: &Path) -> Result<PathBuf> {
    path.strip_prefix(base)
        .map(|p| p.to_path_buf())
        .map_err(|_| {
            Error::Other(format!(
                "Path {} is outside the documentation root",
                path.display()
            ))
        })
}

/// Identity and naming fields shared by every chunk of one document
#[derive(Debug, Clone)]
struct DocDescriptor {
    rel_str: String,
    doc_id: String,
    content_hash: String,
    api_name: String,
    file_name: String,
    category: String,
    file_size: usize,
}

fn describe_document(base: &Path, path: &Path, content: &str) -> Result<DocDescriptor> {
    let rel = relative_path(base, path)?;
    let doc_id = doc_id(&rel);
    let content_hash = content_hash(content);
    let rel_str = rel.to_string_lossy().replace('\\', "/");

    let api_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let category = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(DocDescriptor {
        rel_str,
        doc_id,
        content_hash,
        api_name,
        file_name,
        category,
        file_size: content.len(),
    })
}

fn assemble_chunk(
    desc: &DocDescriptor,
    source: &DocSource,
    fragment: ChunkFragment,
    index: usize,
    total_chunks: usize,
    embedding: Vec<f32>,
    indexed_at: &str,
) -> ChunkDocument {
    ChunkDocument {
        chunk_id: chunk_id(&desc.doc_id, index),
        doc_id: desc.doc_id.clone(),
        doc_type: source.doc_type,
        category: desc.category.clone(),
        api_name: desc.api_name.clone(),
        file_path: desc.rel_str.clone(),
        content: fragment.content,
        content_hash: desc.content_hash.clone(),
        chunk_index: index,
        total_chunks,
        section: fragment.section,
        section_hierarchy: fragment.section_hierarchy,
        section_level: fragment.section_level,
        embedding,
        metadata: ChunkMetadata {
            file_name: desc.file_name.clone(),
            file_size: desc.file_size,
            chunk_size: fragment.size,
        },
        indexed_at: indexed_at.to_string(),
    }
}

/// Read, chunk, and embed a single document in one batch.
///
/// Returns `None` for files that are empty after trimming. Used by the
/// parallel path, where a document is the unit of failure; the
/// sequential path embeds chunk by chunk instead.
pub async fn prepare_document(
    base: &Path,
    path: &Path,
    source: &DocSource,
    max_chunk_chars: usize,
    embedder: &dyn Embedder,
) -> Result<Option<PreparedDocument>> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let desc = describe_document(base, path, &content)?;

    let fragments = chunk_markdown(&content, max_chunk_chars);
    let total_chunks = fragments.len();

    let texts: Vec<String> = fragments.iter().map(|f| f.content.clone()).collect();
    let embeddings = embedder.embed(texts).await?;
    if embeddings.len() != total_chunks {
        return Err(Error::Embedding(format!(
            "Expected {} embeddings for {}, got {}",
            total_chunks,
            desc.rel_str,
            embeddings.len()
        )));
    }

    let indexed_at = chrono::Utc::now().to_rfc3339();
    let chunks = fragments
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, (fragment, embedding))| {
            assemble_chunk(&desc, source, fragment, i, total_chunks, embedding, &indexed_at)
        })
        .collect();

    Ok(Some(PreparedDocument {
        relative_path: desc.rel_str,
        doc_id: desc.doc_id,
        content_hash: desc.content_hash,
        collection: source.collection,
        chunks,
    }))
}

/// Indexing orchestrator over both collections
pub struct Indexer {
    config: Config,
    base_path: PathBuf,
}

impl Indexer {
    pub fn new(config: Config, base_path: PathBuf) -> Self {
        Self { config, base_path }
    }

    fn store_for(&self, collection: Collection) -> Result<SearchStore> {
        SearchStore::connect(&self.config, collection)
    }

    fn selected_sources(&self, collection: Option<Collection>) -> Vec<DocSource> {
        SOURCES
            .iter()
            .copied()
            .filter(|s| collection.map(|c| s.collection == c).unwrap_or(true))
            .collect()
    }

    /// Run an indexing pass with the given options
    pub async fn run(&self, options: &IndexOptions) -> Result<IndexRunStats> {
        let collections = match options.collection {
            Some(c) => vec![c],
            None => vec![Collection::ApiDocs, Collection::Guides],
        };

        for collection in &collections {
            let store = self.store_for(*collection)?;
            if options.recreate {
                info!("Recreating index {}", store.index_name());
                store.reset_index().await?;
            } else {
                store.ensure_index().await?;
            }
        }

        if options.workers > 1 {
            self.run_parallel(options).await
        } else {
            self.run_sequential(options).await
        }
    }

    async fn run_sequential(&self, options: &IndexOptions) -> Result<IndexRunStats> {
        let embedder = crate::embed::create_embedder(&self.config.embedding)?;
        let mut stats = IndexRunStats::default();

        for source in self.selected_sources(options.collection) {
            let dir = self.base_path.join(source.dir);
            if !dir.exists() {
                warn!("Skipping missing source directory {}", dir.display());
                continue;
            }

            let files = discover_markdown(&dir);
            info!(
                "Indexing {} files from {} as {}",
                files.len(),
                source.dir,
                source.doc_type
            );

            let store = self.store_for(source.collection)?;
            let bar = progress_bar(files.len() as u64, source.dir);

            for path in files {
                match self.index_one(&store, &path, &source, embedder.as_ref()).await {
                    Ok(outcome) => stats.merge(outcome),
                    Err(e) => {
                        warn!("Failed to index {}: {}", path.display(), e);
                        stats.failed += 1;
                    }
                }
                bar.inc(1);
            }
            bar.finish_and_clear();
        }

        info!(
            "Indexing complete: {} documents, {} chunks, {} skipped, {} failed",
            stats.documents_indexed, stats.chunks_indexed, stats.skipped, stats.failed
        );
        Ok(stats)
    }

    async fn index_one(
        &self,
        store: &SearchStore,
        path: &Path,
        source: &DocSource,
        embedder: &dyn Embedder,
    ) -> Result<IndexRunStats> {
        let mut stats = IndexRunStats::default();

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            stats.skipped += 1;
            return Ok(stats);
        }

        // Cheap dedup probe before paying for embeddings
        let desc = describe_document(&self.base_path, path, &content)?;
        if store.is_indexed(&desc.doc_id, &desc.content_hash).await? {
            stats.skipped += 1;
            return Ok(stats);
        }

        let fragments = chunk_markdown(&content, self.config.chunk.max_chars);
        let total_chunks = fragments.len();
        let indexed_at = chrono::Utc::now().to_rfc3339();

        // A failed chunk is logged and skipped; its siblings still index
        let mut written = 0;
        for (i, fragment) in fragments.into_iter().enumerate() {
            let embedding = match embedder.embed_one(fragment.content.clone()).await {
                Ok(vector) => vector,
                Err(e) => {
                    warn!("Failed to embed chunk {} of {}: {}", i, desc.rel_str, e);
                    continue;
                }
            };

            let chunk =
                assemble_chunk(&desc, source, fragment, i, total_chunks, embedding, &indexed_at);
            if let Err(e) = store.index_chunk(&chunk).await {
                warn!("Failed to write chunk {} of {}: {}", i, desc.rel_str, e);
                continue;
            }
            written += 1;
        }

        stats.chunks_indexed += written;
        if written > 0 {
            stats.documents_indexed += 1;
        } else {
            stats.failed += 1;
        }
        Ok(stats)
    }

    /// Gather per-index statistics for both collections
    pub async fn verify(&self) -> Result<Vec<(String, Option<IndexStats>)>> {
        let mut reports = Vec::new();
        for collection in [Collection::ApiDocs, Collection::Guides] {
            let store = self.store_for(collection)?;
            let name = store.index_name().to_string();
            let stats = store.stats().await?;
            reports.push((name, stats));
        }
        Ok(reports)
    }

    /// Delete both indices; returns the names of those that existed
    pub async fn delete_indices(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for collection in [Collection::ApiDocs, Collection::Guides] {
            let store = self.store_for(collection)?;
            if store.delete_index().await? {
                deleted.push(store.index_name().to_string());
            }
        }
        Ok(deleted)
    }
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{msg:>20} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(label.to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_markdown_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("payments")).unwrap();
        fs::write(tmp.path().join("payments/b.md"), "# B").unwrap();
        fs::write(tmp.path().join("payments/a.md"), "# A").unwrap();
        fs::write(tmp.path().join("payments/notes.txt"), "not markdown").unwrap();

        let files = discover_markdown(tmp.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.md"));
        assert!(files[1].ends_with("b.md"));
    }

    #[test]
    fn test_sources_cover_both_collections() {
        let api: Vec<_> = SOURCES
            .iter()
            .filter(|s| s.collection == Collection::ApiDocs)
            .collect();
        let guides: Vec<_> = SOURCES
            .iter()
            .filter(|s| s.collection == Collection::Guides)
            .collect();
        assert_eq!(api.len(), 2);
        assert_eq!(guides.len(), 2);
    }

    struct FixedEmbedder {
        dimension: usize,
    }

    #[async_trait::async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5; self.dimension]).collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_prepare_document_assembles_chunks() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api-docs").join("payments");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("create-payment.md");
        fs::write(&path, "# Create Payment\nbody\n## Request\nfields").unwrap();

        let embedder = FixedEmbedder { dimension: 4 };
        let prepared = prepare_document(tmp.path(), &path, &SOURCES[0], 3000, &embedder)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(prepared.relative_path, "api-docs/payments/create-payment.md");
        assert_eq!(prepared.collection, Collection::ApiDocs);
        assert_eq!(prepared.chunks.len(), 2);

        let first = &prepared.chunks[0];
        assert_eq!(first.chunk_id, format!("{}_0", prepared.doc_id));
        assert_eq!(first.api_name, "create-payment");
        assert_eq!(first.category, "payments");
        assert_eq!(first.doc_type, DocType::ApiDoc);
        assert_eq!(first.total_chunks, 2);
        assert_eq!(first.embedding.len(), 4);
        assert_eq!(first.metadata.file_name, "create-payment.md");
    }

    #[tokio::test]
    async fn test_prepare_document_skips_empty_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api-docs").join("misc");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.md");
        fs::write(&path, "   \n").unwrap();

        let embedder = FixedEmbedder { dimension: 4 };
        let prepared = prepare_document(tmp.path(), &path, &SOURCES[0], 3000, &embedder)
            .await
            .unwrap();
        assert!(prepared.is_none());
    }

    #[tokio::test]
    async fn test_prepare_document_stable_ids_across_runs() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("payermax_doc").join("cards");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("card-payment.md");
        fs::write(&path, "# Card Payment\ncontent").unwrap();

        let embedder = FixedEmbedder { dimension: 4 };
        let a = prepare_document(tmp.path(), &path, &SOURCES[3], 3000, &embedder)
            .await
            .unwrap()
            .unwrap();
        let b = prepare_document(tmp.path(), &path, &SOURCES[3], 3000, &embedder)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(a.doc_id, b.doc_id);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.chunks[0].chunk_id, b.chunks[0].chunk_id);
    }

    #[tokio::test]
    async fn test_sibling_chunks_survive_one_write_failure() {
        use wiremock::matchers::{body_string_contains, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        // The first chunk's write fails; its siblings must still be written
        Mock::given(method("POST"))
            .and(path("/payermax-api-docs/_doc"))
            .and(body_string_contains("\"chunk_index\":0"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/payermax-api-docs/_doc"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"result": "created"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api-docs").join("payments");
        fs::create_dir_all(&dir).unwrap();
        let doc_path = dir.join("refund.md");
        fs::write(&doc_path, "# A\ntext1\n## B\ntext2\n## C\ntext3").unwrap();

        let mut config = Config::default();
        config.search_url = server.uri();
        config.embedding.dimension = 4;

        let indexer = Indexer::new(config, tmp.path().to_path_buf());
        let store = indexer.store_for(Collection::ApiDocs).unwrap();
        let embedder = FixedEmbedder { dimension: 4 };

        let stats = indexer
            .index_one(&store, &doc_path, &SOURCES[0], &embedder)
            .await
            .unwrap();

        assert_eq!(stats.chunks_indexed, 2);
        assert_eq!(stats.documents_indexed, 1);
        assert_eq!(stats.failed, 0);
    }

    struct SelectiveEmbedder {
        dimension: usize,
        reject_containing: &'static str,
    }

    #[async_trait::async_trait]
    impl Embedder for SelectiveEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            if texts.iter().any(|t| t.contains(self.reject_containing)) {
                return Err(Error::Embedding("backend rejected input".to_string()));
            }
            Ok(texts.iter().map(|_| vec![0.5; self.dimension]).collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "selective"
        }
    }

    #[tokio::test]
    async fn test_document_survives_one_chunk_embed_failure() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payermax-api-docs/_doc"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"result": "created"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("api-docs").join("payments");
        fs::create_dir_all(&dir).unwrap();
        let doc_path = dir.join("capture.md");
        fs::write(&doc_path, "# A\ntext1\n## B\ntext2\n## C\ntext3").unwrap();

        let mut config = Config::default();
        config.search_url = server.uri();
        config.embedding.dimension = 4;

        let indexer = Indexer::new(config, tmp.path().to_path_buf());
        let store = indexer.store_for(Collection::ApiDocs).unwrap();
        let embedder = SelectiveEmbedder {
            dimension: 4,
            reject_containing: "text2",
        };

        let stats = indexer
            .index_one(&store, &doc_path, &SOURCES[0], &embedder)
            .await
            .unwrap();

        assert_eq!(stats.chunks_indexed, 2);
        assert_eq!(stats.documents_indexed, 1);
    }
}
