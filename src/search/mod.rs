//! Search facades over the two chunk indices
//!
//! Each facade pairs a store handle with an embedder and formats results
//! as JSON envelopes. Search failures degrade to an error envelope with
//! an empty result list instead of propagating, so callers (the MCP
//! surface in particular) always get a well-formed response.

mod api_docs;
mod guides;

pub use api_docs::*;
pub use guides::*;

use crate::config::{Collection, Config};
use crate::embed::{create_embedder, Embedder};
use crate::error::Result;
use crate::store::{ScoredChunk, SearchFilter, SearchStore};
use serde_json::{json, Value};

/// A store handle plus the embedder used for query vectors
pub struct SearchIndex {
    store: SearchStore,
    embedder: Box<dyn Embedder>,
    default_k: usize,
    max_results: usize,
}

impl SearchIndex {
    /// Open a search index for one collection
    pub fn open(config: &Config, collection: Collection) -> Result<Self> {
        Ok(Self {
            store: SearchStore::connect(config, collection)?,
            embedder: create_embedder(&config.embedding)?,
            default_k: config.search.default_k,
            max_results: config.search.max_results,
        })
    }

    pub fn index_name(&self) -> &str {
        self.store.index_name()
    }

    pub fn store(&self) -> &SearchStore {
        &self.store
    }

    /// Clamp a requested result count to the configured bounds
    pub fn clamp_k(&self, top_k: Option<usize>) -> usize {
        top_k.unwrap_or(self.default_k).clamp(1, self.max_results)
    }

    /// Embed the query and run a k-NN search
    pub async fn semantic_search(
        &self,
        query: &str,
        k: usize,
        filter: &SearchFilter,
    ) -> Result<(usize, Vec<ScoredChunk>)> {
        let vector = self.embedder.embed_one(query.to_string()).await?;
        self.store.knn_search(&vector, k, filter).await
    }
}

/// Error envelope returned when a search cannot be completed
pub fn degraded_search_result(error: &str, query: &str) -> Value {
    json!({
        "error": error,
        "query": query,
        "results": []
    })
}

/// Format one hit for a search envelope; `name_key` is "api_name" for
/// the API index and "guide_name" for the guide index.
fn format_hit(hit: &ScoredChunk, name_key: &str) -> Value {
    json!({
        "relevance_score": hit.score,
        name_key: hit.doc.api_name,
        "doc_type": hit.doc.doc_type.as_str(),
        "category": hit.doc.category,
        "file_path": hit.doc.file_path,
        "section": hit.doc.section,
        "section_hierarchy": hit.doc.section_hierarchy,
        "content": hit.doc.content,
        "chunk_info": hit.doc.chunk_info()
    })
}

fn search_envelope(
    query: &str,
    total: usize,
    hits: &[ScoredChunk],
    name_key: &str,
    index: &str,
    filter: &SearchFilter,
    top_k: usize,
) -> Value {
    let results: Vec<Value> = hits.iter().map(|h| format_hit(h, name_key)).collect();
    json!({
        "query": query,
        "total_results": total,
        "returned_results": results.len(),
        "results": results,
        "search_metadata": {
            "index": index,
            "doc_type_filter": filter.doc_type.map(|d| d.as_str()),
            "category_filter": filter.category,
            "top_k": top_k
        }
    })
}
