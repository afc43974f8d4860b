//! Semantic search over API specifications and samples

use super::{degraded_search_result, search_envelope, SearchIndex};
use crate::config::{Collection, Config};
use crate::error::Result;
use crate::store::{ChunkDocument, DocType, SearchFilter};
use serde_json::{json, Value};
use tracing::warn;

/// Search facade over the API documentation index
pub struct ApiDocSearch {
    index: SearchIndex,
}

impl ApiDocSearch {
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self {
            index: SearchIndex::open(config, Collection::ApiDocs)?,
        })
    }

    /// Semantic search across API specs and samples.
    ///
    /// Failures return a degraded envelope instead of an error.
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        doc_type_filter: Option<DocType>,
        category_filter: Option<String>,
    ) -> Value {
        let k = self.index.clamp_k(top_k);
        let filter = SearchFilter {
            doc_type: doc_type_filter,
            category: category_filter,
        };

        match self.index.semantic_search(query, k, &filter).await {
            Ok((total, hits)) => search_envelope(
                query,
                total,
                &hits,
                "api_name",
                self.index.index_name(),
                &filter,
                k,
            ),
            Err(e) => {
                warn!("API documentation search failed: {}", e);
                degraded_search_result(&e.to_string(), query)
            }
        }
    }

    /// Fetch all chunks for a named API, grouped into specification and
    /// sample code, each ordered by chunk position.
    pub async fn search_by_api_name(&self, api_name: &str, include_samples: bool) -> Value {
        let doc_type = if include_samples {
            None
        } else {
            Some(DocType::ApiDoc)
        };

        let chunks = match self.index.store().lookup_by_name(api_name, 20, doc_type).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("API lookup failed for '{}': {}", api_name, e);
                return json!({
                    "error": e.to_string(),
                    "api_name": api_name,
                    "found": false
                });
            }
        };

        let mut api_docs = Vec::new();
        let mut api_samples = Vec::new();
        for doc in &chunks {
            let item = chunk_item(doc);
            match doc.doc_type {
                DocType::ApiDoc => api_docs.push(item),
                DocType::ApiSample => api_samples.push(item),
                _ => {}
            }
        }

        json!({
            "api_name": api_name,
            "found": !api_docs.is_empty() || !api_samples.is_empty(),
            "specification": {
                "total_chunks": api_docs.len(),
                "chunks": api_docs
            },
            "samples": if include_samples {
                json!({
                    "total_chunks": api_samples.len(),
                    "chunks": api_samples
                })
            } else {
                Value::Null
            }
        })
    }

    /// List every indexed API with its categories and available material
    pub async fn list_available_apis(&self, category: Option<&str>) -> Value {
        let buckets = match self.index.store().list_names(category, None).await {
            Ok(buckets) => buckets,
            Err(e) => {
                warn!("API listing failed: {}", e);
                return json!({"error": e.to_string(), "apis": []});
            }
        };

        let mut apis: Vec<Value> = buckets
            .iter()
            .map(|bucket| {
                json!({
                    "api_name": bucket.key,
                    "document_count": bucket.doc_count,
                    "categories": bucket.categories.keys(),
                    "has_specification": bucket.doc_types.contains("api_doc"),
                    "has_samples": bucket.doc_types.contains("api_sample")
                })
            })
            .collect();
        apis.sort_by(|a, b| {
            a["api_name"]
                .as_str()
                .unwrap_or("")
                .cmp(b["api_name"].as_str().unwrap_or(""))
        });

        json!({
            "total_apis": apis.len(),
            "category_filter": category,
            "apis": apis
        })
    }
}

fn chunk_item(doc: &ChunkDocument) -> Value {
    json!({
        "file_path": doc.file_path,
        "section": doc.section,
        "content": doc.content,
        "chunk_info": doc.chunk_info()
    })
}
