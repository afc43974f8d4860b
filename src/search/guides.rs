//! Semantic search over integration guides and product documentation

use super::{degraded_search_result, search_envelope, SearchIndex};
use crate::config::{Collection, Config};
use crate::error::Result;
use crate::store::{DocType, SearchFilter};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Search facade over the integration guide index
pub struct GuideSearch {
    index: SearchIndex,
}

impl GuideSearch {
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self {
            index: SearchIndex::open(config, Collection::Guides)?,
        })
    }

    /// Semantic search across guides and product docs.
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
                "guide_name",
                self.index.index_name(),
                &filter,
                k,
            ),
            Err(e) => {
                warn!("Integration guide search failed: {}", e);
                degraded_search_result(&e.to_string(), query)
            }
        }
    }

    /// Search guides for a known integration mode.
    ///
    /// Known modes expand to curated bilingual queries matching how the
    /// guides are written; unknown modes search verbatim.
    pub async fn search_by_integration_mode(&self, integration_mode: &str) -> Value {
        let query = match integration_mode.to_lowercase().as_str() {
            "cashier" => "收银台支付集成 cashier mode hosted checkout",
            "pure_api" => "纯API支付集成 pure API mode direct integration",
            "drop_in" => "前置组件 drop-in component embedded payment",
            "payment_link" => "链接支付 payment link share link",
            "auth_capture" => "Auth-Capture 授权请款",
            "tokenization" => "Tokenization 代扣 saved card",
            "subscription" => "订阅 subscription recurring payment",
            _ => integration_mode,
        };

        self.search(query, Some(10), Some(DocType::IntegrationGuide), None)
            .await
    }

    /// Search product docs for a payment method
    pub async fn search_by_payment_method(&self, payment_method: &str) -> Value {
        let query = match payment_method.to_lowercase().as_str() {
            "card" => "卡支付 card payment credit debit",
            "applepay" => "ApplePay Apple Pay wallet",
            "googlepay" => "GooglePay Google Pay wallet",
            "apm" => "APM alternative payment method local payment",
            _ => payment_method,
        };

        self.search(query, Some(10), Some(DocType::PayermaxDoc), None)
            .await
    }

    /// Fetch a complete workflow by name, chunks grouped per file and
    /// ordered by position
    pub async fn get_integration_workflow(&self, workflow_name: &str) -> Value {
        let chunks = match self
            .index
            .store()
            .lookup_by_name(workflow_name, 50, None)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("Workflow lookup failed for '{}': {}", workflow_name, e);
                return json!({
                    "error": e.to_string(),
                    "workflow_name": workflow_name,
                    "found": false
                });
            }
        };

        // Group chunks by file, preserving first-seen file order
        let mut workflows: Map<String, Value> = Map::new();
        for doc in &chunks {
            let entry = workflows.entry(doc.file_path.clone()).or_insert_with(|| {
                json!({
                    "file_path": doc.file_path,
                    "doc_type": doc.doc_type.as_str(),
                    "category": doc.category,
                    "chunks": []
                })
            });
            if let Some(list) = entry["chunks"].as_array_mut() {
                list.push(json!({
                    "section": doc.section,
                    "section_hierarchy": doc.section_hierarchy,
                    "content": doc.content,
                    "chunk_index": doc.chunk_index
                }));
            }
        }

        let mut grouped: Vec<Value> = workflows.into_iter().map(|(_, v)| v).collect();
        for workflow in &mut grouped {
            if let Some(list) = workflow["chunks"].as_array_mut() {
                list.sort_by_key(|c| c["chunk_index"].as_u64().unwrap_or(0));
            }
        }

        json!({
            "workflow_name": workflow_name,
            "found": !grouped.is_empty(),
            "workflows": grouped
        })
    }

    /// List every indexed guide with its categories and document types
    pub async fn list_available_guides(&self, doc_type: Option<DocType>) -> Value {
        let buckets = match self.index.store().list_names(None, doc_type).await {
            Ok(buckets) => buckets,
            Err(e) => {
                warn!("Guide listing failed: {}", e);
                return json!({"error": e.to_string(), "guides": []});
            }
        };

        let mut guides: Vec<Value> = buckets
            .iter()
            .map(|bucket| {
                json!({
                    "guide_name": bucket.key,
                    "document_count": bucket.doc_count,
                    "categories": bucket.categories.keys(),
                    "doc_types": bucket.doc_types.keys()
                })
            })
            .collect();
        guides.sort_by(|a, b| {
            a["guide_name"]
                .as_str()
                .unwrap_or("")
                .cmp(b["guide_name"].as_str().unwrap_or(""))
        });

        json!({
            "total_guides": guides.len(),
            "doc_type_filter": doc_type.map(|d| d.as_str()),
            "guides": guides
        })
    }
}
