//! Search cluster integration
//!
//! This module wraps an OpenSearch-compatible REST API and provides:
//! - Index management (create with k-NN mapping, delete, reset)
//! - Chunk document writes with dimension validation
//! - Vector and term search, counts, and aggregations

mod query;
mod schema;

pub use query::*;
pub use schema::*;

use crate::config::{Collection, Config};
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// A search hit with its relevance score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub score: f32,
    pub doc: ChunkDocument,
}

/// Index statistics for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub index: String,
    pub total_documents: usize,
    pub documents_by_type: Vec<(DocType, usize)>,
    pub size_bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
    #[serde(default)]
    aggregations: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: TotalHits,
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct TotalHits {
    value: usize,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_score", default)]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: ChunkDocument,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: usize,
}

/// Handle to one chunk index on the search cluster
pub struct SearchStore {
    client: Client,
    base_url: Url,
    index: String,
    dimension: usize,
    api_key: Option<String>,
}

impl SearchStore {
    /// Connect to the cluster for one of the two document collections
    pub fn connect(config: &Config, collection: Collection) -> Result<Self> {
        Self::new(
            &config.search_url,
            config.index_for(collection),
            config.embedding.dimension,
            config.search_api_key(),
            Duration::from_secs(config.search.timeout_secs),
        )
    }

    /// Create a store handle directly with URL and index name
    pub fn new(
        url: &str,
        index: &str,
        dimension: usize,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        debug!("Connecting to search cluster at {}", url);

        let base_url = Url::parse(url)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            index: index.to_string(),
            dimension,
            api_key,
        })
    }

    /// Get the index name this store targets
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Get the expected vector dimension for this store
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid search cluster URL: {}", e)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Search cluster returned {}: {}",
                status, body
            )));
        }
        Ok(response.json::<T>().await?)
    }

    /// Check if the index exists
    pub async fn index_exists(&self) -> Result<bool> {
        let url = self.endpoint(&self.index)?;
        let response = self.authorize(self.client.head(url)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Error::Store(format!(
                "Index existence check returned {}",
                status
            ))),
        }
    }

    /// Ensure the index exists with the k-NN mapping
    pub async fn ensure_index(&self) -> Result<()> {
        if self.index_exists().await? {
            debug!("Index {} already exists", self.index);
            return Ok(());
        }

        info!(
            "Creating index {} with dimension {}",
            self.index, self.dimension
        );

        let url = self.endpoint(&self.index)?;
        let body = index_mapping(self.dimension);
        let _: Value = self.send_json(self.client.put(url).json(&body)).await?;

        info!("Index {} created successfully", self.index);
        Ok(())
    }

    /// Delete the index if it exists; returns whether it existed
    pub async fn delete_index(&self) -> Result<bool> {
        if !self.index_exists().await? {
            return Ok(false);
        }

        info!("Deleting index {}", self.index);
        let url = self.endpoint(&self.index)?;
        let _: Value = self.send_json(self.client.delete(url)).await?;
        Ok(true)
    }

    /// Reset the index (delete and recreate)
    pub async fn reset_index(&self) -> Result<()> {
        self.delete_index().await?;
        self.ensure_index().await
    }

    /// Write a single chunk document
    pub async fn index_chunk(&self, doc: &ChunkDocument) -> Result<()> {
        self.validate_dimension(doc)?;

        let url = self.endpoint(&format!("{}/_doc", self.index))?;
        let _: Value = self.send_json(self.client.post(url).json(doc)).await?;
        Ok(())
    }

    /// Write a batch of chunk documents via the bulk API
    pub async fn bulk_index(&self, docs: &[ChunkDocument]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }

        for doc in docs {
            self.validate_dimension(doc)?;
        }

        debug!("Bulk indexing {} chunks into {}", docs.len(), self.index);

        let mut body = String::new();
        for doc in docs {
            body.push_str(&serde_json::to_string(
                &serde_json::json!({"index": {"_index": self.index}}),
            )?);
            body.push('\n');
            body.push_str(&serde_json::to_string(doc)?);
            body.push('\n');
        }

        let url = self.endpoint("_bulk")?;
        let response: Value = self
            .send_json(
                self.client
                    .post(url)
                    .header("Content-Type", "application/x-ndjson")
                    .body(body),
            )
            .await?;

        if response["errors"].as_bool() == Some(true) {
            return Err(Error::Store(format!(
                "Bulk indexing into {} reported item failures",
                self.index
            )));
        }
        Ok(())
    }

    fn validate_dimension(&self, doc: &ChunkDocument) -> Result<()> {
        if doc.embedding.len() != self.dimension {
            return Err(Error::Store(format!(
                "Vector dimension mismatch for index '{}': expected {}, got {} (chunk {})",
                self.index,
                self.dimension,
                doc.embedding.len(),
                doc.chunk_id
            )));
        }
        Ok(())
    }

    /// Check whether a document is already indexed with identical content.
    ///
    /// A missing index means nothing is indexed yet.
    pub async fn is_indexed(&self, doc_id: &str, content_hash: &str) -> Result<bool> {
        if !self.index_exists().await? {
            return Ok(false);
        }

        let body = dedup_query(doc_id, content_hash);
        let response = self.search_raw(&body).await?;
        Ok(response.hits.total.value > 0)
    }

    async fn search_raw(&self, body: &Value) -> Result<SearchResponse> {
        let url = self.endpoint(&format!("{}/_search", self.index))?;
        self.send_json(self.client.post(url).json(body)).await
    }

    /// Vector search with optional term filters
    pub async fn knn_search(
        &self,
        vector: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<(usize, Vec<ScoredChunk>)> {
        debug!("k-NN search on {} with k={}", self.index, k);

        let body = knn_query(vector, k, filter);
        let response = self.search_raw(&body).await?;
        let total = response.hits.total.value;
        let results = response
            .hits
            .hits
            .into_iter()
            .map(|hit| ScoredChunk {
                score: hit.score.unwrap_or(0.0),
                doc: hit.source,
            })
            .collect();
        Ok((total, results))
    }

    /// Look up all chunks for a named API or guide, ordered by position
    pub async fn lookup_by_name(
        &self,
        name: &str,
        size: usize,
        doc_type: Option<DocType>,
    ) -> Result<Vec<ChunkDocument>> {
        let body = name_lookup_query(name, size, doc_type);
        let response = self.search_raw(&body).await?;
        Ok(response.hits.hits.into_iter().map(|h| h.source).collect())
    }

    /// List distinct names with their categories and document types
    pub async fn list_names(
        &self,
        category: Option<&str>,
        doc_type: Option<DocType>,
    ) -> Result<Vec<NameBucket>> {
        let body = name_listing_query(category, doc_type);
        let response = self.search_raw(&body).await?;

        let aggregations = response
            .aggregations
            .ok_or_else(|| Error::Store("Aggregation response missing buckets".to_string()))?;
        let buckets: Vec<NameBucket> =
            serde_json::from_value(aggregations["unique_names"]["buckets"].clone())?;
        Ok(buckets)
    }

    /// Total chunk count for the index
    pub async fn count(&self) -> Result<usize> {
        let url = self.endpoint(&format!("{}/_count", self.index))?;
        let response: CountResponse = self.send_json(self.client.post(url)).await?;
        Ok(response.count)
    }

    /// Chunk count for a single document type
    pub async fn count_doc_type(&self, doc_type: DocType) -> Result<usize> {
        let url = self.endpoint(&format!("{}/_count", self.index))?;
        let body = doc_type_count_query(doc_type);
        let response: CountResponse = self.send_json(self.client.post(url).json(&body)).await?;
        Ok(response.count)
    }

    /// Gather index statistics for status reporting
    pub async fn stats(&self) -> Result<Option<IndexStats>> {
        if !self.index_exists().await? {
            return Ok(None);
        }

        let total_documents = self.count().await?;

        let mut documents_by_type = Vec::new();
        for doc_type in DocType::ALL {
            let count = self.count_doc_type(doc_type).await?;
            if count > 0 {
                documents_by_type.push((doc_type, count));
            }
        }

        let url = self.endpoint(&format!("{}/_stats/store", self.index))?;
        let stats: Value = self.send_json(self.client.get(url)).await?;
        let size_bytes = stats["_all"]["total"]["store"]["size_in_bytes"].as_u64();

        Ok(Some(IndexStats {
            index: self.index.clone(),
            total_documents,
            documents_by_type,
            size_bytes,
        }))
    }
}

/// One bucket from the name-listing aggregation
#[derive(Debug, Clone, Deserialize)]
pub struct NameBucket {
    pub key: String,
    pub doc_count: usize,
    #[serde(default)]
    pub categories: TermBuckets,
    #[serde(default)]
    pub doc_types: TermBuckets,
}

/// Sub-aggregation bucket list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermBuckets {
    #[serde(default)]
    pub buckets: Vec<TermBucket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TermBucket {
    pub key: String,
    pub doc_count: usize,
}

impl TermBuckets {
    /// Keys of all buckets, in cluster order
    pub fn keys(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.key.clone()).collect()
    }

    /// Whether any bucket matches the given key
    pub fn contains(&self, key: &str) -> bool {
        self.buckets.iter().any(|b| b.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_doc(dimension: usize) -> ChunkDocument {
        ChunkDocument {
            chunk_id: "doc1_0".to_string(),
            doc_id: "doc1".to_string(),
            doc_type: DocType::ApiDoc,
            category: "payments".to_string(),
            api_name: "create-payment".to_string(),
            file_path: "api-docs/payments/create-payment.md".to_string(),
            content: "# Create Payment".to_string(),
            content_hash: "hash1".to_string(),
            chunk_index: 0,
            total_chunks: 1,
            section: "Create Payment".to_string(),
            section_hierarchy: vec!["Create Payment".to_string()],
            section_level: 1,
            embedding: vec![0.0; dimension],
            metadata: ChunkMetadata::default(),
            indexed_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_index_chunk_rejects_dimension_mismatch() {
        let store = SearchStore::new(
            "http://127.0.0.1:1",
            "test-index",
            1024,
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        let doc = sample_doc(2);

        let err = store.index_chunk(&doc).await.unwrap_err();
        match err {
            Error::Store(message) => assert!(message.contains("dimension mismatch")),
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_is_indexed_missing_index_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/test-index"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store =
            SearchStore::new(&server.uri(), "test-index", 3, None, Duration::from_secs(5)).unwrap();
        assert!(!store.is_indexed("doc1", "hash1").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_indexed_matches_existing_content() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/test-index"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/test-index/_search"))
            .and(body_partial_json(json!({
                "query": {"bool": {"must": [
                    {"term": {"doc_id": "doc1"}},
                    {"term": {"content_hash": "hash1"}}
                ]}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {"total": {"value": 1}, "hits": []}
            })))
            .mount(&server)
            .await;

        let store =
            SearchStore::new(&server.uri(), "test-index", 3, None, Duration::from_secs(5)).unwrap();
        assert!(store.is_indexed("doc1", "hash1").await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_index_skips_existing() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/test-index"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        // No PUT mock: creation would fail if attempted
        let store =
            SearchStore::new(&server.uri(), "test-index", 3, None, Duration::from_secs(5)).unwrap();
        store.ensure_index().await.unwrap();
    }

    #[tokio::test]
    async fn test_configured_timeout_bounds_slow_cluster() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/test-index"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let store = SearchStore::new(
            &server.uri(),
            "test-index",
            3,
            None,
            Duration::from_millis(100),
        )
        .unwrap();
        assert!(store.index_exists().await.is_err());
    }

    #[tokio::test]
    async fn test_knn_search_parses_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-index/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {
                    "total": {"value": 42},
                    "hits": [{
                        "_score": 0.87,
                        "_source": {
                            "chunk_id": "doc1_0",
                            "doc_id": "doc1",
                            "doc_type": "api_doc",
                            "category": "payments",
                            "api_name": "create-payment",
                            "file_path": "api-docs/payments/create-payment.md",
                            "content": "# Create Payment",
                            "content_hash": "hash1",
                            "chunk_index": 0,
                            "total_chunks": 2,
                            "section": "Create Payment",
                            "section_hierarchy": ["Create Payment"],
                            "section_level": 1,
                            "indexed_at": "2025-01-01T00:00:00Z"
                        }
                    }]
                }
            })))
            .mount(&server)
            .await;

        let store =
            SearchStore::new(&server.uri(), "test-index", 3, None, Duration::from_secs(5)).unwrap();
        let (total, results) = store
            .knn_search(&[0.1, 0.2, 0.3], 5, &SearchFilter::default())
            .await
            .unwrap();

        assert_eq!(total, 42);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 0.87);
        assert_eq!(results[0].doc.chunk_info(), "1/2");
    }

    #[tokio::test]
    async fn test_bulk_index_reports_item_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": true,
                "items": []
            })))
            .mount(&server)
            .await;

        let store =
            SearchStore::new(&server.uri(), "test-index", 3, None, Duration::from_secs(5)).unwrap();
        let err = store.bulk_index(&[sample_doc(3)]).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}
