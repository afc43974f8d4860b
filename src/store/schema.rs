//! Index schema: document shape and mapping definition

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Document type discriminator stored on every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// API specification (api-docs/**/*.md)
    ApiDoc,
    /// API sample code (api-samples/**/*.md)
    ApiSample,
    /// Integration process guide
    IntegrationGuide,
    /// Product documentation
    PayermaxDoc,
}

impl DocType {
    /// All document types, in the order status reports enumerate them
    pub const ALL: [DocType; 4] = [
        DocType::ApiDoc,
        DocType::ApiSample,
        DocType::IntegrationGuide,
        DocType::PayermaxDoc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::ApiDoc => "api_doc",
            DocType::ApiSample => "api_sample",
            DocType::IntegrationGuide => "integration_guide",
            DocType::PayermaxDoc => "payermax_doc",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = Error;

    fn from_str(value: &str) -> crate::error::Result<Self> {
        match value {
            "api_doc" => Ok(DocType::ApiDoc),
            "api_sample" => Ok(DocType::ApiSample),
            "integration_guide" => Ok(DocType::IntegrationGuide),
            "payermax_doc" => Ok(DocType::PayermaxDoc),
            _ => Err(Error::Config(format!("Unknown doc_type '{}'", value))),
        }
    }
}

/// Per-chunk metadata stored alongside the indexed fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_name: String,
    pub file_size: usize,
    pub chunk_size: usize,
}

/// A single chunk as stored in the search index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDocument {
    pub chunk_id: String,
    pub doc_id: String,
    pub doc_type: DocType,
    pub category: String,
    pub api_name: String,
    pub file_path: String,
    pub content: String,
    pub content_hash: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub section: String,
    #[serde(default)]
    pub section_hierarchy: Vec<String>,
    pub section_level: usize,
    /// Omitted from search responses to keep payloads small
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: ChunkMetadata,
    pub indexed_at: String,
}

impl ChunkDocument {
    /// Human-readable chunk position, 1-based ("2/5")
    pub fn chunk_info(&self) -> String {
        format!("{}/{}", self.chunk_index + 1, self.total_chunks)
    }
}

/// Index settings and mappings for a chunk index.
///
/// Vectors use HNSW over cosine similarity; keyword fields back the
/// term filters and aggregations the search facades rely on.
pub fn index_mapping(dimension: usize) -> Value {
    json!({
        "settings": {
            "index": {
                "knn": true,
                "knn.algo_param.ef_search": 512
            }
        },
        "mappings": {
            "properties": {
                "chunk_id": {"type": "keyword"},
                "doc_id": {"type": "keyword"},
                "doc_type": {"type": "keyword"},
                "category": {"type": "keyword"},
                "api_name": {"type": "text", "fields": {"keyword": {"type": "keyword"}}},
                "file_path": {"type": "keyword"},
                "content": {"type": "text"},
                "content_hash": {"type": "keyword"},
                "chunk_index": {"type": "integer"},
                "total_chunks": {"type": "integer"},
                "section": {"type": "text"},
                "section_hierarchy": {"type": "keyword"},
                "section_level": {"type": "integer"},
                "embedding": {
                    "type": "knn_vector",
                    "dimension": dimension,
                    "method": {
                        "name": "hnsw",
                        "space_type": "cosinesimil",
                        "engine": "nmslib",
                        "parameters": {
                            "ef_construction": 512,
                            "m": 16
                        }
                    }
                },
                "metadata": {"type": "object"},
                "indexed_at": {"type": "date"}
            }
        }
    })
}
