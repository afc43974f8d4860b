//! Query body builders for the search cluster
//!
//! All builders are pure functions over serde_json values so the exact
//! request shapes can be asserted in tests without a live cluster.

use serde_json::{json, Value};

use super::DocType;

/// Fields returned by search queries (the embedding is excluded)
const SOURCE_FIELDS: [&str; 12] = [
    "chunk_id",
    "doc_id",
    "file_path",
    "doc_type",
    "category",
    "api_name",
    "section",
    "section_hierarchy",
    "section_level",
    "content",
    "chunk_index",
    "total_chunks",
];

/// Term filters applied to vector search
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub doc_type: Option<DocType>,
    pub category: Option<String>,
}

impl SearchFilter {
    fn to_terms(&self) -> Vec<Value> {
        let mut filters = Vec::new();
        if let Some(doc_type) = self.doc_type {
            filters.push(json!({"term": {"doc_type": doc_type.as_str()}}));
        }
        if let Some(ref category) = self.category {
            filters.push(json!({"term": {"category": category}}));
        }
        filters
    }

    pub fn is_empty(&self) -> bool {
        self.doc_type.is_none() && self.category.is_none()
    }
}

/// k-NN query over the embedding field, optionally wrapped in a bool
/// filter when term filters are present.
pub fn knn_query(vector: &[f32], k: usize, filter: &SearchFilter) -> Value {
    let knn = json!({
        "knn": {
            "embedding": {
                "vector": vector,
                "k": k
            }
        }
    });

    let query = if filter.is_empty() {
        knn
    } else {
        json!({
            "bool": {
                "must": [knn],
                "filter": filter.to_terms()
            }
        })
    };

    json!({
        "size": k,
        "query": query,
        "_source": SOURCE_FIELDS
    })
}

/// Name lookup: boosted match on api_name plus a file_path match,
/// results ordered by chunk position for document reassembly.
pub fn name_lookup_query(name: &str, size: usize, doc_type: Option<DocType>) -> Value {
    let mut query = json!({
        "bool": {
            "should": [
                {"match": {"api_name": {"query": name, "boost": 2}}},
                {"match": {"file_path": name}}
            ],
            "minimum_should_match": 1
        }
    });

    if let Some(doc_type) = doc_type {
        query["bool"]["filter"] = json!([{"term": {"doc_type": doc_type.as_str()}}]);
    }

    json!({
        "size": size,
        "query": query,
        "_source": SOURCE_FIELDS,
        "sort": [{"chunk_index": "asc"}]
    })
}

/// Aggregation listing distinct names with their categories and types
pub fn name_listing_query(category: Option<&str>, doc_type: Option<DocType>) -> Value {
    let mut body = json!({
        "size": 0,
        "aggs": {
            "unique_names": {
                "terms": {
                    "field": "api_name.keyword",
                    "size": 1000
                },
                "aggs": {
                    "categories": {
                        "terms": {"field": "category"}
                    },
                    "doc_types": {
                        "terms": {"field": "doc_type"}
                    }
                }
            }
        }
    });

    if let Some(category) = category {
        body["query"] = json!({"term": {"category": category}});
    } else if let Some(doc_type) = doc_type {
        body["query"] = json!({"term": {"doc_type": doc_type.as_str()}});
    }

    body
}

/// Probe for an already-indexed document with identical content
pub fn dedup_query(doc_id: &str, content_hash: &str) -> Value {
    json!({
        "size": 1,
        "query": {
            "bool": {
                "must": [
                    {"term": {"doc_id": doc_id}},
                    {"term": {"content_hash": content_hash}}
                ]
            }
        }
    })
}

/// Count query for a single document type
pub fn doc_type_count_query(doc_type: DocType) -> Value {
    json!({
        "query": {"term": {"doc_type": doc_type.as_str()}}
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knn_query_unfiltered() {
        let body = knn_query(&[0.1, 0.2], 5, &SearchFilter::default());
        assert_eq!(body["size"], 5);
        assert_eq!(body["query"]["knn"]["embedding"]["k"], 5);
        assert_eq!(
            body["query"]["knn"]["embedding"]["vector"],
            serde_json::json!([0.1f32, 0.2f32])
        );
    }

    #[test]
    fn test_knn_query_with_filters_wraps_in_bool() {
        let filter = SearchFilter {
            doc_type: Some(DocType::ApiDoc),
            category: Some("payments".to_string()),
        };
        let body = knn_query(&[0.1], 3, &filter);

        let bool_query = &body["query"]["bool"];
        assert!(bool_query["must"][0]["knn"].is_object());
        assert_eq!(bool_query["filter"][0]["term"]["doc_type"], "api_doc");
        assert_eq!(bool_query["filter"][1]["term"]["category"], "payments");
    }

    #[test]
    fn test_name_lookup_query_boost_and_sort() {
        let body = name_lookup_query("create-payment", 20, None);
        let should = &body["query"]["bool"]["should"];
        assert_eq!(should[0]["match"]["api_name"]["boost"], 2);
        assert_eq!(should[1]["match"]["file_path"], "create-payment");
        assert_eq!(body["sort"][0]["chunk_index"], "asc");
        assert!(body["query"]["bool"].get("filter").is_none());
    }

    #[test]
    fn test_name_lookup_query_doc_type_filter() {
        let body = name_lookup_query("refund", 20, Some(DocType::ApiDoc));
        assert_eq!(
            body["query"]["bool"]["filter"][0]["term"]["doc_type"],
            "api_doc"
        );
    }

    #[test]
    fn test_name_listing_query_category_filter() {
        let body = name_listing_query(Some("payments"), None);
        assert_eq!(body["size"], 0);
        assert_eq!(body["query"]["term"]["category"], "payments");
        assert_eq!(
            body["aggs"]["unique_names"]["terms"]["field"],
            "api_name.keyword"
        );
    }

    #[test]
    fn test_dedup_query_terms() {
        let body = dedup_query("doc123", "hash456");
        assert_eq!(body["size"], 1);
        let must = &body["query"]["bool"]["must"];
        assert_eq!(must[0]["term"]["doc_id"], "doc123");
        assert_eq!(must[1]["term"]["content_hash"], "hash456");
    }
}
