//! Default values for configuration

/// Default search cluster URL for local development
pub fn default_search_url() -> String {
    std::env::var("PAYDOCS_SEARCH_URL").unwrap_or_else(|_| "http://127.0.0.1:9200".to_string())
}

/// Default environment variable name for the search cluster API key
pub fn default_search_api_key_env() -> String {
    "".to_string()
}

/// Default index name for API reference documents
pub fn default_api_docs_index() -> String {
    "payermax-api-docs".to_string()
}

/// Default index name for integration guide documents
pub fn default_guides_index() -> String {
    "payermax-integration-guides".to_string()
}

/// Default embedding backend URL
pub fn default_embedding_url() -> String {
    std::env::var("PAYDOCS_EMBEDDING_URL").unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default embedding model identifier
pub fn default_embedding_model() -> String {
    "amazon.titan-embed-text-v2:0".to_string()
}

/// Default embedding dimension
pub fn default_embedding_dimension() -> usize {
    1024
}

/// Maximum characters sent to the embedding model per request
pub fn default_embedding_max_chars() -> usize {
    8000
}

/// Default completion backend URL
pub fn default_completion_url() -> String {
    std::env::var("PAYDOCS_COMPLETION_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
}

/// Default completion model identifier
pub fn default_completion_model() -> String {
    "amazon.nova-lite-v1:0".to_string()
}

/// Default sampling temperature for API selection
pub fn default_completion_temperature() -> f32 {
    0.1
}

/// Default nucleus sampling parameter
pub fn default_completion_top_p() -> f32 {
    0.9
}

/// Default maximum tokens in a completion response
pub fn default_completion_max_tokens() -> u32 {
    4000
}

/// Default maximum characters per chunk
pub fn default_chunk_max_chars() -> usize {
    3000
}

/// Default number of search results
pub fn default_search_k() -> usize {
    5
}

/// Default maximum search results
pub fn default_search_max_results() -> usize {
    50
}

/// Default request timeout in seconds
pub fn default_request_timeout() -> u64 {
    30
}

/// Default worker count for parallel indexing (cores minus one, at least one)
pub fn default_index_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}
