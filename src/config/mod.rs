//! Configuration management for paydocs
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Search cluster connection URL
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Environment variable name for the search cluster API key
    #[serde(default = "default_search_api_key_env")]
    pub search_api_key_env: String,

    /// Index name for API reference documents
    #[serde(default = "default_api_docs_index")]
    pub api_docs_index: String,

    /// Index name for integration guide documents
    #[serde(default = "default_guides_index")]
    pub guides_index: String,

    /// Embedding backend configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Completion backend configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Indexing configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend URL
    #[serde(default = "default_embedding_url")]
    pub url: String,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match the index mapping)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Maximum characters sent per embedding request
    #[serde(default = "default_embedding_max_chars")]
    pub max_chars: usize,
}

/// Completion backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Backend URL
    #[serde(default = "default_completion_url")]
    pub url: String,

    /// Model name/identifier
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_completion_temperature")]
    pub temperature: f32,

    /// Nucleus sampling parameter
    #[serde(default = "default_completion_top_p")]
    pub top_p: f32,

    /// Maximum tokens in a completion response
    #[serde(default = "default_completion_max_tokens")]
    pub max_tokens: u32,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_max_chars")]
    pub max_chars: usize,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results
    #[serde(default = "default_search_k")]
    pub default_k: usize,

    /// Maximum results allowed
    #[serde(default = "default_search_max_results")]
    pub max_results: usize,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Worker count for parallel indexing
    #[serde(default = "default_index_workers")]
    pub workers: usize,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for paydocs data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            search_api_key_env: default_search_api_key_env(),
            api_docs_index: default_api_docs_index(),
            guides_index: default_guides_index(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
            chunk: ChunkConfig::default(),
            search: SearchConfig::default(),
            index: IndexConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            max_chars: default_embedding_max_chars(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            url: default_completion_url(),
            model: default_completion_model(),
            temperature: default_completion_temperature(),
            top_p: default_completion_top_p(),
            max_tokens: default_completion_max_tokens(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: default_chunk_max_chars(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_search_k(),
            max_results: default_search_max_results(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            workers: default_index_workers(),
        }
    }
}

impl Config {
    /// Get the default base directory for paydocs (~/.paydocs)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".paydocs")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Get the search cluster API key from environment
    pub fn search_api_key(&self) -> Option<String> {
        if self.search_api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.search_api_key_env).ok()
    }

    /// Check if paydocs is initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.paths.config_file.exists()
    }

    /// Resolve the index name for a document collection
    pub fn index_for(&self, collection: Collection) -> &str {
        match collection {
            Collection::ApiDocs => &self.api_docs_index,
            Collection::Guides => &self.guides_index,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(Error::Config(
                "embedding.dimension must be positive".to_string(),
            ));
        }

        if self.chunk.max_chars == 0 {
            return Err(Error::Config("chunk.max_chars must be positive".to_string()));
        }

        if self.completion.temperature < 0.0 || self.completion.temperature > 2.0 {
            return Err(Error::Config(
                "completion.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.completion.top_p <= 0.0 || self.completion.top_p > 1.0 {
            return Err(Error::Config(
                "completion.top_p must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.completion.max_tokens == 0 {
            return Err(Error::Config(
                "completion.max_tokens must be positive".to_string(),
            ));
        }

        if self.search.default_k > self.search.max_results {
            return Err(Error::Config(
                "search.default_k must be <= search.max_results".to_string(),
            ));
        }

        if self.index.workers == 0 {
            return Err(Error::Config("index.workers must be positive".to_string()));
        }

        Ok(())
    }
}

/// Which of the two document collections an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// API reference documentation
    ApiDocs,
    /// Integration guides
    Guides,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_docs_index, "payermax-api-docs");
        assert_eq!(config.guides_index, "payermax-integration-guides");
        assert_eq!(config.embedding.dimension, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.api_docs_index = "test-api-docs".to_string();

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.api_docs_index, "test-api-docs");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.completion.temperature = 3.0;
        assert!(config.validate().is_err());

        config.completion.temperature = 0.2;
        assert!(config.validate().is_ok());

        config.completion.max_tokens = 0;
        assert!(config.validate().is_err());

        config.completion.max_tokens = 4000;
        config.search.default_k = config.search.max_results + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_index_for_collection() {
        let config = Config::default();
        assert_eq!(config.index_for(Collection::ApiDocs), "payermax-api-docs");
        assert_eq!(
            config.index_for(Collection::Guides),
            "payermax-integration-guides"
        );
    }
}
