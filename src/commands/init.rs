//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Base directory for paydocs data; defaults to ~/.paydocs
    pub base_dir: Option<PathBuf>,
    /// Overwrite an existing config file
    pub force: bool,
}

/// Write a default configuration file
pub async fn cmd_init(options: InitOptions) -> Result<Config> {
    let mut config = Config::default();
    config.init_paths(options.base_dir);

    if config.is_initialized() && !options.force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    config.save()?;
    info!("Initialized paydocs at {:?}", config.paths.base_dir);
    Ok(config)
}

/// Print init result to console
pub fn print_init(config: &Config) {
    println!("✓ Wrote config to {}", config.paths.config_file.display());
    println!();
    println!("Search cluster:    {}", config.search_url);
    println!("API docs index:    {}", config.api_docs_index);
    println!("Guides index:      {}", config.guides_index);
    println!("Embedding backend: {}", config.embedding.url);
    println!("Embedding model:   {}", config.embedding.model);
    println!("Completion model:  {}", config.completion.model);
    println!();
    println!("Edit the file to point at your own backends, then run 'paydocs index'.");
}
