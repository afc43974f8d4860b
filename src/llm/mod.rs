//! Completion model access
//!
//! This module provides an abstraction over chat completion models with:
//! - A trait for different completion backends
//! - HTTP completion backend
//! - Helpers for extracting JSON from model output

mod http_backend;

pub use http_backend::*;

use crate::config::CompletionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for completion providers
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send a prompt and return the model's text response
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create a completion model based on configuration
pub fn create_completion_model(config: &CompletionConfig) -> Result<Box<dyn CompletionModel>> {
    let model = HttpCompletionModel::new(config)?;
    Ok(Box::new(model))
}

/// Strip a surrounding markdown code fence from model output.
///
/// Models asked for JSON often wrap it in ```json ... ``` fences.
/// Returns the inner text trimmed; input without fences passes through.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the language tag on the opening fence line, if any
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    rest.strip_suffix("```").unwrap_or(rest).trim()
}
