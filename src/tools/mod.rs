//! LLM-backed recommendation tools
//!
//! Both tools follow the same contract: build a deterministic, bounded
//! candidate shortlist before any model call, ask the model for a strict
//! JSON response, and fall back to a rule-based selection whenever the
//! model is unavailable or its output fails to parse.

mod assistant;
mod endpoint_finder;

pub use assistant::*;
pub use endpoint_finder::*;

use crate::llm::strip_code_fences;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Read a file, returning `None` on any error.
///
/// Candidate documents may be missing on disk; that is a "not found"
/// condition, not a failure.
pub(crate) fn read_file_safe(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

/// Best-effort parse of a model's JSON response.
///
/// Strips code-fence wrapping first; any parse failure returns `None`
/// so the caller takes its deterministic fallback path.
pub(crate) fn parse_model_json<T: DeserializeOwned>(response: &str) -> Option<T> {
    let cleaned = strip_code_fences(response);
    match serde_json::from_str(cleaned) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Model response failed to parse as JSON: {}", e);
            None
        }
    }
}

/// Truncate to a character budget without splitting codepoints
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
