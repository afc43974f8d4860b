//! Content-addressed identifiers for documents and chunks

use std::path::Path;

/// Stable document identifier derived from the repository-relative path.
///
/// Paths are normalized to forward slashes before hashing so the same
/// document hashes identically across platforms.
pub fn doc_id(relative_path: &Path) -> String {
    let normalized = relative_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    blake3::hash(normalized.as_bytes()).to_hex().to_string()
}

/// Fingerprint of a document's full text, used for change detection
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Identifier for a single chunk within a document
pub fn chunk_id(doc_id: &str, chunk_index: usize) -> String {
    format!("{}_{}", doc_id, chunk_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_doc_id_stable_across_separators() {
        let a = doc_id(&PathBuf::from("api-docs/payments/create.md"));
        let b = doc_id(&PathBuf::from("api-docs").join("payments").join("create.md"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_doc_id_differs_by_path() {
        let a = doc_id(Path::new("api-docs/a.md"));
        let b = doc_id(Path::new("api-docs/b.md"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let h1 = content_hash("hello");
        let h2 = content_hash("hello world");
        assert_ne!(h1, h2);
        assert_eq!(h1, content_hash("hello"));
    }

    #[test]
    fn test_chunk_id_format() {
        assert_eq!(chunk_id("abc123", 0), "abc123_0");
        assert_eq!(chunk_id("abc123", 7), "abc123_7");
    }
}
