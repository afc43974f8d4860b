//! Markdown-aware chunking with section hierarchy tracking
//!
//! This module splits markdown documentation into chunks while:
//! - Respecting heading boundaries (a chunk never straddles a major section)
//! - Tracking the hierarchy of headings above each chunk
//! - Capping chunk size to stay within embedding input limits
//! - Providing stable, deterministic chunk boundaries

mod fingerprint;

pub use fingerprint::*;

/// Default maximum chunk size in characters
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 3000;

/// A buffer is flushed at a minor heading only once it has grown past this
const MIN_FLUSH_SIZE: usize = 500;

/// Headings at this level or shallower always start a new chunk
const MAJOR_SECTION_LEVEL: usize = 2;

/// A chunk fragment produced by [`chunk_markdown`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFragment {
    /// The chunk text (buffer lines joined by newline, trimmed)
    pub content: String,

    /// Title of the nearest preceding heading ("Introduction" before any)
    pub section: String,

    /// Ancestor heading titles, outermost first
    pub section_hierarchy: Vec<String>,

    /// Heading depth of the section (1 = top, 0 = none seen yet)
    pub section_level: usize,

    /// Accumulated size in characters at flush time
    pub size: usize,
}

/// Split a markdown document into chunk fragments.
///
/// Line-oriented scan: headings open new sections, the size cap bounds
/// chunk growth, and the hierarchy is maintained by truncating to the
/// heading's parent depth before appending the new title. Deterministic
/// and pure; sizes count characters plus one per line for the newline.
pub fn chunk_markdown(content: &str, max_chunk_size: usize) -> Vec<ChunkFragment> {
    let mut chunks: Vec<ChunkFragment> = Vec::new();

    let mut current_chunk: Vec<&str> = Vec::new();
    let mut current_size: usize = 0;
    let mut current_section = "Introduction".to_string();
    let mut section_level: usize = 0;
    let mut section_hierarchy: Vec<String> = Vec::new();

    for line in content.split('\n') {
        let line_size = line.chars().count() + 1;
        let trimmed = line.trim();

        if trimmed.starts_with('#') {
            let level = trimmed.chars().take_while(|&c| c == '#').count();
            let title = trimmed.trim_matches('#').trim().to_string();

            // Close nested sections at or below this depth, then open the new one
            if level <= section_hierarchy.len() {
                section_hierarchy.truncate(level - 1);
            }
            section_hierarchy.push(title.clone());

            if !current_chunk.is_empty()
                && (current_size > MIN_FLUSH_SIZE || level <= MAJOR_SECTION_LEVEL)
            {
                // The flushed chunk belongs to the section we are leaving;
                // its hierarchy excludes the heading we just appended.
                let hierarchy = section_hierarchy[..section_hierarchy.len() - 1].to_vec();
                push_fragment(
                    &mut chunks,
                    &current_chunk,
                    &current_section,
                    hierarchy,
                    section_level,
                    current_size,
                );

                current_chunk = vec![line];
                current_size = line_size;
            } else {
                current_chunk.push(line);
                current_size += line_size;
            }

            current_section = title;
            section_level = level;
        } else if current_size + line_size > max_chunk_size {
            push_fragment(
                &mut chunks,
                &current_chunk,
                &current_section,
                section_hierarchy.clone(),
                section_level,
                current_size,
            );

            current_chunk = vec![line];
            current_size = line_size;
        } else {
            current_chunk.push(line);
            current_size += line_size;
        }
    }

    if !current_chunk.is_empty() {
        push_fragment(
            &mut chunks,
            &current_chunk,
            &current_section,
            section_hierarchy.clone(),
            section_level,
            current_size,
        );
    }

    // Heading-free short documents still get one chunk
    if chunks.is_empty() && !content.trim().is_empty() {
        chunks.push(ChunkFragment {
            content: content.trim().to_string(),
            section: "Document".to_string(),
            section_hierarchy: Vec::new(),
            section_level: 0,
            size: content.chars().count(),
        });
    }

    chunks
}

fn push_fragment(
    chunks: &mut Vec<ChunkFragment>,
    lines: &[&str],
    section: &str,
    hierarchy: Vec<String>,
    level: usize,
    size: usize,
) {
    let content = lines.join("\n").trim().to_string();
    if content.is_empty() {
        return;
    }
    chunks.push(ChunkFragment {
        content,
        section: section.to_string(),
        section_hierarchy: hierarchy,
        section_level: level,
        size,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> Vec<ChunkFragment> {
        chunk_markdown(content, DEFAULT_MAX_CHUNK_SIZE)
    }

    #[test]
    fn test_no_heading_fallback() {
        let chunks = chunk("just some plain text\nwith two lines");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section, "Introduction");
        assert!(chunks[0].section_hierarchy.is_empty());
        assert_eq!(chunks[0].section_level, 0);
        assert_eq!(chunks[0].content, "just some plain text\nwith two lines");
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk("").is_empty());
        assert!(chunk("   \n  \n").is_empty());
    }

    #[test]
    fn test_major_heading_boundaries() {
        let chunks = chunk("# A\ntext1\n## B\ntext2\n## C\ntext3");

        assert_eq!(chunks.len(), 3);

        assert_eq!(chunks[0].content, "# A\ntext1");
        assert_eq!(chunks[0].section, "A");
        assert_eq!(chunks[0].section_hierarchy, vec!["A".to_string()]);
        assert_eq!(chunks[0].section_level, 1);

        assert_eq!(chunks[1].content, "## B\ntext2");
        assert_eq!(chunks[1].section, "B");
        assert_eq!(chunks[1].section_hierarchy, vec!["A".to_string()]);
        assert_eq!(chunks[1].section_level, 2);

        // The trailing buffer is flushed with the full hierarchy as-is
        assert_eq!(chunks[2].content, "## C\ntext3");
        assert_eq!(chunks[2].section, "C");
        assert_eq!(
            chunks[2].section_hierarchy,
            vec!["A".to_string(), "C".to_string()]
        );
        assert_eq!(chunks[2].section_level, 2);
    }

    #[test]
    fn test_minor_heading_kept_in_small_buffer() {
        // Level-3 headings don't flush until the buffer passes 500 chars
        let chunks = chunk("# Top\nintro\n### Detail\nbody");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "# Top\nintro\n### Detail\nbody");
        assert_eq!(chunks[0].section, "Detail");
        assert_eq!(
            chunks[0].section_hierarchy,
            vec!["Top".to_string(), "Detail".to_string()]
        );
    }

    #[test]
    fn test_minor_heading_flushes_large_buffer() {
        let filler = "x".repeat(600);
        let input = format!("# Top\n{}\n### Detail\nbody", filler);
        let chunks = chunk(&input);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section, "Top");
        assert_eq!(chunks[0].section_hierarchy, vec!["Top".to_string()]);
        assert_eq!(chunks[1].content, "### Detail\nbody");
        assert_eq!(chunks[1].section, "Detail");
    }

    #[test]
    fn test_hierarchy_resets_on_level_decrease() {
        let chunks = chunk("# A\ntext\n## B\ntext\n### C\ntext\n## D\ntext");

        let last = chunks.last().unwrap();
        assert_eq!(last.section, "D");
        // "### C" is closed when "## D" opens at the same depth as "## B"
        assert_eq!(
            last.section_hierarchy,
            vec!["A".to_string(), "D".to_string()]
        );
    }

    #[test]
    fn test_size_cap_splitting() {
        let line = "word ".repeat(20); // ~100 chars per line
        let doc = vec![line.trim_end(); 10].join("\n");
        let chunks = chunk_markdown(&doc, 300);

        assert!(chunks.len() >= 2);
        for c in &chunks {
            // Each chunk stays within the cap plus at most one line overflow
            assert!(c.content.chars().count() <= 300 + 100);
        }
    }

    #[test]
    fn test_chunk_coverage() {
        let doc = "# One\nalpha\nbeta\n## Two\ngamma\n\ndelta\n# Three\nepsilon";
        let chunks = chunk(doc);

        let original_lines: Vec<&str> =
            doc.lines().filter(|l| !l.trim().is_empty()).collect();
        let chunked_lines: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.content.lines())
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.to_string())
            .collect();

        assert_eq!(original_lines, chunked_lines);
    }

    #[test]
    fn test_determinism() {
        let doc = "# A\ntext\n## B\nmore text\n### C\neven more";
        assert_eq!(chunk(doc), chunk(doc));
    }

    #[test]
    fn test_blank_only_buffer_dropped() {
        // A buffer that trims to nothing is dropped silently
        let chunks = chunk("# A\n\n# B\ntext");
        assert!(chunks.iter().all(|c| !c.content.is_empty()));
    }
}
