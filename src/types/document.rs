//! Document chunk types shared between the index and the orchestrator

use serde::{Deserialize, Serialize};

/// A contiguous span of source-document text, the unit of retrieval
///
/// Produced once at index-build time and immutable afterwards. Consecutive
/// chunks from the same source overlap by a configured number of characters
/// so a sentence split across a boundary still appears intact in one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk text
    pub content: String,

    /// Identity of the source document (file name)
    pub source_id: String,

    /// Order of this chunk within its source
    pub sequence_index: usize,
}

/// A chunk returned by one similarity query
///
/// Transient: exists only for the lifetime of a single answer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: DocumentChunk,

    /// Rank within the query result, 0 = most relevant
    pub relevance_rank: usize,
}

/// Truncate `text` to at most `limit` characters, appending an ellipsis
/// marker when anything was cut. Operates on chars, never bytes.
pub fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(limit) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_untouched() {
        assert_eq!(preview("férias", 10), "férias");
    }

    #[test]
    fn test_preview_truncates_with_marker() {
        assert_eq!(preview("política de férias", 8), "política...");
    }

    #[test]
    fn test_preview_exact_length_untouched() {
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn test_preview_counts_chars_not_bytes() {
        // "áéíóú" is 10 bytes but 5 chars
        assert_eq!(preview("áéíóú", 5), "áéíóú");
        assert_eq!(preview("áéíóú", 4), "áéíó...");
    }
}
