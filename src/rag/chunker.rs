//! Fixed-size overlapping text windows
//!
//! Splitting is content-length aware (characters, never tokens). The
//! overlap exists so a sentence split across a window boundary still
//! appears intact in at least one chunk; joining a source's chunks in
//! order while dropping each successor's first `overlap` characters
//! reproduces the original text.

use crate::types::DocumentChunk;
use crate::{DeskError, Result};

/// Default window size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive windows
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Character-window chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker; the overlap must be smaller than the window
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(DeskError::ConfigError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(DeskError::ConfigError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split one document into ordered, overlapping chunks
    ///
    /// Every chunk except the last spans exactly `chunk_size` characters;
    /// consecutive chunks share the last `overlap` characters of the
    /// earlier one. `sequence_index` preserves original order.
    pub fn chunk(&self, source_id: &str, text: &str) -> Vec<DocumentChunk> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut sequence_index = 0usize;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(DocumentChunk {
                content: chars[start..end].iter().collect(),
                source_id: source_id.to_string(),
                sequence_index,
            });

            if end == chars.len() {
                break;
            }
            start += step;
            sequence_index += 1;
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    /// Inverse of chunking: keep the first chunk whole, then drop each
    /// successor's leading `overlap` characters.
    fn reassemble(chunks: &[DocumentChunk], overlap: usize) -> String {
        let mut text = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                text.push_str(&chunk.content);
            } else {
                text.extend(chunk.content.chars().skip(overlap));
            }
        }
        text
    }

    #[test]
    fn test_empty_text_produces_no_chunks() {
        let chunker = Chunker::new(100, 20).unwrap();
        assert!(chunker.chunk("doc", "").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = Chunker::new(100, 20).unwrap();
        let chunks = chunker.chunk("doc", "política de férias");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "política de férias");
        assert_eq!(chunks[0].source_id, "doc");
        assert_eq!(chunks[0].sequence_index, 0);
    }

    #[test]
    fn test_windows_overlap_and_keep_order() {
        let chunker = Chunker::new(10, 4).unwrap();
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.chunk("doc", text);

        assert_eq!(chunks[0].content, "abcdefghij");
        assert_eq!(chunks[1].content, "ghijklmnop");
        assert_eq!(chunks[2].content, "mnopqrstuv");
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence_index, i);
        }

        // Each window starts `overlap` chars before the previous one ended
        assert!(chunks[0].content.ends_with("ghij"));
        assert!(chunks[1].content.starts_with("ghij"));
    }

    #[test]
    fn test_roundtrip_exact_text() {
        let chunker = Chunker::new(10, 4).unwrap();
        let text = "abcdefghijklmnopqrstuvwxyz0123456789";
        let chunks = chunker.chunk("doc", text);
        assert_eq!(reassemble(&chunks, 4), text);
    }

    #[test]
    fn test_roundtrip_multibyte_text() {
        let chunker = Chunker::new(8, 3).unwrap();
        let text = "férias são um direito de todo funcionário da empresa";
        let chunks = chunker.chunk("doc", text);
        assert_eq!(reassemble(&chunks, 3), text);
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(Chunker::new(100, 100).is_err());
        assert!(Chunker::new(100, 150).is_err());
        assert!(Chunker::new(0, 0).is_err());
    }

    #[quickcheck]
    fn prop_roundtrip_reproduces_source(text: String) -> bool {
        let chunker = Chunker::new(50, 10).unwrap();
        let chunks = chunker.chunk("doc", &text);
        reassemble(&chunks, 10) == text
    }

    #[quickcheck]
    fn prop_nonfinal_chunks_are_full_windows(text: String) -> bool {
        let chunker = Chunker::new(50, 10).unwrap();
        let chunks = chunker.chunk("doc", &text);
        chunks
            .iter()
            .take(chunks.len().saturating_sub(1))
            .all(|c| c.content.chars().count() == 50)
    }
}
