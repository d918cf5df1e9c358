//! Policy index - build-once, read-many vector similarity search
//!
//! Two-phase lifecycle: [`PolicyIndex::build`] embeds the whole corpus
//! once at startup; [`PolicyIndex::search`] is read-only and shared by
//! every request afterwards. A rebuild constructs a new index and swaps
//! the shared reference through [`IndexHandle`]; an index is never
//! mutated while reads are in flight.

use std::sync::{Arc, RwLock};

use futures_util::{stream, StreamExt, TryStreamExt};
use tracing::info;

use crate::corpus::PolicyDocument;
use crate::providers::Embedder;
use crate::rag::Chunker;
use crate::types::DocumentChunk;
use crate::{DeskError, Result};

/// Texts embedded per upstream call during a build
const EMBED_BATCH_SIZE: usize = 16;
/// Embedding batches kept in flight during a build
const EMBED_CONCURRENCY: usize = 4;

/// A chunk with its similarity score for one query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

struct IndexEntry {
    vector: Vec<f32>,
    chunk: DocumentChunk,
}

/// Immutable vector index over policy chunks
pub struct PolicyIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl PolicyIndex {
    /// An index with no entries; any search against it fails with
    /// [`DeskError::IndexNotReady`]
    pub fn empty(dimensions: usize) -> Self {
        Self {
            entries: Vec::new(),
            dimensions,
        }
    }

    /// Chunk and embed the corpus, producing a ready index
    ///
    /// Runs once at startup; its cost is never paid on the request path.
    /// Batches are streamed in order with bounded concurrency.
    pub async fn build(
        documents: &[PolicyDocument],
        chunker: &Chunker,
        embedder: &dyn Embedder,
    ) -> Result<Self> {
        let mut chunks: Vec<DocumentChunk> = Vec::new();
        for doc in documents {
            chunks.extend(chunker.chunk(&doc.source_id, &doc.text));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(EMBED_BATCH_SIZE))
            .map(|batch| embedder.embed_batch(batch))
            .buffered(EMBED_CONCURRENCY)
            .try_collect()
            .await?;
        let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();

        if vectors.len() != chunks.len() {
            return Err(DeskError::EmbeddingFailure(format!(
                "embedded {} of {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimensions = embedder.dimensions();
        for vector in &vectors {
            if vector.len() != dimensions {
                return Err(DeskError::EmbeddingFailure(format!(
                    "embedding dimension {} does not match backend dimension {}",
                    vector.len(),
                    dimensions
                )));
            }
        }

        let entries = vectors
            .into_iter()
            .zip(chunks)
            .map(|(vector, chunk)| IndexEntry { vector, chunk })
            .collect::<Vec<_>>();

        info!(
            documents = documents.len(),
            chunks = entries.len(),
            dimensions,
            backend = embedder.name(),
            "policy index built"
        );

        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Top-k nearest chunks by cosine similarity
    ///
    /// Results are ordered by descending similarity; ties keep insertion
    /// order (stable sort). `k` larger than the corpus returns the full
    /// corpus ranked.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() {
            return Err(DeskError::IndexNotReady);
        }
        if query.len() != self.dimensions {
            return Err(DeskError::RetrievalFailure(format!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Shared reference to the current index
///
/// Readers clone the `Arc` and search without holding the lock; a corpus
/// rebuild installs a fresh index atomically through [`IndexHandle::swap`].
pub struct IndexHandle {
    inner: RwLock<Arc<PolicyIndex>>,
}

impl IndexHandle {
    pub fn new(index: Arc<PolicyIndex>) -> Self {
        Self {
            inner: RwLock::new(index),
        }
    }

    /// Current index; the lock is held only long enough to clone the Arc
    pub fn current(&self) -> Arc<PolicyIndex> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Atomically replace the index used by subsequent requests
    pub fn swap(&self, index: Arc<PolicyIndex>) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, seq: usize) -> DocumentChunk {
        DocumentChunk {
            content: content.to_string(),
            source_id: "doc".to_string(),
            sequence_index: seq,
        }
    }

    fn index_with(vectors: Vec<Vec<f32>>) -> PolicyIndex {
        let dimensions = vectors.first().map(|v| v.len()).unwrap_or(0);
        PolicyIndex {
            entries: vectors
                .into_iter()
                .enumerate()
                .map(|(i, vector)| IndexEntry {
                    vector,
                    chunk: chunk(&format!("chunk {}", i), i),
                })
                .collect(),
            dimensions,
        }
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = index_with(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.7, 0.7],
        ]);

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results[0].chunk.sequence_index, 1);
        assert_eq!(results[1].chunk.sequence_index, 2);
        assert_eq!(results[2].chunk.sequence_index, 0);
    }

    #[test]
    fn test_search_is_deterministic() {
        let index = index_with(vec![vec![1.0, 0.0], vec![0.5, 0.5], vec![0.0, 1.0]]);
        let query = [0.6, 0.4];

        let first = index.search(&query, 2).unwrap();
        let second = index.search(&query, 2).unwrap();

        let ids = |r: &[ScoredChunk]| r.iter().map(|s| s.chunk.sequence_index).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        // All entries identical, so every score ties
        let index = index_with(vec![vec![1.0, 0.0]; 4]);
        let results = index.search(&[1.0, 0.0], 4).unwrap();
        let ids: Vec<usize> = results.iter().map(|s| s.chunk.sequence_index).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_k_larger_than_corpus_returns_everything() {
        let index = index_with(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let results = index.search(&[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_index_is_not_ready() {
        let index = PolicyIndex::empty(2);
        assert!(matches!(
            index.search(&[1.0, 0.0], 3),
            Err(DeskError::IndexNotReady)
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let index = index_with(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 3),
            Err(DeskError::RetrievalFailure(_))
        ));
    }

    #[test]
    fn test_handle_swap_replaces_index() {
        let handle = IndexHandle::new(Arc::new(PolicyIndex::empty(2)));
        assert!(handle.current().is_empty());

        handle.swap(Arc::new(index_with(vec![vec![1.0, 0.0]])));
        assert_eq!(handle.current().len(), 1);
    }
}
