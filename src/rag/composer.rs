//! Grounded answer composition
//!
//! Embeds the question, retrieves the top-k chunks, concatenates them
//! into one context block and issues a single completion constrained by
//! the grounding instruction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::providers::{CompletionModel, Embedder};
use crate::rag::{IndexHandle, GROUNDING_PROMPT};
use crate::types::{preview, RetrievedChunk};
use crate::{DeskError, Result};

/// Default number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 3;

/// Character budget for source previews
const SOURCE_PREVIEW_CHARS: usize = 200;

/// One consulted source: document identity plus a bounded content preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultedSource {
    pub source_id: String,
    pub preview: String,
}

/// A composed answer with the material it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedAnswer {
    /// Generated answer text
    pub answer: String,

    /// Per-chunk source identity and bounded preview, in relevance order
    pub sources: Vec<ConsultedSource>,

    /// The retrieved chunks themselves (full content)
    pub retrieved: Vec<RetrievedChunk>,
}

/// Composes context-grounded answers against the shared policy index
pub struct AnswerComposer {
    embedder: Arc<dyn Embedder>,
    completion: Arc<dyn CompletionModel>,
    index: Arc<IndexHandle>,
    top_k: usize,
}

impl AnswerComposer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn CompletionModel>,
        index: Arc<IndexHandle>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            completion,
            index,
            top_k,
        }
    }

    /// Shared index handle (used by the CLI for corpus statistics)
    pub fn index(&self) -> &Arc<IndexHandle> {
        &self.index
    }

    /// Answer a question from retrieved policy context
    ///
    /// Fails with [`DeskError::IndexNotReady`] when the index was never
    /// built; the caller decides how to degrade, the composer never
    /// guesses without context.
    pub async fn answer(&self, question: &str) -> Result<GroundedAnswer> {
        let index = self.index.current();
        if index.is_empty() {
            return Err(DeskError::IndexNotReady);
        }

        let query = self.embedder.embed(question).await?;
        let scored = index.search(&query, self.top_k)?;

        let retrieved: Vec<RetrievedChunk> = scored
            .into_iter()
            .enumerate()
            .map(|(rank, s)| RetrievedChunk {
                chunk: s.chunk,
                relevance_rank: rank,
            })
            .collect();

        debug!(question, chunks = retrieved.len(), "retrieved context");

        let context = retrieved
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let answer = self
            .completion
            .generate(GROUNDING_PROMPT, &context, question)
            .await?;

        let sources = retrieved
            .iter()
            .map(|r| ConsultedSource {
                source_id: r.chunk.source_id.clone(),
                preview: preview(&r.chunk.content, SOURCE_PREVIEW_CHARS),
            })
            .collect();

        Ok(GroundedAnswer {
            answer,
            sources,
            retrieved,
        })
    }
}
