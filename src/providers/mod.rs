//! External capability contracts and their concrete adapters
//!
//! The core only talks to classification, embedding and completion through
//! these traits; the adapters (Gemini REST client, local BERT embedder)
//! are thin and replaceable.

pub mod gemini;
pub mod local_embedder;

use async_trait::async_trait;

use crate::types::TriageVerdict;
use crate::Result;

pub use gemini::GeminiClient;
pub use local_embedder::LocalEmbedder;

/// Maps a free-text message to a triage verdict
///
/// The contract guarantees well-formed output for a given call, not
/// stability across calls - the underlying model is non-deterministic.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, message: &str) -> Result<TriageVerdict>;
}

/// Embeds text into fixed-dimension vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed multiple texts, preserving input order
    ///
    /// The default delegates to `embed` sequentially; implementations
    /// override it when the backend has a batch endpoint.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Output vector dimensions
    fn dimensions(&self) -> usize;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Generative text completion
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Generate text for a question, constrained by a system instruction
    /// and a context block
    async fn generate(
        &self,
        system_instruction: &str,
        context: &str,
        question: &str,
    ) -> Result<String>;

    /// Model name for logging
    fn name(&self) -> &str;
}
