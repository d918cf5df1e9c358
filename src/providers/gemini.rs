//! Gemini REST adapter
//!
//! One HTTP client covering the two capabilities the pipeline consumes
//! from the Gemini API: `generateContent` (completion, plus JSON-mode
//! output for triage) and `embedContent` / `batchEmbedContents` (remote
//! embeddings).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::providers::{CompletionModel, Embedder};
use crate::{DeskError, Result};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Output dimensions of the known Gemini embedding models
fn embedding_dimensions_for(model: &str) -> Option<usize> {
    match model {
        "text-embedding-004" | "embedding-001" => Some(768),
        "gemini-embedding-001" => Some(3072),
        _ => None,
    }
}

/// HTTP client for the Gemini API
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    completion_model: String,
    embedding_model: String,
    embedding_dim: usize,
    temperature: f32,
}

impl GeminiClient {
    /// Create a client with the production model settings
    /// (gemini-1.5-flash at temperature 0.3, text-embedding-004)
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_models(api_key, "gemini-1.5-flash", "text-embedding-004", 0.3)
    }

    pub fn with_models(
        api_key: impl Into<String>,
        completion_model: impl Into<String>,
        embedding_model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        let embedding_model = embedding_model.into();
        let embedding_dim =
            embedding_dimensions_for(&embedding_model).unwrap_or(DEFAULT_EMBEDDING_DIM);

        Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
            completion_model: completion_model.into(),
            embedding_model,
            embedding_dim,
            temperature,
        }
    }

    /// Override the API base URL (used by tests against a local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the embedding dimensions for a model the client does not
    /// know about
    pub fn with_embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.embedding_dim = dimensions;
        self
    }

    /// Call generateContent and return the first candidate's text
    async fn generate_content(
        &self,
        system_instruction: &str,
        user_text: &str,
        json_mode: bool,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.completion_model, self.api_key
        );

        let mut generation_config = json!({ "temperature": self.temperature });
        if json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }

        let body = json!({
            "system_instruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{ "role": "user", "parts": [{ "text": user_text }] }],
            "generationConfig": generation_config,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(DeskError::CompletionFailure(format!(
                "Gemini API error: {}",
                response.status()
            )));
        }

        let payload: GenerateContentResponse = response.json().await?;
        payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| DeskError::CompletionFailure("empty candidate list".to_string()))
    }

    /// Completion constrained to JSON output (used by the classifier)
    pub async fn generate_json(&self, system_instruction: &str, user_text: &str) -> Result<String> {
        self.generate_content(system_instruction, user_text, true)
            .await
    }

    fn embed_url(&self, endpoint: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, self.embedding_model, endpoint, self.api_key
        )
    }

    fn embed_request(&self, text: &str) -> Value {
        json!({
            "model": format!("models/{}", self.embedding_model),
            "content": { "parts": [{ "text": text }] },
        })
    }
}

#[async_trait]
impl CompletionModel for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        context: &str,
        question: &str,
    ) -> Result<String> {
        let system = format!("{}\n\nContexto:\n{}", system_instruction, context);
        self.generate_content(&system, question, false).await
    }

    fn name(&self) -> &str {
        &self.completion_model
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.embed_url("embedContent");
        let response = self
            .client
            .post(&url)
            .json(&self.embed_request(text))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeskError::EmbeddingFailure(format!(
                "Gemini API error: {}",
                response.status()
            )));
        }

        let payload: EmbedContentResponse = response.json().await?;
        Ok(payload.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.embed_url("batchEmbedContents");
        let requests: Vec<Value> = texts.iter().map(|t| self.embed_request(t)).collect();
        let response = self
            .client
            .post(&url)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeskError::EmbeddingFailure(format!(
                "Gemini API error: {}",
                response.status()
            )));
        }

        let payload: BatchEmbedResponse = response.json().await?;
        if payload.embeddings.len() != texts.len() {
            return Err(DeskError::EmbeddingFailure(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                payload.embeddings.len()
            )));
        }
        Ok(payload.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.embedding_dim
    }

    fn name(&self) -> &str {
        &self.embedding_model
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_default_models() {
        let client = GeminiClient::new("test-key");
        assert_eq!(CompletionModel::name(&client), "gemini-1.5-flash");
        assert_eq!(Embedder::name(&client), "text-embedding-004");
        assert_eq!(client.dimensions(), 768);
    }

    #[test]
    fn test_dimensions_follow_the_configured_model() {
        let client = GeminiClient::with_models("k", "gemini-1.5-flash", "gemini-embedding-001", 0.3);
        assert_eq!(client.dimensions(), 3072);

        let client = GeminiClient::with_models("k", "gemini-1.5-flash", "embedding-001", 0.3);
        assert_eq!(client.dimensions(), 768);

        // Unknown model: default dimension, overridable by the caller
        let client = GeminiClient::with_models("k", "gemini-1.5-flash", "custom-embedder", 0.3)
            .with_embedding_dimensions(1536);
        assert_eq!(client.dimensions(), 1536);
    }

    #[test]
    fn test_embed_url_shape() {
        let client = GeminiClient::new("k").with_base_url("http://localhost:9999/v1beta");
        let url = client.embed_url("embedContent");
        assert_eq!(
            url,
            "http://localhost:9999/v1beta/models/text-embedding-004:embedContent?key=k"
        );
    }

    #[test]
    fn test_generate_response_parsing() {
        let raw = r#"{
            "candidates": [
                { "content": { "parts": [{ "text": "resposta" }], "role": "model" } }
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "resposta");
    }

    #[test]
    fn test_batch_embed_response_parsing() {
        let raw = r#"{ "embeddings": [{ "values": [0.1, 0.2] }, { "values": [0.3, 0.4] }] }"#;
        let parsed: BatchEmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1].values, vec![0.3, 0.4]);
    }
}
