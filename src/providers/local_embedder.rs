//! Local embedding backend - all-MiniLM-L6-v2 via Candle
//!
//! The quota-free path: a small sentence-transformer downloaded from the
//! HuggingFace Hub and run on CPU. Model work is blocking, so every call
//! is moved off the async runtime with `spawn_blocking`.

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::providers::Embedder;
use crate::{DeskError, Result};

const MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
const EMBEDDING_DIM: usize = 384;
const MAX_TOKENS: usize = 512;

/// Sentence embedder backed by a local BERT model
pub struct LocalEmbedder {
    inner: Arc<BertEncoder>,
}

struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl LocalEmbedder {
    /// Create the embedder, downloading the model on first use
    pub fn new() -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new()
            .map_err(|e| DeskError::EmbeddingFailure(format!("HuggingFace API: {}", e)))?;
        let repo = api.repo(Repo::new(MODEL_ID.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| DeskError::EmbeddingFailure(format!("model config download: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| DeskError::EmbeddingFailure(format!("tokenizer download: {}", e)))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| DeskError::EmbeddingFailure(format!("model weights download: {}", e)))?;

        let config_contents = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_contents)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| DeskError::EmbeddingFailure(format!("tokenizer load: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| DeskError::EmbeddingFailure(format!("tokenizer truncation: {}", e)))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], candle_core::DType::F32, &device)?
        };
        let model = BertModel::load(vb, &config)?;

        info!(model = MODEL_ID, dimensions = EMBEDDING_DIM, "local embedder ready");

        Ok(Self {
            inner: Arc::new(BertEncoder {
                model,
                tokenizer,
                device,
            }),
        })
    }
}

impl BertEncoder {
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| DeskError::EmbeddingFailure(format!("tokenization: {}", e)))?;

        let batch_size = texts.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Pad token ids and attention masks to a rectangular batch
        let mut flat_ids = vec![0u32; batch_size * max_len];
        let mut flat_mask = vec![0u32; batch_size * max_len];
        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            flat_ids[i * max_len..i * max_len + ids.len()].copy_from_slice(ids);
            flat_mask[i * max_len..i * max_len + mask.len()].copy_from_slice(mask);
        }

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let embeddings = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled = Self::mean_pool(&embeddings, &attention_mask)?;
        let normalized = Self::l2_normalize(&pooled)?;

        Ok(normalized.to_vec2::<f32>()?)
    }

    /// Mean pooling over the sequence dimension, weighted by attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(sum_embeddings.broadcast_div(&sum_mask)?)
    }

    fn l2_normalize(pooled: &Tensor) -> Result<Tensor> {
        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        Ok(pooled.broadcast_div(&norm)?)
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| DeskError::EmbeddingFailure("empty batch result".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || inner.encode_batch(&texts))
            .await
            .map_err(|e| DeskError::EmbeddingFailure(format!("embedding task: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    fn name(&self) -> &str {
        MODEL_ID
    }
}
