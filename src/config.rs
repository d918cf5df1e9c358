//! Configuration: optional TOML file plus the environment secret
//!
//! Every knob has a default, so a missing file is not an error. The
//! Gemini API key is the one required piece and is checked before any
//! orchestration starts.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{DeskError, Result};

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub agent: AgentConfig,
    pub models: ModelsConfig,
    pub corpus: CorpusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Retry budget for information requests
    pub max_attempts: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// all-MiniLM-L6-v2 through Candle (quota-free, default)
    Local,
    /// text-embedding-004 through the Gemini API
    Gemini,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub completion_model: String,
    pub temperature: f32,
    pub embedding_backend: EmbeddingBackend,
    pub gemini_embedding_model: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            completion_model: "gemini-1.5-flash".to_string(),
            temperature: 0.3,
            embedding_backend: EmbeddingBackend::Local,
            gemini_embedding_model: "text-embedding-004".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Folder scanned for policy documents
    pub folder: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("policies"),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path or the default location;
    /// a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        toml::from_str(&contents)
            .map_err(|e| DeskError::ConfigError(format!("invalid config file: {}", e)))
    }

    /// Write the configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| DeskError::ConfigError(format!("config serialization: {}", e)))?;
        fs::write(&config_path, toml_string)?;
        Ok(())
    }

    /// Default configuration file path (`~/.deskpilot/config.toml`)
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            DeskError::ConfigurationMissing("could not determine home directory".to_string())
        })?;
        Ok(home.join(".deskpilot").join("config.toml"))
    }

    /// Gemini API key from the environment
    ///
    /// This is checked before orchestration starts: no partial result is
    /// meaningful without credentials.
    pub fn require_gemini_api_key() -> Result<String> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(DeskError::ConfigurationMissing(format!(
                "{} is not set",
                API_KEY_ENV
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.agent.max_attempts, 3);
        assert_eq!(config.models.embedding_backend, EmbeddingBackend::Local);
        assert_eq!(config.models.completion_model, "gemini-1.5-flash");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let raw = "[retrieval]\ntop_k = 5\n\n[models]\nembedding_backend = \"gemini\"\n";
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.models.embedding_backend, EmbeddingBackend::Gemini);
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_roundtrip_serialization() {
        let mut config = Config::default();
        config.corpus.folder = PathBuf::from("docs/policies");

        let raw = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.corpus.folder, PathBuf::from("docs/policies"));
    }
}
