//! Configuration for embedding models

use crate::error::{EmbedError, Result};
use fastembed::EmbeddingModel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The embedding model every index defaults to.
///
/// Small, fast, open-source, and runs fully locally through ONNX.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Configuration for embedding models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedConfig {
    /// Name of the embedding model to use
    pub model_name: String,
    /// Directory where downloaded model files are cached
    pub cache_dir: PathBuf,
    /// Maximum batch size for embedding generation
    pub batch_size: usize,
    /// Whether to print download progress when fetching model files
    pub show_download_progress: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            cache_dir: PathBuf::from("models"),
            batch_size: 16,
            show_download_progress: false,
        }
    }
}

impl EmbedConfig {
    /// Create a configuration for the given model, caching under `cache_dir`.
    pub fn new(model_name: impl Into<String>, cache_dir: impl AsRef<Path>) -> Self {
        Self {
            model_name: model_name.into(),
            cache_dir: cache_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Default model configuration with a specific cache directory.
    pub fn default_with_cache(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Set the batch size for embedding generation (builder style).
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set whether to show model download progress (builder style).
    pub fn with_show_download_progress(self, show_download_progress: bool) -> Self {
        Self {
            show_download_progress,
            ..self
        }
    }

    /// The identifier recorded in every index built with this model.
    ///
    /// Indexes and queries must agree on this value; the assistant refuses
    /// to search an index built by a different model.
    pub fn model_id(&self) -> &str {
        &self.model_name
    }

    /// Resolve the configured model name to a fastembed model.
    ///
    /// Returns [`EmbedError::InvalidConfig`] for names outside the
    /// supported catalogue.
    pub fn embedding_model(&self) -> Result<EmbeddingModel> {
        match self.model_name.as_str() {
            DEFAULT_MODEL_NAME => Ok(EmbeddingModel::AllMiniLML6V2),
            other => Err(EmbedError::invalid_config(format!(
                "unsupported embedding model '{other}' (supported: {DEFAULT_MODEL_NAME})"
            ))),
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EmbedError::invalid_config(
                "batch_size must be greater than zero",
            ));
        }
        self.embedding_model().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EmbedConfig::default();
        assert_eq!(config.model_name, "all-MiniLM-L6-v2");
        assert_eq!(config.model_id(), "all-MiniLM-L6-v2");
        assert_eq!(config.batch_size, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_creation() {
        let temp_dir = tempdir().unwrap();
        let config = EmbedConfig::new("all-MiniLM-L6-v2", temp_dir.path()).with_batch_size(4);

        assert_eq!(config.cache_dir, temp_dir.path());
        assert_eq!(config.batch_size, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_model_rejected() {
        let config = EmbedConfig {
            model_name: "no-such-model".to_string(),
            ..EmbedConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EmbedError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = EmbedConfig::default().with_batch_size(0);
        assert!(matches!(
            config.validate(),
            Err(EmbedError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = EmbedConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EmbedConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
