//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use fastembed::{InitOptions, TextEmbedding};
use std::sync::{Arc, Mutex};

/// Trait for embedding providers that map text to fixed-length dense vectors.
///
/// Providers are explicitly owned objects, handed to the components that
/// need them (the index builder and the assistant); there is no implicit
/// process-wide model state. Embedding is deterministic: a fixed provider
/// produces identical vectors for identical input across calls.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, preserving input order
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The dimension of vectors produced by this provider
    fn dimension(&self) -> usize;

    /// Identifier of the model behind this provider, recorded in every
    /// index it builds
    fn model_id(&self) -> &str;
}

/// FastEmbed-based embedding provider running a local ONNX model.
///
/// Inference is blocking, so every call is offloaded to
/// `tokio::task::spawn_blocking`; the model itself sits behind a mutex
/// because fastembed requires `&mut` access to embed.
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Arc<Mutex<TextEmbedding>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedProvider {
    /// Load the configured model and return a ready provider.
    ///
    /// Downloads the model files into the configured cache directory on
    /// first use. The vector dimension is probed with a throwaway
    /// embedding rather than hardcoded per model.
    pub async fn load(config: EmbedConfig) -> Result<Self> {
        config.validate()?;
        let model_kind = config.embedding_model()?;

        tracing::info!("Loading embedding model: {}", config.model_name);

        let init_options = InitOptions::new(model_kind)
            .with_cache_dir(config.cache_dir.clone())
            .with_show_download_progress(config.show_download_progress);

        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                let mut model = TextEmbedding::try_new(init_options)
                    .map_err(|e| EmbedError::model_init(e))?;

                // Probe the dimension with a test embedding
                let probe = model
                    .embed(vec!["dimension probe".to_string()], None)
                    .map_err(|e| EmbedError::model_init(e))?;
                let dimension = probe
                    .first()
                    .map(|embedding| embedding.len())
                    .ok_or_else(|| {
                        EmbedError::invalid_config("model produced no probe embedding")
                    })?;

                Ok((model, dimension))
            })
            .await??;

        tracing::info!(
            "Embedding model {} ready, dimension {}",
            config.model_name,
            dimension
        );

        Ok(Self {
            config,
            model: Arc::new(Mutex::new(model)),
            dimension,
        })
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    /// Run one blocking embedding batch on the shared model.
    async fn embed_batch(&self, batch: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let embeddings = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
            let mut guard = model.lock().map_err(|_| {
                EmbedError::invalid_config("embedding model mutex poisoned")
            })?;
            guard
                .embed(batch, None)
                .map_err(|e| EmbedError::embedding_gen(e))
        })
        .await??;
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let result = self.embed_many(&texts).await?;
        result
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::embedding_gen(anyhow::anyhow!("no embedding generated")))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            let embeddings = self.embed_batch(batch.to_vec()).await?;
            all_embeddings.extend(embeddings);
        }

        if all_embeddings.len() != texts.len() {
            return Err(EmbedError::embedding_gen(anyhow::anyhow!(
                "expected {} embeddings, model returned {}",
                texts.len(),
                all_embeddings.len()
            )));
        }

        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.config.model_name
    }
}
