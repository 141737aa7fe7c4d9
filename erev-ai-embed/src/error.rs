//! Error types for the embedding backend.

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type covering every way the embedding backend can fail, from
/// configuration problems to runtime failures during embedding generation.
///
/// Index building treats any of these as fatal; query-time callers catch
/// them and degrade to an explicit "search unavailable" state instead of
/// crashing.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// The embedding configuration is not usable (unknown model name,
    /// zero batch size).
    #[error("invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// The model could not be loaded or initialized.
    #[error("embedding model failed to load: {source}")]
    ModelInitialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The model loaded, but failed while generating embeddings.
    #[error("embedding generation failed: {source}")]
    EmbeddingGeneration {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The blocking inference task was cancelled or panicked.
    #[error("embedding task failed: {source}")]
    InferenceTask {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl EmbedError {
    /// Wrap an error that occurred while loading or initializing the model.
    pub fn model_init<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::ModelInitialization {
            source: source.into(),
        }
    }

    /// Wrap an error that occurred during embedding generation.
    pub fn embedding_gen<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::EmbeddingGeneration {
            source: source.into(),
        }
    }

    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
