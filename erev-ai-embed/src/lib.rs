//! # erev-ai-embed
//!
//! Text embedding for the retrieval pipeline, backed by local ONNX models
//! via FastEmbed. Both document chunks at index-build time and questions at
//! query time go through the same provider, so vectors always live in one
//! embedding space.
//!
//! ## Design
//!
//! - **Local inference**: the default model (`all-MiniLM-L6-v2`) runs
//!   entirely on this machine; no external API calls.
//! - **Explicit ownership**: a provider is constructed once, then passed to
//!   whatever needs it. There is no module-level model singleton.
//! - **Async-friendly blocking**: model inference is CPU-bound and runs
//!   under `tokio::task::spawn_blocking`.
//! - **Determinism**: a fixed model and fixed input produce identical
//!   vectors on every call, which retrieval ranking depends on.
//!
//! ## Quick Start
//!
//! ```no_run
//! use erev_ai_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::load(EmbedConfig::default()).await?;
//!
//! let vectors = provider
//!     .embed_many(&["how far can an EREV drive on battery?".to_string()])
//!     .await?;
//! assert_eq!(vectors[0].len(), provider.dimension());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] using the crate's [`EmbedError`]
//! type. Model-load and inference failures are fatal for index building but
//! are caught at query time, where search degrades instead of crashing.

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::{DEFAULT_MODEL_NAME, EmbedConfig};
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, FastEmbedProvider};
