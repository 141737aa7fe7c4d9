//! erev-ai-index: persistent vector index and retrieval
//!
//! This crate owns the middle of the question-answering pipeline: it turns
//! a directory of documents into a persisted vector index, and answers
//! top-k similarity queries against it.
//!
//! ## Key Modules
//!
//! - **[`index`]**: the in-memory [`SearchIndex`] and brute-force cosine search
//! - **[`store`]**: two-file persistence with atomic replacement
//! - **[`loader`]**: corpus document loading (.txt, .md, .pdf)
//! - **[`build`]**: the batch build engine tying the pieces together
//!
//! ## Architecture
//!
//! ```text
//! docs/ -> loader -> chunker -> embedder -> SearchIndex -> IndexStore
//!                                               ^
//!                              queries ---------+ (read-only, Arc-shared)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use erev_ai_index::{BuildConfig, IndexStore, build_index};
//! use erev_ai_embed::{EmbedConfig, FastEmbedProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = FastEmbedProvider::load(EmbedConfig::default()).await?;
//! let config = BuildConfig::new("docs/knowledge_base", "data/knowledge_base");
//! build_index(&config, &provider).await?;
//!
//! let index = IndexStore::new("data/knowledge_base").load().await?;
//! println!("{} chunks indexed", index.len());
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod index;
pub mod loader;
pub mod store;

pub use build::{BuildConfig, BuildReport, build_index};
pub use index::{IndexError, SearchHit, SearchIndex};
pub use loader::load_documents;
pub use store::IndexStore;
