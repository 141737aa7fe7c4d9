//! # erev-ai-qa
//!
//! The question-answering surface of the system: retrieval-augmented
//! generation over the local document index. This crate composes the other
//! pieces (the embedding provider, the persisted search index, and the
//! Ollama generation backend) behind one entry point,
//! [`Assistant::ask`], which the presentation layer calls.
//!
//! ## Degradation, not crashes
//!
//! `ask` never returns an error. Every failure mode becomes a structured
//! [`Answer`] the UI can display:
//!
//! - no usable index → [`AnswerFailure::IndexUnavailable`], empty context
//! - query embedding failed → [`AnswerFailure::SearchUnavailable`]
//! - generation backend down or timed out →
//!   [`AnswerFailure::Generation`], with the retrieval context retained;
//!   the retrieved chunks are still useful on their own
//!
//! ## Concurrency
//!
//! The active index is an immutable `Arc<SearchIndex>` behind a read-write
//! lock. Queries share it freely; [`Assistant::reload_index`] swaps the
//! reference only after a new index has loaded successfully, so a rebuild
//! never disturbs questions in flight.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use erev_ai_embed::{EmbedConfig, FastEmbedProvider};
//! use erev_ai_qa::{Assistant, AssistantConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let embedder = Arc::new(FastEmbedProvider::load(EmbedConfig::default()).await?);
//! let assistant = Assistant::open(AssistantConfig::default(), embedder).await;
//!
//! let answer = assistant.ask("How much CO2 does an EREV save per mile?").await;
//! match &answer.text {
//!     Some(text) => println!("{text}"),
//!     None => println!("no answer: {:?}", answer.failure),
//! }
//! # Ok(())
//! # }
//! ```

pub mod generation;
pub mod prompt;

pub use generation::{GenerationConfig, GenerationError, OllamaClient};

use erev_ai_embed::EmbeddingProvider;
use erev_ai_index::{IndexStore, SearchHit, SearchIndex};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configuration for the assistant.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Directory holding the persisted index files.
    pub index_dir: PathBuf,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Generation backend settings.
    pub generation: GenerationConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("data/knowledge_base"),
            top_k: 4,
            generation: GenerationConfig::from_env(),
        }
    }
}

impl AssistantConfig {
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
            ..Self::default()
        }
    }

    /// Set how many chunks are retrieved per question (builder style).
    pub fn with_top_k(self, top_k: usize) -> Self {
        Self { top_k, ..self }
    }

    /// Set the generation backend configuration (builder style).
    pub fn with_generation(self, generation: GenerationConfig) -> Self {
        Self { generation, ..self }
    }
}

/// Why a question could not be (fully) answered.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerFailure {
    /// The question was empty or whitespace-only.
    EmptyQuestion,
    /// No knowledge base is available (index missing, corrupt, or empty).
    IndexUnavailable { detail: String },
    /// The question could not be embedded, so retrieval cannot run.
    SearchUnavailable { detail: String },
    /// Retrieval succeeded but generation failed; the context is still
    /// attached to the answer.
    Generation { error: GenerationError },
}

impl std::fmt::Display for AnswerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuestion => write!(f, "the question is empty"),
            Self::IndexUnavailable { detail } => {
                write!(f, "knowledge base unavailable: {detail}")
            }
            Self::SearchUnavailable { detail } => write!(f, "search unavailable: {detail}"),
            Self::Generation { error } => write!(f, "generation failed: {error}"),
        }
    }
}

/// The result of one question: generated text (when generation succeeded),
/// a structured failure (when it did not), and the retrieval context used
/// either way.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The question as asked.
    pub question: String,
    /// The generated answer, absent when generation failed.
    pub text: Option<String>,
    /// Set exactly when `text` is absent.
    pub failure: Option<AnswerFailure>,
    /// The retrieved chunks backing this answer, in retrieval order.
    pub context: Vec<SearchHit>,
}

impl Answer {
    fn failed(question: &str, failure: AnswerFailure, context: Vec<SearchHit>) -> Self {
        Self {
            question: question.to_string(),
            text: None,
            failure: Some(failure),
            context,
        }
    }

    /// Whether generation produced text.
    pub fn is_answered(&self) -> bool {
        self.text.is_some()
    }
}

/// Retrieval-augmented question answering over the local index.
///
/// Owns its embedding provider and generation client explicitly; nothing
/// here is process-global.
pub struct Assistant {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: OllamaClient,
    store: IndexStore,
    index: RwLock<Option<Arc<SearchIndex>>>,
    top_k: usize,
}

impl Assistant {
    /// Create an assistant and try to load the persisted index.
    ///
    /// A missing or unusable index is tolerated here: questions degrade to
    /// an [`AnswerFailure::IndexUnavailable`] answer until
    /// [`reload_index`](Self::reload_index) succeeds, so the UI stays
    /// usable with no knowledge base.
    pub async fn open(config: AssistantConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let assistant = Self {
            embedder,
            generator: OllamaClient::new(config.generation),
            store: IndexStore::new(&config.index_dir),
            index: RwLock::new(None),
            top_k: config.top_k,
        };
        if let Err(e) = assistant.reload_index().await {
            tracing::warn!("starting without a knowledge base: {e}");
        }
        assistant
    }

    /// Load the persisted index and make it the active one.
    ///
    /// The swap happens only after the new index has loaded and been
    /// validated against the active embedding model; on any failure the
    /// previously active index (if any) keeps serving queries.
    pub async fn reload_index(&self) -> anyhow::Result<()> {
        let index = self.store.load().await?;
        if index.model_id() != self.embedder.model_id() {
            anyhow::bail!(
                "index was built with embedding model '{}' but the active model is '{}'; \
                 rebuild the index",
                index.model_id(),
                self.embedder.model_id()
            );
        }
        tracing::info!(
            "Activated index: {} chunks, model {}",
            index.len(),
            index.model_id()
        );
        *self.index.write().await = Some(Arc::new(index));
        Ok(())
    }

    /// The currently active index, if one is loaded.
    pub async fn active_index(&self) -> Option<Arc<SearchIndex>> {
        self.index.read().await.clone()
    }

    /// Answer a question with retrieval-augmented generation.
    ///
    /// This is the sole entry point the presentation layer calls. It never
    /// panics or returns an error; see the crate docs for how each failure
    /// mode degrades.
    pub async fn ask(&self, question: &str) -> Answer {
        let question = question.trim();
        if question.is_empty() {
            return Answer::failed(question, AnswerFailure::EmptyQuestion, Vec::new());
        }

        let Some(index) = self.active_index().await else {
            return Answer::failed(
                question,
                AnswerFailure::IndexUnavailable {
                    detail: format!(
                        "no index loaded from {}; build the knowledge base first",
                        self.store.dir().display()
                    ),
                },
                Vec::new(),
            );
        };
        if index.is_empty() {
            return Answer::failed(
                question,
                AnswerFailure::IndexUnavailable {
                    detail: "the index contains no chunks".to_string(),
                },
                Vec::new(),
            );
        }

        let query = match self.embedder.embed(question).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!("query embedding failed: {e}");
                return Answer::failed(
                    question,
                    AnswerFailure::SearchUnavailable {
                        detail: e.to_string(),
                    },
                    Vec::new(),
                );
            }
        };

        let hits = match index.search(&query, self.top_k) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("search failed: {e}");
                return Answer::failed(
                    question,
                    AnswerFailure::SearchUnavailable {
                        detail: e.to_string(),
                    },
                    Vec::new(),
                );
            }
        };

        let user = prompt::user_prompt(question, &hits);
        match self.generator.chat(prompt::system_prompt(), &user).await {
            Ok(text) => Answer {
                question: question.to_string(),
                text: Some(text),
                failure: None,
                context: hits,
            },
            Err(error) => {
                tracing::warn!("generation failed, returning retrieval context only: {error}");
                Answer::failed(question, AnswerFailure::Generation { error }, hits)
            }
        }
    }
}
