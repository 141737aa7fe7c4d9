//! Corpus build engine: documents -> chunks -> embeddings -> persisted index.
//!
//! Building is a single-threaded, offline batch operation. There is no
//! incremental update: every build re-reads the whole corpus and replaces
//! the persisted index wholesale, which keeps chunk/vector alignment
//! trivially correct. Queries running against a previously loaded index are
//! unaffected; they keep their immutable snapshot until the caller swaps in
//! the new one.

use crate::index::SearchIndex;
use crate::loader::load_documents;
use crate::store::IndexStore;
use anyhow::{Context, Result};
use erev_ai_context::{ChunkConfig, TextChunker};
use erev_ai_embed::EmbeddingProvider;
use std::path::PathBuf;

/// Configuration for one corpus build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory of source documents (.txt, .md, .pdf).
    pub docs_dir: PathBuf,
    /// Directory the persisted index is written to.
    pub index_dir: PathBuf,
    /// Chunking geometry used for every document.
    pub chunking: ChunkConfig,
}

impl BuildConfig {
    pub fn new(docs_dir: impl Into<PathBuf>, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            index_dir: index_dir.into(),
            chunking: ChunkConfig::default(),
        }
    }

    /// Set the chunking geometry (builder style).
    pub fn with_chunking(self, chunking: ChunkConfig) -> Self {
        Self { chunking, ..self }
    }
}

/// Summary of a completed build.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildReport {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub model: String,
}

/// Build the index from the configured corpus and persist it.
///
/// A missing or empty corpus directory produces a valid empty index. Any
/// other failure (chunking, embedding, persistence) aborts the build and
/// leaves the previously persisted index untouched.
pub async fn build_index(
    config: &BuildConfig,
    provider: &dyn EmbeddingProvider,
) -> Result<BuildReport> {
    let chunker = TextChunker::new(config.chunking.clone())
        .context("invalid chunking configuration")?;

    tracing::info!("Scanning documents in {}", config.docs_dir.display());
    let documents = load_documents(&config.docs_dir).await?;

    let mut chunks = Vec::new();
    for document in &documents {
        chunks.extend(
            chunker
                .chunk(document)
                .with_context(|| format!("failed to chunk {}", document.source))?,
        );
    }

    tracing::info!(
        "Embedding {} chunks from {} documents with {}",
        chunks.len(),
        documents.len(),
        provider.model_id()
    );
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = provider
        .embed_many(&texts)
        .await
        .context("embedding backend failed during index build")?;

    let index = SearchIndex::build(chunks, vectors, provider.model_id())?;
    IndexStore::new(&config.index_dir).save(&index).await?;

    let report = BuildReport {
        documents: documents.len(),
        chunks: index.len(),
        dimension: index.dimension(),
        model: index.model_id().to_string(),
    };
    tracing::info!(
        "Index build complete: {} documents, {} chunks, dimension {}",
        report.documents,
        report.chunks,
        report.dimension
    );
    Ok(report)
}
