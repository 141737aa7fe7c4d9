//! The in-memory search index and its similarity search.
//!
//! A [`SearchIndex`] pairs chunk metadata with a flat, row-major block of
//! f32 vectors. It is built wholesale by the corpus build engine, persisted
//! by [`IndexStore`](crate::store::IndexStore), and reloaded read-only at
//! query time. Once loaded it is immutable; concurrent callers share it as
//! `Arc<SearchIndex>` without locking.
//!
//! Search is a brute-force cosine scan over every stored vector. That is
//! the baseline the retrieval contract is defined against: descending
//! similarity, ties broken by ascending chunk position, k clamped to the
//! index size, and identical inputs always producing the identical ordered
//! result.

use erev_ai_context::Chunk;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors for index construction, persistence, and search.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Chunks and vectors do not line up (count or dimension mismatch).
    #[error("index is inconsistent: {message}")]
    Consistency { message: String },

    /// No persisted index exists at the given location.
    #[error("no persisted index found in {dir}")]
    NotFound { dir: PathBuf },

    /// The persisted files exist but do not describe a valid index.
    #[error("persisted index in {dir} is corrupt: {message}")]
    Corrupt { dir: PathBuf, message: String },

    /// The index holds no chunks, so there is nothing to search.
    #[error("index contains no chunks")]
    EmptyIndex,

    /// IO errors while reading or writing index files.
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Chunk metadata could not be serialized.
    #[error("metadata serialization failed: {source}")]
    Metadata {
        #[from]
        source: serde_json::Error,
    },
}

impl IndexError {
    pub(crate) fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency {
            message: message.into(),
        }
    }
}

/// A retrieved chunk paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity against the query vector (higher is closer).
    pub score: f32,
    /// Position of the chunk within the index, the deterministic
    /// tie-breaker for equal scores.
    pub position: usize,
}

/// Immutable collection of (chunk, vector) pairs plus the id of the
/// embedding model that produced the vectors.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    model_id: String,
    dimension: usize,
    chunks: Vec<Chunk>,
    /// Row-major vector block: chunk `i` owns `vectors[i*dimension..(i+1)*dimension]`.
    vectors: Vec<f32>,
}

impl SearchIndex {
    /// Assemble an index from parallel chunk and vector lists.
    ///
    /// Validates that the lists have equal length and that every vector
    /// shares one non-zero dimension; fails with
    /// [`IndexError::Consistency`] otherwise. An empty chunk list produces
    /// a valid empty index (dimension 0).
    pub fn build(
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
        model_id: impl Into<String>,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::consistency(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
        if !vectors.is_empty() && dimension == 0 {
            return Err(IndexError::consistency("vectors have zero dimension"));
        }

        let mut flat = Vec::with_capacity(chunks.len() * dimension);
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(IndexError::consistency(format!(
                    "vector {} has dimension {}, expected {}",
                    i,
                    vector.len(),
                    dimension
                )));
            }
            flat.extend_from_slice(vector);
        }

        Ok(Self {
            model_id: model_id.into(),
            dimension,
            chunks,
            vectors: flat,
        })
    }

    /// Reassemble an index from already-validated persisted parts.
    pub(crate) fn from_parts(
        model_id: String,
        dimension: usize,
        chunks: Vec<Chunk>,
        vectors: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(chunks.len() * dimension, vectors.len());
        Self {
            model_id,
            dimension,
            chunks,
            vectors,
        }
    }

    /// Identifier of the embedding model this index was built with.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Dimension of every stored vector (0 for an empty index).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub(crate) fn raw_vectors(&self) -> &[f32] {
        &self.vectors
    }

    /// The stored vector for chunk `position`.
    pub fn vector(&self, position: usize) -> &[f32] {
        &self.vectors[position * self.dimension..(position + 1) * self.dimension]
    }

    /// Names of the distinct source files behind this index, sorted.
    pub fn sources(&self) -> Vec<String> {
        self.chunks
            .iter()
            .map(|c| c.source.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Return the `k` chunks most similar to `query` by cosine similarity.
    ///
    /// `k` larger than the index is clamped. Results are ordered by
    /// descending score; equal scores fall back to ascending chunk
    /// position, so repeated calls with identical inputs return the
    /// identical ordered result.
    ///
    /// # Errors
    ///
    /// - [`IndexError::EmptyIndex`] when the index holds no chunks.
    /// - [`IndexError::Consistency`] when the query dimension differs from
    ///   the index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if self.chunks.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        if query.len() != self.dimension {
            return Err(IndexError::consistency(format!(
                "query has dimension {}, index has dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = (0..self.chunks.len())
            .map(|position| (position, cosine_similarity(self.vector(position), query)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k.min(self.chunks.len()));

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchHit {
                chunk: self.chunks[position].clone(),
                score,
                position,
            })
            .collect())
    }
}

/// Cosine similarity between two equal-length vectors.
///
/// Returns 0.0 when either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
