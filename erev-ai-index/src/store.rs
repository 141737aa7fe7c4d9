//! Persistence for the search index.
//!
//! An index is persisted as two files inside one directory:
//!
//! - `embeddings.bin`: the raw f32 vector block, one fixed-dimension row
//!   per chunk, in index order
//! - `chunks.json`: the embedding model id, the vector dimension, and one
//!   chunk record per row, index-aligned 1:1 with the vector block
//!
//! Saving stages both files in a fresh sibling directory and swaps it into
//! place with directory renames. An interrupted build therefore leaves
//! either the previous index or no index at all, never a torn one; the
//! worst crash window turns into [`IndexError::NotFound`] on the next
//! load. Loading validates that the vector byte length matches the record
//! count times the dimension and reports [`IndexError::Corrupt`] when the
//! two files disagree.

use crate::index::{IndexError, Result, SearchIndex};
use erev_ai_context::Chunk;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File holding the raw f32 vector rows.
pub const VECTORS_FILE: &str = "embeddings.bin";
/// File holding the model id, dimension, and chunk records.
pub const METADATA_FILE: &str = "chunks.json";

/// The persisted metadata record list.
#[derive(Debug, Serialize, Deserialize)]
struct IndexMetadata {
    model: String,
    dimension: usize,
    chunks: Vec<Chunk>,
}

/// Reads and writes persisted indexes under one directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether both index files are present.
    pub fn exists(&self) -> bool {
        self.dir.join(VECTORS_FILE).exists() && self.dir.join(METADATA_FILE).exists()
    }

    fn staging_dir(&self) -> PathBuf {
        sibling(&self.dir, ".staging")
    }

    fn retired_dir(&self) -> PathBuf {
        sibling(&self.dir, ".old")
    }

    /// Persist the index, replacing any previous one atomically.
    pub async fn save(&self, index: &SearchIndex) -> Result<()> {
        let staging = self.staging_dir();
        if staging.exists() {
            fs::remove_dir_all(&staging).await?;
        }
        fs::create_dir_all(&staging).await?;

        let vector_bytes: &[u8] = bytemuck::cast_slice(index.raw_vectors());
        fs::write(staging.join(VECTORS_FILE), vector_bytes).await?;

        let metadata = IndexMetadata {
            model: index.model_id().to_string(),
            dimension: index.dimension(),
            chunks: index.chunks().to_vec(),
        };
        fs::write(
            staging.join(METADATA_FILE),
            serde_json::to_vec_pretty(&metadata)?,
        )
        .await?;

        // Swap the staged directory into place. After the first rename the
        // old index is out of the way; after the second the new one is
        // live. A crash in between leaves no index, which loads as
        // NotFound rather than as a half-written mix.
        let retired = self.retired_dir();
        if retired.exists() {
            fs::remove_dir_all(&retired).await?;
        }
        if self.dir.exists() {
            fs::rename(&self.dir, &retired).await?;
        }
        fs::rename(&staging, &self.dir).await?;
        if retired.exists() {
            fs::remove_dir_all(&retired).await?;
        }

        tracing::info!(
            "Saved index: {} chunks, dimension {}, model {} -> {}",
            index.len(),
            index.dimension(),
            index.model_id(),
            self.dir.display()
        );
        Ok(())
    }

    /// Load the persisted index.
    pub async fn load(&self) -> Result<SearchIndex> {
        let vectors_path = self.dir.join(VECTORS_FILE);
        let metadata_path = self.dir.join(METADATA_FILE);
        if !vectors_path.exists() || !metadata_path.exists() {
            return Err(IndexError::NotFound {
                dir: self.dir.clone(),
            });
        }

        let metadata_bytes = fs::read(&metadata_path).await?;
        let metadata: IndexMetadata =
            serde_json::from_slice(&metadata_bytes).map_err(|e| IndexError::Corrupt {
                dir: self.dir.clone(),
                message: format!("unreadable metadata: {e}"),
            })?;

        let vector_bytes = fs::read(&vectors_path).await?;
        let expected = metadata.chunks.len() * metadata.dimension * std::mem::size_of::<f32>();
        if vector_bytes.len() != expected {
            return Err(IndexError::Corrupt {
                dir: self.dir.clone(),
                message: format!(
                    "vector file holds {} bytes, expected {} for {} chunks of dimension {}",
                    vector_bytes.len(),
                    expected,
                    metadata.chunks.len(),
                    metadata.dimension
                ),
            });
        }

        let vectors: Vec<f32> = bytemuck::pod_collect_to_vec(&vector_bytes);

        tracing::debug!(
            "Loaded index: {} chunks, dimension {}, model {}",
            metadata.chunks.len(),
            metadata.dimension,
            metadata.model
        );

        Ok(SearchIndex::from_parts(
            metadata.model,
            metadata.dimension,
            metadata.chunks,
            vectors,
        ))
    }
}

/// Append a suffix to the final component of a path.
fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    dir.with_file_name(format!("{name}{suffix}"))
}
