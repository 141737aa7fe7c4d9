//! This module provides the chunking layer for the retrieval pipeline:
//! documents are split into overlapping fixed-size segments that become the
//! unit of embedding and retrieval.
//!
//! The module defines three main types:
//! - [`Document`]: a loaded source document with a stable identifier.
//! - [`Chunk`]: a bounded segment of a document's text, carrying character
//!   offsets and its sequence position within the document.
//! - [`TextChunker`]: the splitter, configured by [`ChunkConfig`].
//!
//! Chunks carry enough metadata to reconstruct their origin: consecutive
//! chunks of a document overlap by a fixed number of characters, and
//! concatenating chunk texts with the overlap stripped reproduces the
//! document text exactly. That reconstruction property is what keeps the
//! persisted index aligned with the documents it was built from.
//!
//! # Usage
//!
//! ```
//! use erev_ai_context::text::{ChunkConfig, Document, TextChunker};
//!
//! let config = ChunkConfig::default().with_max_chars(500).with_overlap(100);
//! let chunker = TextChunker::new(config).unwrap();
//!
//! let doc = Document::new("doc-0", "notes/range_tradeoffs.md", "A".repeat(1000));
//! let chunks = chunker.chunk(&doc).unwrap();
//!
//! assert_eq!(chunks.len(), 3);
//! assert_eq!((chunks[0].start, chunks[0].end), (0, 500));
//! assert_eq!((chunks[1].start, chunks[1].end), (400, 900));
//! assert_eq!((chunks[2].start, chunks[2].end), (800, 1000));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for chunking operations.
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Errors produced while splitting documents into chunks.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The document text is empty or whitespace-only.
    #[error("document '{id}' has no text content")]
    EmptyDocument { id: String },

    /// The chunking configuration is not usable (e.g. overlap >= chunk size).
    #[error("invalid chunking configuration: {message}")]
    InvalidConfig { message: String },
}

/// A source document loaded from the corpus.
///
/// Documents are immutable once loaded. The `text` field holds the content
/// the chunker (and therefore the index) operates on; loaders are expected
/// to normalize whitespace before constructing a `Document` so that chunk
/// offsets refer to the text the index actually stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier within one corpus build (e.g. `doc-3`).
    pub id: String,
    /// Path of the source file, relative to the corpus root.
    pub source: String,
    /// The document text content.
    pub text: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A bounded segment of a document's text, the unit of retrieval.
///
/// `start` and `end` are character offsets into the parent document's text
/// (`end` exclusive). Offsets increase monotonically with `sequence`, and
/// consecutive chunks share the configured overlap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the parent [`Document`].
    pub doc_id: String,
    /// Path of the parent document's source file.
    pub source: String,
    /// Position of this chunk within the document (0-indexed).
    pub sequence: usize,
    /// Character offset where this chunk begins in the document text.
    pub start: usize,
    /// Character offset just past the end of this chunk.
    pub end: usize,
    /// The text content of this chunk.
    pub text: String,
}

/// Configuration for [`TextChunker`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkConfig {
    /// Maximum chunk length in characters.
    pub max_chars: usize,
    /// Number of characters shared between consecutive chunks.
    pub overlap: usize,
    /// A final chunk shorter than this is merged into the previous chunk
    /// instead of being emitted on its own. Zero keeps every tail.
    pub min_tail: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            overlap: 200,
            min_tail: 0,
        }
    }
}

impl ChunkConfig {
    /// Set the maximum chunk length in characters (builder style).
    pub fn with_max_chars(self, max_chars: usize) -> Self {
        Self { max_chars, ..self }
    }

    /// Set the overlap between consecutive chunks (builder style).
    pub fn with_overlap(self, overlap: usize) -> Self {
        Self { overlap, ..self }
    }

    /// Set the minimum length for a trailing chunk (builder style).
    pub fn with_min_tail(self, min_tail: usize) -> Self {
        Self { min_tail, ..self }
    }

    /// Validate that the configuration describes a terminating split.
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(ChunkError::InvalidConfig {
                message: "max_chars must be greater than zero".to_string(),
            });
        }
        if self.overlap >= self.max_chars {
            return Err(ChunkError::InvalidConfig {
                message: format!(
                    "overlap ({}) must be less than max_chars ({})",
                    self.overlap, self.max_chars
                ),
            });
        }
        if self.min_tail >= self.max_chars {
            return Err(ChunkError::InvalidConfig {
                message: format!(
                    "min_tail ({}) must be less than max_chars ({})",
                    self.min_tail, self.max_chars
                ),
            });
        }
        Ok(())
    }
}

/// Collapse all runs of whitespace to single spaces.
///
/// Document loaders apply this before chunking so that chunk offsets refer
/// to the normalized text that ends up in the index.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits documents into overlapping fixed-size chunks.
///
/// The chunker walks the document in strides of `max_chars - overlap`
/// characters, emitting one chunk per stride. The final segment is kept as
/// a short trailing chunk unless it is shorter than `min_tail`, in which
/// case it is absorbed into the previous chunk; text is never dropped
/// either way.
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkConfig,
}

impl TextChunker {
    /// Create a chunker, validating the configuration.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split a document into chunks.
    ///
    /// Fails with [`ChunkError::EmptyDocument`] when the document text is
    /// empty or whitespace-only.
    pub fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        Ok(self.chunk_iter(document)?.collect())
    }

    /// Lazy form of [`chunk`](Self::chunk): returns a finite, restartable
    /// iterator over the document's chunks.
    pub fn chunk_iter<'a>(&self, document: &'a Document) -> Result<Chunks<'a>> {
        if document.text.trim().is_empty() {
            return Err(ChunkError::EmptyDocument {
                id: document.id.clone(),
            });
        }

        // Character-offset to byte-offset table, so slicing never lands
        // inside a multi-byte character.
        let mut boundaries: Vec<usize> =
            document.text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(document.text.len());

        Ok(Chunks {
            doc_id: &document.id,
            source: &document.source,
            text: &document.text,
            boundaries,
            config: self.config.clone(),
            pos: 0,
            sequence: 0,
            done: false,
        })
    }
}

/// Iterator over a document's chunks, produced by [`TextChunker::chunk_iter`].
pub struct Chunks<'a> {
    doc_id: &'a str,
    source: &'a str,
    text: &'a str,
    boundaries: Vec<usize>,
    config: ChunkConfig,
    pos: usize,
    sequence: usize,
    done: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let total = self.boundaries.len() - 1;
        let stride = self.config.max_chars - self.config.overlap;
        let start = self.pos;
        let mut end = (start + self.config.max_chars).min(total);

        if end < total {
            let next_start = start + stride;
            // When only a too-short tail would remain, absorb it here.
            if next_start + self.config.max_chars >= total
                && total - next_start < self.config.min_tail
            {
                end = total;
            }
        }

        if end == total {
            self.done = true;
        } else {
            self.pos = start + stride;
        }

        let text = &self.text[self.boundaries[start]..self.boundaries[end]];
        let chunk = Chunk {
            doc_id: self.doc_id.to_string(),
            source: self.source.to_string(),
            sequence: self.sequence,
            start,
            end,
            text: text.to_string(),
        };
        self.sequence += 1;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max_chars: usize, overlap: usize) -> TextChunker {
        TextChunker::new(
            ChunkConfig::default()
                .with_max_chars(max_chars)
                .with_overlap(overlap),
        )
        .unwrap()
    }

    /// Reassemble a document from its chunks by stripping the overlap from
    /// every chunk after the first.
    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&chunk.text);
            } else {
                out.extend(chunk.text.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_fixed_offsets() {
        let doc = Document::new("doc-0", "a.txt", "x".repeat(1000));
        let chunks = chunker(500, 100).chunk(&doc).unwrap();

        let offsets: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(offsets, vec![(0, 500), (400, 900), (800, 1000)]);

        let sequences: Vec<usize> = chunks.iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        for chunk in &chunks {
            assert_eq!(chunk.doc_id, "doc-0");
            assert_eq!(chunk.source, "a.txt");
            assert_eq!(chunk.text.chars().count(), chunk.end - chunk.start);
        }
    }

    #[test]
    fn test_reconstruction() {
        // Varied content so a reconstruction bug cannot hide in repetition
        let content: String = (0..137)
            .map(|i| format!("Sentence number {i} about electric range. "))
            .collect();
        let overlap = 75;
        let chunks = chunker(400, overlap).chunk(&Document::new("d", "s", &content)).unwrap();

        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks, overlap), content);
    }

    #[test]
    fn test_short_document_single_chunk() {
        let doc = Document::new("doc-0", "a.txt", "short text");
        let chunks = chunker(500, 100).chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].end, doc.text.chars().count());
        assert_eq!(chunks[0].text, doc.text);
    }

    #[test]
    fn test_empty_document_rejected() {
        let chunker = chunker(500, 100);
        for text in ["", "   ", "\n\t \n"] {
            let err = chunker.chunk(&Document::new("doc-0", "a.txt", text));
            assert!(matches!(err, Err(ChunkError::EmptyDocument { .. })));
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(TextChunker::new(ChunkConfig::default().with_max_chars(0)).is_err());
        assert!(
            TextChunker::new(ChunkConfig::default().with_max_chars(100).with_overlap(100))
                .is_err()
        );
        assert!(
            TextChunker::new(ChunkConfig::default().with_max_chars(100).with_overlap(150))
                .is_err()
        );
        assert!(
            TextChunker::new(
                ChunkConfig::default().with_max_chars(100).with_overlap(10).with_min_tail(100)
            )
            .is_err()
        );
    }

    #[test]
    fn test_min_tail_merges_into_previous_chunk() {
        let doc = Document::new("doc-0", "a.txt", "x".repeat(1000));
        let config = ChunkConfig::default()
            .with_max_chars(500)
            .with_overlap(100)
            .with_min_tail(300);
        let chunks = TextChunker::new(config).unwrap().chunk(&doc).unwrap();

        // The 200-char tail is shorter than min_tail, so the second chunk
        // absorbs it instead of a third chunk appearing.
        let offsets: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(offsets, vec![(0, 500), (400, 1000)]);
        assert_eq!(reconstruct(&chunks, 100), doc.text);
    }

    #[test]
    fn test_multibyte_text_offsets_are_characters() {
        // 3-byte characters; byte slicing at offset 10 would panic or tear
        let content = "日本語のテキスト".repeat(40);
        let chunks = chunker(50, 10).chunk(&Document::new("d", "s", &content)).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.text.chars().count(), chunk.end - chunk.start);
        }
        assert_eq!(reconstruct(&chunks, 10), content);
    }

    #[test]
    fn test_chunk_iter_is_restartable() {
        let doc = Document::new("doc-0", "a.txt", "y".repeat(1500));
        let chunker = chunker(400, 50);

        let first: Vec<Chunk> = chunker.chunk_iter(&doc).unwrap().collect();
        let second: Vec<Chunk> = chunker.chunk_iter(&doc).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunk_serialization_round_trip() {
        let doc = Document::new("doc-2", "report.md", "alpha beta gamma delta");
        let chunks = chunker(10, 2).chunk(&doc).unwrap();

        let json = serde_json::to_string(&chunks).unwrap();
        let back: Vec<Chunk> = serde_json::from_str(&json).unwrap();
        assert_eq!(chunks, back);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  a\tb\n\nc   d "),
            "a b c d".to_string()
        );
        assert_eq!(normalize_whitespace("plain"), "plain");
        assert_eq!(normalize_whitespace(" \n\t"), "");
    }
}
