//! Integration tests for the ask() degradation contract: every failure of
//! the pipeline must come back as a structured Answer, and a generation
//! failure must keep the retrieval context.

use async_trait::async_trait;
use erev_ai_context::Chunk;
use erev_ai_embed::{EmbedError, EmbeddingProvider};
use erev_ai_index::{IndexStore, SearchIndex};
use erev_ai_qa::{
    Answer, AnswerFailure, Assistant, AssistantConfig, GenerationConfig, GenerationError,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const DIM: usize = 4;

/// Deterministic stub embedder: buckets character codes into a fixed-size
/// vector, so identical text embeds identically.
struct StubEmbedder;

fn stub_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.1f32; DIM];
    for (i, c) in text.chars().enumerate() {
        vector[i % DIM] += (c as u32 % 31) as f32 / 31.0;
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(stub_vector(text))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| stub_vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_id(&self) -> &str {
        "stub-model"
    }
}

/// An embedder whose backend is permanently broken.
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
        Err(EmbedError::invalid_config("model backend is gone"))
    }

    async fn embed_many(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Err(EmbedError::invalid_config("model backend is gone"))
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_id(&self) -> &str {
        "stub-model"
    }
}

async fn save_index(dir: &Path, model_id: &str) {
    let texts = [
        "EREVs combine a battery with a gasoline range extender.",
        "Long-range BEVs carry much larger batteries than EREVs.",
    ];
    let chunks: Vec<Chunk> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk {
            doc_id: "doc-0".to_string(),
            source: "paper.md".to_string(),
            sequence: i,
            start: i * 100,
            end: i * 100 + text.chars().count(),
            text: text.to_string(),
        })
        .collect();
    let vectors = texts.iter().map(|t| stub_vector(t)).collect();

    let index = SearchIndex::build(chunks, vectors, model_id).unwrap();
    IndexStore::new(dir).save(&index).await.unwrap();
}

/// A generation config pointing at a port nothing listens on.
async fn unreachable_generation() -> GenerationConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    GenerationConfig::default()
        .with_base_url(format!("http://127.0.0.1:{port}"))
        .with_timeout(Duration::from_secs(5))
}

fn assert_failed_with(answer: &Answer, check: impl Fn(&AnswerFailure) -> bool) {
    assert!(!answer.is_answered());
    assert!(answer.text.is_none());
    match &answer.failure {
        Some(failure) if check(failure) => {}
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_index_degrades_to_structured_answer() {
    let temp_dir = tempdir().unwrap();
    let config = AssistantConfig::new(temp_dir.path().join("no-index"))
        .with_generation(unreachable_generation().await);
    let assistant = Assistant::open(config, Arc::new(StubEmbedder)).await;

    let answer = assistant.ask("what is an EREV?").await;
    assert_failed_with(&answer, |f| {
        matches!(f, AnswerFailure::IndexUnavailable { .. })
    });
    assert!(answer.context.is_empty());
}

#[tokio::test]
async fn test_empty_question_is_its_own_failure() {
    let temp_dir = tempdir().unwrap();
    let config = AssistantConfig::new(temp_dir.path().join("no-index"))
        .with_generation(unreachable_generation().await);
    let assistant = Assistant::open(config, Arc::new(StubEmbedder)).await;

    let answer = assistant.ask("   \n ").await;
    assert_failed_with(&answer, |f| matches!(f, AnswerFailure::EmptyQuestion));
}

#[tokio::test]
async fn test_unreachable_backend_keeps_retrieval_context() {
    let temp_dir = tempdir().unwrap();
    let index_dir = temp_dir.path().join("kb");
    save_index(&index_dir, "stub-model").await;

    let config = AssistantConfig::new(&index_dir)
        .with_top_k(2)
        .with_generation(unreachable_generation().await);
    let assistant = Assistant::open(config, Arc::new(StubEmbedder)).await;

    let answer = assistant.ask("how do EREVs extend range?").await;
    assert_failed_with(&answer, |f| {
        matches!(
            f,
            AnswerFailure::Generation {
                error: GenerationError::BackendUnavailable { .. }
            }
        )
    });
    // Retrieval succeeded, so the context survives the generation failure
    assert_eq!(answer.context.len(), 2);
    assert!(answer.context[0].score >= answer.context[1].score);
}

#[tokio::test]
async fn test_generation_timeout_is_reported_as_timeout() {
    let temp_dir = tempdir().unwrap();
    let index_dir = temp_dir.path().join("kb");
    save_index(&index_dir, "stub-model").await;

    // A backend that accepts connections but never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut sockets = Vec::new();
        loop {
            if let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        }
    });

    let generation = GenerationConfig::default()
        .with_base_url(format!("http://127.0.0.1:{port}"))
        .with_timeout(Duration::from_secs(1));
    let config = AssistantConfig::new(&index_dir).with_generation(generation);
    let assistant = Assistant::open(config, Arc::new(StubEmbedder)).await;

    let answer = assistant.ask("how do EREVs extend range?").await;
    assert_failed_with(&answer, |f| {
        matches!(
            f,
            AnswerFailure::Generation {
                error: GenerationError::Timeout { .. }
            }
        )
    });
    assert!(!answer.context.is_empty());
}

#[tokio::test]
async fn test_broken_embedder_degrades_to_search_unavailable() {
    let temp_dir = tempdir().unwrap();
    let index_dir = temp_dir.path().join("kb");
    save_index(&index_dir, "stub-model").await;

    let config = AssistantConfig::new(&index_dir)
        .with_generation(unreachable_generation().await);
    let assistant = Assistant::open(config, Arc::new(FailingEmbedder)).await;

    let answer = assistant.ask("how do EREVs extend range?").await;
    assert_failed_with(&answer, |f| {
        matches!(f, AnswerFailure::SearchUnavailable { .. })
    });
}

#[tokio::test]
async fn test_model_mismatch_refuses_to_activate_index() {
    let temp_dir = tempdir().unwrap();
    let index_dir = temp_dir.path().join("kb");
    save_index(&index_dir, "some-other-model").await;

    let config = AssistantConfig::new(&index_dir)
        .with_generation(unreachable_generation().await);
    let assistant = Assistant::open(config, Arc::new(StubEmbedder)).await;

    // The mismatched index must not have been activated
    assert!(assistant.active_index().await.is_none());
    assert!(assistant.reload_index().await.is_err());

    let answer = assistant.ask("what is an EREV?").await;
    assert_failed_with(&answer, |f| {
        matches!(f, AnswerFailure::IndexUnavailable { .. })
    });
}

#[tokio::test]
async fn test_empty_index_degrades_like_missing_index() {
    let temp_dir = tempdir().unwrap();
    let index_dir = temp_dir.path().join("kb");
    let empty = SearchIndex::build(vec![], vec![], "stub-model").unwrap();
    IndexStore::new(&index_dir).save(&empty).await.unwrap();

    let config = AssistantConfig::new(&index_dir)
        .with_generation(unreachable_generation().await);
    let assistant = Assistant::open(config, Arc::new(StubEmbedder)).await;

    let answer = assistant.ask("what is an EREV?").await;
    assert_failed_with(&answer, |f| {
        matches!(f, AnswerFailure::IndexUnavailable { .. })
    });
}
