//! Acceptance scenarios for chunking, ranking and contained completion failures.

use nucrag_core::{AppConfig, AppError, AppResult};
use nucrag_llm::{LlmClient, LlmRequest, LlmResponse};
use nucrag_retrieval::chunker::chunk_documents;
use nucrag_retrieval::{
    rank, ChunkConfig, CompletionOrchestrator, Corpus, Document, Embedding, VectorKind,
    ERROR_MARKER,
};
use std::sync::Arc;

#[test]
fn scenario_ten_words_size_five_overlap_two() {
    let paragraph = "one two three four five six seven eight nine ten";
    let docs = vec![Document::new("a.pdf", "file:///a.pdf").with_page(1, vec![paragraph.to_string()])];

    let chunks = chunk_documents(&docs, &ChunkConfig::new(5, 2).unwrap()).unwrap();
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

    assert_eq!(
        texts,
        vec![
            "one two three four five",
            "four five six seven eight",
            "seven eight nine ten"
        ]
    );
    assert!(chunks.iter().all(|c| c.source_paragraph == paragraph));
}

#[test]
fn scenario_overlap_not_below_size_is_rejected() {
    let docs = vec![Document::new("a.pdf", "file:///a.pdf").with_page(1, vec!["x y z".to_string()])];
    let config = ChunkConfig {
        chunk_size: 4,
        overlap: 4,
    };
    assert!(matches!(chunk_documents(&docs, &config), Err(AppError::Config(_))));
}

#[test]
fn scenario_identical_query_ranks_first() {
    let docs = vec![Document::new("a.pdf", "file:///a.pdf").with_page(
        1,
        vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()],
    )];
    let chunks = chunk_documents(&docs, &ChunkConfig::new(5, 0).unwrap()).unwrap();
    let vectors = vec![
        Embedding::Dense(vec![0.2, 0.9, 0.1]),
        Embedding::Dense(vec![0.6, 0.3, 0.7]),
        Embedding::Dense(vec![0.9, 0.1, 0.0]),
    ];
    let corpus = Corpus::new("test", VectorKind::Dense { dimensions: 3 }, chunks, vectors).unwrap();

    let query = Embedding::Dense(vec![0.6, 0.3, 0.7]);
    let ranked = rank(&corpus, &query, 0.5).unwrap();

    assert_eq!(ranked[0].chunk.text, "beta");
    assert!((ranked[0].score - 1.0).abs() < 1e-6);
    assert!(ranked.iter().all(|r| r.score >= 0.5));
}

struct AlwaysFails;

#[async_trait::async_trait]
impl LlmClient for AlwaysFails {
    fn provider_name(&self) -> &str {
        "always-fails"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::Backend("Azure OpenAI returned HTTP 429: quota exceeded".to_string()))
    }
}

#[tokio::test]
async fn scenario_failing_backend_yields_marked_answer() {
    let orchestrator = CompletionOrchestrator::new(AppConfig::default());
    orchestrator.register("AzureGPT", Arc::new(AlwaysFails)).unwrap();

    let answer = orchestrator
        .complete("system", "What is GDC 55?", "AzureGPT", 0.5, None)
        .await;

    assert!(answer.starts_with(ERROR_MARKER));
    assert!(!answer.trim_start_matches(ERROR_MARKER).trim().is_empty());
}
