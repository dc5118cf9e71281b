//! End-to-end setup and query runs with offline embeddings and scripted
//! completion backends.

use futures::StreamExt;
use nucrag_core::{AppConfig, AppError, AppResult};
use nucrag_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use nucrag_retrieval::progress::{
    STATUS_COMPLETE, STATUS_ERROR, STATUS_GENERATING, STATUS_PROCESSING, STATUS_SEARCHING,
};
use nucrag_retrieval::{
    CompletionOrchestrator, CompletionSettings, Document, DocumentReader, DocumentStore, Embedding,
    EmbeddingEngine, EmbeddingProvider, MemoryDocumentStore, ModelLimits, Pipeline, QueryEvent,
    VectorKind, ERROR_MARKER, QUERY_ERROR_PREFIX,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Serves canned documents keyed by file name.
struct CannedReader {
    reads: AtomicUsize,
}

#[async_trait::async_trait]
impl DocumentReader for CannedReader {
    async fn read(&self, path: &Path) -> AppResult<Document> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let link = format!("file:///regs/{}", name);

        match name.as_str() {
            "gdc.pdf" => Ok(Document::new(name, link)
                .with_page(
                    1,
                    vec!["Containment isolation valves shall be provided with redundancy for each line penetrating containment.".to_string()],
                )
                .with_page(
                    2,
                    vec!["The emergency core cooling system shall transfer heat from the reactor core following any loss of reactor coolant.".to_string()],
                )),
            "fuel.pdf" => Ok(Document::new(name, link).with_page(
                1,
                vec!["Spent fuel pool cooling must remove decay heat from stored fuel assemblies.".to_string()],
            )),
            _ => Err(AppError::Document(format!("cannot read {}", name))),
        }
    }
}

/// Returns the prompt it was given.
struct PromptEcho;

#[async_trait::async_trait]
impl LlmClient for PromptEcho {
    fn provider_name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        Ok(LlmResponse {
            content: request.prompt.clone(),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

struct Unreachable;

#[async_trait::async_trait]
impl LlmClient for Unreachable {
    fn provider_name(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::BackendNetwork("connection refused".to_string()))
    }
}

/// Names documents by file name and fills them with the parent directory's
/// name.
struct DirectoryTagReader;

#[async_trait::async_trait]
impl DocumentReader for DirectoryTagReader {
    async fn read(&self, path: &Path) -> AppResult<Document> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let folder = path.parent().unwrap().file_name().unwrap().to_string_lossy().into_owned();
        let link = format!("file://{}", path.display());
        Ok(Document::new(name, link).with_page(1, vec![format!("Report filed under {}.", folder)]))
    }
}

/// Three-dimensional dense vectors, except item 1 of each batch, which
/// comes back one dimension short.
#[derive(Debug)]
struct ShortSecondVector;

#[async_trait::async_trait]
impl EmbeddingProvider for ShortSecondVector {
    fn provider_name(&self) -> &str {
        "short-second"
    }

    fn model_name(&self) -> &str {
        "short-second"
    }

    fn kind(&self) -> VectorKind {
        VectorKind::Dense { dimensions: 3 }
    }

    fn limits(&self) -> ModelLimits {
        ModelLimits {
            max_tokens: 64,
            recommended_chunk: 8,
            recommended_overlap: 2,
        }
    }

    async fn embed_normalized(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        Ok((0..texts.len())
            .map(|i| match i {
                1 => Embedding::Dense(vec![1.0, 0.0]),
                _ => Embedding::Dense(vec![1.0, 0.0, 0.0]),
            })
            .collect())
    }
}

struct Fixture {
    _dir: TempDir,
    files: Vec<PathBuf>,
    reader: Arc<CannedReader>,
    store: Arc<MemoryDocumentStore>,
    pipeline: Pipeline,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let files = vec![dir.path().join("gdc.pdf"), dir.path().join("fuel.pdf")];
    for file in &files {
        std::fs::write(file, b"%PDF-").unwrap();
    }

    let config = AppConfig::default();
    let orchestrator = CompletionOrchestrator::new(config.clone());
    orchestrator.register("echo", Arc::new(PromptEcho)).unwrap();
    orchestrator.register("down", Arc::new(Unreachable)).unwrap();

    let reader = Arc::new(CannedReader {
        reads: AtomicUsize::new(0),
    });
    let store = Arc::new(MemoryDocumentStore::new());
    let pipeline = Pipeline::new(
        Arc::new(EmbeddingEngine::new(config)),
        Arc::new(orchestrator),
        store.clone(),
    )
    .with_reader(reader.clone());

    Fixture {
        _dir: dir,
        files,
        reader,
        store,
        pipeline,
    }
}

fn settings(backend: &str) -> CompletionSettings<'_> {
    CompletionSettings {
        backend,
        temperature: 0.5,
        max_tokens: None,
    }
}

#[tokio::test]
async fn test_setup_builds_corpus_and_stores_documents() {
    let f = fixture();
    let (corpus, message) = f
        .pipeline
        .setup(&f.files, "trigram", "echo", Some(8), Some(2))
        .await
        .unwrap();

    assert_eq!(corpus.model(), "trigram");
    assert_eq!(corpus.document_count(), 2);
    assert!(corpus.len() >= 3);
    assert_eq!(
        message,
        format!(
            "Setup complete: embeddings generated for {} chunks from 2 documents.",
            corpus.len()
        )
    );

    // Chunk ids follow emission order.
    for (i, chunk) in corpus.chunks().enumerate() {
        assert_eq!(chunk.id, i);
    }
    assert_eq!(f.store.load_all().unwrap().len(), 2);
}

#[tokio::test]
async fn test_setup_validates_before_reading() {
    let f = fixture();

    let bad_overlap = f.pipeline.setup(&f.files, "trigram", "echo", Some(5), Some(5)).await;
    assert!(matches!(bad_overlap, Err(AppError::Config(_))));

    let bad_model = f.pipeline.setup(&f.files, "glove", "echo", None, None).await;
    assert!(matches!(bad_model, Err(AppError::Config(_))));

    let bad_backend = f.pipeline.setup(&f.files, "trigram", "gpt-9", None, None).await;
    assert!(matches!(bad_backend, Err(AppError::Config(_))));

    assert_eq!(f.reader.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_setup_aborts_on_unreadable_file() {
    let f = fixture();
    let broken = f.files[0].with_file_name("scan.pdf");
    std::fs::write(&broken, b"").unwrap();

    let result = f
        .pipeline
        .setup(&[broken], "trigram", "echo", None, None)
        .await;
    assert!(matches!(result, Err(AppError::Document(_))));
}

#[tokio::test]
async fn test_answer_cites_retrieved_chunks() {
    let f = fixture();
    let (corpus, _) = f
        .pipeline
        .setup(&f.files, "lexical", "echo", None, None)
        .await
        .unwrap();

    let answer = f
        .pipeline
        .answer("containment isolation valves", "lexical", 10.0, &corpus, settings("echo"))
        .await;

    assert!(answer.contains("> Containment isolation valves shall be provided"));
    assert!(answer.contains("- Chunk 0, Page 1: [file:///regs/gdc.pdf#page=1](file:///regs/gdc.pdf#page=1)"));
    assert!(!answer.contains("Spent fuel pool"));
}

#[tokio::test]
async fn test_answer_with_nothing_above_threshold_still_prompts() {
    let f = fixture();
    let (corpus, _) = f
        .pipeline
        .setup(&f.files, "lexical", "echo", None, None)
        .await
        .unwrap();

    let answer = f
        .pipeline
        .answer("tritium breeding blankets", "lexical", 99.0, &corpus, settings("echo"))
        .await;

    assert!(answer.contains("No relevant passages were retrieved"));
    assert!(answer.contains("tritium breeding blankets"));
}

#[tokio::test]
async fn test_failing_backend_answer_is_marked() {
    let f = fixture();
    let (corpus, _) = f
        .pipeline
        .setup(&f.files, "trigram", "down", None, None)
        .await
        .unwrap();

    let answer = f
        .pipeline
        .answer("decay heat", "trigram", 0.0, &corpus, settings("down"))
        .await;

    assert!(answer.starts_with(ERROR_MARKER));
    assert!(answer.contains("connection refused"));
}

#[tokio::test]
async fn test_model_mismatch_is_rejected() {
    let f = fixture();
    let (corpus, _) = f
        .pipeline
        .setup(&f.files, "trigram", "echo", None, None)
        .await
        .unwrap();

    let answer = f
        .pipeline
        .answer("decay heat", "lexical", 20.0, &corpus, settings("echo"))
        .await;

    assert!(answer.starts_with(QUERY_ERROR_PREFIX));
    assert!(answer.contains("run setup again"));
}

#[tokio::test]
async fn test_answer_events_sequence() {
    let f = fixture();
    let (corpus, _) = f
        .pipeline
        .setup(&f.files, "lexical", "echo", None, None)
        .await
        .unwrap();

    let events: Vec<QueryEvent> = f
        .pipeline
        .answer_events("spent fuel pool", "lexical", 10.0, &corpus, settings("echo"))
        .collect()
        .await;

    assert_eq!(events.len(), 5);
    assert_eq!(events[0], QueryEvent::status(STATUS_PROCESSING));
    assert_eq!(events[1], QueryEvent::status(STATUS_SEARCHING));
    assert_eq!(events[2], QueryEvent::status(STATUS_GENERATING));
    assert_eq!(events[3], QueryEvent::status(STATUS_COMPLETE));
    match &events[4] {
        QueryEvent::Answer(text) => assert!(text.contains("> Spent fuel pool cooling")),
        other => panic!("expected answer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_answer_events_on_error() {
    let f = fixture();
    let (corpus, _) = f
        .pipeline
        .setup(&f.files, "lexical", "echo", None, None)
        .await
        .unwrap();

    let events: Vec<QueryEvent> = f
        .pipeline
        .answer_events("   ", "lexical", 10.0, &corpus, settings("echo"))
        .collect()
        .await;

    assert_eq!(events.len(), 4);
    assert_eq!(events[2], QueryEvent::status(STATUS_ERROR));
    match &events[3] {
        QueryEvent::Answer(text) => assert!(text.starts_with(QUERY_ERROR_PREFIX)),
        other => panic!("expected answer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_exports_written_when_configured() {
    let f = fixture();
    let exports = TempDir::new().unwrap();
    let pipeline = f.pipeline.with_export_dir(Some(exports.path().to_path_buf()));

    let (corpus, _) = pipeline
        .setup(&f.files, "lexical", "echo", None, None)
        .await
        .unwrap();
    pipeline
        .answer("decay heat removal", "lexical", 0.0, &corpus, settings("echo"))
        .await;

    assert!(exports.path().join("corpus.csv").is_file());
    assert!(exports.path().join("ranked_decay_heat_remo.csv").is_file());

    // One score row per corpus chunk, whatever the threshold.
    let mut scores = csv::Reader::from_path(exports.path().join("scores_decay_heat_remo.csv")).unwrap();
    assert_eq!(scores.records().count(), corpus.len());
}

#[tokio::test]
async fn test_setup_rejects_two_files_with_the_same_name() {
    let f = fixture();
    let pipeline = f.pipeline.with_reader(Arc::new(DirectoryTagReader));
    let root = TempDir::new().unwrap();
    for folder in ["a", "b"] {
        std::fs::create_dir(root.path().join(folder)).unwrap();
        std::fs::write(root.path().join(folder).join("report.pdf"), b"%PDF-").unwrap();
    }

    let result = pipeline
        .setup(&[root.path().to_path_buf()], "lexical", "echo", None, None)
        .await;

    match result {
        Err(AppError::Document(message)) => {
            assert!(message.contains("report.pdf"));
            assert!(message.contains("rename"));
        }
        other => panic!("expected a document error, got {:?}", other.map(|(_, m)| m)),
    }
    assert_eq!(f.store.load_all().unwrap().len(), 1);
}

#[tokio::test]
async fn test_setup_reads_a_file_named_twice_once() {
    let f = fixture();
    let folder = f.files[0].parent().unwrap().to_path_buf();
    let (corpus, _) = f
        .pipeline
        .setup(
            &[f.files[0].clone(), folder],
            "lexical",
            "echo",
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(corpus.document_count(), 2);
    assert_eq!(f.reader.reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_setup_aborts_when_one_vector_is_malformed() {
    let f = fixture();
    f.pipeline
        .engine()
        .register("short-second", Arc::new(ShortSecondVector))
        .unwrap();

    let result = f
        .pipeline
        .setup(&f.files, "short-second", "echo", Some(8), Some(2))
        .await;

    match result {
        Err(AppError::Embedding(message)) => {
            assert!(message.contains("Item 1"), "{}", message);
            assert!(message.contains("expected 3 dimensions"), "{}", message);
        }
        other => panic!("expected an embedding error, got {:?}", other.map(|(_, m)| m)),
    }
}
