//! Setup and query operations over a corpus of PDF documents.

use crate::chunker::{chunk_documents, ChunkConfig};
use crate::corpus::Corpus;
use crate::document::{Document, DocumentReader, PdfReader};
use crate::embeddings::EmbeddingEngine;
use crate::export::{export_corpus, export_ranked, export_scores};
use crate::progress::{
    ProgressReporter, QueryEvent, SetupStep, STATUS_COMPLETE, STATUS_ERROR, STATUS_GENERATING,
    STATUS_PROCESSING, STATUS_SEARCHING,
};
use crate::rag::{generate_answer, CompletionOrchestrator};
use crate::rank::{score_all, select, threshold_from_percent, RankedChunk};
use crate::store::{DocumentStore, SqliteDocumentStore};
use futures::Stream;
use nucrag_core::{AppConfig, AppError, AppResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use walkdir::WalkDir;

/// Prefix of answers for queries that failed before completion.
pub const QUERY_ERROR_PREFIX: &str = "Error processing question:";

/// Completion settings for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionSettings<'a> {
    pub backend: &'a str,
    pub temperature: f32,
    /// Catalog recommendation when `None`
    pub max_tokens: Option<u32>,
}

/// Wires reader, store, embedding engine and completion orchestrator into
/// the setup and query operations.
pub struct Pipeline {
    engine: Arc<EmbeddingEngine>,
    orchestrator: Arc<CompletionOrchestrator>,
    store: Arc<dyn DocumentStore>,
    reader: Arc<dyn DocumentReader>,
    progress: ProgressReporter,
    export_dir: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(
        engine: Arc<EmbeddingEngine>,
        orchestrator: Arc<CompletionOrchestrator>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            engine,
            orchestrator,
            store,
            reader: Arc::new(PdfReader),
            progress: ProgressReporter::noop(),
            export_dir: None,
        }
    }

    /// Build the default pipeline: SQLite store under the state directory,
    /// PDF reader, exports where configured.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        let store = SqliteDocumentStore::open(&config.store_path())?;

        Ok(Self::new(
            Arc::new(EmbeddingEngine::new(config.clone())),
            Arc::new(CompletionOrchestrator::new(config.clone())),
            Arc::new(store),
        )
        .with_export_dir(config.export_dir()))
    }

    pub fn with_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_export_dir(mut self, export_dir: Option<PathBuf>) -> Self {
        self.export_dir = export_dir;
        self
    }

    pub fn engine(&self) -> &EmbeddingEngine {
        &self.engine
    }

    pub fn orchestrator(&self) -> &CompletionOrchestrator {
        &self.orchestrator
    }

    /// Read, store, chunk and embed `files`, returning the new corpus and a
    /// status message.
    ///
    /// Model, backend and chunk settings are checked before any file is
    /// read. Chunk settings default to the model's recommendation.
    /// Directories are searched for PDFs. Any failure aborts the run; no
    /// partial corpus is returned.
    #[instrument(skip_all, fields(files = files.len(), model = embedding_model))]
    pub async fn setup(
        &self,
        files: &[PathBuf],
        embedding_model: &str,
        llm_backend: &str,
        chunk_size: Option<usize>,
        overlap: Option<usize>,
    ) -> AppResult<(Corpus, String)> {
        let provider = self.engine.provider(embedding_model)?;
        self.orchestrator.validate_backend(llm_backend)?;

        let limits = provider.limits();
        let chunk_config = ChunkConfig::new(
            chunk_size.unwrap_or(limits.recommended_chunk),
            overlap.unwrap_or(limits.recommended_overlap),
        )?;

        let paths = collect_pdfs(files)?;
        tracing::info!(
            "Setting up {} files with {} (chunk size {}, overlap {})",
            paths.len(),
            embedding_model,
            chunk_config.chunk_size,
            chunk_config.overlap
        );

        let mut sources: Vec<(String, &PathBuf)> = Vec::with_capacity(paths.len());
        for (i, path) in paths.iter().enumerate() {
            self.progress.report(SetupStep::Reading {
                index: i + 1,
                total: paths.len(),
                path: path.clone(),
            });
            let document = self.reader.read(path).await?;

            // The store is keyed by filename; a second file with the same
            // name would replace the first.
            if let Some((_, first)) = sources.iter().find(|(name, _)| *name == document.filename) {
                return Err(AppError::Document(format!(
                    "{} and {} are both named '{}'; rename one of them",
                    first.display(),
                    path.display(),
                    document.filename
                )));
            }

            self.store.save(&document)?;
            sources.push((document.filename, path));
        }

        let filenames: Vec<String> = sources.into_iter().map(|(name, _)| name).collect();
        let documents = self.reload(&filenames)?;
        let chunks = chunk_documents(&documents, &chunk_config)?;
        self.progress.report(SetupStep::Chunked {
            documents: documents.len(),
            chunks: chunks.len(),
        });

        let embeddings = self.engine.embed_chunks(embedding_model, &chunks).await?;
        self.progress.report(SetupStep::Embedded {
            chunks: embeddings.len(),
            model: embedding_model.to_string(),
        });

        let corpus = Corpus::new(embedding_model, provider.kind(), chunks, embeddings)?;

        if let Some(dir) = &self.export_dir {
            match export_corpus(&corpus, dir) {
                Ok(path) => self.progress.report(SetupStep::Exported { path }),
                Err(e) => tracing::warn!("Corpus export failed: {}", e),
            }
        }

        let message = format!(
            "Setup complete: embeddings generated for {} chunks from {} documents.",
            corpus.len(),
            corpus.document_count()
        );
        tracing::info!("{}", message);

        Ok((corpus, message))
    }

    fn reload(&self, filenames: &[String]) -> AppResult<Vec<Document>> {
        filenames
            .iter()
            .map(|name| {
                self.store.load(name)?.ok_or_else(|| {
                    AppError::Document(format!("{} missing from the document store", name))
                })
            })
            .collect()
    }

    /// Answer a question over `corpus`.
    ///
    /// Never fails: retrieval errors become `"Error processing question: ..."`
    /// and completion errors `"Error: ..."`.
    pub async fn answer(
        &self,
        query: &str,
        embedding_model: &str,
        threshold_percent: f32,
        corpus: &Corpus,
        completion: CompletionSettings<'_>,
    ) -> String {
        self.try_answer(query, embedding_model, threshold_percent, corpus, completion)
            .await
            .unwrap_or_else(|e| query_error(&e))
    }

    async fn try_answer(
        &self,
        query: &str,
        embedding_model: &str,
        threshold_percent: f32,
        corpus: &Corpus,
        completion: CompletionSettings<'_>,
    ) -> AppResult<String> {
        let ranked = self
            .retrieve(query, embedding_model, threshold_percent, corpus)
            .await?;
        self.generate(query, &ranked, completion).await
    }

    /// Answer a question as a stream of status updates ending in the answer.
    ///
    /// The stream is lazy and finite: nothing runs until it is polled, and
    /// the last item is always `QueryEvent::Answer`.
    pub fn answer_events<'a>(
        &'a self,
        query: &'a str,
        embedding_model: &'a str,
        threshold_percent: f32,
        corpus: &'a Corpus,
        completion: CompletionSettings<'a>,
    ) -> impl Stream<Item = QueryEvent> + 'a {
        async_stream::stream! {
            yield QueryEvent::status(STATUS_PROCESSING);
            yield QueryEvent::status(STATUS_SEARCHING);

            let ranked = match self.retrieve(query, embedding_model, threshold_percent, corpus).await {
                Ok(ranked) => ranked,
                Err(e) => {
                    yield QueryEvent::status(STATUS_ERROR);
                    yield QueryEvent::Answer(query_error(&e));
                    return;
                }
            };

            yield QueryEvent::status(STATUS_GENERATING);

            match self.generate(query, &ranked, completion).await {
                Ok(answer) => {
                    yield QueryEvent::status(STATUS_COMPLETE);
                    yield QueryEvent::Answer(answer);
                }
                Err(e) => {
                    yield QueryEvent::status(STATUS_ERROR);
                    yield QueryEvent::Answer(query_error(&e));
                }
            }
        }
    }

    #[instrument(skip_all, fields(model = embedding_model, threshold_percent = threshold_percent))]
    async fn retrieve<'c>(
        &self,
        query: &str,
        embedding_model: &str,
        threshold_percent: f32,
        corpus: &'c Corpus,
    ) -> AppResult<Vec<RankedChunk<'c>>> {
        if query.trim().is_empty() {
            return Err(AppError::Config("the question is empty".to_string()));
        }
        if embedding_model != corpus.model() {
            return Err(AppError::Config(format!(
                "corpus was embedded with '{}' but the query uses '{}'; run setup again",
                corpus.model(),
                embedding_model
            )));
        }

        let query_embedding = self.engine.embed_query(embedding_model, query).await?;
        let scores = score_all(corpus, &query_embedding)?;

        if let Some(dir) = &self.export_dir {
            if let Err(e) = export_scores(&scores, query, dir) {
                tracing::warn!("Score export failed: {}", e);
            }
        }

        let ranked = select(scores, threshold_from_percent(threshold_percent));
        tracing::info!("Retrieved {} chunks for the question", ranked.len());

        if let Some(dir) = &self.export_dir {
            if let Err(e) = export_ranked(&ranked, query, dir) {
                tracing::warn!("Ranked export failed: {}", e);
            }
        }

        Ok(ranked)
    }

    async fn generate(
        &self,
        query: &str,
        ranked: &[RankedChunk<'_>],
        completion: CompletionSettings<'_>,
    ) -> AppResult<String> {
        generate_answer(
            &self.orchestrator,
            query,
            ranked,
            completion.backend,
            completion.temperature,
            completion.max_tokens,
        )
        .await
    }
}

fn query_error(error: &AppError) -> String {
    tracing::error!("Query failed: {}", error);
    format!("{} {}", QUERY_ERROR_PREFIX, error)
}

/// Expand `files` into PDF paths: files are taken as given, directories are
/// searched recursively for `.pdf` files in name order.
pub fn collect_pdfs(files: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    if files.is_empty() {
        return Err(AppError::Config("no documents given".to_string()));
    }

    let mut paths = Vec::new();

    for file in files {
        if file.is_dir() {
            let before = paths.len();
            for entry in WalkDir::new(file)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() && is_pdf(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
            if paths.len() == before {
                tracing::warn!("No PDF files found under {}", file.display());
            }
        } else if file.is_file() {
            paths.push(file.clone());
        } else {
            return Err(AppError::Document(format!("{} does not exist", file.display())));
        }
    }

    if paths.is_empty() {
        return Err(AppError::Document("no PDF files found".to_string()));
    }

    // A file named directly and again through its directory is read once.
    let mut seen = HashSet::new();
    paths.retain(|path| seen.insert(path.clone()));

    Ok(paths)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
