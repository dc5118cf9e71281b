//! Ask command handler.
//!
//! Builds a corpus from the given documents and answers one question,
//! streaming status updates to stderr and the answer to stdout.

use super::{build_corpus, build_pipeline, CorpusArgs, QueryArgs};
use clap::Args;
use futures::StreamExt;
use nucrag_core::{config::AppConfig, AppError, AppResult};
use nucrag_retrieval::{Corpus, Pipeline, QueryEvent};
use std::path::PathBuf;

/// Answer one question over the given documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(long, conflicts_with = "question")]
    pub question_file: Option<PathBuf>,

    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Do not print status updates
    #[arg(short, long)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self.get_question()?;
        let interactive = !self.quiet && !self.json;

        let pipeline = build_pipeline(config, interactive)?;
        let (corpus, message) = build_corpus(&pipeline, config, &self.corpus).await?;
        if interactive {
            eprintln!("{}", message);
        }

        let answer = stream_answer(&pipeline, config, &corpus, &question, &self.query, interactive).await;

        if self.json {
            let output = serde_json::json!({
                "question": question,
                "answer": answer,
                "embeddingModel": corpus.model(),
                "backend": config.completion.backend,
                "thresholdPercent": self.query.threshold_percent(config),
                "chunksCount": corpus.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer);
        }

        Ok(())
    }

    fn get_question(&self) -> AppResult<String> {
        let question = match (&self.question, &self.question_file) {
            (Some(q), _) => q.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => {
                return Err(AppError::Config("No question provided".to_string()));
            }
        };

        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(AppError::Config("The question is empty".to_string()));
        }
        Ok(question)
    }
}

/// Run one query, echoing status events to stderr when `show_status` is set.
///
/// Returns the final answer text, which may itself be an error message.
pub async fn stream_answer(
    pipeline: &Pipeline,
    config: &AppConfig,
    corpus: &Corpus,
    question: &str,
    query: &QueryArgs,
    show_status: bool,
) -> String {
    let events = pipeline.answer_events(
        question,
        &config.retrieval.embedding_model,
        query.threshold_percent(config),
        corpus,
        query.completion(config),
    );
    futures::pin_mut!(events);

    let mut answer = String::new();
    while let Some(event) = events.next().await {
        match event {
            QueryEvent::Status(status) => {
                tracing::debug!("Query status: {}", status);
                if show_status {
                    eprintln!("{}", status);
                }
            }
            QueryEvent::Answer(text) => answer = text,
        }
    }
    answer
}
