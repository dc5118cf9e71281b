//! Command handlers for the nucrag CLI.
//!
//! Each command lives in its own submodule; the argument groups and the
//! pipeline wiring they share are defined here.

pub mod ask;
pub mod chat;
pub mod models;
pub mod setup;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use models::ModelsCommand;
pub use setup::SetupCommand;

use clap::Args;
use nucrag_core::{config::AppConfig, AppResult};
use nucrag_retrieval::{CompletionSettings, Corpus, Pipeline, ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Documents to build the corpus from.
#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// PDF files or directories containing PDFs
    #[arg(short, long = "file", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Words per chunk (default: the embedding model's recommendation)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Words shared by consecutive chunks (default: the model's recommendation)
    #[arg(long)]
    pub overlap: Option<usize>,
}

/// Retrieval and completion settings for a question.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Minimum similarity in percent (0-100)
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Sampling temperature (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens in the answer (default: the backend's recommendation)
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

impl QueryArgs {
    pub fn threshold_percent(&self, config: &AppConfig) -> f32 {
        self.threshold.unwrap_or(config.retrieval.threshold_percent)
    }

    pub fn completion<'a>(&self, config: &'a AppConfig) -> CompletionSettings<'a> {
        CompletionSettings {
            backend: &config.completion.backend,
            temperature: self.temperature.unwrap_or(config.completion.temperature),
            max_tokens: self.max_tokens.or(config.completion.max_tokens),
        }
    }
}

/// Build the pipeline from config, reporting setup progress on stderr.
pub fn build_pipeline(config: &AppConfig, show_progress: bool) -> AppResult<Pipeline> {
    config.ensure_state_dir()?;

    let pipeline = Pipeline::from_config(config)?;
    if !show_progress {
        return Ok(pipeline);
    }

    let reporter = ProgressReporter::new(Arc::new(|event: ProgressEvent| {
        eprintln!("{}", event);
    }));
    Ok(pipeline.with_progress(reporter))
}

/// Run setup for `args`, falling back to configured chunk settings.
pub async fn build_corpus(
    pipeline: &Pipeline,
    config: &AppConfig,
    args: &CorpusArgs,
) -> AppResult<(Corpus, String)> {
    pipeline
        .setup(
            &args.files,
            &config.retrieval.embedding_model,
            &config.completion.backend,
            args.chunk_size.or(config.retrieval.chunk_size),
            args.overlap.or(config.retrieval.overlap),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_args_fall_back_to_config() {
        let config = AppConfig::default();
        let args = QueryArgs::default();

        assert_eq!(args.threshold_percent(&config), config.retrieval.threshold_percent);
        let completion = args.completion(&config);
        assert_eq!(completion.backend, config.completion.backend);
        assert_eq!(completion.temperature, config.completion.temperature);
    }

    #[test]
    fn test_query_args_override_config() {
        let config = AppConfig::default();
        let args = QueryArgs {
            threshold: Some(35.0),
            temperature: Some(0.1),
            max_tokens: Some(512),
        };

        assert_eq!(args.threshold_percent(&config), 35.0);
        let completion = args.completion(&config);
        assert_eq!(completion.temperature, 0.1);
        assert_eq!(completion.max_tokens, Some(512));
    }
}
