//! Setup command handler.

use super::{build_corpus, build_pipeline, CorpusArgs};
use clap::Args;
use nucrag_core::{config::AppConfig, AppResult};

/// Read, chunk and embed documents
#[derive(Args, Debug)]
pub struct SetupCommand {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SetupCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing setup command for {} paths", self.corpus.files.len());

        let pipeline = build_pipeline(config, !self.json)?;
        let (corpus, message) = build_corpus(&pipeline, config, &self.corpus).await?;

        if self.json {
            let output = serde_json::json!({
                "message": message,
                "embeddingModel": corpus.model(),
                "vectorKind": corpus.kind().to_string(),
                "chunksCount": corpus.len(),
                "documentsCount": corpus.document_count(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", message);
        }

        Ok(())
    }
}
