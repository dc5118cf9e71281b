//! Models command handler.

use clap::Args;
use nucrag_core::AppResult;
use nucrag_llm::BACKENDS;
use nucrag_retrieval::embeddings::EMBEDDING_MODELS;

/// List embedding models and completion backends
#[derive(Args, Debug)]
pub struct ModelsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ModelsCommand {
    pub fn execute(&self) -> AppResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&catalog_json())?);
            return Ok(());
        }

        println!("Embedding models:");
        for model in EMBEDDING_MODELS {
            println!(
                "  {:<26} {:<12} chunk {:>4}, overlap {:>3}, max {} tokens",
                model.name,
                model.kind.to_string(),
                model.limits.recommended_chunk,
                model.limits.recommended_overlap,
                model.limits.max_tokens
            );
        }

        println!();
        println!("Completion backends:");
        for backend in BACKENDS {
            println!(
                "  {:<26} {:<12} {} tokens (max {})",
                backend.name,
                backend.provider.as_str(),
                backend.recommended_max_tokens,
                backend.max_tokens
            );
        }

        Ok(())
    }
}

fn catalog_json() -> serde_json::Value {
    let models: Vec<_> = EMBEDDING_MODELS
        .iter()
        .map(|m| {
            serde_json::json!({
                "name": m.name,
                "vectorKind": m.kind.to_string(),
                "maxTokens": m.limits.max_tokens,
                "recommendedChunkSize": m.limits.recommended_chunk,
                "recommendedOverlap": m.limits.recommended_overlap,
            })
        })
        .collect();

    let backends: Vec<_> = BACKENDS
        .iter()
        .map(|b| {
            serde_json::json!({
                "name": b.name,
                "provider": b.provider.as_str(),
                "maxTokens": b.max_tokens,
                "recommendedMaxTokens": b.recommended_max_tokens,
            })
        })
        .collect();

    serde_json::json!({ "embeddingModels": models, "backends": backends })
}
