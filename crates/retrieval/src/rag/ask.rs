//! Cited answer generation over ranked chunks.

use crate::rag::orchestrator::CompletionOrchestrator;
use crate::rank::RankedChunk;
use nucrag_core::AppResult;
use nucrag_prompt::{assemble, ContextPassage};

/// Convert ranked chunks to prompt passages, keeping rank order.
pub fn to_passages(ranked: &[RankedChunk<'_>]) -> Vec<ContextPassage> {
    ranked
        .iter()
        .map(|r| ContextPassage {
            chunk_id: r.chunk.id,
            page: r.chunk.page,
            link: r.chunk.link.clone(),
            source_paragraph: r.chunk.source_paragraph.clone(),
        })
        .collect()
}

/// Assemble the cited prompt and run the completion.
///
/// Prompt rendering failures are errors; backend failures come back as
/// answer text starting with `ERROR_MARKER`.
pub async fn generate_answer(
    orchestrator: &CompletionOrchestrator,
    query: &str,
    ranked: &[RankedChunk<'_>],
    backend: &str,
    temperature: f32,
    max_tokens: Option<u32>,
) -> AppResult<String> {
    let prompt = assemble(query, &to_passages(ranked))?;

    tracing::debug!(
        "Generating answer with backend '{}' from {} cited chunks",
        backend,
        prompt.citations.len()
    );

    Ok(orchestrator
        .complete(&prompt.system, &prompt.user, backend, temperature, max_tokens)
        .await)
}
