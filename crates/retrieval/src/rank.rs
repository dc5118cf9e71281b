//! Similarity scoring and threshold ranking.

use crate::chunker::Chunk;
use crate::corpus::Corpus;
use crate::embeddings::Embedding;
use nucrag_core::{AppError, AppResult};
use std::collections::BTreeMap;

/// A corpus chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

/// Cosine similarity of two dense vectors; 0 when either has zero norm.
///
/// # Errors
/// `AppError::Config` when the lengths differ.
pub fn cosine(a: &[f32], b: &[f32]) -> AppResult<f32> {
    if a.len() != b.len() {
        return Err(AppError::Config(format!(
            "Cannot compare vectors of {} and {} dimensions",
            a.len(),
            b.len()
        )));
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Cosine similarity of two sparse vectors over the union of their features.
pub fn sparse_cosine(a: &BTreeMap<String, f32>, b: &BTreeMap<String, f32>) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f32 = small
        .iter()
        .filter_map(|(feature, x)| large.get(feature).map(|y| x * y))
        .sum();
    let norm_a: f32 = a.values().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.values().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Score two vectors of the same kind.
///
/// # Errors
/// `AppError::Config` for a dense/sparse mix or mismatched dense lengths.
pub fn similarity(a: &Embedding, b: &Embedding) -> AppResult<f32> {
    match (a, b) {
        (Embedding::Dense(a), Embedding::Dense(b)) => cosine(a, b),
        (Embedding::Sparse(a), Embedding::Sparse(b)) => Ok(sparse_cosine(a, b)),
        _ => Err(AppError::Config(format!(
            "Cannot compare a {} vector with a {} vector",
            a.kind(),
            b.kind()
        ))),
    }
}

/// Map the user's "top n %" control to an absolute score cutoff in [0, 1].
pub fn threshold_from_percent(percent: f32) -> f32 {
    (percent / 100.0).clamp(0.0, 1.0)
}

/// Score every corpus chunk against the query, in corpus order.
pub fn score_all<'a>(corpus: &'a Corpus, query: &Embedding) -> AppResult<Vec<RankedChunk<'a>>> {
    corpus
        .entries()
        .iter()
        .map(|entry| {
            Ok(RankedChunk {
                chunk: &entry.chunk,
                score: similarity(query, &entry.embedding)?,
            })
        })
        .collect()
}

/// Keep scores at or above `threshold`, sorted descending. Ties keep corpus
/// order.
pub fn select(mut scores: Vec<RankedChunk<'_>>, threshold: f32) -> Vec<RankedChunk<'_>> {
    let total = scores.len();
    scores.retain(|r| r.score >= threshold);

    // Stable sort keeps corpus order among equal scores
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    tracing::debug!(
        "Ranked {} of {} chunks at threshold {:.2} (top score: {:.3})",
        scores.len(),
        total,
        threshold,
        scores.first().map(|r| r.score).unwrap_or(0.0)
    );

    scores
}

/// Score every corpus chunk against the query, keep scores at or above
/// `threshold`, and sort descending. Ties keep corpus order.
pub fn rank<'a>(corpus: &'a Corpus, query: &Embedding, threshold: f32) -> AppResult<Vec<RankedChunk<'a>>> {
    Ok(select(score_all(corpus, query)?, threshold))
}
