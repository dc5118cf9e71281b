//! CSV exports of the corpus, of per-query scores and of ranked results.
//!
//! Headers are written up front so an empty table still names its columns.

use crate::corpus::Corpus;
use crate::rank::RankedChunk;
use nucrag_core::{AppError, AppResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CORPUS_FILE: &str = "corpus.csv";

const CORPUS_HEADERS: [&str; 6] = ["chunk_id", "document", "page", "link", "chunk", "source_paragraph"];
const SCORED_HEADERS: [&str; 7] = [
    "chunk_id",
    "document",
    "page",
    "link",
    "chunk",
    "source_paragraph",
    "score",
];

#[derive(Debug, Serialize)]
struct CorpusRow<'a> {
    chunk_id: usize,
    document: &'a str,
    page: u32,
    link: &'a str,
    chunk: &'a str,
    source_paragraph: &'a str,
}

#[derive(Debug, Serialize)]
struct ScoredRow<'a> {
    chunk_id: usize,
    document: &'a str,
    page: u32,
    link: &'a str,
    chunk: &'a str,
    source_paragraph: &'a str,
    score: f32,
}

/// Write every corpus chunk to `<dir>/corpus.csv`.
pub fn export_corpus(corpus: &Corpus, dir: &Path) -> AppResult<PathBuf> {
    let path = dir.join(CORPUS_FILE);
    let mut writer = open_writer(&path, &CORPUS_HEADERS)?;

    for chunk in corpus.chunks() {
        writer
            .serialize(CorpusRow {
                chunk_id: chunk.id,
                document: &chunk.document,
                page: chunk.page,
                link: &chunk.link,
                chunk: &chunk.text,
                source_paragraph: &chunk.source_paragraph,
            })
            .map_err(csv_error)?;
    }

    writer.flush()?;
    tracing::info!("Exported {} chunks to {}", corpus.len(), path.display());
    Ok(path)
}

/// Write ranked results for `query` to `<dir>/ranked_<query prefix>.csv`.
pub fn export_ranked(ranked: &[RankedChunk<'_>], query: &str, dir: &Path) -> AppResult<PathBuf> {
    let path = dir.join(ranked_file_name(query));
    write_scored(&path, ranked)?;
    tracing::debug!("Exported {} ranked chunks to {}", ranked.len(), path.display());
    Ok(path)
}

/// Write the score of every corpus chunk for `query`, unfiltered and in
/// corpus order, to `<dir>/scores_<query prefix>.csv`.
pub fn export_scores(scores: &[RankedChunk<'_>], query: &str, dir: &Path) -> AppResult<PathBuf> {
    let path = dir.join(scores_file_name(query));
    write_scored(&path, scores)?;
    tracing::debug!("Exported {} chunk scores to {}", scores.len(), path.display());
    Ok(path)
}

fn write_scored(path: &Path, rows: &[RankedChunk<'_>]) -> AppResult<()> {
    let mut writer = open_writer(path, &SCORED_HEADERS)?;

    for result in rows {
        let chunk = result.chunk;
        writer
            .serialize(ScoredRow {
                chunk_id: chunk.id,
                document: &chunk.document,
                page: chunk.page,
                link: &chunk.link,
                chunk: &chunk.text,
                source_paragraph: &chunk.source_paragraph,
                score: result.score,
            })
            .map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

/// File name for a ranked export: the first 15 characters of the query,
/// trimmed, spaces turned into underscores, other unsafe characters dropped.
pub fn ranked_file_name(query: &str) -> String {
    format!("ranked_{}.csv", query_stem(query))
}

/// File name for a score export, named like the ranked export.
pub fn scores_file_name(query: &str) -> String {
    format!("scores_{}.csv", query_stem(query))
}

fn query_stem(query: &str) -> String {
    let prefix: String = query.chars().take(15).collect();
    let stem: String = prefix
        .trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect();

    if stem.is_empty() {
        "query".to_string()
    } else {
        stem
    }
}

fn open_writer(path: &Path, headers: &[&str]) -> AppResult<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error)?;
    writer.write_record(headers).map_err(csv_error)?;
    Ok(writer)
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::Serialization(format!("CSV export failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunk;
    use crate::embeddings::{Embedding, VectorKind};
    use tempfile::TempDir;

    fn corpus() -> Corpus {
        let chunk = Chunk {
            id: 0,
            text: "isolation valves, redundant".to_string(),
            source_paragraph: "Containment \"isolation\" valves, redundant.".to_string(),
            page: 4,
            link: "file:///docs/gdc.pdf#page=4".to_string(),
            document: "gdc.pdf".to_string(),
        };
        Corpus::new(
            "trigram",
            VectorKind::Dense { dimensions: 1 },
            vec![chunk],
            vec![Embedding::Dense(vec![1.0])],
        )
        .unwrap()
    }

    #[test]
    fn test_ranked_file_name() {
        assert_eq!(ranked_file_name("What is GDC 55 about?"), "ranked_What_is_GDC_55.csv");
        assert_eq!(ranked_file_name("  a/b\\c  "), "ranked_abc.csv");
        assert_eq!(ranked_file_name("???"), "ranked_query.csv");
    }

    #[test]
    fn test_export_corpus_round_trips_through_csv() {
        let temp = TempDir::new().unwrap();
        let path = export_corpus(&corpus(), &temp.path().join("exports")).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["chunk_id", "document", "page", "link", "chunk", "source_paragraph"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][3], "file:///docs/gdc.pdf#page=4");
        assert_eq!(&rows[0][5], "Containment \"isolation\" valves, redundant.");
    }

    #[test]
    fn test_export_ranked_includes_score() {
        let temp = TempDir::new().unwrap();
        let corpus = corpus();
        let ranked = vec![RankedChunk {
            chunk: &corpus.entries()[0].chunk,
            score: 0.75,
        }];

        let path = export_ranked(&ranked, "isolation valves", temp.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "ranked_isolation_valve.csv");

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().get(6), Some("score"));
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[6], "0.75");
    }

    #[test]
    fn test_empty_ranking_still_has_header() {
        let temp = TempDir::new().unwrap();
        let path = export_ranked(&[], "tritium breeding", temp.path()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 7);
        assert_eq!(reader.records().count(), 0);
    }

    #[test]
    fn test_export_scores_lists_every_chunk() {
        let temp = TempDir::new().unwrap();
        let corpus = corpus();
        let scores = vec![RankedChunk {
            chunk: &corpus.entries()[0].chunk,
            score: -0.25,
        }];

        let path = export_scores(&scores, "isolation valves", temp.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "scores_isolation_valve.csv");

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().get(6), Some("score"));
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][6], "-0.25");
    }
}
