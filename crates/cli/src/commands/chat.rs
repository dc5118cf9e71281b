//! Chat command handler.
//!
//! Builds the corpus once, then answers one question per stdin line.

use super::ask::stream_answer;
use super::{build_corpus, build_pipeline, CorpusArgs, QueryArgs};
use clap::Args;
use nucrag_core::{config::AppConfig, AppResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Answer questions from stdin until EOF or `exit`
#[derive(Args, Debug)]
pub struct ChatCommand {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Do not print status updates
    #[arg(short, long)]
    pub quiet: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let pipeline = build_pipeline(config, !self.quiet)?;
        let (corpus, message) = build_corpus(&pipeline, config, &self.corpus).await?;
        eprintln!("{}", message);
        eprintln!("Ask a question, or type 'exit' to quit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        let mut asked = 0usize;

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if is_exit(question) {
                break;
            }

            let answer =
                stream_answer(&pipeline, config, &corpus, question, &self.query, !self.quiet).await;
            stdout.write_all(format!("{}\n\n", answer).as_bytes()).await?;
            asked += 1;
        }

        tracing::info!("Chat ended after {} questions", asked);
        Ok(())
    }
}

fn is_exit(line: &str) -> bool {
    matches!(line.to_ascii_lowercase().as_str(), "exit" | "quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(!is_exit("exit criteria for GDC 55"));
    }
}
