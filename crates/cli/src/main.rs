//! nucrag CLI
//!
//! Main entry point for the nucrag command-line tool.
//! Builds a searchable corpus from PDF documents and answers questions
//! over it with cited passages.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, ModelsCommand, SetupCommand};
use nucrag_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// nucrag - question answering over nuclear regulatory documents
#[derive(Parser, Debug)]
#[command(name = "nucrag")]
#[command(about = "Question answering over PDF documents with cited sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NUCRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NUCRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Embedding model (see `nucrag models`)
    #[arg(short, long, global = true, env = "NUCRAG_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Completion backend (see `nucrag models`)
    #[arg(short = 'b', long, global = true, env = "NUCRAG_LLM_BACKEND")]
    llm_backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read, chunk and embed documents
    Setup(SetupCommand),

    /// Answer one question over the given documents
    Ask(AskCommand),

    /// Answer questions from stdin until EOF
    Chat(ChatCommand),

    /// List embedding models and completion backends
    Models(ModelsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.embedding_model,
        cli.llm_backend,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("nucrag starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Embedding model: {}", config.retrieval.embedding_model);
    tracing::debug!("Completion backend: {}", config.completion.backend);

    let command_name = match &cli.command {
        Commands::Setup(_) => "setup",
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Models(_) => "models",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Setup(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Models(cmd) => cmd.execute(),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
