//! Logging setup.
//!
//! Installs a tracing subscriber that writes to stderr, so stdout carries only
//! answers, status lines and exported data.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Filter used when neither a level override nor `RUST_LOG` is present.
///
/// Dependencies stay at `warn` so HTTP and SQLite internals do not drown the
/// pipeline's own events.
pub const DEFAULT_FILTER: &str = "warn,nucrag=info,nucrag_core=info,nucrag_llm=info,nucrag_prompt=info,nucrag_retrieval=info";

/// Build the filter directive from an optional override.
///
/// A bare level such as `debug` applies to the nucrag crates only; anything
/// containing `=` or `,` is treated as a full directive and passed through.
pub fn filter_directive(log_level: Option<&str>) -> String {
    match log_level.map(str::trim).filter(|l| !l.is_empty()) {
        None => std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
        Some(level) if level.contains('=') || level.contains(',') => level.to_string(),
        Some(level) => format!(
            "warn,nucrag={level},nucrag_core={level},nucrag_llm={level},nucrag_prompt={level},nucrag_retrieval={level}"
        ),
    }
}

/// Initialize the tracing subscriber with stderr output.
///
/// # Arguments
/// * `log_level` - Optional level or directive override (e.g. "debug")
/// * `no_color` - Disable ANSI colors
///
/// # Example
/// ```no_run
/// use nucrag_core::logging::init_logging;
///
/// init_logging(None, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let directive = filter_directive(log_level);

    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", directive, e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

fn supports_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}
