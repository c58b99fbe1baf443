//! Tracing setup.
//!
//! The console owns the terminal, so interactive runs log to a daily rolling
//! file under `$PAMDASH_HOME/logs`. One-shot commands log to stderr.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "PAMDASH_LOG";

const DEFAULT_FILTER: &str = "info";

/// Builds the filter: `PAMDASH_LOG` wins, then the config directive, then `info`.
pub fn build_filter(configured: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return filter;
    }
    configured
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Initializes file logging.
///
/// Returns a guard that must be held for the lifetime of the application
/// so buffered lines are flushed on exit.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_file_logging(log_dir: &Path, configured: Option<&str>) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "pamdash.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(build_filter(configured))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(log_dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}

/// Initializes stderr logging for non-interactive commands.
///
/// Silently keeps an existing subscriber (tests may install their own).
pub fn init_stderr_logging(configured: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(configured))
        .with_writer(std::io::stderr)
        .try_init();
}
