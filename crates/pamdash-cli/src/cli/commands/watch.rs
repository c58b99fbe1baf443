//! Watch command handler (the live console).

use anyhow::{Context, Result};
use pamdash_core::config::{Config, paths};
use pamdash_core::logging;
use pamdash_tui::Route;

pub async fn run(config: Config, page: &str) -> Result<()> {
    // The console owns the terminal; keep the guard alive until it exits.
    let _log_guard = logging::init_file_logging(&paths::logs_dir(), config.log_filter.as_deref())?;

    let route = Route::parse(page);
    if let Route::NotFound(name) = &route {
        tracing::warn!(page = %name, "unknown start page");
    }

    pamdash_tui::run_console(config, route)
        .await
        .context("console failed")
}
