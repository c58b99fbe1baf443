//! Full-screen monitoring console for pamdash.

pub mod bindings;
pub mod common;
pub mod effects;
pub mod events;
pub mod overlays;
pub mod render;
pub mod runtime;
pub mod settings_form;
pub mod state;
pub mod sync;
pub mod terminal;
pub mod toasts;
pub mod update;
pub mod view;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
use pamdash_core::config::Config;
pub use runtime::ConsoleRuntime;
pub use state::{Page, Route};

/// Runs the interactive console until the user quits.
///
/// # Errors
/// Returns an error if stderr is not a terminal, the service URL is invalid,
/// or the terminal fails.
pub async fn run_console(config: Config, route: Route) -> Result<()> {
    // The console draws to the terminal; refuse to scribble over a pipe
    if !stderr().is_terminal() {
        anyhow::bail!(
            "The console requires a terminal.\n\
             Use `pamdash snapshot` for non-interactive output."
        );
    }

    let mut err = stderr();
    writeln!(err, "pamdash")?;
    writeln!(err, "Server: {}", config.server_url)?;
    writeln!(err, "Refresh: every {}s", config.refresh_interval_secs)?;
    err.flush()?;

    let mut runtime = ConsoleRuntime::new(config, route)?;
    runtime.run()
}
