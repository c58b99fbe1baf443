//! Terminal lifecycle management.
//!
//! Terminal state is restored on:
//! - Normal exit (via `TerminalGuard` drop)
//! - Panic (via the hook from `install_panic_hook`)

use std::io::{self, Stdout};
use std::panic;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type ConsoleTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Owns the terminal while the console runs and restores it on drop.
pub struct TerminalGuard {
    terminal: ConsoleTerminal,
}

impl TerminalGuard {
    /// Enables raw mode, enters the alternate screen and turns on mouse
    /// capture so sidebar and form rows are clickable.
    ///
    /// Call `install_panic_hook()` first so a panic cannot leave the terminal raw.
    ///
    /// # Errors
    /// Returns an error if any terminal mode cannot be set.
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide) {
            let _ = restore_terminal();
            return Err(err).context("Failed to enter alternate screen");
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("Failed to create terminal")?;
        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut ConsoleTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = restore_terminal() {
            tracing::warn!(error = %err, "failed to restore terminal");
        }
    }
}

/// Restores terminal state.
///
/// Idempotent: mouse capture and the alternate screen are left even if they
/// were never entered.
///
/// # Errors
/// Returns an error if raw mode cannot be disabled.
pub fn restore_terminal() -> Result<()> {
    // Mouse capture must go before raw mode is left.
    let _ = execute!(io::stdout(), DisableMouseCapture, Show);
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before printing the panic.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}
