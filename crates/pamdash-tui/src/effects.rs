//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only (no direct UI mutations).
//!
//! ## Timer Effects
//!
//! The reducer owns the poll timer's cancellation token and generation (see
//! `Store::replace_poll_timer`). `StartPollTimer` cancels the previous token
//! and spawns the replacement; `StopPollTimer` only cancels.

use pamdash_core::api::{ClearScope, Settings};
use tokio_util::sync::CancellationToken;

use crate::common::TaskId;
use crate::state::{CycleId, PollRestart};

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Fetch alerts, sessions and events for one cycle.
    FetchCycle { cycle: CycleId },

    /// Replace the poll timer.
    StartPollTimer(PollRestart),

    /// Stop the poll timer.
    StopPollTimer { token: CancellationToken },

    /// Load the settings document.
    LoadSettings { task: TaskId },

    /// Persist a validated settings document.
    SaveSettings { task: TaskId, settings: Box<Settings> },

    CheckHealth { task: TaskId },

    ExportLogs { task: TaskId },

    ClearLogs { task: TaskId, scope: ClearScope },

    SendTestAlert { task: TaskId },

    /// Open a URL with the system opener.
    OpenBrowser { url: String },
}
