//! UI event types.
//!
//! All external inputs (terminal, poll timer, async results) are converted to
//! `UiEvent` before being processed by the reducer.
//!
//! ## Inbox Pattern
//!
//! Async handlers send events directly to the runtime's inbox. Results arrive
//! as separate events; the reducer never awaits anything.
//!
//! ## Task Lifecycle Events
//!
//! One-at-a-time requests (settings, health, log management, test alert) use a
//! uniform lifecycle:
//! - The reducer reserves a `TaskId` before emitting the effect
//! - The runtime emits `UiEvent::TaskStarted` once the task is spawned
//! - The runtime emits `UiEvent::TaskCompleted` wrapping the result event
//!
//! Fetch cycles and poll ticks are not tasks: they carry their own sequence
//! numbers (`CycleId`, timer generation) so stale results can be discarded.

use crossterm::event::Event as CrosstermEvent;
use pamdash_core::api::{ClearScope, ExportReceipt, HealthReport, Settings, TestAlertReceipt};
use pamdash_core::snapshot::Snapshot;

use crate::common::{TaskCompleted, TaskKind, TaskStarted};
use crate::state::CycleId;

/// Events processed by the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Frame tick (toast expiry).
    Tick,

    /// Raw terminal input.
    Terminal(CrosstermEvent),

    /// The poll timer fired.
    PollTick { generation: u64 },

    /// A fetch cycle finished. Errors are already rendered to strings.
    CycleFinished {
        cycle: CycleId,
        result: Result<Snapshot, String>,
    },

    /// The settings view needs the settings document.
    SettingsLoadRequested,

    SettingsLoaded(Result<Settings, String>),

    /// Save outcome. `Err` holds the message to show.
    SettingsSaved(Result<(), String>),

    HealthChecked(Result<HealthReport, String>),

    /// Export outcome with the resolved download URL.
    LogsExported(Result<(ExportReceipt, String), String>),

    LogsCleared {
        scope: ClearScope,
        result: Result<String, String>,
    },

    TestAlertSent(Result<TestAlertReceipt, String>),

    TaskStarted {
        kind: TaskKind,
        started: TaskStarted,
    },

    TaskCompleted {
        kind: TaskKind,
        completed: TaskCompleted<Box<UiEvent>>,
    },
}
