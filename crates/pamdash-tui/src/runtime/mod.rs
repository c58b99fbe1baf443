//! Console runtime - owns the terminal, runs the event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! - Handlers send `UiEvent`s directly to `inbox_tx`
//! - The runtime drains `inbox_rx` each loop iteration
//! - The poll timer is just another sender on the same inbox
//!
//! ## Drawing
//!
//! A frame is drawn only when the store holds a render request. Each draw
//! builds a fresh `View`, renders it, and replaces the binding table with the
//! one the renderer returned.
//!
//! Structure:
//! - `mod.rs`: Core runtime (ConsoleRuntime, event loop, effect dispatch)
//! - `inbox.rs`: Inbox channel types
//! - `handlers.rs`: Async handlers for requests and the poll timer

pub mod handlers;
mod inbox;

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use pamdash_core::api::ApiClient;
use pamdash_core::config::Config;
use tokio::sync::mpsc;

use crate::bindings::Bindings;
use crate::common::{TaskCompleted, TaskId, TaskKind, TaskMeta, TaskStarted};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, Route};
use crate::terminal::{self, TerminalGuard};
use crate::{render, update, view};

/// Cadence of `UiEvent::Tick` (toast expiry).
pub const TICK_DURATION: Duration = Duration::from_millis(250);

/// Full-screen console runtime.
///
/// Owns the terminal and state. Terminal state is restored on drop or panic.
pub struct ConsoleRuntime {
    terminal: TerminalGuard,
    /// Application state (split: tui + overlay).
    pub state: AppState,
    client: ApiClient,
    /// Inbox sender - handlers send events here.
    inbox_tx: UiEventSender,
    /// Inbox receiver - runtime drains this each iteration.
    inbox_rx: UiEventReceiver,
    last_tick: std::time::Instant,
}

impl ConsoleRuntime {
    /// Creates the runtime and takes over the terminal.
    ///
    /// # Errors
    /// Returns an error if the service URL is invalid or the terminal cannot
    /// be set up.
    pub fn new(config: Config, route: Route) -> Result<Self> {
        let client = ApiClient::from_config(&config)?;

        // Panic hook goes in BEFORE the alternate screen
        terminal::install_panic_hook();
        let terminal = TerminalGuard::enter().context("Failed to setup terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state: AppState::new(config, route),
            client,
            inbox_tx,
            inbox_rx,
            last_tick: std::time::Instant::now(),
        })
    }

    /// Runs the main event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if reading terminal input or drawing fails.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(route = ?self.state.tui.store.route(), "console started");
        let effects = update::init(&mut self.state);
        self.execute_effects(effects);

        let result = self.event_loop();

        // The timer must not outlive the console.
        if let Some(token) = self.state.tui.store.take_poll_cancel() {
            token.cancel();
        }
        tracing::info!("console stopped");
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        while !self.state.tui.should_quit {
            if self.state.tui.store.take_render_request() {
                self.draw()?;
            }

            for event in self.collect_events()? {
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }
        }
        Ok(())
    }

    /// Rebuilds the whole screen and swaps in the new binding table.
    fn draw(&mut self) -> Result<()> {
        let mut view = view::build(&self.state);
        if view.wants_settings_load {
            self.dispatch_event(UiEvent::SettingsLoadRequested);
            view = view::build(&self.state);
        }

        let mut bindings = Bindings::default();
        self.terminal.terminal_mut().draw(|frame| {
            bindings = render::draw(&view, frame);
        })?;
        tracing::trace!(bindings = bindings.len(), "frame drawn");
        self.state.tui.replace_bindings(bindings);
        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    /// Collects events from the inbox and the terminal, then a `Tick` once
    /// the tick interval has elapsed.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Block until the next tick only when there is nothing to process.
        let poll_duration = if events.is_empty() {
            TICK_DURATION.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= TICK_DURATION {
            events.push(UiEvent::Tick);
            self.last_tick = std::time::Instant::now();
        }

        Ok(events)
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) {
        let effects = update::update(&mut self.state, event);
        if !effects.is_empty() {
            self.execute_effects(effects);
        }
    }

    /// Spawns an async handler and sends its result event when complete.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    /// Spawns an async task with a uniform TaskStarted/TaskCompleted lifecycle.
    fn spawn_task<F, Fut>(&self, kind: TaskKind, id: TaskId, meta: TaskMeta, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let _ = tx.send(UiEvent::TaskStarted {
            kind,
            started: TaskStarted { id, meta },
        });
        tokio::spawn(async move {
            let inner = f().await;
            let completed = TaskCompleted {
                id,
                result: Box::new(inner),
            };
            let _ = tx.send(UiEvent::TaskCompleted { kind, completed });
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.tui.should_quit = true;
            }
            UiEffect::OpenBrowser { url } => {
                if let Err(err) = open::that(&url) {
                    tracing::warn!(%url, error = %err, "failed to open browser");
                }
            }

            // ================================================================
            // Polling
            // ================================================================
            UiEffect::FetchCycle { cycle } => {
                let client = self.client.clone();
                self.spawn_effect(move || handlers::fetch_cycle(client, cycle));
            }
            UiEffect::StartPollTimer(restart) => {
                if let Some(previous) = &restart.previous {
                    previous.cancel();
                }
                tokio::spawn(handlers::poll_timer(self.inbox_tx.clone(), restart));
            }
            UiEffect::StopPollTimer { token } => {
                token.cancel();
            }

            // ================================================================
            // Tasks
            // ================================================================
            UiEffect::LoadSettings { task } => {
                let client = self.client.clone();
                self.spawn_task(TaskKind::SettingsLoad, task, TaskMeta::None, move || {
                    handlers::load_settings(client)
                });
            }
            UiEffect::SaveSettings { task, settings } => {
                let client = self.client.clone();
                self.spawn_task(TaskKind::SettingsSave, task, TaskMeta::None, move || {
                    handlers::save_settings(client, *settings)
                });
            }
            UiEffect::CheckHealth { task } => {
                let client = self.client.clone();
                self.spawn_task(TaskKind::HealthCheck, task, TaskMeta::None, move || {
                    handlers::check_health(client)
                });
            }
            UiEffect::ExportLogs { task } => {
                let client = self.client.clone();
                self.spawn_task(TaskKind::ExportLogs, task, TaskMeta::None, move || {
                    handlers::export_logs(client)
                });
            }
            UiEffect::ClearLogs { task, scope } => {
                let client = self.client.clone();
                self.spawn_task(
                    TaskKind::ClearLogs,
                    task,
                    TaskMeta::ClearLogs { scope },
                    move || handlers::clear_logs(client, scope),
                );
            }
            UiEffect::SendTestAlert { task } => {
                let client = self.client.clone();
                self.spawn_task(TaskKind::TestAlert, task, TaskMeta::None, move || {
                    handlers::send_test_alert(client)
                });
            }
        }
    }
}
