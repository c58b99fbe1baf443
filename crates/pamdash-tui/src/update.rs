//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.
//!
//! This is the single source of truth for how events modify state.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use pamdash_core::api::{ClearScope, Settings};
use pamdash_core::health::component_rows;
use tokio::time::Instant;

use crate::bindings::Action;
use crate::common::{TaskId, TaskKind, TaskMeta};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::overlays::{self, ConfirmState, Overlay};
use crate::settings_form::{Button, FormOutcome, SettingsForm};
use crate::state::{AppState, Route, SettingsSlot, TuiState};
use crate::sync;

/// Effects to run once at startup: load settings, fetch (policy-checked),
/// start the poll timer.
pub fn init(app: &mut AppState) -> Vec<UiEffect> {
    let tui = &mut app.tui;
    let mut effects = Vec::new();
    effects.extend(load_settings(tui));
    effects.extend(sync::scheduled_cycle(tui, Instant::now()));
    let interval = tui.config.refresh_interval();
    effects.push(sync::start_timer(&mut tui.store, interval));
    effects
}

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            if app.tui.toasts.expire(Instant::now()) {
                app.tui.store.request_render();
            }
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::PollTick { generation } => {
            sync::on_poll_tick(&mut app.tui, generation, Instant::now())
                .into_iter()
                .collect()
        }
        UiEvent::CycleFinished { cycle, result } => {
            sync::on_cycle_finished(&mut app.tui.store, cycle, result);
            vec![]
        }
        UiEvent::SettingsLoadRequested => load_settings(&mut app.tui).into_iter().collect(),
        UiEvent::SettingsLoaded(result) => {
            handle_settings_loaded(&mut app.tui, result);
            vec![]
        }
        UiEvent::SettingsSaved(result) => handle_settings_saved(&mut app.tui, result),
        UiEvent::HealthChecked(result) => {
            match result {
                Ok(report) => {
                    tracing::info!("health check completed");
                    app.tui.health = Some(component_rows(&report));
                }
                Err(message) => app.tui.toasts.error(message),
            }
            app.tui.store.request_render();
            vec![]
        }
        UiEvent::LogsExported(result) => {
            app.tui.store.request_render();
            match result {
                Ok((receipt, url)) => {
                    tracing::info!(filename = ?receipt.filename, %url, "log export ready");
                    app.tui.toasts.success("Logs exported successfully!");
                    vec![UiEffect::OpenBrowser { url }]
                }
                Err(message) => {
                    app.tui.toasts.error(message);
                    vec![]
                }
            }
        }
        UiEvent::LogsCleared { scope, result } => handle_logs_cleared(&mut app.tui, scope, result),
        UiEvent::TestAlertSent(result) => {
            match result {
                Ok(receipt) => {
                    tracing::info!(results = ?receipt.results, "test alert sent");
                    app.tui.toasts.success("Test alert sent successfully!");
                }
                Err(message) => app.tui.toasts.error(message),
            }
            app.tui.store.request_render();
            vec![]
        }
        UiEvent::TaskStarted { kind, started } => {
            app.tui.tasks.state_mut(kind).on_started(&started);
            vec![]
        }
        UiEvent::TaskCompleted { kind, completed } => {
            if app.tui.tasks.state_mut(kind).finish_if_active(completed.id) {
                app.tui.store.request_render();
                update(app, *completed.result)
            } else {
                tracing::debug!(?kind, "ignoring result of superseded task");
                vec![]
            }
        }
    }
}

// ============================================================================
// Input
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
            let Some(action) = app.tui.bindings().resolve_click(mouse.column, mouse.row) else {
                return vec![];
            };
            dispatch(app, action, None)
        }
        Event::Resize(..) => {
            app.tui.store.request_render();
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let Some(action) = app.tui.bindings().resolve_key(&key) else {
        return vec![];
    };
    let typed = match key.code {
        KeyCode::Char(c) => Some(c),
        _ => None,
    };
    dispatch(app, action, typed)
}

/// Runs a bound action. Every bound input counts as an interaction and
/// repaints the screen.
fn dispatch(app: &mut AppState, action: Action, typed: Option<char>) -> Vec<UiEffect> {
    app.tui.store.record_interaction(Instant::now());
    app.tui.store.request_render();

    if let Some(effects) = overlays::handle_overlay_action(app, action) {
        return effects;
    }
    handle_action(app, action, typed)
}

fn handle_action(app: &mut AppState, action: Action, typed: Option<char>) -> Vec<UiEffect> {
    let tui = &mut app.tui;
    match action {
        Action::Quit => {
            let mut effects: Vec<UiEffect> = sync::stop_timer(&mut tui.store).into_iter().collect();
            effects.push(UiEffect::Quit);
            effects
        }
        Action::Navigate(page) => {
            if let Some(form) = tui.form.as_mut() {
                form.cancel_edit();
            }
            tui.store.navigate(Route::Page(page));
            tui.scroll = 0;
            vec![]
        }
        Action::TogglePause => {
            tui.store.toggle_pause();
            tracing::info!(paused = tui.store.is_paused(), "auto-refresh toggled");
            vec![]
        }
        Action::ManualRefresh => vec![sync::manual_refresh(tui)],
        Action::Scroll(delta) => {
            tui.scroll = tui.scroll.saturating_add_signed(delta);
            vec![]
        }
        Action::SaveAll => activate_button(app, Button::SaveAll),
        Action::ConfirmYes | Action::ConfirmNo => vec![],
        form_action => handle_form_action(app, form_action, typed),
    }
}

fn handle_form_action(app: &mut AppState, action: Action, typed: Option<char>) -> Vec<UiEffect> {
    let Some(form) = app.tui.form.as_mut() else {
        return vec![];
    };
    let outcome = match action {
        Action::FocusNext => {
            form.focus_next();
            FormOutcome::None
        }
        Action::FocusPrev => {
            form.focus_prev();
            FormOutcome::None
        }
        Action::FormActivate => form.activate(),
        Action::FormCycle { forward } => form.cycle(forward),
        Action::FormClick(index) => {
            if form.focus_row(index) {
                form.activate()
            } else {
                FormOutcome::None
            }
        }
        Action::EditCommit => {
            form.commit_edit();
            FormOutcome::None
        }
        Action::EditCancel => {
            form.cancel_edit();
            FormOutcome::None
        }
        Action::EditBackspace => {
            form.backspace();
            FormOutcome::None
        }
        Action::InsertChar => {
            if let Some(c) = typed {
                form.insert_char(c);
            }
            FormOutcome::None
        }
        _ => FormOutcome::None,
    };
    handle_form_outcome(app, outcome)
}

fn handle_form_outcome(app: &mut AppState, outcome: FormOutcome) -> Vec<UiEffect> {
    match outcome {
        FormOutcome::None => vec![],
        FormOutcome::RefreshIntervalChanged(secs) => {
            match sync::reconfigure_timer(&mut app.tui, secs) {
                Ok(effect) => {
                    app.tui
                        .toasts
                        .success(format!("Refresh interval updated to {secs} seconds"));
                    vec![effect]
                }
                Err(err) => {
                    app.tui.toasts.error(err.to_string());
                    vec![]
                }
            }
        }
        FormOutcome::Activate(button) => activate_button(app, button),
    }
}

fn activate_button(app: &mut AppState, button: Button) -> Vec<UiEffect> {
    let tui = &mut app.tui;
    let Some(form) = tui.form.as_ref() else {
        return vec![];
    };
    match button {
        Button::UpdateThresholds => {
            let settings = form.thresholds_update();
            save_settings(tui, settings)
        }
        Button::SaveAll => {
            let settings = form.build_settings();
            save_settings(tui, settings)
        }
        Button::SendTestAlert => start_task(tui, TaskKind::TestAlert, |task| {
            UiEffect::SendTestAlert { task }
        }),
        Button::RunHealthCheck => start_task(tui, TaskKind::HealthCheck, |task| {
            UiEffect::CheckHealth { task }
        }),
        Button::ExportLogs => {
            let effects = start_task(tui, TaskKind::ExportLogs, |task| UiEffect::ExportLogs {
                task,
            });
            if !effects.is_empty() {
                tui.toasts.info("Preparing log export...");
            }
            effects
        }
        Button::ClearOldLogs => {
            app.overlay = Some(Overlay::Confirm(ConfirmState::new(ClearScope::Old)));
            vec![]
        }
        Button::ClearAllLogs => {
            app.overlay = Some(Overlay::Confirm(ConfirmState::new(ClearScope::All)));
            vec![]
        }
    }
}

fn start_task(
    tui: &mut TuiState,
    kind: TaskKind,
    effect: impl FnOnce(TaskId) -> UiEffect,
) -> Vec<UiEffect> {
    match tui.begin_task(kind, TaskMeta::None) {
        Some(task) => vec![effect(task)],
        None => {
            tracing::debug!(?kind, "request already in flight");
            vec![]
        }
    }
}

// ============================================================================
// Settings round-trip
// ============================================================================

/// Starts a settings load if nothing is loaded or in flight.
fn load_settings(tui: &mut TuiState) -> Option<UiEffect> {
    if !matches!(tui.store.settings(), SettingsSlot::NotLoaded) {
        return None;
    }
    reload_settings(tui)
}

/// Starts a settings load even if a copy is already loaded.
fn reload_settings(tui: &mut TuiState) -> Option<UiEffect> {
    let task = tui.begin_task(TaskKind::SettingsLoad, TaskMeta::None)?;
    if tui.store.loaded_settings().is_none() {
        tui.store.mark_settings_loading();
    }
    Some(UiEffect::LoadSettings { task })
}

fn handle_settings_loaded(tui: &mut TuiState, result: Result<Settings, String>) {
    match result {
        Ok(settings) => {
            tracing::info!(thresholds = ?settings.risk_thresholds, "settings loaded");
            tui.form = Some(match &tui.form {
                Some(form) => form.reloaded(&settings),
                None => SettingsForm::from_settings(&settings),
            });
            tui.store.install_settings(settings);
        }
        Err(error) => {
            tracing::warn!(%error, "failed to load settings");
            if tui.store.loaded_settings().is_none() {
                tui.store.mark_settings_failed(error);
            } else {
                tui.toasts
                    .warning("Could not reload settings; showing the last loaded values");
            }
        }
    }
    tui.store.request_render();
}

/// Validates locally, then reserves the save task. Nothing is sent when
/// validation fails.
fn save_settings(
    tui: &mut TuiState,
    settings: anyhow::Result<Settings>,
) -> Vec<UiEffect> {
    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            tracing::debug!(error = %err, "settings rejected before save");
            tui.toasts.error(err.to_string());
            return vec![];
        }
    };
    start_task(tui, TaskKind::SettingsSave, |task| UiEffect::SaveSettings {
        task,
        settings: Box::new(settings),
    })
}

fn handle_settings_saved(tui: &mut TuiState, result: Result<(), String>) -> Vec<UiEffect> {
    match result {
        Ok(()) => {
            tracing::info!("settings saved");
            tui.toasts.success("Settings saved successfully!");
            reload_settings(tui).into_iter().collect()
        }
        Err(message) => {
            tracing::warn!(%message, "settings save rejected");
            tui.toasts.error(message);
            vec![]
        }
    }
}

// ============================================================================
// Log management
// ============================================================================

fn handle_logs_cleared(
    tui: &mut TuiState,
    scope: ClearScope,
    result: Result<String, String>,
) -> Vec<UiEffect> {
    tui.store.request_render();
    match (scope, result) {
        (ClearScope::Old, Ok(status)) => {
            tracing::info!(%status, "old logs cleared");
            tui.toasts.success("Old logs cleared successfully");
            vec![]
        }
        (ClearScope::All, Ok(status)) => {
            tracing::info!(%status, "all logs cleared");
            tui.toasts.success("All logs cleared");
            sync::scheduled_cycle(tui, Instant::now())
                .into_iter()
                .collect()
        }
        (_, Err(message)) => {
            tui.toasts.error(message);
            vec![]
        }
    }
}
