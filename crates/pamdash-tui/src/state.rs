//! Application state composition.
//!
//! This module defines the top-level state hierarchy for the TUI:
//! - `AppState` - combined state (`TuiState` + overlay)
//! - `TuiState` - non-overlay UI state (store, settings form, toasts, bindings)
//! - `Store` - the single snapshot of service data and navigation flags
//!
//! ## State Hierarchy
//!
//! ```text
//! AppState
//! ├── tui: TuiState
//! │   ├── store: Store           (collections, thresholds, settings, route, poll timer)
//! │   ├── form: Option<SettingsForm> (editable copy of the loaded settings)
//! │   ├── health: Option<...>    (last health check)
//! │   ├── toasts: Toasts         (transient notifications)
//! │   ├── bindings: Bindings     (input table produced by the last draw)
//! │   ├── task_seq: TaskSeq      (async task id generator)
//! │   └── tasks: Tasks           (task lifecycle state)
//! └── overlay: Option<Overlay>   (confirmation prompt)
//! ```
//!
//! `Store` fields are private; every mutation goes through a named method so
//! the collection, cycle and timer invariants hold at every call site.

use std::time::Duration;

use pamdash_core::api::{ActiveSession, Alert, SecurityEvent, Settings};
use pamdash_core::config::Config;
use pamdash_core::health::ComponentHealth;
use pamdash_core::risk::Thresholds;
use pamdash_core::snapshot::Snapshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::bindings::Bindings;
use crate::common::{TaskId, TaskKind, TaskMeta, TaskSeq, TaskStarted, Tasks};
use crate::overlays::Overlay;
use crate::settings_form::SettingsForm;
use crate::toasts::Toasts;

/// Strike limit shown before settings have loaded.
pub const DEFAULT_MAX_STRIKES: u32 = 3;

// ============================================================================
// Navigation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Dashboard,
    Sessions,
    Alerts,
    Settings,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Dashboard, Page::Sessions, Page::Alerts, Page::Settings];

    pub fn id(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Sessions => "sessions",
            Page::Alerts => "alerts",
            Page::Settings => "settings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Sessions => "Sessions",
            Page::Alerts => "Alerts",
            Page::Settings => "Settings",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Live Dashboard Overview",
            Page::Sessions => "Privileged Session Management",
            Page::Alerts => "Live Security Alerts",
            Page::Settings => "System Configuration",
        }
    }

    /// Sidebar shortcut.
    pub fn hotkey(self) -> char {
        match self {
            Page::Dashboard => '1',
            Page::Sessions => '2',
            Page::Alerts => '3',
            Page::Settings => '4',
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|page| page.id() == id)
    }
}

/// Where the console currently points.
///
/// `NotFound` only arises from an unrecognized start page and renders a
/// fallback view instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Page(Page),
    NotFound(String),
}

impl Route {
    pub fn parse(id: &str) -> Self {
        Page::from_id(id).map_or_else(|| Route::NotFound(id.to_string()), Route::Page)
    }

    pub fn page(&self) -> Option<Page> {
        match self {
            Route::Page(page) => Some(*page),
            Route::NotFound(_) => None,
        }
    }

    pub fn is_settings(&self) -> bool {
        self.page() == Some(Page::Settings)
    }
}

impl Default for Route {
    fn default() -> Self {
        Route::Page(Page::Dashboard)
    }
}

// ============================================================================
// Store
// ============================================================================

/// Sequence id of one fetch cycle. Later cycles have larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleId(pub u64);

/// Load state of the server settings document.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsSlot {
    NotLoaded,
    Loading,
    Loaded(Box<Settings>),
    Failed(String),
}

/// Values the runtime needs to start a replacement poll timer.
#[derive(Debug, Clone)]
pub struct PollRestart {
    pub generation: u64,
    pub interval: Duration,
    pub cancel: CancellationToken,
    /// Token of the timer being replaced, if one was live.
    pub previous: Option<CancellationToken>,
}

#[derive(Debug)]
struct PollTimer {
    generation: u64,
    interval: Duration,
    cancel: Option<CancellationToken>,
}

/// Single mutable snapshot of application data.
#[derive(Debug)]
pub struct Store {
    alerts: Vec<Alert>,
    sessions: Vec<ActiveSession>,
    events: Vec<SecurityEvent>,
    thresholds: Thresholds,
    settings: SettingsSlot,
    route: Route,
    paused: bool,
    last_interaction: Option<Instant>,
    poll: PollTimer,
    next_cycle: u64,
    last_applied_cycle: Option<CycleId>,
    render_requested: bool,
}

impl Store {
    pub fn new(route: Route, poll_interval: Duration) -> Self {
        Self {
            alerts: Vec::new(),
            sessions: Vec::new(),
            events: Vec::new(),
            thresholds: Thresholds::default(),
            settings: SettingsSlot::NotLoaded,
            route,
            paused: false,
            last_interaction: None,
            poll: PollTimer {
                generation: 0,
                interval: poll_interval,
                cancel: None,
            },
            next_cycle: 0,
            last_applied_cycle: None,
            render_requested: true,
        }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn sessions(&self) -> &[ActiveSession] {
        &self.sessions
    }

    pub fn events(&self) -> &[SecurityEvent] {
        &self.events
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn settings(&self) -> &SettingsSlot {
        &self.settings
    }

    pub fn loaded_settings(&self) -> Option<&Settings> {
        match &self.settings {
            SettingsSlot::Loaded(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn max_strikes(&self) -> u32 {
        self.loaded_settings()
            .map_or(DEFAULT_MAX_STRIKES, |s| s.session_management.max_strikes)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn last_interaction(&self) -> Option<Instant> {
        self.last_interaction
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll.interval
    }

    pub fn last_applied_cycle(&self) -> Option<CycleId> {
        self.last_applied_cycle
    }

    // ------------------------------------------------------------------------
    // Fetch cycles
    // ------------------------------------------------------------------------

    /// Allocates the id for a cycle about to start.
    pub fn begin_cycle(&mut self) -> CycleId {
        self.next_cycle += 1;
        CycleId(self.next_cycle)
    }

    /// Replaces all three collections from one cycle's results.
    ///
    /// Results from a cycle older than the last applied one are dropped and
    /// `false` is returned.
    pub fn install_snapshot(&mut self, cycle: CycleId, snapshot: Snapshot) -> bool {
        if self.last_applied_cycle.is_some_and(|applied| applied >= cycle) {
            return false;
        }
        let Snapshot {
            alerts,
            sessions,
            events,
        } = snapshot;
        self.alerts = alerts;
        self.sessions = sessions;
        self.events = events;
        self.last_applied_cycle = Some(cycle);
        true
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn mark_settings_loading(&mut self) {
        self.settings = SettingsSlot::Loading;
    }

    pub fn mark_settings_failed(&mut self, error: String) {
        self.settings = SettingsSlot::Failed(error);
    }

    /// Installs server-confirmed settings and adopts their thresholds.
    ///
    /// A threshold set the server returns out of order is not adopted; the
    /// previous set stays in effect.
    pub fn install_settings(&mut self, settings: Settings) {
        match settings.risk_thresholds.validate() {
            Ok(()) => self.thresholds = settings.risk_thresholds,
            Err(err) => {
                tracing::warn!(error = %err, "server returned invalid thresholds; keeping current set");
            }
        }
        self.settings = SettingsSlot::Loaded(Box::new(settings));
    }

    // ------------------------------------------------------------------------
    // UI flags
    // ------------------------------------------------------------------------

    /// Changes the route. A failed settings load is forgotten so the
    /// settings page retries on its next visit.
    pub fn navigate(&mut self, route: Route) {
        if route.is_settings() && matches!(self.settings, SettingsSlot::Failed(_)) {
            self.settings = SettingsSlot::NotLoaded;
        }
        self.route = route;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn record_interaction(&mut self, now: Instant) {
        self.last_interaction = Some(now);
    }

    // ------------------------------------------------------------------------
    // Poll timer
    // ------------------------------------------------------------------------

    /// Retires the live timer (if any) and describes its replacement.
    ///
    /// The caller must cancel `previous` and start a timer tagged with the
    /// returned generation. Ticks from older generations are stale.
    pub fn replace_poll_timer(&mut self, interval: Duration) -> PollRestart {
        let cancel = CancellationToken::new();
        self.poll.generation += 1;
        self.poll.interval = interval;
        let previous = self.poll.cancel.replace(cancel.clone());
        PollRestart {
            generation: self.poll.generation,
            interval,
            cancel,
            previous,
        }
    }

    /// Cancels the live timer without replacing it.
    pub fn take_poll_cancel(&mut self) -> Option<CancellationToken> {
        self.poll.cancel.take()
    }

    pub fn is_current_poll(&self, generation: u64) -> bool {
        self.poll.cancel.is_some() && self.poll.generation == generation
    }

    // ------------------------------------------------------------------------
    // Render requests
    // ------------------------------------------------------------------------

    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// Returns whether a render was requested and clears the request.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }
}

// ============================================================================
// AppState (Combined State)
// ============================================================================

/// Combined application state for the TUI.
///
/// Overlay handlers can borrow the overlay and `TuiState` at the same time.
pub struct AppState {
    pub tui: TuiState,
    pub overlay: Option<Overlay>,
}

impl AppState {
    pub fn new(config: Config, route: Route) -> Self {
        Self {
            tui: TuiState::new(config, route),
            overlay: None,
        }
    }
}

// ============================================================================
// TuiState
// ============================================================================

/// TUI application state (non-overlay).
pub struct TuiState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    pub config: Config,
    pub store: Store,
    /// Editable copy of the loaded settings, rebuilt on every load.
    pub form: Option<SettingsForm>,
    /// Result of the last health check.
    pub health: Option<Vec<ComponentHealth>>,
    pub toasts: Toasts,
    /// Scroll offset of the current page body.
    pub scroll: u16,
    bindings: Bindings,
    /// Task id sequence for async operations.
    pub task_seq: TaskSeq,
    /// Task lifecycle state for async operations.
    pub tasks: Tasks,
}

impl TuiState {
    pub fn new(config: Config, route: Route) -> Self {
        let store = Store::new(route, config.refresh_interval());
        let toasts = Toasts::new(config.toast_duration());
        Self {
            should_quit: false,
            config,
            store,
            form: None,
            health: None,
            toasts,
            scroll: 0,
            bindings: Bindings::default(),
            task_seq: TaskSeq::default(),
            tasks: Tasks::default(),
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Installs the table produced by the latest draw, discarding the old one.
    pub fn replace_bindings(&mut self, bindings: Bindings) {
        self.bindings = bindings;
    }

    /// Reserves a task slot. Returns `None` when a task of this kind is running.
    pub fn begin_task(&mut self, kind: TaskKind, meta: TaskMeta) -> Option<TaskId> {
        if self.tasks.state(kind).is_running() {
            return None;
        }
        let id = self.task_seq.next_id();
        self.tasks
            .state_mut(kind)
            .on_started(&TaskStarted { id, meta });
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use pamdash_core::api::EventActor;

    use super::*;

    fn snapshot_with_scores(scores: &[u8]) -> Snapshot {
        let events: Vec<SecurityEvent> = scores
            .iter()
            .map(|&score| SecurityEvent {
                time: chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap(),
                action: "RUN_QUERY".to_string(),
                risk_score: score,
                user: EventActor {
                    role: "Analyst".to_string(),
                },
                details: None,
            })
            .collect();
        Snapshot {
            alerts: events.iter().cloned().map(Alert::from).collect(),
            sessions: Vec::new(),
            events,
        }
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("alerts"), Route::Page(Page::Alerts));
        assert_eq!(Route::parse("reports"), Route::NotFound("reports".to_string()));
        assert!(Route::parse("settings").is_settings());
    }

    #[test]
    fn test_newer_cycle_wins() {
        let mut store = Store::new(Route::default(), Duration::from_secs(5));
        let older = store.begin_cycle();
        let newer = store.begin_cycle();

        assert!(store.install_snapshot(newer, snapshot_with_scores(&[90])));
        assert!(!store.install_snapshot(older, snapshot_with_scores(&[10, 20])));
        assert_eq!(store.events().len(), 1);
        assert_eq!(store.last_applied_cycle(), Some(newer));
    }

    #[test]
    fn test_replace_poll_timer_bumps_generation() {
        let mut store = Store::new(Route::default(), Duration::from_secs(5));
        let first = store.replace_poll_timer(Duration::from_secs(5));
        assert!(first.previous.is_none());
        assert!(store.is_current_poll(first.generation));

        let second = store.replace_poll_timer(Duration::from_secs(10));
        assert!(second.previous.is_some());
        assert!(!store.is_current_poll(first.generation));
        assert!(store.is_current_poll(second.generation));
        assert_eq!(store.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_navigate_to_settings_retries_failed_load() {
        let mut store = Store::new(Route::default(), Duration::from_secs(5));
        store.mark_settings_failed("HTTP 500".to_string());
        store.navigate(Route::Page(Page::Settings));
        assert_eq!(store.settings(), &SettingsSlot::NotLoaded);
    }

    #[test]
    fn test_install_settings_ignores_invalid_thresholds() {
        let mut store = Store::new(Route::default(), Duration::from_secs(5));
        let mut settings = Settings::default();
        settings.risk_thresholds = Thresholds {
            medium: 90,
            high: 50,
            critical: 95,
        };
        store.install_settings(settings);
        assert_eq!(store.thresholds(), &Thresholds::default());
        assert!(store.loaded_settings().is_some());
    }

    #[test]
    fn test_render_request_is_consumed() {
        let mut store = Store::new(Route::default(), Duration::from_secs(5));
        assert!(store.take_render_request());
        assert!(!store.take_render_request());
        store.request_render();
        assert!(store.take_render_request());
    }
}
