//! Pure projection of application state into display data.
//!
//! `build` reads `AppState` and returns a `View` without mutating anything.
//! The renderer turns a `View` into widgets and a fresh binding table; it never
//! looks at `AppState` itself. Two builds from the same state are equal.

use chrono::NaiveDateTime;
use pamdash_core::actions;
use pamdash_core::api::{ActiveSession, SecurityEvent};
use pamdash_core::dashboard::{Summary, high_risk_alerts};
use pamdash_core::health::ComponentHealth;
use pamdash_core::risk::{RiskLevel, Thresholds};

use crate::common::TaskKind;
use crate::overlays::OverlayView;
use crate::settings_form::FormRowView;
use crate::state::{AppState, Page, Route, SettingsSlot, TuiState};
use crate::toasts::ToastLevel;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// View types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub sidebar: Vec<SidebarItem>,
    pub header: Header,
    pub body: Body,
    pub toasts: Vec<ToastView>,
    pub overlay: Option<OverlayView>,
    /// A settings field editor has the keyboard.
    pub editing: bool,
    pub scroll: u16,
    /// The settings page needs the settings document loaded.
    pub wants_settings_load: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarItem {
    pub page: Page,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub title: String,
    pub controls: RefreshControls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshControls {
    /// Normal pages: live/paused indicator with a pause toggle.
    Live { paused: bool },
    /// Settings page: auto-refresh is held, only manual refresh is offered.
    SettingsHold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastView {
    pub level: ToastLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Dashboard(DashboardView),
    Sessions(SessionsView),
    Alerts(AlertsView),
    Settings(SettingsBody),
    NotFound(String),
}

/// Risk badge: classification plus the raw score, e.g. `High (85)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskBadge {
    pub level: RiskLevel,
    pub score: u8,
}

impl RiskBadge {
    pub fn new(score: u8, thresholds: &Thresholds) -> Self {
        Self {
            level: thresholds.classify(score),
            score,
        }
    }

    pub fn text(&self) -> String {
        format!("{} ({})", self.level.label(), self.score)
    }
}

/// One entry of an event list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub role: String,
    pub action: String,
    pub description: &'static str,
    pub badge: RiskBadge,
    pub time: String,
    pub details: Option<String>,
}

impl EventRow {
    fn new(event: &SecurityEvent, thresholds: &Thresholds) -> Self {
        Self {
            role: event.user.role.clone(),
            action: event.action.clone(),
            description: actions::describe(&event.action),
            badge: RiskBadge::new(event.risk_score, thresholds),
            time: format_time(&event.time),
            details: event.details_line(),
        }
    }

    /// `role - action` heading.
    pub fn heading(&self) -> String {
        format!("{} - {}", self.role, self.action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub summary: Summary,
    pub high_risk: Vec<EventRow>,
    pub events: Vec<EventRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub email: String,
    pub role: String,
    pub login_time: String,
    pub strikes: String,
    pub has_strikes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionsView {
    pub rows: Vec<SessionRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertsView {
    pub rows: Vec<EventRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsBody {
    Loading,
    Failed(String),
    Form(FormView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub rows: Vec<FormRowView>,
    pub health: Option<Vec<ComponentHealth>>,
    /// Labels of requests still in flight.
    pub busy: Vec<&'static str>,
}

// ============================================================================
// Build
// ============================================================================

pub fn build(app: &AppState) -> View {
    let tui = &app.tui;
    let route = tui.store.route();
    let body = match route {
        Route::Page(Page::Dashboard) => Body::Dashboard(dashboard(tui)),
        Route::Page(Page::Sessions) => Body::Sessions(sessions(tui)),
        Route::Page(Page::Alerts) => Body::Alerts(alerts(tui)),
        Route::Page(Page::Settings) => Body::Settings(settings(tui)),
        Route::NotFound(name) => Body::NotFound(name.clone()),
    };
    let wants_settings_load =
        route.is_settings() && matches!(tui.store.settings(), SettingsSlot::NotLoaded);

    View {
        sidebar: Page::ALL
            .into_iter()
            .map(|page| SidebarItem {
                page,
                active: route.page() == Some(page),
            })
            .collect(),
        header: header(tui),
        body,
        toasts: tui
            .toasts
            .iter()
            .map(|toast| ToastView {
                level: toast.level,
                message: toast.message.clone(),
            })
            .collect(),
        overlay: app.overlay.as_ref().map(|overlay| overlay.view()),
        editing: route.is_settings() && tui.form.as_ref().is_some_and(|f| f.is_editing()),
        scroll: tui.scroll,
        wants_settings_load,
    }
}

fn header(tui: &TuiState) -> Header {
    let route = tui.store.route();
    let title = match route {
        Route::Page(page) => page.title().to_string(),
        Route::NotFound(_) => "Page Not Found".to_string(),
    };
    let controls = if route.is_settings() {
        RefreshControls::SettingsHold
    } else {
        RefreshControls::Live {
            paused: tui.store.is_paused(),
        }
    };
    Header { title, controls }
}

fn dashboard(tui: &TuiState) -> DashboardView {
    let store = &tui.store;
    let thresholds = store.thresholds();
    DashboardView {
        summary: Summary::derive(store.alerts(), store.sessions().len(), thresholds),
        high_risk: high_risk_alerts(store.alerts(), thresholds)
            .into_iter()
            .map(|alert| EventRow::new(&alert.event, thresholds))
            .collect(),
        events: store
            .events()
            .iter()
            .map(|event| EventRow::new(event, thresholds))
            .collect(),
    }
}

fn sessions(tui: &TuiState) -> SessionsView {
    let max = tui.store.max_strikes();
    SessionsView {
        rows: tui
            .store
            .sessions()
            .iter()
            .map(|session| session_row(session, max))
            .collect(),
    }
}

fn session_row(session: &ActiveSession, max_strikes: u32) -> SessionRow {
    SessionRow {
        email: session.email.clone(),
        role: session.role.clone(),
        login_time: format_time(&session.login_time),
        strikes: format!("{} / {max_strikes}", session.strike_count),
        has_strikes: session.strike_count > 0,
    }
}

fn alerts(tui: &TuiState) -> AlertsView {
    let thresholds = tui.store.thresholds();
    AlertsView {
        rows: tui
            .store
            .events()
            .iter()
            .map(|event| EventRow::new(event, thresholds))
            .collect(),
    }
}

fn settings(tui: &TuiState) -> SettingsBody {
    match (tui.store.settings(), &tui.form) {
        (SettingsSlot::Failed(error), _) => SettingsBody::Failed(error.clone()),
        (SettingsSlot::Loaded(_), Some(form)) => SettingsBody::Form(FormView {
            rows: form.row_views(),
            health: tui.health.clone(),
            busy: busy_labels(tui),
        }),
        _ => SettingsBody::Loading,
    }
}

fn busy_labels(tui: &TuiState) -> Vec<&'static str> {
    [
        (TaskKind::SettingsSave, "Saving settings"),
        (TaskKind::HealthCheck, "Checking health"),
        (TaskKind::ExportLogs, "Exporting logs"),
        (TaskKind::ClearLogs, "Clearing logs"),
        (TaskKind::TestAlert, "Sending test alert"),
    ]
    .into_iter()
    .filter(|(kind, _)| tui.tasks.state(*kind).is_running())
    .map(|(_, label)| label)
    .collect()
}

fn format_time(time: &NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}
