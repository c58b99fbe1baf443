//! Editable settings form.
//!
//! The form holds its own string buffers so half-typed values survive
//! re-renders. It is rebuilt from server-confirmed settings after every load.

use anyhow::{Context, Result};
use pamdash_core::api::Settings;
use pamdash_core::config::REFRESH_INTERVAL_CHOICES;
use pamdash_core::risk::Thresholds;

pub const MAX_EVENTS_CHOICES: &[i64] = &[25, 50, 100, 200, -1];
pub const RETENTION_CHOICES: &[u32] = &[7, 30, 90, 365];
pub const LOG_LEVEL_CHOICES: &[&str] = &["debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Medium,
    High,
    Critical,
    MaxStrikes,
    SessionTimeout,
    RefreshInterval,
    MaxEvents,
    EmailEnabled,
    SlackEnabled,
    EmailRecipients,
    RetentionDays,
    LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    UpdateThresholds,
    SendTestAlert,
    RunHealthCheck,
    ExportLogs,
    ClearOldLogs,
    ClearAllLogs,
    SaveAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    Section(&'static str),
    Field(Field),
    Button(Button),
}

/// Form layout, top to bottom.
pub const ROWS: &[Row] = &[
    Row::Section("Risk Score Thresholds"),
    Row::Field(Field::Medium),
    Row::Field(Field::High),
    Row::Field(Field::Critical),
    Row::Button(Button::UpdateThresholds),
    Row::Section("Session Management"),
    Row::Field(Field::MaxStrikes),
    Row::Field(Field::SessionTimeout),
    Row::Section("Dashboard"),
    Row::Field(Field::RefreshInterval),
    Row::Field(Field::MaxEvents),
    Row::Section("Alert Notifications"),
    Row::Field(Field::EmailEnabled),
    Row::Field(Field::SlackEnabled),
    Row::Field(Field::EmailRecipients),
    Row::Button(Button::SendTestAlert),
    Row::Section("System Health"),
    Row::Button(Button::RunHealthCheck),
    Row::Section("Log Management"),
    Row::Field(Field::RetentionDays),
    Row::Field(Field::LogLevel),
    Row::Button(Button::ExportLogs),
    Row::Button(Button::ClearOldLogs),
    Row::Button(Button::ClearAllLogs),
    Row::Section(""),
    Row::Button(Button::SaveAll),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
    Select,
    Toggle,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Medium => "Medium Risk",
            Field::High => "High Risk",
            Field::Critical => "Critical Risk",
            Field::MaxStrikes => "Max Critical Strikes",
            Field::SessionTimeout => "Session Timeout (minutes)",
            Field::RefreshInterval => "Refresh Interval",
            Field::MaxEvents => "Max Events Displayed",
            Field::EmailEnabled => "Email Alerts",
            Field::SlackEnabled => "Slack Alerts",
            Field::EmailRecipients => "Email Recipients",
            Field::RetentionDays => "Log Retention",
            Field::LogLevel => "Log Level",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Medium
            | Field::High
            | Field::Critical
            | Field::MaxStrikes
            | Field::SessionTimeout => FieldKind::Number,
            Field::EmailRecipients => FieldKind::Text,
            Field::RefreshInterval | Field::MaxEvents | Field::RetentionDays | Field::LogLevel => {
                FieldKind::Select
            }
            Field::EmailEnabled | Field::SlackEnabled => FieldKind::Toggle,
        }
    }
}

impl Button {
    pub fn label(self) -> &'static str {
        match self {
            Button::UpdateThresholds => "Update Thresholds",
            Button::SendTestAlert => "Send Test Alert",
            Button::RunHealthCheck => "Run Health Check",
            Button::ExportLogs => "Export Logs",
            Button::ClearOldLogs => "Clear Old Logs",
            Button::ClearAllLogs => "Clear All Logs",
            Button::SaveAll => "Save All Configuration Changes",
        }
    }
}

impl Row {
    pub fn is_focusable(self) -> bool {
        !matches!(self, Row::Section(_))
    }
}

/// What the reducer must do after a form interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    None,
    RefreshIntervalChanged(u64),
    Activate(Button),
}

/// Display data for one form row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRowView {
    pub row: Row,
    pub label: String,
    pub value: String,
    pub focused: bool,
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    base: Settings,
    medium: String,
    high: String,
    critical: String,
    max_strikes: String,
    session_timeout: String,
    refresh_interval: u64,
    max_events: i64,
    email_enabled: bool,
    slack_enabled: bool,
    email_recipients: String,
    retention_days: u32,
    log_level: String,
    focus: usize,
    editor: Option<String>,
}

impl SettingsForm {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base: settings.clone(),
            medium: settings.risk_thresholds.medium.to_string(),
            high: settings.risk_thresholds.high.to_string(),
            critical: settings.risk_thresholds.critical.to_string(),
            max_strikes: settings.session_management.max_strikes.to_string(),
            session_timeout: settings.session_management.session_timeout.to_string(),
            refresh_interval: settings.dashboard.refresh_interval,
            max_events: settings.dashboard.max_events,
            email_enabled: settings.alerts.email_enabled,
            slack_enabled: settings.alerts.slack_enabled,
            email_recipients: settings.alerts.email_recipients.join(", "),
            retention_days: settings.logs.retention_days,
            log_level: settings.logs.log_level.clone(),
            focus: first_focusable(),
            editor: None,
        }
    }

    /// Rebuilds from reloaded settings, keeping the focused row.
    #[must_use]
    pub fn reloaded(&self, settings: &Settings) -> Self {
        let mut form = Self::from_settings(settings);
        form.focus = self.focus;
        form
    }

    // ------------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------------

    pub fn focused_row(&self) -> Row {
        ROWS[self.focus]
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    pub fn focus_next(&mut self) {
        if let Some(next) = (self.focus + 1..ROWS.len()).find(|&i| ROWS[i].is_focusable()) {
            self.focus = next;
        }
    }

    pub fn focus_prev(&mut self) {
        if let Some(prev) = (0..self.focus).rev().find(|&i| ROWS[i].is_focusable()) {
            self.focus = prev;
        }
    }

    /// Focuses a row by index. Section rows are ignored.
    pub fn focus_row(&mut self, index: usize) -> bool {
        if ROWS.get(index).is_some_and(|row| row.is_focusable()) {
            self.focus = index;
            self.editor = None;
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    /// Enter on the focused row: edit, toggle, cycle or press.
    pub fn activate(&mut self) -> FormOutcome {
        match self.focused_row() {
            Row::Section(_) => FormOutcome::None,
            Row::Button(button) => FormOutcome::Activate(button),
            Row::Field(field) => match field.kind() {
                FieldKind::Number | FieldKind::Text => {
                    self.editor = Some(self.text(field).to_string());
                    FormOutcome::None
                }
                FieldKind::Toggle => {
                    self.toggle(field);
                    FormOutcome::None
                }
                FieldKind::Select => self.cycle(true),
            },
        }
    }

    /// Left/Right on the focused row: steps a select or flips a toggle.
    pub fn cycle(&mut self, forward: bool) -> FormOutcome {
        let Row::Field(field) = self.focused_row() else {
            return FormOutcome::None;
        };
        match field {
            Field::RefreshInterval => {
                self.refresh_interval = step(REFRESH_INTERVAL_CHOICES, &self.refresh_interval, forward);
                FormOutcome::RefreshIntervalChanged(self.refresh_interval)
            }
            Field::MaxEvents => {
                self.max_events = step(MAX_EVENTS_CHOICES, &self.max_events, forward);
                FormOutcome::None
            }
            Field::RetentionDays => {
                self.retention_days = step(RETENTION_CHOICES, &self.retention_days, forward);
                FormOutcome::None
            }
            Field::LogLevel => {
                self.log_level = step(LOG_LEVEL_CHOICES, &self.log_level.as_str(), forward).to_string();
                FormOutcome::None
            }
            Field::EmailEnabled | Field::SlackEnabled => {
                self.toggle(field);
                FormOutcome::None
            }
            _ => FormOutcome::None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let Row::Field(field) = self.focused_row() else {
            return;
        };
        if let Some(buffer) = self.editor.as_mut() {
            let accepted = match field.kind() {
                FieldKind::Number => c.is_ascii_digit() || (c == '-' && buffer.is_empty()),
                _ => !c.is_control(),
            };
            if accepted {
                buffer.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.editor.as_mut() {
            buffer.pop();
        }
    }

    /// Writes the editor buffer into the focused field.
    pub fn commit_edit(&mut self) {
        let Some(buffer) = self.editor.take() else {
            return;
        };
        if let Row::Field(field) = self.focused_row()
            && let Some(slot) = self.text_mut(field)
        {
            *slot = buffer;
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Parses and validates the three threshold fields.
    ///
    /// # Errors
    /// Returns a user-facing message for non-numeric, out-of-range or
    /// out-of-order values.
    pub fn thresholds(&self) -> Result<Thresholds> {
        let parse = |name: &str, raw: &str| -> Result<i64> {
            raw.trim()
                .parse::<i64>()
                .ok()
                .with_context(|| format!("{name} threshold must be a whole number"))
        };
        let medium = parse("Medium", &self.medium)?;
        let high = parse("High", &self.high)?;
        let critical = parse("Critical", &self.critical)?;
        Thresholds::new(medium, high, critical)
    }

    /// The loaded settings with only the thresholds replaced.
    ///
    /// # Errors
    /// Same conditions as [`SettingsForm::thresholds`].
    pub fn thresholds_update(&self) -> Result<Settings> {
        let mut settings = self.base.clone();
        settings.risk_thresholds = self.thresholds()?;
        Ok(settings)
    }

    /// The complete settings document built from every field.
    ///
    /// Fields the form does not show are carried over from the loaded copy.
    ///
    /// # Errors
    /// Returns a user-facing message naming the first invalid field.
    pub fn build_settings(&self) -> Result<Settings> {
        let mut settings = self.base.clone();
        settings.risk_thresholds = self.thresholds()?;
        settings.session_management.max_strikes = parse_count("Max strikes", &self.max_strikes)?;
        settings.session_management.session_timeout =
            parse_count("Session timeout", &self.session_timeout)?;
        settings.dashboard.refresh_interval = self.refresh_interval;
        settings.dashboard.max_events = self.max_events;
        settings.alerts.email_enabled = self.email_enabled;
        settings.alerts.slack_enabled = self.slack_enabled;
        settings.alerts.email_recipients = self
            .email_recipients
            .split(',')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .collect();
        settings.logs.retention_days = self.retention_days;
        settings.logs.log_level.clone_from(&self.log_level);
        Ok(settings)
    }

    // ------------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------------

    pub fn row_views(&self) -> Vec<FormRowView> {
        ROWS.iter()
            .enumerate()
            .map(|(index, &row)| {
                let focused = index == self.focus;
                let editing = focused && self.editor.is_some();
                let (label, value) = match row {
                    Row::Section(title) => (title.to_string(), String::new()),
                    Row::Button(button) => (button.label().to_string(), String::new()),
                    Row::Field(field) => {
                        let value = if editing {
                            self.editor.clone().unwrap_or_default()
                        } else {
                            self.display_value(field)
                        };
                        (field.label().to_string(), value)
                    }
                };
                FormRowView {
                    row,
                    label,
                    value,
                    focused,
                    editing,
                }
            })
            .collect()
    }

    fn display_value(&self, field: Field) -> String {
        match field {
            Field::RefreshInterval => match self.refresh_interval {
                1 => "1 second".to_string(),
                secs => format!("{secs} seconds"),
            },
            Field::MaxEvents => match self.max_events {
                -1 => "All events".to_string(),
                n => format!("{n} events"),
            },
            Field::RetentionDays => match self.retention_days {
                365 => "1 year".to_string(),
                days => format!("{days} days"),
            },
            Field::LogLevel => self.log_level.clone(),
            Field::EmailEnabled => on_off(self.email_enabled),
            Field::SlackEnabled => on_off(self.slack_enabled),
            _ => self.text(field).to_string(),
        }
    }

    fn text(&self, field: Field) -> &str {
        match field {
            Field::Medium => &self.medium,
            Field::High => &self.high,
            Field::Critical => &self.critical,
            Field::MaxStrikes => &self.max_strikes,
            Field::SessionTimeout => &self.session_timeout,
            Field::EmailRecipients => &self.email_recipients,
            _ => "",
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Medium => Some(&mut self.medium),
            Field::High => Some(&mut self.high),
            Field::Critical => Some(&mut self.critical),
            Field::MaxStrikes => Some(&mut self.max_strikes),
            Field::SessionTimeout => Some(&mut self.session_timeout),
            Field::EmailRecipients => Some(&mut self.email_recipients),
            _ => None,
        }
    }

    fn toggle(&mut self, field: Field) {
        match field {
            Field::EmailEnabled => self.email_enabled = !self.email_enabled,
            Field::SlackEnabled => self.slack_enabled = !self.slack_enabled,
            _ => {}
        }
    }
}

fn first_focusable() -> usize {
    ROWS.iter().position(|row| row.is_focusable()).unwrap_or(0)
}

fn on_off(enabled: bool) -> String {
    if enabled { "[x] enabled" } else { "[ ] disabled" }.to_string()
}

fn parse_count(name: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .with_context(|| format!("{name} must be a whole number"))
}

/// Next (or previous) choice after `current`, wrapping. Unknown values
/// start from the first choice.
fn step<T: Copy + PartialEq>(choices: &[T], current: &T, forward: bool) -> T {
    let Some(index) = choices.iter().position(|c| c == current) else {
        return choices[0];
    };
    let len = choices.len();
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    choices[next]
}
