//! Wire types for the security-event service.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::risk::{MAX_SCORE, Thresholds};

/// Role of the user who performed an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventActor {
    pub role: String,
}

/// A single analyzed action as reported by `/api/all_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    #[serde(with = "timestamp")]
    pub time: NaiveDateTime,
    #[serde(default)]
    pub action: String,
    #[serde(rename = "riskScore", deserialize_with = "risk_score")]
    pub risk_score: u8,
    #[serde(default)]
    pub user: EventActor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl SecurityEvent {
    /// Renders the detail map as `key: value, ...` in the order the server sent.
    ///
    /// The first underscore of each key is shown as a space. Returns `None`
    /// when there are no details.
    pub fn details_line(&self) -> Option<String> {
        let details = self.details.as_ref().filter(|d| !d.is_empty())?;
        let parts: Vec<String> = details
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{}: {value}", key.replacen('_', " ", 1))
            })
            .collect();
        Some(parts.join(", "))
    }
}

/// A high-risk event from `/get_alerts` plus the reason shown next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    #[serde(flatten)]
    pub event: SecurityEvent,
    pub reason: String,
}

impl From<SecurityEvent> for Alert {
    fn from(event: SecurityEvent) -> Self {
        let reason = format!("Risk Score: {}", event.risk_score);
        Self { event, reason }
    }
}

/// A logged-in privileged session from `/api/active_sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub email: String,
    pub role: String,
    #[serde(with = "timestamp")]
    pub login_time: NaiveDateTime,
    #[serde(default)]
    pub strike_count: u32,
}

/// Full settings document from `/api/settings`.
///
/// Fields the console does not edit are kept in `extra` and sent back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub risk_thresholds: Thresholds,
    pub session_management: SessionManagement,
    pub alerts: AlertChannels,
    pub dashboard: DashboardPrefs,
    pub logs: LogPolicy,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            risk_thresholds: Thresholds::default(),
            session_management: SessionManagement {
                max_strikes: 3,
                session_timeout: 30,
            },
            alerts: AlertChannels {
                email_enabled: true,
                slack_enabled: false,
                email_recipients: vec!["security@company.com".to_string()],
                extra: Map::new(),
            },
            dashboard: DashboardPrefs {
                refresh_interval: 3,
                max_events: 50,
            },
            logs: LogPolicy {
                retention_days: 30,
                log_level: "info".to_string(),
            },
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionManagement {
    pub max_strikes: u32,
    /// Minutes of inactivity before the server logs a session out.
    pub session_timeout: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertChannels {
    pub email_enabled: bool,
    pub slack_enabled: bool,
    #[serde(default)]
    pub email_recipients: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardPrefs {
    /// Seconds.
    pub refresh_interval: u64,
    /// `-1` means all events.
    pub max_events: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPolicy {
    pub retention_days: u32,
    pub log_level: String,
}

/// Component name to status string, as returned by `/api/system-health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthReport(pub BTreeMap<String, String>);

impl HealthReport {
    pub fn status(&self, component: &str) -> Option<&str> {
        self.0.get(component).map(String::as_str)
    }
}

/// Result of `/api/export-logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    pub download_url: String,
}

/// Result of `/api/send-test-alert`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestAlertReceipt {
    pub status: Option<String>,
    pub results: Vec<String>,
}

/// Which log entries `/api/clear-logs` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearScope {
    #[serde(rename = "clear_old")]
    Old,
    #[serde(rename = "clear_all")]
    All,
}

impl ClearScope {
    /// Confirmations required before the request is sent.
    pub fn confirmations(self) -> usize {
        match self {
            ClearScope::Old => 1,
            ClearScope::All => 2,
        }
    }
}

/// Generic `{status}` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StatusBody {
    pub status: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Scores arrive as JSON numbers; anything outside [0, 100] is clamped.
fn risk_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, f64::from(MAX_SCORE)) as u8)
}

mod timestamp {
    //! ISO-8601 timestamps, with or without an offset.

    use chrono::{DateTime, Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Some(with_offset.with_timezone(&Local).naive_local());
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format("%Y-%m-%dT%H:%M:%S%.f"))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
