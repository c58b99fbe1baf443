//! Client and wire types for the security-event service.

mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use types::{
    ActiveSession, Alert, AlertChannels, ClearScope, DashboardPrefs, EventActor, ExportReceipt,
    HealthReport, LogPolicy, SecurityEvent, SessionManagement, Settings, TestAlertReceipt,
};
