//! All-or-nothing fetch of the three polled collections.

use serde::Serialize;

use crate::api::{ActiveSession, Alert, ApiClient, ApiResult, SecurityEvent};

/// Alerts, sessions and events fetched in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub alerts: Vec<Alert>,
    pub sessions: Vec<ActiveSession>,
    pub events: Vec<SecurityEvent>,
}

/// Fetches the three collections concurrently.
///
/// Fails as a whole if any single request fails, so callers never see a
/// partial snapshot.
pub async fn fetch_snapshot(client: &ApiClient) -> ApiResult<Snapshot> {
    let (alerts, sessions, events) = tokio::try_join!(
        client.alerts(),
        client.active_sessions(),
        client.all_events()
    )?;
    Ok(Snapshot {
        alerts,
        sessions,
        events,
    })
}
