//! Effect handlers.
//!
//! Handlers are pure async functions that return `UiEvent`. The runtime uses
//! `spawn_effect` / `spawn_task` to spawn them and send results to the inbox.
//! Failures are turned into the message the user sees here, so the reducer
//! only ever handles strings.

use pamdash_core::api::{ApiClient, ApiError, ApiErrorKind, ClearScope, Settings};
use pamdash_core::snapshot::fetch_snapshot;
use tokio::time::{self, MissedTickBehavior};

use super::inbox::UiEventSender;
use crate::events::UiEvent;
use crate::state::{CycleId, PollRestart};

/// Days of logs included in an export.
pub const EXPORT_RANGE_DAYS: u32 = 30;

/// Picks the toast text for a failed auxiliary request: one message when the
/// server answered with an error status, another when it could not be reached.
fn failure_message(err: &ApiError, rejected: &str, unreachable: &str) -> String {
    if err.kind == ApiErrorKind::HttpStatus {
        rejected.to_string()
    } else {
        unreachable.to_string()
    }
}

// ============================================================================
// Polling
// ============================================================================

pub async fn fetch_cycle(client: ApiClient, cycle: CycleId) -> UiEvent {
    let result = fetch_snapshot(&client).await.map_err(|err| {
        tracing::warn!(cycle = cycle.0, kind = %err.kind, error = %err, "fetch failed");
        err.to_string()
    });
    UiEvent::CycleFinished { cycle, result }
}

/// Sends `PollTick` every period until the token is cancelled.
///
/// The first tick fires one full period after start; the startup fetch is
/// issued separately.
pub async fn poll_timer(tx: UiEventSender, restart: PollRestart) {
    let PollRestart {
        generation,
        interval,
        cancel,
        ..
    } = restart;
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(generation, "poll timer cancelled");
                break;
            }
            _ = ticker.tick() => {
                if tx.send(UiEvent::PollTick { generation }).is_err() {
                    break;
                }
            }
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

pub async fn load_settings(client: ApiClient) -> UiEvent {
    let result = client.settings().await.map_err(|err| {
        tracing::warn!(kind = %err.kind, error = %err, "settings request failed");
        err.to_string()
    });
    UiEvent::SettingsLoaded(result)
}

pub async fn save_settings(client: ApiClient, settings: Settings) -> UiEvent {
    let result = client.save_settings(&settings).await.map_err(|err| {
        tracing::warn!(kind = %err.kind, error = %err, "settings save failed");
        if err.is_server_message() {
            err.message
        } else {
            "Failed to save settings".to_string()
        }
    });
    UiEvent::SettingsSaved(result)
}

// ============================================================================
// Maintenance actions
// ============================================================================

pub async fn check_health(client: ApiClient) -> UiEvent {
    let result = client.system_health().await.map_err(|err| {
        tracing::warn!(kind = %err.kind, error = %err, "health check failed");
        failure_message(&err, "Failed to check system health", "Health check failed")
    });
    UiEvent::HealthChecked(result)
}

pub async fn export_logs(client: ApiClient) -> UiEvent {
    let result = match client.export_logs(EXPORT_RANGE_DAYS).await {
        Ok(receipt) => match client.resolve(&receipt.download_url) {
            Ok(url) => Ok((receipt, url.to_string())),
            Err(err) => {
                tracing::warn!(error = %err, "unusable download link");
                Err("Export failed".to_string())
            }
        },
        Err(err) => {
            tracing::warn!(kind = %err.kind, error = %err, "log export failed");
            Err(failure_message(&err, "Failed to export logs", "Export failed"))
        }
    };
    UiEvent::LogsExported(result)
}

pub async fn clear_logs(client: ApiClient, scope: ClearScope) -> UiEvent {
    let result = client.clear_logs(scope).await.map_err(|err| {
        tracing::warn!(?scope, kind = %err.kind, error = %err, "clear logs failed");
        failure_message(&err, "Failed to clear logs", "Clear operation failed")
    });
    UiEvent::LogsCleared { scope, result }
}

pub async fn send_test_alert(client: ApiClient) -> UiEvent {
    let result = client.send_test_alert().await.map_err(|err| {
        tracing::warn!(kind = %err.kind, error = %err, "test alert failed");
        failure_message(&err, "Failed to send test alert", "Test alert failed")
    });
    UiEvent::TestAlertSent(result)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::*;

    fn restart(generation: u64, secs: u64) -> (PollRestart, CancellationToken) {
        let cancel = CancellationToken::new();
        let restart = PollRestart {
            generation,
            interval: Duration::from_secs(secs),
            cancel: cancel.clone(),
            previous: None,
        };
        (restart, cancel)
    }

    #[test]
    fn test_failure_message_distinguishes_status_from_transport() {
        let status = ApiError::http_status(500, "");
        let transport = ApiError::new(ApiErrorKind::Transport, "connection refused");
        assert_eq!(
            failure_message(&status, "Failed to export logs", "Export failed"),
            "Failed to export logs"
        );
        assert_eq!(
            failure_message(&transport, "Failed to export logs", "Export failed"),
            "Export failed"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timer_waits_a_full_period_before_first_tick() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (restart, cancel) = restart(3, 5);
        let handle = tokio::spawn(poll_timer(tx, restart));

        time::sleep(Duration::from_millis(4_900)).await;
        assert!(rx.try_recv().is_err());

        time::sleep(Duration::from_millis(200)).await;
        assert!(matches!(
            rx.try_recv(),
            Ok(UiEvent::PollTick { generation: 3 })
        ));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timer_stops_when_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (restart, cancel) = restart(1, 5);
        let handle = tokio::spawn(poll_timer(tx, restart));

        cancel.cancel();
        handle.await.unwrap();
        time::sleep(Duration::from_secs(20)).await;
        assert!(rx.try_recv().is_err());
    }
}
