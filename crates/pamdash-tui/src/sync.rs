//! Poll scheduling and fetch-cycle bookkeeping.
//!
//! Scheduled refreshes pass through [`evaluate`] first; a suppressed tick
//! makes no network call. Manual refresh skips the policy entirely and never
//! touches the pause flag, so the flag always reads as the user left it.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use pamdash_core::config::validate_refresh_interval;
use pamdash_core::snapshot::Snapshot;
use tokio::time::Instant;

use crate::effects::UiEffect;
use crate::state::{CycleId, Store, TuiState};

/// Reason a scheduled refresh was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    SettingsOpen,
    RecentInteraction,
    Paused,
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Suppression::SettingsOpen => "settings page open",
            Suppression::RecentInteraction => "recent user interaction",
            Suppression::Paused => "auto-refresh paused",
        })
    }
}

/// Applies the suppression rules in order. The first match wins.
pub fn evaluate(store: &Store, debounce: Duration, now: Instant) -> Option<Suppression> {
    if store.route().is_settings() {
        return Some(Suppression::SettingsOpen);
    }
    if store
        .last_interaction()
        .is_some_and(|at| now.saturating_duration_since(at) < debounce)
    {
        return Some(Suppression::RecentInteraction);
    }
    if store.is_paused() {
        return Some(Suppression::Paused);
    }
    None
}

/// Policy-checked cycle start. Returns `None` when suppressed.
pub fn scheduled_cycle(tui: &mut TuiState, now: Instant) -> Option<UiEffect> {
    if let Some(reason) = evaluate(&tui.store, tui.config.interaction_debounce(), now) {
        tracing::debug!(%reason, "skipping scheduled refresh");
        return None;
    }
    Some(start_cycle(&mut tui.store))
}

/// Unconditional cycle start.
pub fn start_cycle(store: &mut Store) -> UiEffect {
    let cycle = store.begin_cycle();
    tracing::debug!(cycle = cycle.0, "starting fetch cycle");
    UiEffect::FetchCycle { cycle }
}

/// Handles a timer tick. Ticks from a replaced timer are dropped.
pub fn on_poll_tick(tui: &mut TuiState, generation: u64, now: Instant) -> Option<UiEffect> {
    if !tui.store.is_current_poll(generation) {
        tracing::trace!(generation, "ignoring tick from replaced timer");
        return None;
    }
    scheduled_cycle(tui, now)
}

/// Runs exactly one cycle regardless of pause state and shows a notice.
pub fn manual_refresh(tui: &mut TuiState) -> UiEffect {
    tui.toasts.info("Data refreshed manually");
    start_cycle(&mut tui.store)
}

/// Installs a finished cycle. Failed cycles leave the store untouched.
pub fn on_cycle_finished(store: &mut Store, cycle: CycleId, result: Result<Snapshot, String>) {
    match result {
        Ok(snapshot) => {
            if !store.install_snapshot(cycle, snapshot) {
                tracing::debug!(cycle = cycle.0, "dropping results from superseded cycle");
                return;
            }
            if !store.route().is_settings() {
                store.request_render();
            }
        }
        Err(error) => {
            tracing::warn!(cycle = cycle.0, %error, "fetch cycle failed; keeping previous data");
        }
    }
}

/// Starts (or restarts) the poll timer at the given period.
pub fn start_timer(store: &mut Store, interval: Duration) -> UiEffect {
    let restart = store.replace_poll_timer(interval);
    tracing::info!(
        generation = restart.generation,
        interval_secs = interval.as_secs(),
        "poll timer started"
    );
    UiEffect::StartPollTimer(restart)
}

/// Switches the poll period, replacing the live timer.
///
/// # Errors
/// Returns an error for periods outside the accepted choices.
pub fn reconfigure_timer(tui: &mut TuiState, secs: u64) -> Result<UiEffect> {
    validate_refresh_interval(secs)?;
    tui.config.refresh_interval_secs = secs;
    Ok(start_timer(&mut tui.store, Duration::from_secs(secs)))
}

/// Stops the poll timer (on quit).
pub fn stop_timer(store: &mut Store) -> Option<UiEffect> {
    store
        .take_poll_cancel()
        .map(|token| UiEffect::StopPollTimer { token })
}

#[cfg(test)]
mod tests {
    use pamdash_core::api::{ActiveSession, Alert, EventActor, SecurityEvent};
    use pamdash_core::config::Config;

    use super::*;
    use crate::state::{Page, Route};

    fn tui() -> TuiState {
        TuiState::new(Config::default(), Route::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppression_order() {
        let mut tui = tui();
        let debounce = Duration::from_secs(5);

        tui.store.set_paused(true);
        tui.store.record_interaction(Instant::now());
        tui.store.navigate(Route::Page(Page::Settings));
        assert_eq!(
            evaluate(&tui.store, debounce, Instant::now()),
            Some(Suppression::SettingsOpen)
        );

        tui.store.navigate(Route::Page(Page::Alerts));
        assert_eq!(
            evaluate(&tui.store, debounce, Instant::now()),
            Some(Suppression::RecentInteraction)
        );

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(
            evaluate(&tui.store, debounce, Instant::now()),
            Some(Suppression::Paused)
        );

        tui.store.set_paused(false);
        assert_eq!(evaluate(&tui.store, debounce, Instant::now()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interaction_debounce_window() {
        let mut tui = tui();
        tui.store.record_interaction(Instant::now());

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert!(scheduled_cycle(&mut tui, Instant::now()).is_none());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(matches!(
            scheduled_cycle(&mut tui, Instant::now()),
            Some(UiEffect::FetchCycle { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_ignores_pause() {
        let mut tui = tui();
        tui.store.set_paused(true);
        tui.store.record_interaction(Instant::now());

        let effect = manual_refresh(&mut tui);
        assert!(matches!(effect, UiEffect::FetchCycle { .. }));
        assert!(tui.store.is_paused());
        assert_eq!(
            tui.toasts.latest().map(|t| t.message.as_str()),
            Some("Data refreshed manually")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_tick_is_ignored() {
        let mut tui = tui();
        let UiEffect::StartPollTimer(first) = start_timer(&mut tui.store, Duration::from_secs(5))
        else {
            panic!("expected timer effect");
        };
        let second = reconfigure_timer(&mut tui, 10).unwrap();
        assert!(matches!(second, UiEffect::StartPollTimer(ref r) if r.previous.is_some()));

        assert!(on_poll_tick(&mut tui, first.generation, Instant::now()).is_none());
        assert!(on_poll_tick(&mut tui, first.generation + 1, Instant::now()).is_some());
        assert_eq!(tui.config.refresh_interval_secs, 10);
    }

    #[test]
    fn test_reconfigure_rejects_unknown_interval() {
        let mut tui = tui();
        assert!(reconfigure_timer(&mut tui, 7).is_err());
    }

    fn populated_snapshot() -> Snapshot {
        let time = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let event = SecurityEvent {
            time,
            action: "DROP_DATABASE".to_string(),
            risk_score: 97,
            user: EventActor {
                role: "Database Admin".to_string(),
            },
            details: None,
        };
        Snapshot {
            alerts: vec![Alert::from(event.clone())],
            sessions: vec![ActiveSession {
                email: "dba@company.com".to_string(),
                role: "Database Admin".to_string(),
                login_time: time,
                strike_count: 1,
            }],
            events: vec![event],
        }
    }

    #[test]
    fn test_failed_cycle_keeps_previous_data() {
        let mut store = Store::new(Route::default(), Duration::from_secs(5));
        let first = store.begin_cycle();
        let installed = populated_snapshot();
        on_cycle_finished(&mut store, first, Ok(installed.clone()));
        store.take_render_request();

        let second = store.begin_cycle();
        on_cycle_finished(&mut store, second, Err("HTTP 500".to_string()));
        assert_eq!(store.last_applied_cycle(), Some(first));
        assert_eq!(store.alerts(), installed.alerts.as_slice());
        assert_eq!(store.sessions(), installed.sessions.as_slice());
        assert_eq!(store.events(), installed.events.as_slice());
        assert!(!store.take_render_request());
    }

    #[test]
    fn test_install_on_settings_page_does_not_render() {
        let mut store = Store::new(Route::Page(Page::Settings), Duration::from_secs(5));
        store.take_render_request();
        let cycle = store.begin_cycle();
        on_cycle_finished(&mut store, cycle, Ok(Snapshot::default()));
        assert_eq!(store.last_applied_cycle(), Some(cycle));
        assert!(!store.take_render_request());
    }
}
