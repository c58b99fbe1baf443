//! Snapshot command handler.
//!
//! Runs a single fetch cycle and prints what the dashboard would show.

use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table};
use pamdash_core::api::{ApiClient, SecurityEvent};
use pamdash_core::config::Config;
use pamdash_core::dashboard::{Summary, high_risk_alerts};
use pamdash_core::risk::Thresholds;
use pamdash_core::snapshot::{Snapshot, fetch_snapshot};
use pamdash_core::{actions, logging};
use serde_json::json;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn run(config: &Config, as_json: bool) -> Result<()> {
    logging::init_stderr_logging(config.log_filter.as_deref());
    let client = ApiClient::from_config(config)?;

    // Classification follows the server's thresholds when it will tell us.
    let thresholds = match client.settings().await {
        Ok(settings) => settings.risk_thresholds,
        Err(err) => {
            tracing::warn!(error = %err, "settings unavailable; using default thresholds");
            Thresholds::default()
        }
    };

    let snapshot = fetch_snapshot(&client)
        .await
        .with_context(|| format!("fetch from {}", client.base_url()))?;
    let summary = Summary::derive(&snapshot.alerts, snapshot.sessions.len(), &thresholds);

    if as_json {
        let high_risk: Vec<_> = high_risk_alerts(&snapshot.alerts, &thresholds);
        let doc = json!({
            "summary": summary,
            "thresholds": thresholds,
            "highRisk": high_risk,
            "sessions": snapshot.sessions,
            "events": snapshot.events,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    print_tables(&snapshot, &summary, &thresholds);
    Ok(())
}

fn print_tables(snapshot: &Snapshot, summary: &Summary, thresholds: &Thresholds) {
    let mut cards = Table::new();
    cards.set_header(vec![
        "Active Sessions",
        "Critical Alerts",
        "Total Anomalies",
        "System Health",
    ]);
    cards.add_row(vec![
        summary.active_sessions.to_string(),
        summary.critical_alerts.to_string(),
        summary.total_anomalies.to_string(),
        summary.system_health.to_string(),
    ]);
    println!("{cards}");

    println!("\nHigh-risk alerts");
    let high_risk: Vec<&SecurityEvent> = high_risk_alerts(&snapshot.alerts, thresholds)
        .into_iter()
        .map(|alert| &alert.event)
        .collect();
    println!("{}", event_table(&high_risk, thresholds));

    println!("\nActive sessions");
    let mut sessions = table();
    sessions.set_header(vec!["Email", "Role", "Login Time", "Strikes"]);
    for session in &snapshot.sessions {
        sessions.add_row(vec![
            session.email.clone(),
            session.role.clone(),
            session.login_time.format(TIME_FORMAT).to_string(),
            session.strike_count.to_string(),
        ]);
    }
    println!("{sessions}");

    println!("\nEvents");
    let events: Vec<&SecurityEvent> = snapshot.events.iter().collect();
    println!("{}", event_table(&events, thresholds));
}

fn table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn event_table(events: &[&SecurityEvent], thresholds: &Thresholds) -> Table {
    let mut table = table();
    table.set_header(vec!["Time", "Role", "Action", "Risk", "Description"]);
    for event in events {
        let level = thresholds.classify(event.risk_score);
        table.add_row(vec![
            event.time.format(TIME_FORMAT).to_string(),
            event.user.role.clone(),
            event.action.clone(),
            format!("{} ({})", level.label(), event.risk_score),
            actions::describe(&event.action).to_string(),
        ]);
    }
    table
}
