//! Summary figures derived from a snapshot.

use serde::Serialize;

use crate::api::Alert;
use crate::risk::{RiskLevel, Thresholds};

/// Maximum rows in the high-risk list.
pub const HIGH_RISK_LIMIT: usize = 10;

/// Static label for the system-health card.
pub const SYSTEM_HEALTH_LABEL: &str = "Normal";

/// Figures for the four dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub active_sessions: usize,
    pub critical_alerts: usize,
    pub total_anomalies: usize,
    pub system_health: &'static str,
}

impl Summary {
    pub fn derive(alerts: &[Alert], session_count: usize, thresholds: &Thresholds) -> Self {
        let critical_alerts = alerts
            .iter()
            .filter(|alert| thresholds.classify(alert.event.risk_score) == RiskLevel::Critical)
            .count();
        Self {
            active_sessions: session_count,
            critical_alerts,
            total_anomalies: alerts.len(),
            system_health: SYSTEM_HEALTH_LABEL,
        }
    }
}

/// First [`HIGH_RISK_LIMIT`] alerts at or above the high boundary, in delivery order.
pub fn high_risk_alerts<'a>(alerts: &'a [Alert], thresholds: &Thresholds) -> Vec<&'a Alert> {
    alerts
        .iter()
        .filter(|alert| thresholds.classify(alert.event.risk_score) >= RiskLevel::High)
        .take(HIGH_RISK_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::api::{EventActor, SecurityEvent};

    fn alert(score: u8) -> Alert {
        Alert::from(SecurityEvent {
            time: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            action: "DELETE_TABLE".to_string(),
            risk_score: score,
            user: EventActor {
                role: "Database Admin".to_string(),
            },
            details: None,
        })
    }

    #[test]
    fn test_summary_counts() {
        let alerts = vec![alert(50), alert(85), alert(97)];
        let summary = Summary::derive(&alerts, 2, &Thresholds::default());
        assert_eq!(summary.total_anomalies, 3);
        assert_eq!(summary.critical_alerts, 1);
        assert_eq!(summary.active_sessions, 2);
        assert_eq!(summary.system_health, "Normal");
    }

    #[test]
    fn test_high_risk_list_keeps_order() {
        let alerts = vec![alert(50), alert(85), alert(97)];
        let scores: Vec<u8> = high_risk_alerts(&alerts, &Thresholds::default())
            .iter()
            .map(|a| a.event.risk_score)
            .collect();
        assert_eq!(scores, vec![85, 97]);
    }

    #[test]
    fn test_high_risk_list_is_capped() {
        let alerts: Vec<Alert> = (0..15).map(|i| alert(80 + i)).collect();
        let list = high_risk_alerts(&alerts, &Thresholds::default());
        assert_eq!(list.len(), HIGH_RISK_LIMIT);
        assert_eq!(list[0].event.risk_score, 80);
        assert_eq!(list[9].event.risk_score, 89);
    }

    #[test]
    fn test_empty_alerts() {
        let summary = Summary::derive(&[], 0, &Thresholds::default());
        assert_eq!(summary.total_anomalies, 0);
        assert_eq!(summary.critical_alerts, 0);
        assert!(high_risk_alerts(&[], &Thresholds::default()).is_empty());
    }
}
