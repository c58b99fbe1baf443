//! Component health vocabulary.

use crate::api::HealthReport;

/// Components shown in the health grid, in display order: `(key, label)`.
pub const COMPONENTS: &[(&str, &str)] = &[
    ("database", "Database"),
    ("log_watcher", "Log Watcher"),
    ("ml_model", "ML Model"),
    ("disk_space", "Disk Space"),
    ("memory_usage", "Memory"),
    ("cpu_usage", "CPU Usage"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    /// Maps a status word reported by the server.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "online" | "running" | "active" | "normal" => HealthStatus::Healthy,
            "warning" => HealthStatus::Warning,
            "critical" | "offline" | "stopped" => HealthStatus::Unhealthy,
            _ => HealthStatus::Unknown,
        }
    }
}

/// One row of the health grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHealth {
    pub label: &'static str,
    /// Raw status word, `unknown` when the server omitted the component.
    pub status: String,
    pub level: HealthStatus,
}

/// Lays out a report in [`COMPONENTS`] order.
pub fn component_rows(report: &HealthReport) -> Vec<ComponentHealth> {
    COMPONENTS
        .iter()
        .map(|(key, label)| {
            let status = report.status(key).unwrap_or("unknown").to_string();
            ComponentHealth {
                label,
                level: HealthStatus::classify(&status),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_classify_vocabulary() {
        assert_eq!(HealthStatus::classify("running"), HealthStatus::Healthy);
        assert_eq!(HealthStatus::classify("normal"), HealthStatus::Healthy);
        assert_eq!(HealthStatus::classify("warning"), HealthStatus::Warning);
        assert_eq!(HealthStatus::classify("stopped"), HealthStatus::Unhealthy);
        assert_eq!(HealthStatus::classify("Online"), HealthStatus::Unknown);
    }

    #[test]
    fn test_missing_components_are_unknown() {
        let report = HealthReport(BTreeMap::from([
            ("database".to_string(), "online".to_string()),
            ("cpu_usage".to_string(), "critical".to_string()),
        ]));
        let rows = component_rows(&report);
        assert_eq!(rows.len(), COMPONENTS.len());
        assert_eq!(rows[0].level, HealthStatus::Healthy);
        assert_eq!(rows[1].status, "unknown");
        assert_eq!(rows[5].level, HealthStatus::Unhealthy);
    }
}
