//! Health command handler.

use anyhow::{Context, Result};
use comfy_table::Table;
use pamdash_core::api::ApiClient;
use pamdash_core::config::Config;
use pamdash_core::health::{HealthStatus, component_rows};
use pamdash_core::logging;

pub async fn run(config: &Config) -> Result<()> {
    logging::init_stderr_logging(config.log_filter.as_deref());
    let client = ApiClient::from_config(config)?;
    let report = client
        .system_health()
        .await
        .with_context(|| format!("health check against {}", client.base_url()))?;

    let mut table = Table::new();
    table.set_header(vec!["Component", "Status", "Level"]);
    for row in component_rows(&report) {
        let level = match row.level {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        };
        table.add_row(vec![row.label.to_string(), row.status, level.to_string()]);
    }
    println!("{table}");
    Ok(())
}
