//! HTTP client for the security-event service.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::error::{ApiError, ApiErrorKind, ApiResult};
use super::types::{
    ActiveSession, Alert, ClearScope, ExportReceipt, HealthReport, SecurityEvent, Settings,
    StatusBody, TestAlertReceipt,
};
use crate::config::Config;

const ALERTS_PATH: &str = "get_alerts";
const SESSIONS_PATH: &str = "api/active_sessions";
const EVENTS_PATH: &str = "api/all_events";
const SETTINGS_PATH: &str = "api/settings";
const HEALTH_PATH: &str = "api/system-health";
const EXPORT_PATH: &str = "api/export-logs";
const CLEAR_LOGS_PATH: &str = "api/clear-logs";
const TEST_ALERT_PATH: &str = "api/send-test-alert";

/// Client for the security-event service.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid server URL: {base_url}"))?;
        // Relative joins below must keep any path prefix.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { http, base_url })
    }

    /// Creates a client from the loaded configuration.
    ///
    /// # Errors
    /// Same conditions as [`ApiClient::new`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.server_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a server-relative link (e.g. a download URL) against the base.
    ///
    /// # Errors
    /// Returns an error if the joined URL is invalid.
    pub fn resolve(&self, link: &str) -> Result<Url> {
        self.base_url
            .join(link)
            .with_context(|| format!("Invalid link from server: {link}"))
    }

    /// Fetches the high-risk alert list.
    pub async fn alerts(&self) -> ApiResult<Vec<Alert>> {
        let events: Vec<SecurityEvent> = self.get(ALERTS_PATH).await?;
        Ok(events.into_iter().map(Alert::from).collect())
    }

    pub async fn active_sessions(&self) -> ApiResult<Vec<ActiveSession>> {
        self.get(SESSIONS_PATH).await
    }

    pub async fn all_events(&self) -> ApiResult<Vec<SecurityEvent>> {
        self.get(EVENTS_PATH).await
    }

    pub async fn settings(&self) -> ApiResult<Settings> {
        self.get(SETTINGS_PATH).await
    }

    /// Sends the complete settings document.
    ///
    /// On rejection the server's `error` text is the error message.
    pub async fn save_settings(&self, settings: &Settings) -> ApiResult<()> {
        let _: StatusBody = self.post(SETTINGS_PATH, settings).await?;
        Ok(())
    }

    pub async fn system_health(&self) -> ApiResult<HealthReport> {
        self.get(HEALTH_PATH).await
    }

    /// Requests an archive of the last `date_range_days` days of logs.
    pub async fn export_logs(&self, date_range_days: u32) -> ApiResult<ExportReceipt> {
        self.post(EXPORT_PATH, &json!({ "date_range": date_range_days }))
            .await
    }

    /// Clears stored log entries. Returns the server's status text.
    pub async fn clear_logs(&self, scope: ClearScope) -> ApiResult<String> {
        let body: StatusBody = self
            .post(CLEAR_LOGS_PATH, &json!({ "action": scope }))
            .await?;
        Ok(body.status.unwrap_or_else(|| "Logs cleared".to_string()))
    }

    pub async fn send_test_alert(&self) -> ApiResult<TestAlertReceipt> {
        self.post(TEST_ALERT_PATH, &json!({})).await
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::new(ApiErrorKind::Transport, format!("Bad URL {path}: {err}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::http_status(status.as_u16(), &body));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::new(ApiErrorKind::Parse, format!("Invalid response: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = ApiClient::new("http://10.0.0.5:8080/pam", None).unwrap();
        assert_eq!(client.base_url().as_str(), "http://10.0.0.5:8080/pam/");
        assert_eq!(
            client.endpoint(SETTINGS_PATH).unwrap().as_str(),
            "http://10.0.0.5:8080/pam/api/settings"
        );
    }

    #[test]
    fn test_resolve_download_link() {
        let client = ApiClient::new("http://127.0.0.1:5000", None).unwrap();
        assert_eq!(
            client.resolve("/download/logs_20240501.zip").unwrap().as_str(),
            "http://127.0.0.1:5000/download/logs_20240501.zip"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url", None).is_err());
    }
}
