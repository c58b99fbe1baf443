use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::ErrorBody;

/// Categories of API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Non-2xx response
    HttpStatus,
    /// Connection refused, reset, DNS failure
    Transport,
    /// Request exceeded the configured timeout
    Timeout,
    /// Body was not the expected JSON
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the security-event service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for a toast
    pub message: String,
    /// HTTP status code, when there was a response
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Creates an HTTP status error.
    ///
    /// A JSON body of the form `{"error": "..."}` becomes the message verbatim.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body).map_or_else(
            |_| format!("HTTP {status}"),
            |parsed| parsed.error,
        );
        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            status: Some(status),
        }
    }

    /// True when the server answered and explained the failure.
    pub fn is_server_message(&self) -> bool {
        self.kind == ApiErrorKind::HttpStatus && !self.message.starts_with("HTTP ")
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::new(ApiErrorKind::Timeout, format!("Request timed out: {err}"))
        } else if err.is_decode() {
            ApiError::new(ApiErrorKind::Parse, format!("Invalid response: {err}"))
        } else {
            ApiError::new(ApiErrorKind::Transport, format!("Request failed: {err}"))
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
