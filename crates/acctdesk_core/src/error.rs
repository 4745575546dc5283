use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Message used when a failure carries nothing more specific
pub const FALLBACK_MESSAGE: &str = "request failed";

/// Normalized API failure: the only error shape callers see from the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status, absent for transport-level failures
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build the human-readable error for a failed call.
    ///
    /// Priority: `detail` on the body, then `message` on the body, then the
    /// transport message, then [`FALLBACK_MESSAGE`]. Falsy values (`null`,
    /// `false`, `0`, `""`) are skipped.
    pub fn normalize(
        status: Option<u16>,
        body: Option<&Value>,
        transport_message: Option<&str>,
    ) -> Self {
        let message = body
            .and_then(|b| b.get("detail"))
            .and_then(truthy_text)
            .or_else(|| body.and_then(|b| b.get("message")).and_then(truthy_text))
            .or_else(|| {
                transport_message
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

        Self { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

// Strings are used verbatim; anything else truthy (validation lists, numbers)
// is rendered as compact JSON.
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Api(ApiError),

    #[error("invalid response from server: {0}")]
    InvalidServerResponse(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(api) if api.is_unauthorized())
    }
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        Error::Api(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
