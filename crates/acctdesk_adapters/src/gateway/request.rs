use acctdesk_core::ApiError;
use serde_json::Value;

/// HTTP method for gateway requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

/// Outgoing request, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Response as received from the transport, before unwrapping
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body: JSON when possible, text otherwise, `None` when empty
    pub fn payload(&self) -> Option<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice(&self.body) {
            Ok(value) => Some(value),
            Err(_) => Some(Value::String(
                String::from_utf8_lossy(&self.body).into_owned(),
            )),
        }
    }

    /// Unwrapped success payload handed to callers
    pub fn into_payload(self) -> Value {
        self.payload().unwrap_or(Value::Null)
    }
}

/// Failure below HTTP: connect, timeout, invalid URL, or a request stage refusing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Everything known about a failed call, as seen by failure stages
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayFailure {
    pub status: Option<u16>,
    pub body: Option<Value>,
    pub transport_message: Option<String>,
}

impl GatewayFailure {
    pub fn from_response(response: &RawResponse) -> Self {
        Self {
            status: Some(response.status),
            body: response.payload(),
            transport_message: Some(format!(
                "request failed with status code {}",
                response.status
            )),
        }
    }

    pub fn from_transport(error: TransportError) -> Self {
        Self {
            status: None,
            body: None,
            transport_message: Some(error.message),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    pub fn normalize(&self) -> ApiError {
        ApiError::normalize(
            self.status,
            self.body.as_ref(),
            self.transport_message.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &[u8]) -> RawResponse {
        RawResponse {
            status,
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_payload_decoding() {
        assert_eq!(response(200, b"").payload(), None);
        assert_eq!(response(200, b" \n").payload(), None);
        assert_eq!(
            response(200, br#"{"ok": true}"#).payload(),
            Some(json!({"ok": true}))
        );
        assert_eq!(
            response(502, b"<html>Bad Gateway</html>").payload(),
            Some(json!("<html>Bad Gateway</html>"))
        );
    }

    #[test]
    fn test_empty_success_unwraps_to_null() {
        assert_eq!(response(204, b"").into_payload(), Value::Null);
    }

    #[test]
    fn test_failure_from_structured_response() {
        let failure = GatewayFailure::from_response(&response(404, br#"{"detail": "not found"}"#));
        assert_eq!(failure.status, Some(404));
        assert_eq!(failure.normalize().message, "not found");
    }

    #[test]
    fn test_failure_from_unstructured_response() {
        let failure = GatewayFailure::from_response(&response(500, b"oops"));
        assert_eq!(
            failure.normalize().message,
            "request failed with status code 500"
        );
    }

    #[test]
    fn test_failure_from_transport() {
        let failure = GatewayFailure::from_transport(TransportError::new("connection refused"));
        let err = failure.normalize();
        assert_eq!(err.status, None);
        assert_eq!(err.message, "connection refused");
        assert!(!failure.is_unauthorized());
    }

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::put("/admin/accounts-config")
            .header("x-trace", "1")
            .json(json!([]));
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.headers, vec![("x-trace".to_string(), "1".to_string())]);
        assert_eq!(request.body, Some(json!([])));
    }
}
