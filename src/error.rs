use serde_json::Value;
use thiserror::Error;

/// Main error type for ODK Central API operations
#[derive(Debug, Error)]
pub enum OdkError {
    /// Error reported by the Central server as a `code`/`message` JSON body
    #[error("ODK Central API error {code}: {message}")]
    Api {
        /// Central error code, e.g. `401.2` or `404.1`
        code: String,
        message: String,
        /// HTTP status of the response carrying the error body
        status: Option<u16>,
    },

    /// Operation requires an authentication mode or state the client is not in
    #[error("authentication error: {0}")]
    Auth(String),

    /// Connection/DNS/TLS/timeout failure at the transport layer
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization error (QR settings payload)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error, surfaces a malformed base URL at request time
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// QR encode/decode failure
    #[error("QR code error: {0}")]
    Qr(String),

    /// Base64 decoding error (QR settings payload)
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// IO error (settings compression)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OdkError {
    /// Build an API error from a decoded response body carrying a `code` key.
    ///
    /// Central reports errors inside successful-looking JSON; the HTTP status
    /// is captured alongside so callers are not limited to body-shape
    /// inference.
    pub fn from_error_body(status: u16, body: &Value) -> Option<Self> {
        let code = body.get("code")?;
        let code = match code {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        Some(OdkError::Api {
            code,
            message,
            status: Some(status),
        })
    }

    /// The Central error code, if this is an API error
    pub fn code(&self) -> Option<&str> {
        match self {
            OdkError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if this is a not-found error (any `404.x` code)
    pub fn is_not_found(&self) -> bool {
        matches!(self, OdkError::Api { code, .. } if code.starts_with("404"))
    }

    /// Check if this is an authentication/authorization error (`401.x` or `403.x`)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, OdkError::Api { code, .. } if code.starts_with("401") || code.starts_with("403"))
    }
}

/// Result type for ODK Central operations
pub type Result<T> = std::result::Result<T, OdkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_error_body() {
        let body = json!({"code": "401.2", "message": "Could not authenticate with the provided credentials."});
        let error = OdkError::from_error_body(401, &body).unwrap();
        assert_eq!(error.code(), Some("401.2"));
        assert!(error.is_unauthorized());
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_from_error_body_numeric_code() {
        let body = json!({"code": 409, "message": "conflict"});
        let error = OdkError::from_error_body(409, &body).unwrap();
        assert_eq!(error.code(), Some("409"));
    }

    #[test]
    fn test_body_without_code_is_not_an_error() {
        let body = json!({"id": 1, "name": "default"});
        assert!(OdkError::from_error_body(200, &body).is_none());
    }

    #[test]
    fn test_not_found() {
        let body = json!({"code": "404.1", "message": "Could not find the resource you were looking for."});
        let error = OdkError::from_error_body(404, &body).unwrap();
        assert!(error.is_not_found());
    }
}
