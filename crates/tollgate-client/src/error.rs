//! Client error types.

use thiserror::Error;

/// Client error type.
///
/// Transport failures (`Http`) carry no response. Server failures (`Api`)
/// carry the status and the response body exactly as it was received.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message extracted from the body, or `HTTP <status>`.
        message: String,
        /// Raw response body.
        body: String,
    },

    /// The request was rejected locally before being sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential storage failed.
    #[error("Credential store error: {0}")]
    Store(String),
}

impl Error {
    /// HTTP status of a server-level error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(status) if status >= 500)
    }

    /// Check if the failure happened at the network level (no response).
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(e) if e.status().is_none() && !e.is_decode())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pull a readable message out of an error body.
///
/// Backends disagree on the field name, so `message`, `detail` and `error`
/// are tried in that order.
pub(crate) fn message_from_body(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            status,
            message: String::new(),
            body: String::new(),
        }
    }

    #[test]
    fn test_status_predicates() {
        assert!(api(401).is_unauthorized());
        assert!(!api(403).is_unauthorized());
        assert!(api(404).is_not_found());
        assert!(api(502).is_server_error());
        assert!(!api(499).is_server_error());
        assert!(!api(401).is_network());
    }

    #[test]
    fn test_message_from_body() {
        assert_eq!(
            message_from_body(400, r#"{"message":"bad email"}"#),
            "bad email"
        );
        assert_eq!(
            message_from_body(401, r#"{"detail":"token expired"}"#),
            "token expired"
        );
        assert_eq!(message_from_body(500, "<html>oops</html>"), "HTTP 500");
        assert_eq!(message_from_body(422, r#"{"error":{"code":1}}"#), "HTTP 422");
    }
}
