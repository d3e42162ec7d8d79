//! Error types for the OneDrive Console client.
//!
//! All public API surfaces in this crate return `ConsoleResult<T>`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Convenience alias.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Error codes for console operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsoleErrorCode {
    /// Login redirect or code exchange failed, or the token was rejected.
    AuthFailed,
    /// The operation needs a session token and none is held.
    NotLoggedIn,
    /// The operation needs a selected identifier and none was entered.
    MissingIdentifier,
    /// Bad request / invalid parameter.
    InvalidRequest,
    /// Resource not found (HTTP 404).
    NotFound,
    /// Network / connectivity error.
    NetworkError,
    /// (De)serialization error.
    SerializationError,
    /// Reading or writing the session store failed.
    StorageError,
    /// The operation is not offered by this client variant.
    Unavailable,
    /// Catch-all internal error.
    InternalError,
}

impl fmt::Display for ConsoleErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structured error returned by every public function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleError {
    pub code: ConsoleErrorCode,
    pub message: String,
    pub status: Option<u16>,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConsoleError {}

impl ConsoleError {
    /// Create from a code + message.
    pub fn new(code: ConsoleErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status: None,
        }
    }

    pub fn not_logged_in() -> Self {
        Self::new(ConsoleErrorCode::NotLoggedIn, "Not logged in")
    }

    pub fn missing_identifier(label: &str) -> Self {
        Self::new(
            ConsoleErrorCode::MissingIdentifier,
            format!("{} is required", label),
        )
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(ConsoleErrorCode::InvalidRequest, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ConsoleErrorCode::NetworkError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ConsoleErrorCode::InternalError, msg)
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::new(ConsoleErrorCode::AuthFailed, msg)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::new(ConsoleErrorCode::StorageError, msg)
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ConsoleErrorCode::Unavailable, msg)
    }

    /// Build an error from a non-success backend response.
    ///
    /// The backend relays Graph errors either as `{ "error": { "message" } }`,
    /// `{ "error": "..." }` or `{ "message": "..." }`; anything else falls
    /// back to a generic message.
    pub fn from_backend_response(status: u16, body: &str) -> Self {
        let code = match status {
            401 | 403 => ConsoleErrorCode::AuthFailed,
            404 => ConsoleErrorCode::NotFound,
            _ if status >= 500 => ConsoleErrorCode::InternalError,
            _ => ConsoleErrorCode::InvalidRequest,
        };

        let message = Self::parse_error_body(body)
            .unwrap_or_else(|| format!("Backend error (HTTP {})", status));

        Self {
            code,
            message,
            status: Some(status),
        }
    }

    fn parse_error_body(body: &str) -> Option<String> {
        let v: serde_json::Value = serde_json::from_str(body).ok()?;
        v["error"]["message"]
            .as_str()
            .or_else(|| v["error"].as_str())
            .or_else(|| v["message"].as_str())
            .map(String::from)
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            Self::new(
                ConsoleErrorCode::SerializationError,
                format!("Malformed response: {}", err),
            )
        } else {
            Self::internal(format!("HTTP error: {}", err))
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(
            ConsoleErrorCode::SerializationError,
            format!("JSON error: {}", err),
        )
    }
}

impl From<url::ParseError> for ConsoleError {
    fn from(err: url::ParseError) -> Self {
        Self::new(
            ConsoleErrorCode::InvalidRequest,
            format!("URL parse error: {}", err),
        )
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(format!("I/O error: {}", err))
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_logged_in() {
        let err = ConsoleError::not_logged_in();
        assert_eq!(err.code, ConsoleErrorCode::NotLoggedIn);
        assert!(err.status.is_none());
    }

    #[test]
    fn test_from_backend_response_401() {
        let body = r#"{"error":{"code":"InvalidAuthenticationToken","message":"Access token has expired"}}"#;
        let err = ConsoleError::from_backend_response(401, body);
        assert_eq!(err.code, ConsoleErrorCode::AuthFailed);
        assert_eq!(err.message, "Access token has expired");
        assert_eq!(err.status, Some(401));
    }

    #[test]
    fn test_from_backend_response_plain_message() {
        let err = ConsoleError::from_backend_response(400, r#"{"message":"fileId missing"}"#);
        assert_eq!(err.code, ConsoleErrorCode::InvalidRequest);
        assert_eq!(err.message, "fileId missing");
    }

    #[test]
    fn test_from_backend_response_unparseable() {
        let err = ConsoleError::from_backend_response(502, "bad gateway");
        assert_eq!(err.code, ConsoleErrorCode::InternalError);
        assert!(err.message.contains("502"));
    }

    #[test]
    fn test_error_display() {
        let err = ConsoleError::from_backend_response(404, r#"{"error":"no such file"}"#);
        let s = format!("{}", err);
        assert!(s.contains("no such file"));
        assert!(s.contains("HTTP 404"));
    }
}
