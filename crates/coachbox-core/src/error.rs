//! Error types for coachbox.
//!
//! One unified error type with explicit variants for transport,
//! authentication, protocol, storage and input validation failures. The
//! session-ending case is always [`AuthError::SessionExpired`], so callers can
//! branch on it without string matching.

use std::fmt;
use thiserror::Error;

/// The unified error type for coachbox operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (expired session, rejected login).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success responses outside the session path.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Credential store failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (bad API URL, unencodable header).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if the session is gone and the user must log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Auth(AuthError::SessionExpired))
    }

    /// Returns true for transport-level failures, which are safe to retry.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The session can no longer be renewed; an explicit login is required.
    #[error("session expired")]
    SessionExpired,

    /// The backend rejected the login credentials.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// A non-success HTTP response outside the session path.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error detail from the server (if present).
    pub detail: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref detail) = self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }
}

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The persisted document could not be parsed.
    #[error("corrupt credential document at {path}: {message}")]
    Corrupt { path: String, message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A header value could not be encoded (e.g. control characters in a token).
    #[error("invalid header value for {name}")]
    Header { name: &'static str },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_is_distinguished() {
        let err = Error::from(AuthError::SessionExpired);
        assert!(err.is_session_expired());
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "authentication error: session expired");
    }

    #[test]
    fn transport_is_not_session_expired() {
        let err = Error::from(TransportError::Timeout);
        assert!(err.is_transport());
        assert!(!err.is_session_expired());
    }

    #[test]
    fn protocol_error_display_includes_detail() {
        let err = ProtocolError::new(404, Some("Athlete not found".to_string()));
        assert_eq!(err.to_string(), "HTTP 404: Athlete not found");
        assert_eq!(ProtocolError::new(503, None).to_string(), "HTTP 503");
    }
}
