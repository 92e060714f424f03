//! Error types for the argus-link client library.
//!
//! Every public operation either resolves with a typed result or fails with
//! one of the [`ArgusError`] kinds below. Stream-health failures are the one
//! deliberate exception: they are reported to the observability sink instead
//! of being raised, because HTTP resource calls must keep working while the
//! event stream is degraded.

use std::fmt;

/// Convenient result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ArgusError>;

/// Coarse classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401 — the credential was rejected.
    Unauthorized,
    /// 403 — the credential lacks access to the resource.
    Forbidden,
    /// 404 — the resource does not exist.
    NotFound,
    /// Any 5xx status.
    ServerError,
    /// Any other 4xx status.
    ClientError,
    /// No response was received at all (DNS, timeout, connection refused).
    Transport,
}

impl ErrorCategory {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            s if s >= 500 => Self::ServerError,
            _ => Self::ClientError,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::ServerError => "server error",
            Self::ClientError => "client error",
            Self::Transport => "transport error",
        };
        write!(f, "{}", name)
    }
}

/// A failed request round trip.
///
/// Carries the HTTP status (absent for transport-level failures where no
/// response was received), a human-readable message, and a coarse
/// [`ErrorCategory`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct RequestFailure {
    /// HTTP status code, or `None` when no response was received.
    pub status: Option<u16>,
    /// Coarse failure classification.
    pub category: ErrorCategory,
    /// Human-readable message (server-provided when parseable).
    pub message: String,
}

impl RequestFailure {
    /// Build a failure from a non-2xx HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            category: ErrorCategory::from_status(status),
            message: message.into(),
        }
    }

    /// Build a transport-level failure (no response received).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            category: ErrorCategory::Transport,
            message: message.into(),
        }
    }
}

/// Errors surfaced by the Argus client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArgusError {
    /// Bad or missing caller input, detected locally. No network call is made.
    #[error("validation error: {0}")]
    Validation(String),

    /// A request reached the executor and failed (non-2xx or transport loss).
    #[error("request failed: {0}")]
    Request(#[from] RequestFailure),

    /// Credential validation failed during `connect()`.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A resource call was attempted while the session is not connected.
    #[error("client is not connected")]
    NotConnected,

    /// Invalid client configuration (builder misuse).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A successful response could not be decoded into the expected model.
    #[error("decode error: {0}")]
    Decode(String),

    /// Event-stream failure. Only ever surfaced from explicit stream
    /// operations; never from resource calls.
    #[error("event stream error: {0}")]
    Stream(String),

    /// An operation exceeded its configured timeout.
    #[error("operation timed out: {0}")]
    Timeout(String),
}

impl ArgusError {
    /// The request failure category, when this error wraps one.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Request(failure) => Some(failure.category),
            _ => None,
        }
    }

    /// The HTTP status code, when one was observed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(failure) => failure.status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_status() {
        assert_eq!(ErrorCategory::from_status(401), ErrorCategory::Unauthorized);
        assert_eq!(ErrorCategory::from_status(403), ErrorCategory::Forbidden);
        assert_eq!(ErrorCategory::from_status(404), ErrorCategory::NotFound);
        assert_eq!(ErrorCategory::from_status(500), ErrorCategory::ServerError);
        assert_eq!(ErrorCategory::from_status(503), ErrorCategory::ServerError);
        assert_eq!(ErrorCategory::from_status(422), ErrorCategory::ClientError);
        assert_eq!(ErrorCategory::from_status(400), ErrorCategory::ClientError);
    }

    #[test]
    fn test_transport_failure_has_no_status() {
        let failure = RequestFailure::transport("connection refused");
        assert_eq!(failure.status, None);
        assert_eq!(failure.category, ErrorCategory::Transport);
    }

    #[test]
    fn test_error_accessors() {
        let err = ArgusError::from(RequestFailure::from_status(404, "no such watcher"));
        assert_eq!(err.category(), Some(ErrorCategory::NotFound));
        assert_eq!(err.status(), Some(404));

        let err = ArgusError::Validation("watcherId is required".to_string());
        assert_eq!(err.category(), None);
        assert_eq!(err.status(), None);
    }
}
