//! Client-facing error taxonomy
//!
//! Four failure classes reach callers: an HTTP error status, an
//! unrecoverable authentication expiry (refresh failed or was
//! inapplicable), a transport-level failure with no status at all, and
//! local problems (construction, body decoding). Refresh and telemetry
//! are side channels — their internal errors never appear here except as
//! the `detail` of an `Auth` rejection.

use thiserror::Error;

/// Errors surfaced by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success HTTP response: 4xx other than a recoverable 401, any
    /// 5xx, and 401s that were already retried or were auth-bootstrap.
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    /// Authentication expired and the session refresh failed. Session
    /// teardown and the login redirect have already happened by the time
    /// the caller sees this.
    #[error("authentication expired and refresh failed: {detail}")]
    Auth { status: u16, detail: String },

    /// Transport-level failure — no HTTP status was received.
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded as the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Client construction or configuration problem.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// The HTTP status carried by this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::Auth { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Unrecoverable authentication expiry.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// Server-side failure (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(s) if (500..600).contains(&s))
    }

    /// Client-side failure (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s))
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
