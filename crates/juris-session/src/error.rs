//! Error types for session credential operations

/// Errors from session credential operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("refresh rejected: {0}")]
    Rejected(String),

    #[error("auth endpoint returned an error: {0}")]
    Endpoint(String),

    #[error("invalid token response: {0}")]
    TokenParse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("no refresh token in store")]
    MissingRefreshToken,
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
