//! Common error types

use thiserror::Error;

/// Errors shared across the workspace crates.
///
/// Configuration loading is the main producer: reading the TOML file,
/// overlaying environment variables, and validating the result.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;
