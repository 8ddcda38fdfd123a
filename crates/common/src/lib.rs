//! Shared building blocks for the Juris client crates
//!
//! Holds the pieces both the session layer and the API client need:
//! the common error type used by configuration loading, and the `Secret`
//! wrapper that keeps credential material out of logs.

pub mod error;
pub mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
