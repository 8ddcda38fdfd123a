//! Authenticated HTTP client for the Juris API
//!
//! Wraps outbound calls to the versioned REST base path with credential
//! attachment, a one-shot transparent session refresh on 401, a
//! login-redirect policy for unrecoverable expiry, and best-effort error
//! telemetry for server and network failures. Callers see plain
//! `Result<reqwest::Response, ApiError>` outcomes — the refresh and
//! telemetry plumbing never surfaces.
//!
//! Two deployment variants are supported behind [`SessionStrategy`]:
//! cookie sessions (credential lives in the client's cookie jar) and
//! bearer tokens (pair persisted in a [`juris_session::TokenStore`]).
//!
//! ```no_run
//! use std::sync::Arc;
//! use juris_client::{ApiClient, ApiConfig, CookieSession, NoopNavigator};
//!
//! # async fn run() -> Result<(), juris_client::ApiError> {
//! let client = ApiClient::new(
//!     ApiConfig::default(),
//!     Arc::new(CookieSession),
//!     Arc::new(NoopNavigator),
//! )?;
//! let processos = client.get("/processos/").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod navigator;
pub mod session;
pub mod telemetry;

pub use client::{ApiClient, ClientStats, RequestOptions};
pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use navigator::{Navigator, NoopNavigator, RecordingNavigator, is_login_route};
pub use session::{BearerSession, CookieSession, SessionStrategy};
pub use telemetry::{ErrorDetail, ErrorReport, ErrorReporter};
