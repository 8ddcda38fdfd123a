//! Session credential layer for the Juris API
//!
//! Owns the lifecycle of the API session credential: token pairs obtained
//! at login, replaced by the refresh endpoint, and deleted on logout or
//! when a refresh is rejected. This crate is a standalone library with no
//! dependency on the API client — it can be tested and used independently.
//!
//! Credential flow (bearer deployments):
//! 1. Login response tokens land in `store::TokenStore::set()`
//! 2. Each outbound request reads `TokenStore::access_token()`
//! 3. On 401, the client calls `token::refresh_with_token()`
//! 4. The rotated pair is persisted via `TokenStore::set()`
//! 5. Logout or a rejected refresh calls `TokenStore::clear()`
//!
//! Cookie deployments skip the store entirely: the credential lives in the
//! HTTP client's cookie jar and `token::refresh_cookie_session()` renews it.

pub mod constants;
pub mod error;
pub mod store;
pub mod token;

pub use constants::*;
pub use error::{Error, Result};
pub use store::TokenStore;
pub use token::{RefreshedTokens, TokenPair, refresh_cookie_session, refresh_with_token};
