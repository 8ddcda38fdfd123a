//! Endpoint paths and header names shared with the API client.

/// Header that suppresses error telemetry for a request (wire form
/// `X-Skip-Error-Log`; header names are case-insensitive and the
/// lowercase form is valid as a static `HeaderName`). Attached to every
/// refresh and telemetry call so their own failures cannot feed back
/// into the reporting pipeline.
pub const SKIP_ERROR_LOG_HEADER: &str = "x-skip-error-log";

/// Value carried by [`SKIP_ERROR_LOG_HEADER`].
pub const SKIP_ERROR_LOG_VALUE: &str = "1";

/// Credential issuance endpoint.
pub const LOGIN_PATH: &str = "/auth/login/";

/// Credential renewal endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh/";

/// Session termination endpoint.
pub const LOGOUT_PATH: &str = "/auth/logout/";

/// Authenticated-identity endpoint ("who am I").
pub const ME_PATH: &str = "/usuarios/me/";

/// Endpoints exempt from 401 interception. A 401 from any of these means
/// the credential itself is being negotiated — retrying through a refresh
/// would recurse.
pub const AUTH_BOOTSTRAP_PATHS: &[&str] = &[LOGIN_PATH, REFRESH_PATH, LOGOUT_PATH, ME_PATH];
