//! The authenticated API client
//!
//! Issues HTTP requests against the configured base URL, recovers from
//! access-credential expiry exactly once per request, and emits
//! best-effort telemetry for server and network failures.
//!
//! Per-request state machine:
//! - success → resolve with the response untouched
//! - 401, not yet retried, not auth-bootstrap → refresh the session,
//!   replay the identical request once
//! - refresh failed → tear down the session, redirect to login (unless
//!   already on a login-family route), reject with the original status
//! - any other failure → telemetry side effect (non-blocking), reject
//!
//! Two 401s on independent concurrent requests refresh independently;
//! coalescing them into a shared refresh is intentionally not done (see
//! DESIGN.md).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use juris_session::{
    AUTH_BOOTSTRAP_PATHS, LOGIN_PATH, LOGOUT_PATH, ME_PATH, SKIP_ERROR_LOG_HEADER,
    SKIP_ERROR_LOG_VALUE, TokenPair,
};

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::navigator::{Navigator, is_login_route};
use crate::session::SessionStrategy;
use crate::telemetry::{ErrorReport, ErrorReporter, TELEMETRY_PATH};

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers for this call.
    pub headers: HeaderMap,
    /// Suppress error telemetry for this call. Also puts
    /// `X-Skip-Error-Log: 1` on the wire so the server skips its own
    /// logging.
    pub skip_error_log: bool,
}

/// Everything needed to send (and replay) one request.
#[derive(Debug, Clone)]
struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<Value>,
    headers: HeaderMap,
    skip_error_log: bool,
}

/// One logical request moving through the state machine. Replacing the
/// browser original's `_retry` flag scribbled onto a loose config
/// object: the flag lives next to the descriptor it guards.
struct RequestState {
    request_id: String,
    descriptor: RequestDescriptor,
    retried: bool,
}

/// Counter snapshot from [`ApiClient::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStats {
    /// Logical API calls issued (replays not counted separately).
    pub requests_total: u64,
    /// Replays after a successful session refresh.
    pub replays_total: u64,
    /// Session refresh attempts.
    pub refreshes_total: u64,
    /// Telemetry reports dropped because one was already in flight.
    pub reports_dropped_total: u64,
}

/// Authenticated HTTP client for the Juris API.
///
/// Cheap to share behind an `Arc`; all methods take `&self`. The
/// underlying `reqwest::Client` (with its cookie jar) is shared across
/// the request, refresh, and telemetry paths.
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    strategy: Arc<dyn SessionStrategy>,
    navigator: Arc<dyn Navigator>,
    reporter: ErrorReporter,
    requests_total: AtomicU64,
    replays_total: AtomicU64,
    refreshes_total: AtomicU64,
}

impl ApiClient {
    /// Build a client from explicit configuration.
    pub fn new(
        config: ApiConfig,
        strategy: Arc<dyn SessionStrategy>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut config = config;
        config.normalize();
        config
            .validate()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        let reporter = ErrorReporter::new(http.clone(), &config.base_url);
        info!(base_url = %config.base_url, strategy = strategy.id(), "api client initialized");

        Ok(Self {
            http,
            config,
            strategy,
            navigator,
            reporter,
            requests_total: AtomicU64::new(0),
            replays_total: AtomicU64::new(0),
            refreshes_total: AtomicU64::new(0),
        })
    }

    /// Build a client from `JURIS_API_URL` / `JURIS_CONFIG_PATH`.
    pub fn from_env(
        strategy: Arc<dyn SessionStrategy>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let config = ApiConfig::load().map_err(|e| ApiError::Config(e.to_string()))?;
        Self::new(config, strategy, navigator)
    }

    /// Issue a request. `path` is relative to the configured base URL.
    ///
    /// Resolves with the raw response on any success status; all
    /// recovery and telemetry plumbing stays internal.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<Response> {
        let state = RequestState {
            request_id: format!("req_{}", uuid::Uuid::new_v4().as_simple()),
            descriptor: RequestDescriptor {
                method,
                path: path.to_string(),
                body,
                headers: options.headers,
                skip_error_log: options.skip_error_log,
            },
            retried: false,
        };
        self.execute(state).await
    }

    /// GET a path.
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::GET, path, None, RequestOptions::default())
            .await
    }

    /// GET with per-call options.
    pub async fn get_with(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(Method::GET, path, None, options).await
    }

    /// POST a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> Result<Response> {
        self.request(Method::POST, path, Some(body), RequestOptions::default())
            .await
    }

    /// POST with per-call options.
    pub async fn post_with(
        &self,
        path: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<Response> {
        self.request(Method::POST, path, Some(body), options).await
    }

    /// PATCH a JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> Result<Response> {
        self.request(Method::PATCH, path, Some(body), RequestOptions::default())
            .await
    }

    /// DELETE a path.
    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.request(Method::DELETE, path, None, RequestOptions::default())
            .await
    }

    /// Log in and hand the issued credential to the session strategy.
    ///
    /// Returns the login response body. Login is an auth-bootstrap call:
    /// a 401 here means bad credentials, not an expired session, and is
    /// surfaced directly.
    pub async fn login(&self, username: &str, password: &str) -> Result<Value> {
        let response = self
            .post(
                LOGIN_PATH,
                serde_json::json!({"username": username, "password": password}),
            )
            .await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        match serde_json::from_value::<TokenPair>(body.clone()) {
            Ok(pair) => self.strategy.on_login(&pair).await,
            Err(_) => debug!("login response carried no token pair"),
        }
        Ok(body)
    }

    /// Log out: best-effort server-side invalidation, then local
    /// credential teardown. Never fails — teardown happens regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.post(LOGOUT_PATH, serde_json::json!({})).await {
            warn!(error = %e, "logout request failed, tearing down locally");
        }
        self.strategy.teardown().await;
    }

    /// Fetch the authenticated user's profile.
    pub async fn current_user(&self) -> Result<Value> {
        let response = self.get(ME_PATH).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Counter snapshot.
    pub fn stats(&self) -> ClientStats {
        ClientStats {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            replays_total: self.replays_total.load(Ordering::Relaxed),
            refreshes_total: self.refreshes_total.load(Ordering::Relaxed),
            reports_dropped_total: self.reporter.dropped_count(),
        }
    }

    #[instrument(
        skip_all,
        fields(
            request_id = %state.request_id,
            method = %state.descriptor.method,
            path = %state.descriptor.path,
        )
    )]
    async fn execute(&self, mut state: RequestState) -> Result<Response> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        loop {
            match self.dispatch(&state).await {
                Ok(response) if response.status().is_success() => {
                    debug!(status = response.status().as_u16(), "request succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();

                    if status == 401
                        && !state.retried
                        && !is_auth_bootstrap(&state.descriptor.path)
                    {
                        debug!("access credential rejected, refreshing session");
                        self.refreshes_total.fetch_add(1, Ordering::Relaxed);

                        match self
                            .strategy
                            .refresh(&self.http, &self.config.base_url)
                            .await
                        {
                            Ok(()) => {
                                info!("session refresh succeeded, replaying request");
                                self.replays_total.fetch_add(1, Ordering::Relaxed);
                                state.retried = true;
                                continue;
                            }
                            Err(refresh_err) => {
                                warn!(error = %refresh_err, "session refresh failed, tearing down");
                                self.strategy.teardown().await;
                                if !is_login_route(&self.navigator.current_path()) {
                                    self.navigator.go_to_login();
                                }
                                return Err(ApiError::Auth {
                                    status,
                                    detail: refresh_err.to_string(),
                                });
                            }
                        }
                    }

                    let body = response.text().await.unwrap_or_default();
                    warn!(status, "request failed");
                    self.maybe_report(&state.descriptor, Some(status), &body);
                    return Err(ApiError::Status { status, body });
                }
                Err(transport_err) => {
                    warn!(error = %transport_err, "transport failure");
                    self.maybe_report(&state.descriptor, None, "");
                    return Err(ApiError::Network(transport_err.to_string()));
                }
            }
        }
    }

    /// Send one attempt. Session headers are attached fresh on every
    /// attempt so a replay picks up the renewed credential.
    async fn dispatch(
        &self,
        state: &RequestState,
    ) -> std::result::Result<Response, reqwest::Error> {
        let descriptor = &state.descriptor;
        let url = format!("{}{}", self.config.base_url, descriptor.path);

        let mut headers = descriptor.headers.clone();
        if descriptor.skip_error_log {
            headers.insert(
                SKIP_ERROR_LOG_HEADER,
                HeaderValue::from_static(SKIP_ERROR_LOG_VALUE),
            );
        }
        self.strategy.attach(&mut headers).await;

        let mut request = self
            .http
            .request(descriptor.method.clone(), url)
            .headers(headers);
        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }
        request.send().await
    }

    /// Fire the telemetry side effect when the failure qualifies:
    /// status ≥ 500 or no status at all, not suppressed, and not the
    /// telemetry endpoint itself.
    fn maybe_report(&self, descriptor: &RequestDescriptor, status: Option<u16>, body: &str) {
        let suppressed =
            descriptor.skip_error_log || descriptor.headers.contains_key(SKIP_ERROR_LOG_HEADER);
        let qualifies = match status {
            Some(s) => s >= 500,
            None => true,
        };
        if suppressed || !qualifies || descriptor.path.contains(TELEMETRY_PATH) {
            return;
        }

        let route = if descriptor.path.is_empty() {
            self.navigator.current_path()
        } else {
            descriptor.path.clone()
        };
        self.reporter
            .try_report(ErrorReport::for_failure(&descriptor.method, &route, status, body));
    }
}

/// Whether `path` targets an auth-bootstrap endpoint (exempt from 401
/// interception).
fn is_auth_bootstrap(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    AUTH_BOOTSTRAP_PATHS.iter().any(|p| path == *p)
}
