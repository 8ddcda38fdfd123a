//! Best-effort error telemetry
//!
//! Server and network failures produce a diagnostic POST to the
//! monitoring endpoint. The pipeline is deliberately lossy: a single
//! in-flight slot, no queue, no retry — a second qualifying failure
//! while a report is on the wire is dropped and only counted. Report
//! delivery failures are swallowed; nothing here may ever reach a
//! caller.
//!
//! The reporter posts with the raw HTTP client, not through
//! [`crate::ApiClient::request`], so its own failures can neither
//! trigger a session refresh nor recurse into reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use juris_session::{SKIP_ERROR_LOG_HEADER, SKIP_ERROR_LOG_VALUE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Monitoring endpoint, relative to the API base URL. Failures on this
/// path are never themselves reported.
pub const TELEMETRY_PATH: &str = "/ia/analises/registrar-erro/";

/// Wire format of a diagnostic report. Field names follow the backend's
/// monitoring schema; reports from this client are filed under the
/// `frontend` category alongside the browser's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    #[serde(rename = "tipo")]
    pub category: String,
    #[serde(rename = "severidade")]
    pub severity: String,
    #[serde(rename = "mensagem")]
    pub message: String,
    #[serde(rename = "rota")]
    pub route: String,
    #[serde(rename = "detalhes")]
    pub detail: ErrorDetail,
}

/// Request-level context attached to a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub method: String,
    /// Absent for transport-level failures.
    pub status: Option<u16>,
    /// Response body, parsed as JSON when possible.
    pub response_data: Value,
}

impl ErrorReport {
    /// Build a report for a failed request. `status: None` means the
    /// failure was transport-level and the message says "network".
    pub fn for_failure(method: &reqwest::Method, route: &str, status: Option<u16>, body: &str) -> Self {
        let status_label = status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "network".to_string());
        Self {
            category: "frontend".to_string(),
            severity: "alerta".to_string(),
            message: format!("Erro HTTP {status_label} no frontend"),
            route: route.to_string(),
            detail: ErrorDetail {
                method: method.to_string(),
                status,
                response_data: parse_response_data(body),
            },
        }
    }
}

fn parse_response_data(body: &str) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Releases the single in-flight slot when the report task finishes,
/// whichever way it finishes.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-slot, fire-and-forget report dispatcher.
pub struct ErrorReporter {
    http: reqwest::Client,
    endpoint: String,
    in_flight: Arc<AtomicBool>,
    dropped: AtomicU64,
}

impl ErrorReporter {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}{TELEMETRY_PATH}", base_url.trim_end_matches('/')),
            in_flight: Arc::new(AtomicBool::new(false)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Dispatch a report unless one is already in flight.
    ///
    /// Returns the handle of the spawned delivery task, or `None` when
    /// the slot was taken and the report was dropped. The task swallows
    /// every delivery failure and releases the slot on completion.
    pub fn try_report(&self, report: ErrorReport) -> Option<tokio::task::JoinHandle<()>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(route = %report.route, "error report already in flight, dropping");
            return None;
        }

        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        Some(tokio::spawn(async move {
            let _guard = guard;
            let result = http
                .post(&endpoint)
                .header(SKIP_ERROR_LOG_HEADER, SKIP_ERROR_LOG_VALUE)
                .json(&report)
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    debug!("error report delivered");
                }
                Ok(response) => {
                    debug!(status = response.status().as_u16(), "error report rejected");
                }
                Err(e) => {
                    debug!(error = %e, "error report delivery failed");
                }
            }
        }))
    }

    /// Reports dropped because the slot was taken.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
