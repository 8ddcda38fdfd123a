//! Navigation capability for the login-redirect policy
//!
//! The browser original reached straight for `window.location`; here the
//! redirect side effect sits behind a trait so the policy (login-family
//! path matching, where the redirect goes) is testable without a real
//! navigation context.

use std::sync::Mutex;

use tracing::info;

/// Paths whose subtree counts as "already on the login flow". A failed
/// refresh while on one of these must not trigger another redirect —
/// that loops.
const LOGIN_ROUTES: &[&str] = &["/login", "/accounts/login"];

/// Where unrecoverable authentication failures send the user.
pub const LOGIN_REDIRECT_TARGET: &str = "/login";

/// Whether `path` is on a login-family route.
///
/// Matches the route itself and anything below it (`/login`, `/login/mfa`),
/// but not lookalike prefixes (`/logins`).
pub fn is_login_route(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    LOGIN_ROUTES.iter().any(|route| {
        path.strip_prefix(route)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Navigation capability owned by the embedding application.
pub trait Navigator: Send + Sync {
    /// The route the user is currently on, for redirect-loop suppression
    /// and as the telemetry fallback route.
    fn current_path(&self) -> String;

    /// Send the user to the login page.
    fn go_to_login(&self);
}

/// Default navigator for embeddings without a navigation concept
/// (scripts, workers). Logs the redirect intent and does nothing else.
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn go_to_login(&self) {
        info!("login redirect requested, no navigator attached");
    }
}

/// Navigator that records redirects instead of performing them. Useful in
/// tests and in host applications that drive navigation themselves.
pub struct RecordingNavigator {
    path: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(current_path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(current_path.into()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    /// Update the simulated current route.
    pub fn set_path(&self, path: impl Into<String>) {
        *self.path.lock().unwrap() = path.into();
    }

    /// Redirect targets recorded so far, oldest first.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn go_to_login(&self) {
        self.redirects
            .lock()
            .unwrap()
            .push(LOGIN_REDIRECT_TARGET.to_string());
    }
}
