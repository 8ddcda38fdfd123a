//! Persistent storage for the bearer token pair
//!
//! The browser original kept `access_token`/`refresh_token` in
//! localStorage; the native equivalent is a small JSON file. All writes
//! use atomic temp-file + rename to prevent corruption on crash, and a
//! tokio Mutex serializes access so a login racing a request-time refresh
//! cannot interleave partial states.
//!
//! The file is the single source of truth: every outbound request reads
//! the current access token from here at send time.

use std::path::{Path, PathBuf};

use common::Secret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// On-disk shape. Both fields absent (`{}`) is the logged-out state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// Thread-safe token file manager.
///
/// Accessors hand out `Secret`-wrapped clones so token values stay out of
/// Debug output and tracing fields at the call sites.
pub struct TokenStore {
    path: PathBuf,
    state: Mutex<StoredTokens>,
}

impl TokenStore {
    /// Open the token file at `path`.
    ///
    /// A missing file is the logged-out state: it is created as `{}` so
    /// later loads skip the cold-start path. Corrupt JSON is an error —
    /// silently discarding a refresh token would force a re-login.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading token file: {e}")))?;
            let tokens: StoredTokens = serde_json::from_str(&contents)
                .map_err(|e| Error::TokenParse(format!("parsing token file: {e}")))?;
            debug!(path = %path.display(), logged_in = tokens.access_token.is_some(), "loaded token store");
            tokens
        } else {
            info!(path = %path.display(), "token file not found, starting logged out");
            let tokens = StoredTokens::default();
            write_atomic(&path, &tokens).await?;
            tokens
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Replace both tokens and persist. Called after login and after a
    /// refresh that rotated the pair.
    pub async fn set(&self, access: String, refresh: String) -> Result<()> {
        let mut state = self.state.lock().await;
        state.access_token = Some(access);
        state.refresh_token = Some(refresh);
        debug!("stored token pair");
        write_atomic(&self.path, &state).await
    }

    /// Current access token, if logged in.
    pub async fn access_token(&self) -> Option<Secret<String>> {
        let state = self.state.lock().await;
        state.access_token.clone().map(Secret::new)
    }

    /// Current refresh token, if logged in.
    pub async fn refresh_token(&self) -> Option<Secret<String>> {
        let state = self.state.lock().await;
        state.refresh_token.clone().map(Secret::new)
    }

    /// Drop both tokens and persist. Called on logout and when a refresh
    /// is rejected.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.access_token = None;
        state.refresh_token = None;
        debug!("cleared token pair");
        write_atomic(&self.path, &state).await
    }

    /// Whether the store holds no credential.
    pub async fn is_empty(&self) -> bool {
        let state = self.state.lock().await;
        state.access_token.is_none() && state.refresh_token.is_none()
    }
}

/// Write the token state to disk atomically.
///
/// Temp file in the same directory, then rename over the target, so a
/// crash mid-write leaves the previous state intact. Permissions are
/// 0600 on unix since the file holds live credentials.
async fn write_atomic(path: &Path, data: &StoredTokens) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::TokenParse(format!("serializing tokens: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("token path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".tokens.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp token file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting token file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp token file: {e}")))?;

    Ok(())
}
