//! Client configuration
//!
//! Precedence: env vars > config file > defaults. `JURIS_API_URL`
//! overrides the base URL directly; `JURIS_CONFIG_PATH` points at an
//! optional TOML file for the rest.

use serde::Deserialize;
use std::time::Duration;

/// API client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Absolute base URL of the versioned API, without trailing slash.
    /// The browser original defaulted to the relative path `/api/v1`;
    /// a native client needs the origin spelled out.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout applied by the underlying transport.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("juris-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Load configuration with env > file > default precedence.
    ///
    /// If `JURIS_CONFIG_PATH` is set, the named TOML file must exist and
    /// parse; otherwise defaults are the starting point. `JURIS_API_URL`
    /// then overrides the base URL either way.
    pub fn load() -> common::Result<Self> {
        let mut config = match std::env::var("JURIS_CONFIG_PATH") {
            Ok(path) => {
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    common::Error::Config(format!("failed to read config file {path}: {e}"))
                })?;
                toml::from_str(&contents)?
            }
            Err(_) => ApiConfig::default(),
        };

        if let Ok(url) = std::env::var("JURIS_API_URL") {
            config.base_url = url;
        }

        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Trim the trailing slash so path concatenation stays predictable.
    pub(crate) fn normalize(&mut self) {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
    }

    /// Validate invariants that would otherwise fail at request time.
    pub fn validate(&self) -> common::Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    #[test]
    fn defaults_are_valid() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000/api/v1");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.starts_with("juris-client/"));
        config.validate().unwrap();
    }

    #[test]
    fn env_url_overrides_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            set_env("JURIS_API_URL", "https://api.juris.example/api/v1");
            remove_env("JURIS_CONFIG_PATH");
        }

        let config = ApiConfig::load().unwrap();
        assert_eq!(config.base_url, "https://api.juris.example/api/v1");

        unsafe { remove_env("JURIS_API_URL") };
    }

    #[test]
    fn env_url_overrides_config_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("juris.toml");
        std::fs::write(
            &path,
            r#"
base_url = "https://file.juris.example/api/v1"
timeout_secs = 10
"#,
        )
        .unwrap();
        unsafe {
            set_env("JURIS_CONFIG_PATH", path.to_str().unwrap());
            set_env("JURIS_API_URL", "https://env.juris.example/api/v1");
        }

        let config = ApiConfig::load().unwrap();
        assert_eq!(config.base_url, "https://env.juris.example/api/v1");
        assert_eq!(config.timeout_secs, 10);

        unsafe {
            remove_env("JURIS_CONFIG_PATH");
            remove_env("JURIS_API_URL");
        }
    }

    #[test]
    fn missing_named_config_file_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            set_env("JURIS_CONFIG_PATH", "/nonexistent/juris.toml");
            remove_env("JURIS_API_URL");
        }

        let result = ApiConfig::load();
        assert!(result.is_err());

        unsafe { remove_env("JURIS_CONFIG_PATH") };
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            set_env("JURIS_API_URL", "https://api.juris.example/api/v1/");
            remove_env("JURIS_CONFIG_PATH");
        }

        let config = ApiConfig::load().unwrap();
        assert_eq!(config.base_url, "https://api.juris.example/api/v1");

        unsafe { remove_env("JURIS_API_URL") };
    }

    #[test]
    fn rejects_relative_base_url() {
        let config = ApiConfig {
            base_url: "/api/v1".into(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = ApiConfig {
            timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
