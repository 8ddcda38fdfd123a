//! Session refresh against the auth endpoints
//!
//! Two deployment variants share the `POST /auth/refresh/` endpoint:
//! bearer deployments send the stored refresh token in the body and get a
//! new access token (and possibly a rotated refresh token) back; cookie
//! deployments send an empty body and the server rewrites the session
//! cookie carried by the client's jar.
//!
//! Both calls attach `X-Skip-Error-Log: 1` — a failing refresh must not
//! generate error telemetry of its own.

use serde::{Deserialize, Serialize};

use crate::constants::{REFRESH_PATH, SKIP_ERROR_LOG_HEADER, SKIP_ERROR_LOG_VALUE};
use crate::error::{Error, Result};

/// Access/refresh pair returned by the login endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Response from the refresh endpoint in bearer deployments.
///
/// `refresh` is present only when the server rotates refresh tokens;
/// absent means the old refresh token stays valid.
#[derive(Debug, Deserialize, Serialize)]
pub struct RefreshedTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Exchange a refresh token for a new access token (bearer deployments).
pub async fn refresh_with_token(
    client: &reqwest::Client,
    base_url: &str,
    refresh: &str,
) -> Result<RefreshedTokens> {
    let response = client
        .post(format!("{base_url}{REFRESH_PATH}"))
        .header(SKIP_ERROR_LOG_HEADER, SKIP_ERROR_LOG_VALUE)
        .json(&RefreshRequest { refresh })
        .send()
        .await
        .map_err(|e| Error::Http(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        // 401/403 means the refresh token is expired or revoked
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::Rejected(format!(
                "refresh token rejected ({status}): {body}"
            )));
        }

        return Err(Error::Endpoint(format!(
            "refresh endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<RefreshedTokens>()
        .await
        .map_err(|e| Error::TokenParse(format!("invalid refresh response: {e}")))
}

/// Renew a cookie-held session (cookie deployments).
///
/// The credential never passes through application code: the jar on
/// `client` carries it out and stores the replacement from `Set-Cookie`.
pub async fn refresh_cookie_session(client: &reqwest::Client, base_url: &str) -> Result<()> {
    let response = client
        .post(format!("{base_url}{REFRESH_PATH}"))
        .header(SKIP_ERROR_LOG_HEADER, SKIP_ERROR_LOG_VALUE)
        .json(&serde_json::json!({}))
        .send()
        .await
        .map_err(|e| Error::Http(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::Rejected(format!(
                "session refresh rejected ({status}): {body}"
            )));
        }

        return Err(Error::Endpoint(format!(
            "refresh endpoint returned {status}: {body}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn token_pair_deserializes() {
        let json = r#"{"access":"at_abc","refresh":"rt_def"}"#;
        let pair: TokenPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.access, "at_abc");
        assert_eq!(pair.refresh, "rt_def");
    }

    #[test]
    fn refreshed_tokens_tolerate_missing_rotation() {
        let json = r#"{"access":"at_new"}"#;
        let tokens: RefreshedTokens = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.access, "at_new");
        assert!(tokens.refresh.is_none());

        let json = r#"{"access":"at_new","refresh":"rt_new"}"#;
        let tokens: RefreshedTokens = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.refresh.as_deref(), Some("rt_new"));
    }

    #[tokio::test]
    async fn refresh_with_token_sends_skip_header_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .and(header("X-Skip-Error-Log", "1"))
            .and(body_json(serde_json::json!({"refresh": "rt_1"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "at_2", "refresh": "rt_2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let tokens = refresh_with_token(&client, &server.uri(), "rt_1")
            .await
            .unwrap();
        assert_eq!(tokens.access, "at_2");
        assert_eq!(tokens.refresh.as_deref(), Some("rt_2"));
    }

    #[tokio::test]
    async fn refresh_with_token_maps_401_to_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "token expired"})),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = refresh_with_token(&client, &server.uri(), "rt_dead")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn refresh_with_token_maps_5xx_to_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = refresh_with_token(&client, &server.uri(), "rt_1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Endpoint(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn cookie_refresh_posts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .and(header("X-Skip-Error-Log", "1"))
            .and(body_json(serde_json::json!({})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        refresh_cookie_session(&client, &server.uri()).await.unwrap();
    }

    #[tokio::test]
    async fn cookie_refresh_maps_401_to_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = refresh_cookie_session(&client, &server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected(_)));
    }

    #[tokio::test]
    async fn network_failure_maps_to_http() {
        // Unroutable port — connection refused, no HTTP status
        let client = reqwest::Client::new();
        let err = refresh_with_token(&client, "http://127.0.0.1:9", "rt_1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
