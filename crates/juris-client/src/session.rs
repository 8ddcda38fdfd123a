//! Session strategies — how the credential travels with each request
//!
//! The deployment decides the variant: cookie sessions carry the
//! credential invisibly in the shared client's jar; bearer deployments
//! hold an access/refresh pair in a [`TokenStore`] and attach the access
//! token as an `Authorization` header. The API client is written against
//! the trait and never branches on the variant.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn SessionStrategy>`).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use juris_session::{TokenPair, TokenStore, refresh_cookie_session, refresh_with_token};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, warn};

/// Abstraction over the two credential-carrying variants.
pub trait SessionStrategy: Send + Sync {
    /// Identifier for logging ("cookie" or "bearer").
    fn id(&self) -> &str;

    /// Attach the credential to an outbound request's headers.
    ///
    /// Bearer deployments insert `Authorization: Bearer <access>` when a
    /// token is stored; with no token the request goes out
    /// unauthenticated and the server's 401 drives the refresh path.
    /// Cookie deployments do nothing — the jar handles it.
    fn attach<'a>(
        &'a self,
        headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Renew the credential after a 401. At most one call per original
    /// request — the client enforces that.
    fn refresh<'a>(
        &'a self,
        http: &'a reqwest::Client,
        base_url: &'a str,
    ) -> Pin<Box<dyn Future<Output = juris_session::Result<()>> + Send + 'a>>;

    /// Persist the credential issued by a successful login.
    fn on_login<'a>(
        &'a self,
        tokens: &'a TokenPair,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Delete the credential. Called on logout and when a refresh is
    /// rejected. Must not fail the caller — teardown is already the
    /// failure path.
    fn teardown<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Cookie-session variant. The credential is carried by the HTTP
/// client's cookie jar and never passes through application code.
pub struct CookieSession;

impl SessionStrategy for CookieSession {
    fn id(&self) -> &str {
        "cookie"
    }

    fn attach<'a>(
        &'a self,
        _headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    fn refresh<'a>(
        &'a self,
        http: &'a reqwest::Client,
        base_url: &'a str,
    ) -> Pin<Box<dyn Future<Output = juris_session::Result<()>> + Send + 'a>> {
        Box::pin(refresh_cookie_session(http, base_url))
    }

    fn on_login<'a>(
        &'a self,
        _tokens: &'a TokenPair,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        // Set-Cookie on the login response already updated the jar
        Box::pin(async {})
    }

    fn teardown<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        // The server invalidates the session; the stale cookie in the
        // jar is harmless and gets rejected with 401 if replayed.
        Box::pin(async {})
    }
}

/// Bearer-token variant backed by a persistent [`TokenStore`].
pub struct BearerSession {
    store: Arc<TokenStore>,
}

impl BearerSession {
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }
}

impl SessionStrategy for BearerSession {
    fn id(&self) -> &str {
        "bearer"
    }

    fn attach<'a>(
        &'a self,
        headers: &'a mut HeaderMap,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let Some(access) = self.store.access_token().await else {
                debug!("no access token stored, sending unauthenticated");
                return;
            };
            match HeaderValue::from_str(&format!("Bearer {}", access.expose())) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => {
                    warn!(error = %e, "stored access token is not a valid header value, skipping");
                }
            }
        })
    }

    fn refresh<'a>(
        &'a self,
        http: &'a reqwest::Client,
        base_url: &'a str,
    ) -> Pin<Box<dyn Future<Output = juris_session::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let refresh = self
                .store
                .refresh_token()
                .await
                .ok_or(juris_session::Error::MissingRefreshToken)?;

            let renewed = refresh_with_token(http, base_url, refresh.expose()).await?;

            // Server may rotate the refresh token; keep the old one otherwise
            let next_refresh = renewed
                .refresh
                .unwrap_or_else(|| refresh.expose().clone());
            self.store.set(renewed.access, next_refresh).await?;
            debug!("stored renewed token pair");
            Ok(())
        })
    }

    fn on_login<'a>(
        &'a self,
        tokens: &'a TokenPair,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if let Err(e) = self
                .store
                .set(tokens.access.clone(), tokens.refresh.clone())
                .await
            {
                warn!(error = %e, "failed to persist login tokens");
            }
        })
    }

    fn teardown<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if let Err(e) = self.store.clear().await {
                warn!(error = %e, "failed to clear token store");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_with(dir: &tempfile::TempDir, access: &str, refresh: &str) -> Arc<TokenStore> {
        let store = Arc::new(
            TokenStore::load(dir.path().join("tokens.json"))
                .await
                .unwrap(),
        );
        store.set(access.into(), refresh.into()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn cookie_attach_leaves_headers_untouched() {
        let mut headers = HeaderMap::new();
        CookieSession.attach(&mut headers).await;
        assert!(headers.is_empty());
    }

    #[tokio::test]
    async fn bearer_attach_inserts_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let session = BearerSession::new(store_with(&dir, "at_1", "rt_1").await);

        let mut headers = HeaderMap::new();
        session.attach(&mut headers).await;
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer at_1");
    }

    #[tokio::test]
    async fn bearer_attach_without_token_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            TokenStore::load(dir.path().join("tokens.json"))
                .await
                .unwrap(),
        );
        let session = BearerSession::new(store);

        let mut headers = HeaderMap::new();
        session.attach(&mut headers).await;
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn bearer_refresh_persists_rotated_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .and(body_json(serde_json::json!({"refresh": "rt_1"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "at_2", "refresh": "rt_2"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "at_1", "rt_1").await;
        let session = BearerSession::new(store.clone());

        let http = reqwest::Client::new();
        session.refresh(&http, &server.uri()).await.unwrap();

        assert_eq!(store.access_token().await.unwrap().expose(), "at_2");
        assert_eq!(store.refresh_token().await.unwrap().expose(), "rt_2");
    }

    #[tokio::test]
    async fn bearer_refresh_keeps_old_refresh_without_rotation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "at_2"})),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "at_1", "rt_1").await;
        let session = BearerSession::new(store.clone());

        let http = reqwest::Client::new();
        session.refresh(&http, &server.uri()).await.unwrap();

        assert_eq!(store.access_token().await.unwrap().expose(), "at_2");
        assert_eq!(store.refresh_token().await.unwrap().expose(), "rt_1");
    }

    #[tokio::test]
    async fn bearer_refresh_without_stored_token_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            TokenStore::load(dir.path().join("tokens.json"))
                .await
                .unwrap(),
        );
        let session = BearerSession::new(store);

        let http = reqwest::Client::new();
        let err = session
            .refresh(&http, "http://127.0.0.1:9")
            .await
            .unwrap_err();
        assert!(matches!(err, juris_session::Error::MissingRefreshToken));
    }

    #[tokio::test]
    async fn bearer_teardown_clears_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, "at_1", "rt_1").await;
        let session = BearerSession::new(store.clone());

        session.teardown().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn bearer_on_login_persists_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            TokenStore::load(dir.path().join("tokens.json"))
                .await
                .unwrap(),
        );
        let session = BearerSession::new(store.clone());

        session
            .on_login(&TokenPair {
                access: "at_login".into(),
                refresh: "rt_login".into(),
            })
            .await;

        assert_eq!(store.access_token().await.unwrap().expose(), "at_login");
        assert_eq!(store.refresh_token().await.unwrap().expose(), "rt_login");
    }
}
