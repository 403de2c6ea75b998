//! JSON HTTP client bound to the admin backend origin.
//!
//! Every request carries the session credential when one is present; every
//! response runs through an ordered hook pipeline before status handling, so
//! cross-cutting reactions (the 401 forced logout) live in one place instead
//! of being scattered over call sites.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;
use crate::session::SessionStore;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared reqwest client with the stack-wide timeout applied.
pub fn default_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .expect("failed to create HTTP client")
}

/// Outcome of a single response hook.
pub enum HookAction {
    /// Hand the response to the next hook (or to normal status handling).
    Continue,
    /// Stop the pipeline; the caller receives this error.
    ShortCircuit(ClientError),
}

/// Response interceptor. Hooks run in registration order and may
/// short-circuit the rest of the pipeline.
pub trait ResponseHook: Send + Sync {
    fn on_response(&self, status: StatusCode, path: &str) -> HookAction;
}

/// Clears the session on any 401 and converts it into `AuthExpired`.
///
/// The clear happens exactly once per rejected response; the session store
/// itself makes repeated clears harmless.
struct AuthExpiryHook {
    session: Arc<SessionStore>,
}

impl ResponseHook for AuthExpiryHook {
    fn on_response(&self, status: StatusCode, path: &str) -> HookAction {
        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "authentication rejected; clearing session");
            self.session.clear();
            HookAction::ShortCircuit(ClientError::AuthExpired)
        } else {
            HookAction::Continue
        }
    }
}

struct HttpInner {
    base: Url,
    client: Client,
    session: Arc<SessionStore>,
    hooks: Vec<Box<dyn ResponseHook>>,
}

/// Cheaply cloneable handle to the shared HTTP state.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpInner>,
}

impl HttpClient {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self, ClientError> {
        Self::with_client(base_url, default_client(), session)
    }

    pub fn with_client(
        base_url: &str,
        client: Client,
        session: Arc<SessionStore>,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        let hooks: Vec<Box<dyn ResponseHook>> = vec![Box::new(AuthExpiryHook {
            session: Arc::clone(&session),
        })];
        Ok(Self {
            inner: Arc::new(HttpInner {
                base,
                client,
                session,
                hooks,
            }),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Issue one request. No retries: callers decide whether to try again.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let url = self
            .inner
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))?;

        let mut request = self.inner.client.request(method.clone(), url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        // An absent credential is not an error; the server rejects if it must.
        if let Some(token) = self.inner.session.get() {
            request = request.bearer_auth(token);
        }

        debug!(%method, path, "dispatching request");
        let response = request.send().await?;
        let status = response.status();

        for hook in &self.inner.hooks {
            if let HookAction::ShortCircuit(err) = hook.on_response(status, path) {
                return Err(err);
            }
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        // The server did answer; a failed body read is not a transport error.
        let text = response.text().await.map_err(|e| ClientError::Http {
            status: status.as_u16(),
            body: format!("body read failed: {e}"),
        })?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ClientError> {
        let value = self.request(Method::GET, path, params, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        let value = self.request(Method::POST, path, &[], body).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ClientError> {
        let value = self.request(Method::PUT, path, &[], Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{StubServer, has_header, has_header_named};
    use serde_json::json;

    fn client_for(stub: &StubServer) -> (HttpClient, Arc<SessionStore>) {
        let session = SessionStore::in_memory();
        let http = HttpClient::new(&stub.base_url(), Arc::clone(&session)).unwrap();
        (http, session)
    }

    #[tokio::test]
    async fn success_response_parses_json() {
        let stub = StubServer::spawn(200, r#"{"ok":true}"#).await;
        let (http, _session) = client_for(&stub);

        let value = http.request(Method::GET, "/ping", &[], None).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn bearer_header_attached_after_set() {
        let stub = StubServer::spawn(200, "{}").await;
        let (http, session) = client_for(&stub);
        session.set("secret-token");

        http.request(Method::GET, "/whoami", &[], None)
            .await
            .unwrap();
        let request = stub.last_request().await;
        assert!(has_header(&request, "authorization", "Bearer secret-token"));
    }

    #[tokio::test]
    async fn no_bearer_header_without_credential() {
        let stub = StubServer::spawn(200, "{}").await;
        let (http, _session) = client_for(&stub);

        http.request(Method::GET, "/whoami", &[], None)
            .await
            .unwrap();
        let request = stub.last_request().await;
        assert!(!has_header_named(&request, "authorization"));
    }

    #[tokio::test]
    async fn unauthorized_clears_session_and_returns_auth_expired() {
        let stub = StubServer::spawn(401, r#"{"detail":"Invalid credentials"}"#).await;
        let (http, session) = client_for(&stub);
        session.set("expired-token");

        let err = http
            .request(Method::GET, "/admin/dashboard/stats", &[], None)
            .await
            .unwrap_err();
        assert!(err.is_auth_expired());
        assert_eq!(session.get(), None);
    }

    #[tokio::test]
    async fn requests_after_clear_carry_no_credential() {
        let stub = StubServer::spawn(200, "{}").await;
        let (http, session) = client_for(&stub);
        session.set("tok");
        session.clear();

        http.request(Method::GET, "/x", &[], None).await.unwrap();
        let request = stub.last_request().await;
        assert!(!has_header_named(&request, "authorization"));
    }

    #[tokio::test]
    async fn server_error_propagates_status_and_body() {
        let stub = StubServer::spawn(500, r#"{"detail":"boom"}"#).await;
        let (http, _session) = client_for(&stub);

        let err = http.request(Method::GET, "/x", &[], None).await.unwrap_err();
        match err {
            ClientError::Http { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_body_keeps_the_http_status() {
        let stub = StubServer::spawn_truncated(200, r#"{"ok":tru"#).await;
        let (http, _session) = client_for(&stub);

        let err = http.request(Method::GET, "/x", &[], None).await.unwrap_err();
        match err {
            ClientError::Http { status, body } => {
                assert_eq!(status, 200);
                assert!(body.contains("body read failed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_failure_is_network_error() {
        let session = SessionStore::in_memory();
        // Port 1 is privileged and unbound in the test environment.
        let http = HttpClient::new("http://127.0.0.1:1", session).unwrap();

        let err = http.request(Method::GET, "/x", &[], None).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn query_params_are_sent() {
        let stub = StubServer::spawn(200, "{}").await;
        let (http, _session) = client_for(&stub);

        http.request(
            Method::GET,
            "/admin/dashboard/users",
            &[
                ("user_type".to_owned(), "referrer".to_owned()),
                ("page".to_owned(), "2".to_owned()),
            ],
            None,
        )
        .await
        .unwrap();
        let request = stub.last_request().await;
        assert!(request.contains("user_type=referrer"));
        assert!(request.contains("page=2"));
    }
}
