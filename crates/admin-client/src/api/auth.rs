use serde_json::json;
use tracing::info;

use crate::error::ClientError;
use crate::http::HttpClient;
use crate::models::TokenResponse;

pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub(super) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Authenticate and store the returned credential in the session.
    ///
    /// A 401 from this endpoint means bad credentials, not an expired
    /// session; the store was already empty, so the global expiry hook's
    /// clear is a no-op and no redirect-style transition fires.
    pub async fn login(
        &self,
        telegram_id: i64,
        password: &str,
    ) -> Result<TokenResponse, ClientError> {
        let body = json!({
            "telegram_id": telegram_id,
            "password": password,
        });
        let token: TokenResponse = self.http.post("/admin/auth/login", Some(&body)).await?;
        self.http.session().set(token.access_token.clone());
        info!(telegram_id, "admin login succeeded");
        Ok(token)
    }

    pub fn logout(&self) {
        self.http.session().clear();
        info!("admin logged out");
    }
}

#[cfg(test)]
mod tests {
    use crate::api::AdminApi;
    use crate::http::HttpClient;
    use crate::session::{AuthState, SessionStore};
    use crate::testutil::StubServer;
    use std::sync::Arc;

    #[tokio::test]
    async fn successful_login_stores_credential() {
        let stub = StubServer::spawn(
            200,
            r#"{"access_token": "jwt-abc", "token_type": "bearer"}"#,
        )
        .await;
        let session = SessionStore::in_memory();
        let api = AdminApi::new(HttpClient::new(&stub.base_url(), Arc::clone(&session)).unwrap());

        let token = api.auth().login(123, "secret").await.unwrap();
        assert_eq!(token.access_token, "jwt-abc");
        assert_eq!(session.get().as_deref(), Some("jwt-abc"));
        assert_eq!(session.state(), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn rejected_login_stores_nothing() {
        let stub = StubServer::spawn(401, r#"{"detail": "Invalid credentials"}"#).await;
        let session = SessionStore::in_memory();
        let api = AdminApi::new(HttpClient::new(&stub.base_url(), Arc::clone(&session)).unwrap());

        let err = api.auth().login(123, "bad").await.unwrap_err();
        assert!(err.is_auth_expired());
        assert_eq!(session.get(), None);
        // No forced transition: the session was never authenticated.
        assert_eq!(session.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn logout_clears_credential() {
        let stub = StubServer::spawn(200, "{}").await;
        let session = SessionStore::in_memory();
        session.set("tok");
        let api = AdminApi::new(HttpClient::new(&stub.base_url(), Arc::clone(&session)).unwrap());

        api.auth().logout();
        assert_eq!(session.get(), None);
    }
}
