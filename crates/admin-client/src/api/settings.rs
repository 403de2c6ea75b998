use serde_json::json;

use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::http::HttpClient;
use crate::models::SystemSetting;

pub struct SettingsApi {
    http: HttpClient,
}

impl SettingsApi {
    pub(super) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn all(&self) -> Result<Vec<SystemSetting>, ClientError> {
        self.http.get("/settings/all", &[]).await
    }

    pub async fn update(&self, key: &str, value: &str) -> Result<SystemSetting, ClientError> {
        let body = json!({ "setting_value": value });
        self.http.put(&format!("/settings/{key}"), &body).await
    }

    pub fn all_key() -> QueryKey {
        QueryKey::bare("settings/all")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AdminApi, prefix};
    use crate::session::SessionStore;
    use crate::testutil::StubServer;

    #[tokio::test]
    async fn update_puts_setting_value() {
        let stub = StubServer::spawn(
            200,
            r#"{
                "id": 1,
                "setting_key": "min_withdrawal_amount",
                "setting_value": "500",
                "setting_type": "decimal",
                "description": null,
                "updated_at": "2026-02-01T12:00:00Z"
            }"#,
        )
        .await;
        let api = AdminApi::new(
            HttpClient::new(&stub.base_url(), SessionStore::in_memory()).unwrap(),
        );

        let setting = api
            .settings()
            .update("min_withdrawal_amount", "500")
            .await
            .unwrap();
        assert_eq!(setting.setting_value, "500");

        let request = stub.last_request().await;
        assert!(request.contains("PUT /settings/min_withdrawal_amount"));
        assert!(request.contains(r#""setting_value":"500""#));
    }

    #[test]
    fn settings_key_falls_under_the_family_prefix() {
        assert!(SettingsApi::all_key().matches_prefix(prefix::SETTINGS));
    }
}
