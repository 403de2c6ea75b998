use serde_json::json;

use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::filters::FraudFlagFilters;
use crate::http::HttpClient;
use crate::models::{FraudFlag, FraudFlagCreate, MessageResponse, RunChecksReport};

pub struct FraudApi {
    http: HttpClient,
}

impl FraudApi {
    pub(super) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn flags(&self, filters: &FraudFlagFilters) -> Result<Vec<FraudFlag>, ClientError> {
        self.http.get("/fraud/flags", &filters.query_params()).await
    }

    pub async fn user_flags(
        &self,
        user_id: i64,
        include_resolved: bool,
    ) -> Result<Vec<FraudFlag>, ClientError> {
        self.http
            .get(
                &format!("/fraud/user/{user_id}/flags"),
                &[("include_resolved".to_owned(), include_resolved.to_string())],
            )
            .await
    }

    pub async fn create_flag(&self, flag: &FraudFlagCreate) -> Result<FraudFlag, ClientError> {
        let body = serde_json::to_value(flag)?;
        self.http.post("/fraud/flags/create", Some(&body)).await
    }

    pub async fn resolve_flag(
        &self,
        flag_id: i64,
        resolution_notes: Option<&str>,
    ) -> Result<FraudFlag, ClientError> {
        let body = json!({ "resolution_notes": resolution_notes });
        self.http
            .post(&format!("/fraud/flags/{flag_id}/resolve"), Some(&body))
            .await
    }

    pub async fn block_user(
        &self,
        user_id: i64,
        reason: &str,
    ) -> Result<MessageResponse, ClientError> {
        let body = json!({ "reason": reason });
        self.http
            .post(&format!("/fraud/user/{user_id}/block"), Some(&body))
            .await
    }

    pub async fn unblock_user(&self, user_id: i64) -> Result<MessageResponse, ClientError> {
        self.http
            .post(&format!("/fraud/user/{user_id}/unblock"), None)
            .await
    }

    pub async fn run_checks(
        &self,
        user_id: i64,
        upi_id: Option<&str>,
    ) -> Result<RunChecksReport, ClientError> {
        let body = json!({ "upi_id": upi_id });
        self.http
            .post(&format!("/fraud/user/{user_id}/run-checks"), Some(&body))
            .await
    }

    pub fn flags_key(filters: &FraudFlagFilters) -> QueryKey {
        QueryKey::new("fraud/flags", filters.query_params())
    }

    pub fn user_flags_key(user_id: i64, include_resolved: bool) -> QueryKey {
        QueryKey::new(
            format!("fraud/user/{user_id}/flags"),
            vec![("include_resolved".to_owned(), include_resolved.to_string())],
        )
    }
}
