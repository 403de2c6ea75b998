use serde_json::json;

use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::filters::WithdrawalStatus;
use crate::http::HttpClient;
use crate::models::{Withdrawal, WithdrawalStatistics};

pub struct WithdrawalsApi {
    http: HttpClient,
}

impl WithdrawalsApi {
    pub(super) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn all(&self, status: WithdrawalStatus) -> Result<Vec<Withdrawal>, ClientError> {
        self.http
            .get(
                "/withdrawals/admin/all",
                &[("status".to_owned(), status.as_str().to_owned())],
            )
            .await
    }

    pub async fn statistics(&self) -> Result<WithdrawalStatistics, ClientError> {
        self.http.get("/withdrawals/admin/statistics", &[]).await
    }

    /// The payment reference is optional on approval; it becomes mandatory
    /// at mark-paid time.
    pub async fn approve(
        &self,
        withdrawal_id: &str,
        payment_reference: Option<&str>,
    ) -> Result<Withdrawal, ClientError> {
        let body = json!({ "payment_reference": payment_reference });
        self.http
            .post(&format!("/withdrawals/{withdrawal_id}/approve"), Some(&body))
            .await
    }

    pub async fn reject(
        &self,
        withdrawal_id: &str,
        rejection_reason: &str,
    ) -> Result<Withdrawal, ClientError> {
        let body = json!({ "rejection_reason": rejection_reason });
        self.http
            .post(&format!("/withdrawals/{withdrawal_id}/reject"), Some(&body))
            .await
    }

    pub async fn mark_paid(
        &self,
        withdrawal_id: &str,
        payment_reference: &str,
    ) -> Result<Withdrawal, ClientError> {
        let body = json!({ "payment_reference": payment_reference });
        self.http
            .post(&format!("/withdrawals/{withdrawal_id}/paid"), Some(&body))
            .await
    }

    pub fn list_key(status: WithdrawalStatus) -> QueryKey {
        QueryKey::new(
            "withdrawals/admin/all",
            vec![("status".to_owned(), status.as_str().to_owned())],
        )
    }

    pub fn statistics_key() -> QueryKey {
        QueryKey::bare("withdrawals/admin/statistics")
    }
}
