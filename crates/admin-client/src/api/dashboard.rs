use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::filters::{AuditLogFilters, OrderFilters, ReferrerFilters, UserFilters};
use crate::http::HttpClient;
use crate::models::{
    AdminUser, AuditLogEntry, DashboardStats, KpiMetrics, OrderSummary, Paginated,
    PaymentMonitoring, ReferrerPerformance,
};

pub struct DashboardApi {
    http: HttpClient,
}

impl DashboardApi {
    pub(super) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn stats(&self) -> Result<DashboardStats, ClientError> {
        self.http.get("/admin/dashboard/stats", &[]).await
    }

    pub async fn users(&self, filters: &UserFilters) -> Result<Paginated<AdminUser>, ClientError> {
        self.http
            .get("/admin/dashboard/users", &filters.query_params())
            .await
    }

    pub async fn orders(
        &self,
        filters: &OrderFilters,
    ) -> Result<Paginated<OrderSummary>, ClientError> {
        self.http
            .get("/admin/dashboard/orders", &filters.query_params())
            .await
    }

    pub async fn referrers(
        &self,
        filters: &ReferrerFilters,
    ) -> Result<Paginated<ReferrerPerformance>, ClientError> {
        self.http
            .get("/admin/dashboard/referrers", &filters.query_params())
            .await
    }

    pub async fn payment_monitoring(&self, days: u32) -> Result<PaymentMonitoring, ClientError> {
        self.http
            .get(
                "/admin/dashboard/payment-monitoring",
                &[("days".to_owned(), days.to_string())],
            )
            .await
    }

    pub async fn kpi(&self, days: u32) -> Result<KpiMetrics, ClientError> {
        self.http
            .get(
                "/admin/dashboard/kpi",
                &[("days".to_owned(), days.to_string())],
            )
            .await
    }

    pub async fn audit_logs(
        &self,
        filters: &AuditLogFilters,
    ) -> Result<Paginated<AuditLogEntry>, ClientError> {
        self.http
            .get("/admin/dashboard/audit-logs", &filters.query_params())
            .await
    }

    pub fn stats_key() -> QueryKey {
        QueryKey::bare("admin/dashboard/stats")
    }

    pub fn users_key(filters: &UserFilters) -> QueryKey {
        QueryKey::new("admin/dashboard/users", filters.query_params())
    }

    pub fn orders_key(filters: &OrderFilters) -> QueryKey {
        QueryKey::new("admin/dashboard/orders", filters.query_params())
    }

    pub fn referrers_key(filters: &ReferrerFilters) -> QueryKey {
        QueryKey::new("admin/dashboard/referrers", filters.query_params())
    }

    pub fn kpi_key(days: u32) -> QueryKey {
        QueryKey::new(
            "admin/dashboard/kpi",
            vec![("days".to_owned(), days.to_string())],
        )
    }

    pub fn payment_monitoring_key(days: u32) -> QueryKey {
        QueryKey::new(
            "admin/dashboard/payment-monitoring",
            vec![("days".to_owned(), days.to_string())],
        )
    }

    pub fn audit_logs_key(filters: &AuditLogFilters) -> QueryKey {
        QueryKey::new("admin/dashboard/audit-logs", filters.query_params())
    }
}
