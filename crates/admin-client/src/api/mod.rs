//! Typed endpoint families over the shared HTTP client.
//!
//! Paths and payloads mirror the admin backend surface; each family also
//! exposes the cache-key constructors for its read endpoints so views and
//! the mutation dispatcher agree on key shapes by construction.

mod auth;
mod dashboard;
mod fraud;
mod settings;
mod withdrawals;

pub use auth::AuthApi;
pub use dashboard::DashboardApi;
pub use fraud::FraudApi;
pub use settings::SettingsApi;
pub use withdrawals::WithdrawalsApi;

use crate::http::HttpClient;

/// Cache-key prefixes per resource family, used for invalidation.
pub mod prefix {
    pub const DASHBOARD: &str = "admin/dashboard";
    pub const USERS: &str = "admin/dashboard/users";
    pub const WITHDRAWALS: &str = "withdrawals";
    pub const FRAUD: &str = "fraud";
    pub const SETTINGS: &str = "settings";
}

/// Entry point bundling all endpoint families.
#[derive(Clone)]
pub struct AdminApi {
    http: HttpClient,
}

impl AdminApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.http.clone())
    }

    pub fn dashboard(&self) -> DashboardApi {
        DashboardApi::new(self.http.clone())
    }

    pub fn withdrawals(&self) -> WithdrawalsApi {
        WithdrawalsApi::new(self.http.clone())
    }

    pub fn fraud(&self) -> FraudApi {
        FraudApi::new(self.http.clone())
    }

    pub fn settings(&self) -> SettingsApi {
        SettingsApi::new(self.http.clone())
    }
}
