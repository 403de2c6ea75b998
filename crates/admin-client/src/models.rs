//! Pass-through DTOs owned by the backend; the client only caches copies.
//!
//! Decoding is tolerant where the backend marks fields optional. Monetary
//! values arrive as JSON numbers; rendering them in the operator's currency
//! is a presentation concern and stays out of this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filters::{Severity, UserType, WithdrawalStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub new_users_today: i64,
    pub buyers_today: i64,
    pub revenue_today: f64,
    pub net_profit_today: f64,
    pub referral_payout_today: f64,
    pub active_referrers_today: i64,
    pub total_users: i64,
    pub total_buyers: i64,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub pending_withdrawals: i64,
    pub pending_withdrawal_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub referral_code: String,
    pub user_type: UserType,
    pub is_active: bool,
    pub is_blocked: bool,
    pub is_suspicious: bool,
    pub total_spent: f64,
    pub total_orders: i64,
    pub join_date: DateTime<Utc>,
}

impl AdminUser {
    /// "First Last" with whatever parts are present.
    pub fn display_name(&self) -> String {
        let mut name = String::new();
        for part in [&self.first_name, &self.last_name].into_iter().flatten() {
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(part);
        }
        if name.is_empty() {
            self.username.clone().unwrap_or_else(|| "N/A".to_owned())
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub order_id: String,
    pub user_id: i64,
    pub plan_name: String,
    pub selling_price: f64,
    pub making_cost: f64,
    pub profit: f64,
    pub payment_method: String,
    pub payment_status: String,
    #[serde(default)]
    pub referral_source: Option<i64>,
    pub is_wallet_payment: bool,
    pub commission_eligible: bool,
    pub commission_processed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralStats {
    pub total_clicks: i64,
    pub total_referrals: i64,
    pub level1_referrals: i64,
    pub level2_referrals: i64,
    pub total_buyers: i64,
    pub conversion_rate: f64,
    pub total_commission_earned: f64,
    pub total_commission_paid: f64,
    pub pending_commission: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferrerPerformance {
    pub user_id: i64,
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    pub referral_code: String,
    pub stats: ReferralStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub withdrawal_id: String,
    pub user_id: i64,
    pub amount: f64,
    pub withdrawal_method: String,
    #[serde(default)]
    pub upi_id: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
    pub status: WithdrawalStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalStatistics {
    pub total_withdrawals: i64,
    pub pending_count: i64,
    pub pending_amount: f64,
    pub approved_count: i64,
    pub paid_count: i64,
    pub paid_amount: f64,
    pub rejected_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudFlag {
    pub id: i64,
    pub user_id: i64,
    pub flag_type: String,
    pub severity: Severity,
    #[serde(default)]
    pub description: Option<String>,
    pub auto_detected: bool,
    pub resolved: bool,
    #[serde(default)]
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for manually flagging a user.
#[derive(Debug, Clone, Serialize)]
pub struct FraudFlagCreate {
    pub user_id: i64,
    pub flag_type: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunChecksReport {
    pub flags_created: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    pub id: i64,
    pub setting_key: String,
    pub setting_value: String,
    pub setting_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub admin_id: i64,
    pub action_type: String,
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub target_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiMetrics {
    pub period_days: i64,
    pub total_users: i64,
    pub total_buyers: i64,
    pub conversion_rate: f64,
    pub total_sales: i64,
    pub referral_sales: i64,
    pub referral_sales_percent: f64,
    pub net_profit_per_day: f64,
    #[serde(default)]
    pub daily_buyers: Vec<DailyBuyers>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBuyers {
    pub date: String,
    pub buyers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMonitoring {
    pub period_days: i64,
    pub qr_generated_count: i64,
    pub payment_success_count: i64,
    pub payment_failed_count: i64,
    pub payment_dropoff_count: i64,
    pub conversion_rate: f64,
    pub average_order_value: f64,
}

/// Page envelope used by all paginated dashboard endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
    pub data: Vec<T>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
}
