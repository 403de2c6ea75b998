//! Per-view filter state.
//!
//! Filter values are immutable: every change produces a new value, so cache
//! keys stay derivable by plain equality. Changing any non-page field resets
//! the page to 1; changing the page leaves everything else untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub type QueryParams = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Customer,
    Referrer,
    Admin,
    SuperAdmin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Referrer => "referrer",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "referrer" => Ok(Self::Referrer),
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(format!("unknown user type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Approved,
    Paid,
    Rejected,
}

impl WithdrawalStatus {
    pub const ALL: [WithdrawalStatus; 4] = [
        Self::Pending,
        Self::Approved,
        Self::Paid,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "paid" => Ok(Self::Paid),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown withdrawal status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

fn push_opt(params: &mut QueryParams, name: &str, value: Option<String>) {
    if let Some(value) = value {
        params.push((name.to_owned(), value));
    }
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Filters for the user management list.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFilters {
    pub search: Option<String>,
    pub user_type: Option<UserType>,
    pub is_buyer: Option<bool>,
    pub is_suspicious: Option<bool>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

impl Default for UserFilters {
    fn default() -> Self {
        Self {
            search: None,
            user_type: None,
            is_buyer: None,
            is_suspicious: None,
            date_from: None,
            date_to: None,
            page: 1,
            limit: 50,
        }
    }
}

impl UserFilters {
    /// An empty search string clears the filter.
    pub fn with_search<S: Into<String>>(self, search: S) -> Self {
        let search = search.into();
        Self {
            search: (!search.is_empty()).then_some(search),
            page: 1,
            ..self
        }
    }

    pub fn with_user_type(self, user_type: Option<UserType>) -> Self {
        Self {
            user_type,
            page: 1,
            ..self
        }
    }

    pub fn with_is_buyer(self, is_buyer: Option<bool>) -> Self {
        Self {
            is_buyer,
            page: 1,
            ..self
        }
    }

    pub fn with_is_suspicious(self, is_suspicious: Option<bool>) -> Self {
        Self {
            is_suspicious,
            page: 1,
            ..self
        }
    }

    pub fn with_dates(self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self {
            date_from: from,
            date_to: to,
            page: 1,
            ..self
        }
    }

    pub fn with_page(self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_opt(&mut params, "search", self.search.clone());
        push_opt(
            &mut params,
            "user_type",
            self.user_type.map(|t| t.as_str().to_owned()),
        );
        push_opt(&mut params, "is_buyer", self.is_buyer.map(|b| b.to_string()));
        push_opt(
            &mut params,
            "is_suspicious",
            self.is_suspicious.map(|b| b.to_string()),
        );
        push_opt(&mut params, "date_from", self.date_from.as_ref().map(fmt_ts));
        push_opt(&mut params, "date_to", self.date_to.as_ref().map(fmt_ts));
        params.push(("page".to_owned(), self.page.to_string()));
        params.push(("limit".to_owned(), self.limit.to_string()));
        params
    }
}

/// Filters for the order list.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFilters {
    pub search: Option<String>,
    pub payment_status: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

impl Default for OrderFilters {
    fn default() -> Self {
        Self {
            search: None,
            payment_status: None,
            date_from: None,
            date_to: None,
            page: 1,
            limit: 50,
        }
    }
}

impl OrderFilters {
    pub fn with_search<S: Into<String>>(self, search: S) -> Self {
        let search = search.into();
        Self {
            search: (!search.is_empty()).then_some(search),
            page: 1,
            ..self
        }
    }

    pub fn with_payment_status(self, payment_status: Option<String>) -> Self {
        Self {
            payment_status,
            page: 1,
            ..self
        }
    }

    pub fn with_page(self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_opt(&mut params, "search", self.search.clone());
        push_opt(&mut params, "payment_status", self.payment_status.clone());
        push_opt(&mut params, "date_from", self.date_from.as_ref().map(fmt_ts));
        push_opt(&mut params, "date_to", self.date_to.as_ref().map(fmt_ts));
        params.push(("page".to_owned(), self.page.to_string()));
        params.push(("limit".to_owned(), self.limit.to_string()));
        params
    }
}

/// Pagination for the referrer performance list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferrerFilters {
    pub page: u32,
    pub limit: u32,
}

impl Default for ReferrerFilters {
    fn default() -> Self {
        Self { page: 1, limit: 50 }
    }
}

impl ReferrerFilters {
    pub fn with_page(self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn query_params(&self) -> QueryParams {
        vec![
            ("page".to_owned(), self.page.to_string()),
            ("limit".to_owned(), self.limit.to_string()),
        ]
    }
}

/// Filters for the admin audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogFilters {
    pub admin_id: Option<i64>,
    pub action_type: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

impl Default for AuditLogFilters {
    fn default() -> Self {
        Self {
            admin_id: None,
            action_type: None,
            date_from: None,
            date_to: None,
            page: 1,
            limit: 100,
        }
    }
}

impl AuditLogFilters {
    pub fn with_admin_id(self, admin_id: Option<i64>) -> Self {
        Self {
            admin_id,
            page: 1,
            ..self
        }
    }

    pub fn with_action_type(self, action_type: Option<String>) -> Self {
        Self {
            action_type,
            page: 1,
            ..self
        }
    }

    pub fn with_page(self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_opt(
            &mut params,
            "admin_id",
            self.admin_id.map(|id| id.to_string()),
        );
        push_opt(&mut params, "action_type", self.action_type.clone());
        push_opt(&mut params, "date_from", self.date_from.as_ref().map(fmt_ts));
        push_opt(&mut params, "date_to", self.date_to.as_ref().map(fmt_ts));
        params.push(("page".to_owned(), self.page.to_string()));
        params.push(("limit".to_owned(), self.limit.to_string()));
        params
    }
}

/// Filters for the fraud flag list (offset-paginated on the backend).
#[derive(Debug, Clone, PartialEq)]
pub struct FraudFlagFilters {
    pub severity: Option<Severity>,
    pub resolved: Option<bool>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for FraudFlagFilters {
    fn default() -> Self {
        Self {
            severity: None,
            resolved: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl FraudFlagFilters {
    pub fn with_severity(self, severity: Option<Severity>) -> Self {
        Self {
            severity,
            offset: 0,
            ..self
        }
    }

    pub fn with_resolved(self, resolved: Option<bool>) -> Self {
        Self {
            resolved,
            offset: 0,
            ..self
        }
    }

    pub fn with_offset(self, offset: u32) -> Self {
        Self { offset, ..self }
    }

    pub fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_opt(
            &mut params,
            "severity",
            self.severity.map(|s| s.as_str().to_owned()),
        );
        push_opt(&mut params, "resolved", self.resolved.map(|b| b.to_string()));
        params.push(("limit".to_owned(), self.limit.to_string()));
        params.push(("offset".to_owned(), self.offset.to_string()));
        params
    }
}
