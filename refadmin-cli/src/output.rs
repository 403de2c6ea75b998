use admin_client::Notification;
use admin_client::models::{
    AdminUser, AuditLogEntry, DashboardStats, FraudFlag, KpiMetrics, OrderSummary, Paginated,
    PaymentMonitoring, ReferrerPerformance, SystemSetting, Withdrawal, WithdrawalStatistics,
};
use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::Result;

pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
    currency: String,
}

impl OutputManager {
    pub fn new(format: OutputFormat, currency: String) -> Self {
        Self {
            format,
            // JSON output is for pipes; keep it free of escape codes.
            colored: format != OutputFormat::Json,
            currency,
        }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.colored {
            text.color(color).to_string()
        } else {
            text.to_owned()
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.colored {
            text.green().bold().to_string()
        } else {
            text.to_owned()
        }
    }

    fn field(&self, name: &str, value: &str) -> String {
        format!(
            "  {}: {}\n",
            self.colorize(name, Color::Yellow),
            self.colorize(value, Color::Cyan)
        )
    }

    pub fn money(&self, amount: f64) -> String {
        format!("{} {amount:.2}", self.currency)
    }

    fn json<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    fn table<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        table.to_string()
    }

    fn page_footer(&self, page: u32, pages: u32, total: u64) -> String {
        self.colorize(&format!("page {page} of {pages} ({total} total)"), Color::Blue)
    }

    pub fn notification(&self, notification: &Notification) -> String {
        match notification {
            Notification::Success(msg) => format!("{} {msg}", self.colorize("✓", Color::Green)),
            Notification::Failure(msg) => format!("{} {msg}", self.colorize("✗", Color::Red)),
        }
    }

    pub fn stats(&self, stats: &DashboardStats) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(stats);
        }
        let mut out = String::new();
        out.push_str(&self.heading("Today"));
        out.push('\n');
        out.push_str(&self.field("New users", &stats.new_users_today.to_string()));
        out.push_str(&self.field("Buyers", &stats.buyers_today.to_string()));
        out.push_str(&self.field("Revenue", &self.money(stats.revenue_today)));
        out.push_str(&self.field("Net profit", &self.money(stats.net_profit_today)));
        out.push_str(&self.field(
            "Referral payouts",
            &self.money(stats.referral_payout_today),
        ));
        out.push_str(&self.field(
            "Active referrers",
            &stats.active_referrers_today.to_string(),
        ));
        out.push('\n');
        out.push_str(&self.heading("Overall"));
        out.push('\n');
        out.push_str(&self.field("Users", &stats.total_users.to_string()));
        out.push_str(&self.field("Buyers", &stats.total_buyers.to_string()));
        out.push_str(&self.field("Revenue", &self.money(stats.total_revenue)));
        out.push_str(&self.field("Profit", &self.money(stats.total_profit)));
        out.push_str(&self.field(
            "Pending withdrawals",
            &format!(
                "{} ({})",
                stats.pending_withdrawals,
                self.money(stats.pending_withdrawal_amount)
            ),
        ));
        Ok(out)
    }

    pub fn users(&self, page: &Paginated<AdminUser>) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(page);
        }

        #[derive(Tabled)]
        struct Row {
            id: i64,
            name: String,
            #[tabled(rename = "type")]
            user_type: String,
            #[tabled(rename = "referral code")]
            referral_code: String,
            spent: String,
            orders: i64,
            flags: String,
            joined: String,
        }

        let rows = page.data.iter().map(|u| Row {
            id: u.id,
            name: u.display_name(),
            user_type: u.user_type.to_string(),
            referral_code: u.referral_code.clone(),
            spent: self.money(u.total_spent),
            orders: u.total_orders,
            flags: user_marks(u),
            joined: fmt_date(&u.join_date),
        });

        Ok(format!(
            "{}\n{}",
            Self::table(rows),
            self.page_footer(page.page, page.pages, page.total)
        ))
    }

    pub fn orders(&self, page: &Paginated<OrderSummary>) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(page);
        }

        #[derive(Tabled)]
        struct Row {
            #[tabled(rename = "order")]
            order_id: String,
            #[tabled(rename = "user")]
            user_id: i64,
            plan: String,
            price: String,
            profit: String,
            #[tabled(rename = "payment")]
            payment_status: String,
            referral: String,
            created: String,
        }

        let rows = page.data.iter().map(|o| Row {
            order_id: o.order_id.clone(),
            user_id: o.user_id,
            plan: o.plan_name.clone(),
            price: self.money(o.selling_price),
            profit: self.money(o.profit),
            payment_status: o.payment_status.clone(),
            referral: o
                .referral_source
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_owned()),
            created: fmt_date(&o.created_at),
        });

        Ok(format!(
            "{}\n{}",
            Self::table(rows),
            self.page_footer(page.page, page.pages, page.total)
        ))
    }

    pub fn referrers(&self, page: &Paginated<ReferrerPerformance>) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(page);
        }

        #[derive(Tabled)]
        struct Row {
            #[tabled(rename = "user")]
            user_id: i64,
            name: String,
            #[tabled(rename = "referrals")]
            total_referrals: i64,
            buyers: i64,
            #[tabled(rename = "conversion %")]
            conversion: String,
            earned: String,
            pending: String,
        }

        let rows = page.data.iter().map(|r| Row {
            user_id: r.user_id,
            name: r
                .username
                .clone()
                .or_else(|| r.first_name.clone())
                .unwrap_or_else(|| "N/A".to_owned()),
            total_referrals: r.stats.total_referrals,
            buyers: r.stats.total_buyers,
            conversion: format!("{:.1}", r.stats.conversion_rate),
            earned: self.money(r.stats.total_commission_earned),
            pending: self.money(r.stats.pending_commission),
        });

        Ok(format!(
            "{}\n{}",
            Self::table(rows),
            self.page_footer(page.page, page.pages, page.total)
        ))
    }

    pub fn kpi(&self, kpi: &KpiMetrics) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(kpi);
        }
        let mut out = String::new();
        out.push_str(&self.heading(&format!("KPIs, last {} days", kpi.period_days)));
        out.push('\n');
        out.push_str(&self.field("Users", &kpi.total_users.to_string()));
        out.push_str(&self.field("Buyers", &kpi.total_buyers.to_string()));
        out.push_str(&self.field("Conversion", &format!("{:.1}%", kpi.conversion_rate)));
        out.push_str(&self.field("Sales", &kpi.total_sales.to_string()));
        out.push_str(&self.field(
            "Referral sales",
            &format!(
                "{} ({:.1}%)",
                kpi.referral_sales, kpi.referral_sales_percent
            ),
        ));
        out.push_str(&self.field("Net profit / day", &self.money(kpi.net_profit_per_day)));
        if !kpi.daily_buyers.is_empty() {
            out.push_str(&self.field(
                "Daily buyers",
                &kpi.daily_buyers
                    .iter()
                    .map(|d| format!("{}:{}", d.date, d.buyers))
                    .collect::<Vec<_>>()
                    .join(" "),
            ));
        }
        Ok(out)
    }

    pub fn payments(&self, monitoring: &PaymentMonitoring) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(monitoring);
        }
        let mut out = String::new();
        out.push_str(&self.heading(&format!(
            "Payment funnel, last {} days",
            monitoring.period_days
        )));
        out.push('\n');
        out.push_str(&self.field("QR generated", &monitoring.qr_generated_count.to_string()));
        out.push_str(&self.field("Succeeded", &monitoring.payment_success_count.to_string()));
        out.push_str(&self.field("Failed", &monitoring.payment_failed_count.to_string()));
        out.push_str(&self.field("Dropped off", &monitoring.payment_dropoff_count.to_string()));
        out.push_str(&self.field(
            "Conversion",
            &format!("{:.1}%", monitoring.conversion_rate),
        ));
        out.push_str(&self.field(
            "Average order",
            &self.money(monitoring.average_order_value),
        ));
        Ok(out)
    }

    pub fn audit_logs(&self, page: &Paginated<AuditLogEntry>) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(page);
        }

        #[derive(Tabled)]
        struct Row {
            #[tabled(rename = "admin")]
            admin_id: i64,
            action: String,
            target: String,
            description: String,
            at: String,
        }

        let rows = page.data.iter().map(|e| Row {
            admin_id: e.admin_id,
            action: e.action_type.clone(),
            target: match (&e.target_type, e.target_id) {
                (Some(t), Some(id)) => format!("{t} {id}"),
                (Some(t), None) => t.clone(),
                _ => "-".to_owned(),
            },
            description: e.description.clone().unwrap_or_default(),
            at: fmt_date(&e.created_at),
        });

        Ok(format!(
            "{}\n{}",
            Self::table(rows),
            self.page_footer(page.page, page.pages, page.total)
        ))
    }

    pub fn withdrawals(&self, withdrawals: &[Withdrawal]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(&withdrawals);
        }
        if withdrawals.is_empty() {
            return Ok("no withdrawal requests".to_owned());
        }

        #[derive(Tabled)]
        struct Row {
            id: String,
            #[tabled(rename = "user")]
            user_id: i64,
            amount: String,
            method: String,
            destination: String,
            status: String,
            requested: String,
        }

        let rows = withdrawals.iter().map(|w| Row {
            id: w.withdrawal_id.clone(),
            user_id: w.user_id,
            amount: self.money(w.amount),
            method: w.withdrawal_method.clone(),
            destination: w
                .upi_id
                .clone()
                .or_else(|| w.bank_account.clone())
                .unwrap_or_else(|| "-".to_owned()),
            status: w.status.to_string(),
            requested: fmt_date(&w.requested_at),
        });

        Ok(Self::table(rows))
    }

    pub fn withdrawal_statistics(&self, stats: &WithdrawalStatistics) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(stats);
        }
        let mut out = String::new();
        out.push_str(&self.heading("Withdrawals"));
        out.push('\n');
        out.push_str(&self.field("Total", &stats.total_withdrawals.to_string()));
        out.push_str(&self.field(
            "Pending",
            &format!(
                "{} ({})",
                stats.pending_count,
                self.money(stats.pending_amount)
            ),
        ));
        out.push_str(&self.field("Approved", &stats.approved_count.to_string()));
        out.push_str(&self.field(
            "Paid",
            &format!("{} ({})", stats.paid_count, self.money(stats.paid_amount)),
        ));
        out.push_str(&self.field("Rejected", &stats.rejected_count.to_string()));
        Ok(out)
    }

    pub fn fraud_flags(&self, flags: &[FraudFlag]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(&flags);
        }
        if flags.is_empty() {
            return Ok("no fraud flags".to_owned());
        }

        #[derive(Tabled)]
        struct Row {
            id: i64,
            #[tabled(rename = "user")]
            user_id: i64,
            #[tabled(rename = "type")]
            flag_type: String,
            severity: String,
            source: String,
            resolved: String,
            created: String,
        }

        let rows = flags.iter().map(|f| Row {
            id: f.id,
            user_id: f.user_id,
            flag_type: f.flag_type.clone(),
            severity: f.severity.to_string(),
            source: if f.auto_detected { "auto" } else { "manual" }.to_owned(),
            resolved: if f.resolved { "yes" } else { "no" }.to_owned(),
            created: fmt_date(&f.created_at),
        });

        Ok(Self::table(rows))
    }

    pub fn settings(&self, settings: &[SystemSetting]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(&settings);
        }

        #[derive(Tabled)]
        struct Row {
            key: String,
            value: String,
            #[tabled(rename = "type")]
            setting_type: String,
            description: String,
        }

        let rows = settings.iter().map(|s| Row {
            key: s.setting_key.clone(),
            value: s.setting_value.clone(),
            setting_type: s.setting_type.clone(),
            description: s.description.clone().unwrap_or_default(),
        });

        Ok(Self::table(rows))
    }
}

fn fmt_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn user_marks(user: &AdminUser) -> String {
    let mut marks = Vec::new();
    if user.is_blocked {
        marks.push("blocked");
    }
    if user.is_suspicious {
        marks.push("suspicious");
    }
    if !user.is_active {
        marks.push("inactive");
    }
    if marks.is_empty() {
        "-".to_owned()
    } else {
        marks.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_client::filters::WithdrawalStatus;

    fn sample_withdrawal() -> Withdrawal {
        Withdrawal {
            id: 42,
            withdrawal_id: "WD-42".to_owned(),
            user_id: 9,
            amount: 750.0,
            withdrawal_method: "upi".to_owned(),
            upi_id: Some("user@upi".to_owned()),
            bank_account: None,
            status: WithdrawalStatus::Pending,
            requested_at: "2026-01-05T09:30:00Z".parse().unwrap(),
            approved_at: None,
            paid_at: None,
            rejection_reason: None,
        }
    }

    #[test]
    fn money_uses_configured_currency() {
        let output = OutputManager::new(OutputFormat::Pretty, "INR".to_owned());
        assert_eq!(output.money(750.0), "INR 750.00");
    }

    #[test]
    fn json_output_is_parseable() {
        let output = OutputManager::new(OutputFormat::Json, "INR".to_owned());
        let rendered = output.withdrawals(&[sample_withdrawal()]).unwrap();
        let parsed: Vec<Withdrawal> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed[0].withdrawal_id, "WD-42");
    }

    #[test]
    fn table_output_contains_the_rows() {
        let output = OutputManager::new(OutputFormat::Table, "INR".to_owned());
        let rendered = output.withdrawals(&[sample_withdrawal()]).unwrap();
        assert!(rendered.contains("WD-42"));
        assert!(rendered.contains("user@upi"));
    }

    #[test]
    fn empty_lists_say_so() {
        let output = OutputManager::new(OutputFormat::Pretty, "INR".to_owned());
        assert_eq!(output.withdrawals(&[]).unwrap(), "no withdrawal requests");
        assert_eq!(output.fraud_flags(&[]).unwrap(), "no fraud flags");
    }
}
