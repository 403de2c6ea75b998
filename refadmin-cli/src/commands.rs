use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use admin_client::api::{AdminApi, DashboardApi, SettingsApi, WithdrawalsApi};
use admin_client::filters::{
    AuditLogFilters, FraudFlagFilters, OrderFilters, ReferrerFilters, Severity, UserFilters,
    UserType, WithdrawalStatus,
};
use admin_client::guard::{self, Route, RouteDecision};
use admin_client::models::FraudFlagCreate;
use admin_client::{
    ClientError, FileTokenStorage, HttpClient, Mutation, MutationDispatcher, QueryCache, QueryKey,
    SessionStore,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::OutputManager;

pub struct CommandExecutor {
    api: AdminApi,
    session: Arc<SessionStore>,
    cache: QueryCache,
    dispatcher: MutationDispatcher,
    notifications: mpsc::UnboundedReceiver<admin_client::Notification>,
    output: OutputManager,
}

impl CommandExecutor {
    pub fn new(config: &AppConfig, output: OutputManager) -> Result<Self> {
        let session = SessionStore::new(FileTokenStorage::new(config.token_path()?));
        let http = HttpClient::new(&config.api_base_url, Arc::clone(&session))?;
        let api = AdminApi::new(http);
        let cache = QueryCache::default();
        let (dispatcher, notifications) = MutationDispatcher::new(api.clone(), cache.clone());
        Ok(Self {
            api,
            session,
            cache,
            dispatcher,
            notifications,
            output,
        })
    }

    /// Same access rule a frontend router applies: protected sections need a
    /// credential before any request goes out.
    fn require_session(&self) -> Result<()> {
        match guard::resolve_with(Route::DEFAULT, &self.session) {
            RouteDecision::RedirectToLogin => Err(CliError::AuthRequired),
            _ => Ok(()),
        }
    }

    async fn fetch_cached<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Value, ClientError>> + Send + 'static,
    {
        let payload = self
            .cache
            .fetch(&key, fetch)
            .await
            .map_err(map_shared_err)?;
        Ok(serde_json::from_value((*payload).clone())?)
    }

    fn drain_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            println!("{}", self.output.notification(&notification));
        }
    }

    async fn run_mutation(&mut self, mutation: Mutation) -> Result<Value> {
        match self.dispatcher.dispatch(mutation).await {
            Ok(payload) => {
                self.drain_notifications();
                Ok(payload)
            }
            Err(e) if e.is_auth_expired() => Err(CliError::SessionExpired),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn login(&mut self, telegram_id: i64, password: Option<String>) -> Result<()> {
        // Counterpart of redirecting an authenticated session away from the
        // login screen.
        if let RouteDecision::RedirectToDefault = guard::resolve_with(Route::Login, &self.session)
        {
            println!("already logged in; run `refadmin logout` first");
            return Ok(());
        }
        let password = match password {
            Some(p) => p,
            None => inquire::Password::new("Password:")
                .without_confirmation()
                .prompt()?,
        };
        match self.api.auth().login(telegram_id, &password).await {
            Ok(_) => {
                println!("logged in as {telegram_id}");
                Ok(())
            }
            Err(e) if e.is_auth_expired() => {
                Err(CliError::InvalidInput("invalid credentials".to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn logout(&self) {
        self.api.auth().logout();
        println!("logged out");
    }

    pub async fn stats(&mut self, watch: bool, interval: u64) -> Result<()> {
        self.require_session()?;

        let api = self.api.clone();
        let stats = self
            .fetch_cached(DashboardApi::stats_key(), move || async move {
                let stats = api.dashboard().stats().await?;
                Ok(serde_json::to_value(stats)?)
            })
            .await?;
        println!("{}", self.output.stats(&stats)?);

        if !watch {
            return Ok(());
        }

        let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
        ticker.tick().await; // immediate first tick already served above
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    debug!("watch interrupted");
                    return Ok(());
                }
            }
            let api = self.api.clone();
            let payload = self
                .cache
                .refetch(&DashboardApi::stats_key(), move || async move {
                    let stats = api.dashboard().stats().await?;
                    Ok(serde_json::to_value(stats)?)
                })
                .await
                .map_err(map_shared_err)?;
            let stats = serde_json::from_value((*payload).clone())?;
            println!("--- {} ---", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"));
            println!("{}", self.output.stats(&stats)?);
        }
    }

    pub async fn users(
        &self,
        search: Option<String>,
        user_type: Option<UserType>,
        buyers_only: bool,
        suspicious_only: bool,
        page: u32,
        limit: u32,
    ) -> Result<()> {
        self.require_session()?;
        let mut filters = UserFilters {
            limit,
            ..Default::default()
        };
        if let Some(search) = search {
            filters = filters.with_search(search);
        }
        filters = filters
            .with_user_type(user_type)
            .with_is_buyer(buyers_only.then_some(true))
            .with_is_suspicious(suspicious_only.then_some(true))
            .with_page(page);

        let api = self.api.clone();
        let request = filters.clone();
        let users = self
            .fetch_cached(DashboardApi::users_key(&filters), move || async move {
                let page = api.dashboard().users(&request).await?;
                Ok(serde_json::to_value(page)?)
            })
            .await?;
        println!("{}", self.output.users(&users)?);
        Ok(())
    }

    pub async fn orders(
        &self,
        search: Option<String>,
        payment_status: Option<String>,
        page: u32,
        limit: u32,
    ) -> Result<()> {
        self.require_session()?;
        let mut filters = OrderFilters {
            limit,
            ..Default::default()
        };
        if let Some(search) = search {
            filters = filters.with_search(search);
        }
        filters = filters.with_payment_status(payment_status).with_page(page);

        let orders = self.api.dashboard().orders(&filters).await?;
        println!("{}", self.output.orders(&orders)?);
        Ok(())
    }

    pub async fn referrers(&self, page: u32, limit: u32) -> Result<()> {
        self.require_session()?;
        let filters = ReferrerFilters { page: 1, limit }.with_page(page);
        let referrers = self.api.dashboard().referrers(&filters).await?;
        println!("{}", self.output.referrers(&referrers)?);
        Ok(())
    }

    pub async fn kpi(&self, days: u32) -> Result<()> {
        self.require_session()?;
        let kpi = self.api.dashboard().kpi(days).await?;
        println!("{}", self.output.kpi(&kpi)?);
        Ok(())
    }

    pub async fn payments(&self, days: u32) -> Result<()> {
        self.require_session()?;
        let monitoring = self.api.dashboard().payment_monitoring(days).await?;
        println!("{}", self.output.payments(&monitoring)?);
        Ok(())
    }

    pub async fn audit_logs(
        &self,
        admin_id: Option<i64>,
        action_type: Option<String>,
        page: u32,
        limit: u32,
    ) -> Result<()> {
        self.require_session()?;
        let filters = AuditLogFilters {
            limit,
            ..Default::default()
        }
        .with_admin_id(admin_id)
        .with_action_type(action_type)
        .with_page(page);

        let logs = self.api.dashboard().audit_logs(&filters).await?;
        println!("{}", self.output.audit_logs(&logs)?);
        Ok(())
    }

    pub async fn withdrawals_list(&self, status: WithdrawalStatus) -> Result<()> {
        self.require_session()?;
        let api = self.api.clone();
        let withdrawals: Vec<admin_client::models::Withdrawal> = self
            .fetch_cached(WithdrawalsApi::list_key(status), move || async move {
                let list = api.withdrawals().all(status).await?;
                Ok(serde_json::to_value(list)?)
            })
            .await?;
        println!("{}", self.output.withdrawals(&withdrawals)?);
        Ok(())
    }

    pub async fn withdrawals_statistics(&self) -> Result<()> {
        self.require_session()?;
        let stats = self.api.withdrawals().statistics().await?;
        println!("{}", self.output.withdrawal_statistics(&stats)?);
        Ok(())
    }

    pub async fn withdrawal_approve(
        &mut self,
        withdrawal_id: String,
        reference: Option<String>,
    ) -> Result<()> {
        self.require_session()?;
        self.run_mutation(Mutation::ApproveWithdrawal {
            withdrawal_id,
            payment_reference: reference,
        })
        .await
        .map(|_| ())
    }

    pub async fn withdrawal_reject(&mut self, withdrawal_id: String, reason: String) -> Result<()> {
        self.require_session()?;
        self.run_mutation(Mutation::RejectWithdrawal {
            withdrawal_id,
            rejection_reason: reason,
        })
        .await
        .map(|_| ())
    }

    pub async fn withdrawal_paid(
        &mut self,
        withdrawal_id: String,
        reference: String,
    ) -> Result<()> {
        self.require_session()?;
        self.run_mutation(Mutation::MarkWithdrawalPaid {
            withdrawal_id,
            payment_reference: reference,
        })
        .await
        .map(|_| ())
    }

    pub async fn fraud_flags(
        &self,
        severity: Option<Severity>,
        resolved: Option<bool>,
        limit: u32,
        offset: u32,
    ) -> Result<()> {
        self.require_session()?;
        let filters = FraudFlagFilters {
            limit,
            ..Default::default()
        }
        .with_severity(severity)
        .with_resolved(resolved)
        .with_offset(offset);

        let flags = self.api.fraud().flags(&filters).await?;
        println!("{}", self.output.fraud_flags(&flags)?);
        Ok(())
    }

    pub async fn fraud_user_flags(&self, user_id: i64, include_resolved: bool) -> Result<()> {
        self.require_session()?;
        let flags = self
            .api
            .fraud()
            .user_flags(user_id, include_resolved)
            .await?;
        println!("{}", self.output.fraud_flags(&flags)?);
        Ok(())
    }

    pub async fn fraud_flag(
        &mut self,
        user_id: i64,
        flag_type: String,
        severity: Severity,
        description: Option<String>,
    ) -> Result<()> {
        self.require_session()?;
        self.run_mutation(Mutation::CreateFraudFlag(FraudFlagCreate {
            user_id,
            flag_type,
            severity,
            description,
        }))
        .await
        .map(|_| ())
    }

    pub async fn fraud_resolve(&mut self, flag_id: i64, notes: Option<String>) -> Result<()> {
        self.require_session()?;
        self.run_mutation(Mutation::ResolveFraudFlag {
            flag_id,
            resolution_notes: notes,
        })
        .await
        .map(|_| ())
    }

    pub async fn fraud_block(&mut self, user_id: i64, reason: String) -> Result<()> {
        self.require_session()?;
        self.run_mutation(Mutation::BlockUser { user_id, reason })
            .await
            .map(|_| ())
    }

    pub async fn fraud_unblock(&mut self, user_id: i64) -> Result<()> {
        self.require_session()?;
        self.run_mutation(Mutation::UnblockUser { user_id })
            .await
            .map(|_| ())
    }

    pub async fn fraud_run_checks(&mut self, user_id: i64, upi_id: Option<String>) -> Result<()> {
        self.require_session()?;
        let report = self
            .run_mutation(Mutation::RunFraudChecks { user_id, upi_id })
            .await?;
        let created: Vec<&str> = report
            .get("flags_created")
            .and_then(Value::as_array)
            .map(|flags| flags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        if created.is_empty() {
            println!("no new flags");
        } else {
            for flag in created {
                println!("flagged: {flag}");
            }
        }
        Ok(())
    }

    pub async fn settings_list(&self) -> Result<()> {
        self.require_session()?;
        let api = self.api.clone();
        let settings: Vec<admin_client::models::SystemSetting> = self
            .fetch_cached(SettingsApi::all_key(), move || async move {
                let settings = api.settings().all().await?;
                Ok(serde_json::to_value(settings)?)
            })
            .await?;
        println!("{}", self.output.settings(&settings)?);
        Ok(())
    }

    pub async fn settings_set(&mut self, key: String, value: String) -> Result<()> {
        self.require_session()?;
        self.run_mutation(Mutation::UpdateSetting { key, value })
            .await
            .map(|_| ())
    }
}

/// Cache fetch results arrive behind an `Arc` because concurrent callers
/// share them; flatten that into a CLI error.
fn map_shared_err(err: Arc<ClientError>) -> CliError {
    if err.is_auth_expired() {
        CliError::SessionExpired
    } else {
        CliError::Api(err.to_string())
    }
}
