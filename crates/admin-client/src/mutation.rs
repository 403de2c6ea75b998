//! Write operations with local validation, cache invalidation and operator
//! notifications.
//!
//! Every mutation validates its inputs before touching the network; a
//! validation failure never produces a request. On success the dispatcher
//! invalidates the affected cache families so mounted watchers revalidate,
//! then emits a success notification. Auth expiry is handled globally by the
//! HTTP layer, so it never doubles as a per-mutation failure notification.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::{AdminApi, prefix};
use crate::cache::QueryCache;
use crate::error::ClientError;
use crate::models::FraudFlagCreate;

/// A single admin write operation.
#[derive(Debug, Clone)]
pub enum Mutation {
    ApproveWithdrawal {
        withdrawal_id: String,
        payment_reference: Option<String>,
    },
    RejectWithdrawal {
        withdrawal_id: String,
        rejection_reason: String,
    },
    MarkWithdrawalPaid {
        withdrawal_id: String,
        payment_reference: String,
    },
    CreateFraudFlag(FraudFlagCreate),
    ResolveFraudFlag {
        flag_id: i64,
        resolution_notes: Option<String>,
    },
    BlockUser {
        user_id: i64,
        reason: String,
    },
    UnblockUser {
        user_id: i64,
    },
    RunFraudChecks {
        user_id: i64,
        upi_id: Option<String>,
    },
    UpdateSetting {
        key: String,
        value: String,
    },
}

impl Mutation {
    /// Local input checks; a failure here means no request is issued.
    pub fn validate(&self) -> Result<(), ClientError> {
        match self {
            Mutation::ApproveWithdrawal { withdrawal_id, .. } => {
                require(withdrawal_id, "withdrawal id is required")
            }
            Mutation::RejectWithdrawal {
                withdrawal_id,
                rejection_reason,
            } => {
                require(withdrawal_id, "withdrawal id is required")?;
                require(rejection_reason, "rejection reason is required")
            }
            Mutation::MarkWithdrawalPaid {
                withdrawal_id,
                payment_reference,
            } => {
                require(withdrawal_id, "withdrawal id is required")?;
                require(payment_reference, "payment reference is required")
            }
            Mutation::CreateFraudFlag(flag) => require(&flag.flag_type, "flag type is required"),
            Mutation::ResolveFraudFlag { .. } | Mutation::UnblockUser { .. } => Ok(()),
            Mutation::BlockUser { reason, .. } => require(reason, "block reason is required"),
            Mutation::RunFraudChecks { .. } => Ok(()),
            Mutation::UpdateSetting { key, value } => {
                require(key, "setting key is required")?;
                require(value, "setting value is required")
            }
        }
    }

    /// Message shown to the operator once the backend confirms.
    pub fn success_message(&self) -> &'static str {
        match self {
            Mutation::ApproveWithdrawal { .. } => "Withdrawal approved",
            Mutation::RejectWithdrawal { .. } => "Withdrawal rejected",
            Mutation::MarkWithdrawalPaid { .. } => "Withdrawal marked as paid",
            Mutation::CreateFraudFlag(_) => "Fraud flag created",
            Mutation::ResolveFraudFlag { .. } => "Fraud flag resolved",
            Mutation::BlockUser { .. } => "User blocked",
            Mutation::UnblockUser { .. } => "User unblocked",
            Mutation::RunFraudChecks { .. } => "Fraud checks completed",
            Mutation::UpdateSetting { .. } => "Setting updated",
        }
    }

    /// Cache families whose cached reads this mutation makes stale.
    pub fn invalidates(&self) -> &'static [&'static str] {
        match self {
            Mutation::ApproveWithdrawal { .. }
            | Mutation::RejectWithdrawal { .. }
            | Mutation::MarkWithdrawalPaid { .. } => &[prefix::WITHDRAWALS],
            Mutation::CreateFraudFlag(_)
            | Mutation::ResolveFraudFlag { .. }
            | Mutation::RunFraudChecks { .. } => &[prefix::FRAUD],
            Mutation::BlockUser { .. } | Mutation::UnblockUser { .. } => {
                &[prefix::FRAUD, prefix::USERS]
            }
            Mutation::UpdateSetting { .. } => &[prefix::SETTINGS],
        }
    }

    async fn execute(&self, api: &AdminApi) -> Result<Value, ClientError> {
        match self {
            Mutation::ApproveWithdrawal {
                withdrawal_id,
                payment_reference,
            } => {
                let w = api
                    .withdrawals()
                    .approve(withdrawal_id, payment_reference.as_deref())
                    .await?;
                Ok(serde_json::to_value(w)?)
            }
            Mutation::RejectWithdrawal {
                withdrawal_id,
                rejection_reason,
            } => {
                let w = api
                    .withdrawals()
                    .reject(withdrawal_id, rejection_reason)
                    .await?;
                Ok(serde_json::to_value(w)?)
            }
            Mutation::MarkWithdrawalPaid {
                withdrawal_id,
                payment_reference,
            } => {
                let w = api
                    .withdrawals()
                    .mark_paid(withdrawal_id, payment_reference)
                    .await?;
                Ok(serde_json::to_value(w)?)
            }
            Mutation::CreateFraudFlag(flag) => {
                let created = api.fraud().create_flag(flag).await?;
                Ok(serde_json::to_value(created)?)
            }
            Mutation::ResolveFraudFlag {
                flag_id,
                resolution_notes,
            } => {
                let flag = api
                    .fraud()
                    .resolve_flag(*flag_id, resolution_notes.as_deref())
                    .await?;
                Ok(serde_json::to_value(flag)?)
            }
            Mutation::BlockUser { user_id, reason } => {
                let msg = api.fraud().block_user(*user_id, reason).await?;
                Ok(serde_json::to_value(msg)?)
            }
            Mutation::UnblockUser { user_id } => {
                let msg = api.fraud().unblock_user(*user_id).await?;
                Ok(serde_json::to_value(msg)?)
            }
            Mutation::RunFraudChecks { user_id, upi_id } => {
                let report = api.fraud().run_checks(*user_id, upi_id.as_deref()).await?;
                Ok(serde_json::to_value(report)?)
            }
            Mutation::UpdateSetting { key, value } => {
                let setting = api.settings().update(key, value).await?;
                Ok(serde_json::to_value(setting)?)
            }
        }
    }
}

fn require(value: &str, message: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        Err(ClientError::validation(message))
    } else {
        Ok(())
    }
}

/// Operator-facing outcome of a dispatched mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

/// Runs mutations against the backend and keeps the query cache honest.
#[derive(Clone)]
pub struct MutationDispatcher {
    api: AdminApi,
    cache: QueryCache,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl MutationDispatcher {
    pub fn new(
        api: AdminApi,
        cache: QueryCache,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notifications, rx) = mpsc::unbounded_channel();
        (
            Self {
                api,
                cache,
                notifications,
            },
            rx,
        )
    }

    /// Validate, execute, invalidate, notify. Returns the backend payload so
    /// callers that want the updated resource do not have to refetch it.
    pub async fn dispatch(&self, mutation: Mutation) -> Result<Value, ClientError> {
        // Validation errors go straight back to the caller; notifications are
        // for outcomes of requests that actually ran.
        mutation.validate()?;

        match mutation.execute(&self.api).await {
            Ok(payload) => {
                for prefix in mutation.invalidates() {
                    self.cache.invalidate_prefix(prefix);
                }
                info!(message = mutation.success_message(), "mutation applied");
                self.notify(Notification::Success(
                    mutation.success_message().to_owned(),
                ));
                Ok(payload)
            }
            Err(err) => {
                // Auth expiry already cleared the session and steers the UI
                // to the login route; a duplicate toast would be noise.
                if !err.is_auth_expired() {
                    self.notify(Notification::Failure(err.to_string()));
                }
                Err(err)
            }
        }
    }

    fn notify(&self, notification: Notification) {
        // The receiver may be gone during shutdown; nothing to do then.
        if self.notifications.send(notification).is_err() {
            debug!("notification receiver dropped");
        }
    }
}
