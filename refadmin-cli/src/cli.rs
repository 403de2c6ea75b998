use std::path::PathBuf;
use std::str::FromStr;

use admin_client::filters::{Severity, UserType, WithdrawalStatus};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "refadmin",
    about = "Operate the referral admin backend from the terminal",
    version
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to an alternate configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend origin, overriding the configured one
    #[arg(long, global = true, env = "REFADMIN_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, global = true, value_enum, default_value = "pretty")]
    pub output: OutputFormat,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate against the backend and persist the session
    Login {
        /// Admin telegram id
        telegram_id: i64,

        /// Password; prompted interactively when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Drop the persisted session
    Logout,

    /// Today's headline numbers
    Stats {
        /// Keep the screen updated until interrupted
        #[arg(long)]
        watch: bool,

        /// Refresh interval in seconds for --watch
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },

    /// List and search users
    Users {
        /// Match against name, username, phone or referral code
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_parser = UserType::from_str)]
        user_type: Option<UserType>,

        /// Only users with at least one paid order
        #[arg(long)]
        buyers_only: bool,

        /// Only users carrying a suspicion mark
        #[arg(long)]
        suspicious_only: bool,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// List orders
    Orders {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        payment_status: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Referrer performance leaderboard
    Referrers {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Conversion and profit KPIs over a period
    Kpi {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Payment funnel health over a period
    Payments {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Admin action audit trail
    AuditLogs {
        #[arg(long)]
        admin_id: Option<i64>,

        #[arg(long)]
        action_type: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Review and process withdrawal requests
    Withdrawals {
        #[command(subcommand)]
        command: WithdrawalCommands,
    },

    /// Fraud flags and user enforcement
    Fraud {
        #[command(subcommand)]
        command: FraudCommands,
    },

    /// System settings
    Settings {
        #[command(subcommand)]
        command: SettingCommands,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show or reset the configuration file
    Config {
        #[arg(long)]
        show: bool,

        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum WithdrawalCommands {
    /// List withdrawal requests by status
    List {
        #[arg(long, value_parser = WithdrawalStatus::from_str, default_value = "pending")]
        status: WithdrawalStatus,
    },

    /// Aggregate counts and amounts per status
    Statistics,

    /// Approve a pending request
    Approve {
        withdrawal_id: String,

        /// Payment reference, if the transfer already happened
        #[arg(long)]
        reference: Option<String>,
    },

    /// Reject a pending request
    Reject {
        withdrawal_id: String,

        /// Reason shown to the requesting user
        #[arg(long)]
        reason: String,
    },

    /// Mark an approved request as paid out
    Paid {
        withdrawal_id: String,

        /// Reference of the completed transfer
        #[arg(long)]
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum FraudCommands {
    /// List fraud flags
    Flags {
        #[arg(long, value_parser = Severity::from_str)]
        severity: Option<Severity>,

        /// Only resolved (true) or only open (false) flags
        #[arg(long)]
        resolved: Option<bool>,

        #[arg(long, default_value_t = 100)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Flags raised against one user
    UserFlags {
        user_id: i64,

        #[arg(long)]
        include_resolved: bool,
    },

    /// Manually flag a user
    Flag {
        user_id: i64,

        flag_type: String,

        #[arg(long, value_parser = Severity::from_str, default_value = "medium")]
        severity: Severity,

        #[arg(long)]
        description: Option<String>,
    },

    /// Close a flag
    Resolve {
        flag_id: i64,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Block a user from the platform
    Block {
        user_id: i64,

        #[arg(long)]
        reason: String,
    },

    /// Lift a block
    Unblock { user_id: i64 },

    /// Run the automated detection suite against a user
    RunChecks {
        user_id: i64,

        /// UPI id to include in duplicate-payout checks
        #[arg(long)]
        upi_id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SettingCommands {
    /// Show every setting
    List,

    /// Change one setting value
    Set { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn parses_withdrawal_approve() {
        let args = Args::parse_from([
            "refadmin",
            "withdrawals",
            "approve",
            "WD-42",
            "--reference",
            "TXN-77",
        ]);
        match args.command {
            Commands::Withdrawals {
                command:
                    WithdrawalCommands::Approve {
                        withdrawal_id,
                        reference,
                    },
            } => {
                assert_eq!(withdrawal_id, "WD-42");
                assert_eq!(reference.as_deref(), Some("TXN-77"));
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parses_filter_enums() {
        let args = Args::parse_from(["refadmin", "users", "--user-type", "referrer"]);
        match args.command {
            Commands::Users { user_type, .. } => {
                assert_eq!(user_type, Some(UserType::Referrer));
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
