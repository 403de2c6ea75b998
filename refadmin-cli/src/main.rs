mod cli;
mod commands;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands, FraudCommands, OutputFormat, SettingCommands, WithdrawalCommands},
    commands::CommandExecutor,
    config::AppConfig,
    error::Result,
    output::OutputManager,
};
use clap::Parser;
use colored::Colorize;
use std::process;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let output_format = args.output;

    if let Err(e) = run(args).await {
        match output_format {
            OutputFormat::Json => {
                let error_json = serde_json::json!({
                    "status": "error",
                    "message": e.to_string(),
                });
                println!("{}", serde_json::to_string(&error_json).unwrap());
            }
            _ => {
                error!("command failed: {e}");
                eprintln!("{} {e}", "Error:".red().bold());
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }

    // Commands that never talk to the backend skip executor construction.
    match &args.command {
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            return Ok(());
        }
        Commands::Config { show, reset } => {
            if *reset {
                AppConfig::reset(args.config.as_deref())?;
                println!("configuration reset to defaults");
            } else if *show {
                println!("{}", config.show()?);
            } else {
                println!("use --show to display the configuration or --reset to start over");
            }
            return Ok(());
        }
        _ => {}
    }

    let output = OutputManager::new(args.output, config.currency.clone());
    let mut executor = CommandExecutor::new(&config, output)?;

    match args.command {
        Commands::Login {
            telegram_id,
            password,
        } => executor.login(telegram_id, password).await?,

        Commands::Logout => executor.logout(),

        Commands::Stats { watch, interval } => executor.stats(watch, interval).await?,

        Commands::Users {
            search,
            user_type,
            buyers_only,
            suspicious_only,
            page,
            limit,
        } => {
            executor
                .users(search, user_type, buyers_only, suspicious_only, page, limit)
                .await?
        }

        Commands::Orders {
            search,
            payment_status,
            page,
            limit,
        } => executor.orders(search, payment_status, page, limit).await?,

        Commands::Referrers { page, limit } => executor.referrers(page, limit).await?,

        Commands::Kpi { days } => executor.kpi(days).await?,

        Commands::Payments { days } => executor.payments(days).await?,

        Commands::AuditLogs {
            admin_id,
            action_type,
            page,
            limit,
        } => {
            executor
                .audit_logs(admin_id, action_type, page, limit)
                .await?
        }

        Commands::Withdrawals { command } => match command {
            WithdrawalCommands::List { status } => executor.withdrawals_list(status).await?,
            WithdrawalCommands::Statistics => executor.withdrawals_statistics().await?,
            WithdrawalCommands::Approve {
                withdrawal_id,
                reference,
            } => executor.withdrawal_approve(withdrawal_id, reference).await?,
            WithdrawalCommands::Reject {
                withdrawal_id,
                reason,
            } => executor.withdrawal_reject(withdrawal_id, reason).await?,
            WithdrawalCommands::Paid {
                withdrawal_id,
                reference,
            } => executor.withdrawal_paid(withdrawal_id, reference).await?,
        },

        Commands::Fraud { command } => match command {
            FraudCommands::Flags {
                severity,
                resolved,
                limit,
                offset,
            } => executor.fraud_flags(severity, resolved, limit, offset).await?,
            FraudCommands::UserFlags {
                user_id,
                include_resolved,
            } => executor.fraud_user_flags(user_id, include_resolved).await?,
            FraudCommands::Flag {
                user_id,
                flag_type,
                severity,
                description,
            } => {
                executor
                    .fraud_flag(user_id, flag_type, severity, description)
                    .await?
            }
            FraudCommands::Resolve { flag_id, notes } => {
                executor.fraud_resolve(flag_id, notes).await?
            }
            FraudCommands::Block { user_id, reason } => {
                executor.fraud_block(user_id, reason).await?
            }
            FraudCommands::Unblock { user_id } => executor.fraud_unblock(user_id).await?,
            FraudCommands::RunChecks { user_id, upi_id } => {
                executor.fraud_run_checks(user_id, upi_id).await?
            }
        },

        Commands::Settings { command } => match command {
            SettingCommands::List => executor.settings_list().await?,
            SettingCommands::Set { key, value } => executor.settings_set(key, value).await?,
        },

        Commands::Completions { .. } | Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .init();
}
