//! # bartab
//!
//! Command line front end for the bar tab engine.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize Logging ─── tracing-subscriber, RUST_LOG, stderr         │
//! │  2. Load Config ────────── defaults → bartab.toml → BARTAB_* env        │
//! │  3. Connect to Database ── SQLite (WAL), pending migrations             │
//! │  4. Run Subcommand ─────── run | summary | report | seed                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//! ```bash
//! echo '{"type":"createOrder","payload":{"name":"Mesa 3"}}' | bartab run --actor u_emp1
//! bartab summary ord_demo_mesa1
//! bartab report --kind shift --from 2026-10-18T17:00:00Z --to 2026-10-19T03:00:00Z
//! bartab seed
//! ```

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use bartab_core::SYSTEM_ACTOR;
use bartab_db::{Database, DbConfig};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::commands::ReportKind;
use crate::config::AppConfig;
use crate::error::CliResult;

#[derive(Parser)]
#[command(name = "bartab")]
#[command(about = "Bar and restaurant tab engine")]
#[command(version)]
struct Cli {
    /// Config file (default: platform config dir, bartab.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding config and environment
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply JSON actions read from stdin, one per line
    Run {
        /// User recorded in the audit trail
        #[arg(short, long, default_value = SYSTEM_ACTOR)]
        actor: String,
    },

    /// Print one order with product names and its live total
    Summary {
        order_id: String,
    },

    /// Print a report over closed orders
    Report {
        #[arg(short, long, value_enum, default_value = "sales")]
        kind: ReportKind,

        /// Start of the period (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,

        /// End of the period (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,

        /// Rows in the top products report
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Restore the demo catalog and tabs
    Seed,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "bartab failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.db {
        config.database.path = path;
    }

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(&config.database.path)).await?;
    info!(path = %config.database.path.display(), "Database ready");

    let result = match cli.command {
        Command::Run { actor } => commands::run(&db, &config, &actor).await,
        Command::Summary { order_id } => commands::summary(&db, &order_id).await,
        Command::Report {
            kind,
            from,
            to,
            limit,
        } => commands::report(&db, kind, from, to, limit).await,
        Command::Seed => commands::seed(&db, &config).await,
    };

    db.close().await;
    result
}

/// Logs go to stderr so stdout carries only JSON.
///
/// Default filter: `info,bartab=debug,sqlx=warn`, overridable with `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bartab=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
