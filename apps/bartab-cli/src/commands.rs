//! # Subcommands
//!
//! ```text
//! run      stdin JSON actions ──► Session ──► stdout JSON notifications
//!                                   └── accepted ──► snapshot + new audit rows
//! summary  latest snapshot ──► order_summary ──► stdout JSON
//! report   latest snapshot ──► reports::* ──► stdout JSON
//! seed     latest snapshot ──► ResetToSeed ──► snapshot
//! ```

use bartab_core::reports::{self, Period};
use bartab_core::seed::demo_state;
use bartab_core::summary::order_summary;
use bartab_core::{Action, AppState, Notification, Session, SYSTEM_ACTOR};
use bartab_db::Database;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Revenue, order count and items sold
    Sales,
    /// Best sellers by revenue
    Top,
    /// Consumption per category
    Categories,
    /// Sales, cancellations and best sellers
    Shift,
}

/// Latest stored state, or the demo data on an empty database.
async fn load_state(db: &Database) -> CliResult<AppState> {
    match db.snapshots().load_latest().await? {
        Some(stored) => {
            debug!(snapshot_id = stored.id, "Loaded snapshot");
            Ok(stored.state)
        }
        None => {
            info!("No snapshot found, starting from demo data");
            Ok(demo_state(Utc::now()))
        }
    }
}

async fn persist(db: &Database, config: &AppConfig, state: &AppState) -> CliResult<()> {
    db.snapshots().save(state).await?;
    db.audit().sync(&state.audit_log).await?;
    db.snapshots().prune(config.database.keep_snapshots).await?;
    Ok(())
}

/// Writes one JSON line to stdout.
fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Reads one action per line until EOF.
///
/// Blank lines are skipped. Malformed lines and rejected actions are reported
/// on stdout as error notifications and do not stop the loop.
pub async fn run(db: &Database, config: &AppConfig, actor: &str) -> CliResult<()> {
    let session = Session::new(load_state(db).await?, config.engine_config());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut accepted = 0usize;
    let mut rejected = 0usize;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let action: Action = match serde_json::from_str(line) {
            Ok(action) => action,
            Err(e) => {
                warn!(error = %e, "Unreadable action");
                rejected += 1;
                let notice =
                    Notification::error(format!("Unreadable action: {}", e), Utc::now());
                print_json(&notice)?;
                continue;
            }
        };

        match session.dispatch(action, actor) {
            Ok(notifications) => {
                accepted += 1;
                persist(db, config, &session.snapshot()).await?;
                for notification in &notifications {
                    print_json(notification)?;
                }
            }
            Err(rejection) => {
                rejected += 1;
                if rejection.notifications.is_empty() {
                    let notice = Notification::error(rejection.reason.to_string(), Utc::now());
                    print_json(&notice)?;
                }
                for notification in &rejection.notifications {
                    print_json(notification)?;
                }
            }
        }
    }

    info!(accepted, rejected, "Input exhausted");
    Ok(())
}

pub async fn summary(db: &Database, order_id: &str) -> CliResult<()> {
    let state = load_state(db).await?;
    let summary = order_summary(&state, order_id)?;
    print_json(&summary)
}

pub async fn report(
    db: &Database,
    kind: ReportKind,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    limit: usize,
) -> CliResult<()> {
    if from > to {
        return Err(CliError::InvalidPeriod(format!("{} is after {}", from, to)));
    }
    let state = load_state(db).await?;
    let period = Period::new(from, to);

    match kind {
        ReportKind::Sales => print_json(&reports::sales_report(&state, period)),
        ReportKind::Top => print_json(&reports::top_products(&state, period, limit)),
        ReportKind::Categories => print_json(&reports::consumption_by_category(&state, period)),
        ReportKind::Shift => print_json(&reports::shift_report(&state, period)),
    }
}

/// Restores the demo catalog and tabs. The audit trail is kept.
pub async fn seed(db: &Database, config: &AppConfig) -> CliResult<()> {
    let session = Session::new(load_state(db).await?, config.engine_config());
    let notifications = session
        .dispatch(Action::ResetToSeed, SYSTEM_ACTOR)
        .map_err(|rejection| CliError::Core(rejection.reason))?;

    persist(db, config, &session.snapshot()).await?;

    for notification in &notifications {
        print_json(notification)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bartab_core::CoreError;
    use bartab_db::DbConfig;

    #[tokio::test]
    async fn test_empty_database_loads_demo_data() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = load_state(&db).await.unwrap();
        assert_eq!(state.orders.len(), 2);
    }

    #[tokio::test]
    async fn test_persist_writes_snapshot_and_audit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = AppConfig::default();
        let session = Session::new(demo_state(Utc::now()), config.engine_config());
        session
            .dispatch(
                Action::CreateOrder {
                    name: "Barra".into(),
                },
                "u_emp1",
            )
            .unwrap();

        persist(&db, &config, &session.snapshot()).await.unwrap();
        persist(&db, &config, &session.snapshot()).await.unwrap();

        let reloaded = load_state(&db).await.unwrap();
        assert_eq!(reloaded, session.snapshot());
        assert_eq!(db.audit().count().await.unwrap(), 1);
        assert_eq!(db.snapshots().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_audit_rows_follow_trail_capacity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut config = AppConfig::default();
        config.engine.audit_capacity = 3;
        let session = Session::new(demo_state(Utc::now()), config.engine_config());

        for _ in 0..7 {
            session.dispatch(Action::RestockLow, "u_admin").unwrap();
            persist(&db, &config, &session.snapshot()).await.unwrap();
        }

        assert_eq!(db.audit().count().await.unwrap(), 3);
        assert_eq!(session.read(|s| s.audit_log.len()), 3);
    }

    #[tokio::test]
    async fn test_restore_from_stdin_action_is_refused() {
        let config = AppConfig::default();
        let session = Session::new(demo_state(Utc::now()), config.engine_config());
        let line = r#"{"type":"restoreSnapshot","payload":{"products":[],"orders":[]}}"#;

        let action: Action = serde_json::from_str(line).unwrap();
        let rejection = session.dispatch(action, "u_emp1").unwrap_err();

        assert!(matches!(rejection.reason, CoreError::InternalAction(_)));
        assert_eq!(session.snapshot().orders.len(), 2);
    }

    #[tokio::test]
    async fn test_seed_keeps_audit_trail() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = AppConfig::default();

        let mut state = demo_state(Utc::now());
        state.orders.clear();
        db.snapshots().save(&state).await.unwrap();

        seed(&db, &config).await.unwrap();
        let reseeded = load_state(&db).await.unwrap();
        assert_eq!(reseeded.orders.len(), 2);
        assert_eq!(reseeded.audit_log.by_action("resetToSeed").count(), 1);
    }

    #[tokio::test]
    async fn test_inverted_period_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let earlier = now - chrono::Duration::hours(1);
        let result = report(&db, ReportKind::Sales, now, earlier, 10).await;
        assert!(matches!(result, Err(CliError::InvalidPeriod(_))));
    }
}
