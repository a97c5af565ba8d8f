//! # Database Migrations
//!
//! SQL files under `migrations/sqlite/` are embedded at compile time and
//! applied in filename order on startup.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   state_snapshots, audit_log
//! ```
//!
//! Never modify an applied migration; add the next numbered file instead.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every pending migration. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");
    MIGRATOR.run(pool).await?;
    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
