//! # Snapshot Repository
//!
//! Stores the full [`AppState`] as JSON after every accepted mutation.
//!
//! ```text
//! save(state) ──► INSERT state_snapshots(payload, created_at)
//! load_latest ──► SELECT … ORDER BY id DESC LIMIT 1 ──► AppState
//! prune(keep) ──► DELETE everything but the newest `keep` rows
//! ```
//!
//! The payload is the serde form of the state, so a reload reproduces the
//! products, orders, categories and audit trail field for field.

use bartab_core::AppState;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;

/// One stored snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub state: AppState,
}

#[derive(FromRow)]
struct SnapshotRow {
    id: i64,
    payload: String,
    created_at: DateTime<Utc>,
}

impl SnapshotRow {
    fn decode(self) -> DbResult<StoredSnapshot> {
        Ok(StoredSnapshot {
            id: self.id,
            created_at: self.created_at,
            state: serde_json::from_str(&self.payload)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    /// Appends a snapshot and returns its row id.
    pub async fn save(&self, state: &AppState) -> DbResult<i64> {
        let payload = serde_json::to_string(state)?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO state_snapshots (payload, created_at)
            VALUES (?1, ?2)
            "#,
        )
        .bind(&payload)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(
            snapshot_id = id,
            bytes = payload.len(),
            orders = state.orders.len(),
            "Snapshot saved"
        );
        Ok(id)
    }

    /// The newest snapshot, if any was ever saved.
    pub async fn load_latest(&self) -> DbResult<Option<StoredSnapshot>> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT id, payload, created_at
            FROM state_snapshots
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(SnapshotRow::decode).transpose()
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM state_snapshots")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Keeps the newest `keep` snapshots and deletes the rest.
    ///
    /// Returns the number of deleted rows.
    pub async fn prune(&self, keep: u32) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM state_snapshots
            WHERE id NOT IN (
                SELECT id FROM state_snapshots
                ORDER BY id DESC
                LIMIT ?1
            )
            "#,
        )
        .bind(i64::from(keep))
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(deleted, keep, "Pruned old snapshots");
        }
        Ok(deleted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
