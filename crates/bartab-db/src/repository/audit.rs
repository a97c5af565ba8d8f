//! # Audit Repository
//!
//! Queryable mirror of the in-state audit trail, bounded by the trail's own
//! capacity.
//!
//! ```text
//! AuditTrail (≤ capacity) ──sync──► audit_log (≤ capacity rows)
//!                                   1. skip entries up to the last stored id
//!                                   2. INSERT OR IGNORE the rest
//!                                   3. delete all but the newest `capacity`
//! ```
//!
//! All three steps run in one transaction.

use bartab_core::{AuditLogEntry, AuditTrail};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

#[derive(FromRow)]
struct AuditRow {
    id: String,
    timestamp: DateTime<Utc>,
    user_id: String,
    action: String,
    payload: String,
    details: String,
}

impl AuditRow {
    fn decode(self) -> DbResult<AuditLogEntry> {
        Ok(AuditLogEntry {
            id: self.id,
            timestamp: self.timestamp,
            user_id: self.user_id,
            action: self.action,
            payload: serde_json::from_str(&self.payload)?,
            details: serde_json::from_str(&self.details)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Brings the table in line with `trail`.
    ///
    /// Only entries newer than the last stored one are written; when that
    /// entry is no longer in the trail every entry is offered and ids already
    /// present are skipped. Rows beyond the trail's capacity are deleted,
    /// oldest first. Returns how many rows were inserted.
    pub async fn sync(&self, trail: &AuditTrail) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let last_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM audit_log ORDER BY rowid DESC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        let entries: Vec<&AuditLogEntry> = trail.entries().collect();
        let fresh = last_id
            .and_then(|id| entries.iter().position(|e| e.id == id))
            .map_or(&entries[..], |at| &entries[at + 1..]);

        let mut inserted = 0;
        for entry in fresh {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO audit_log (
                    id, timestamp, user_id, action, payload, details
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&entry.id)
            .bind(entry.timestamp)
            .bind(&entry.user_id)
            .bind(&entry.action)
            .bind(serde_json::to_string(&entry.payload)?)
            .bind(serde_json::to_string(&entry.details)?)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        let pruned = sqlx::query(
            r#"
            DELETE FROM audit_log
            WHERE rowid NOT IN (
                SELECT rowid FROM audit_log ORDER BY rowid DESC LIMIT ?1
            )
            "#,
        )
        .bind(trail.capacity() as i64)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if inserted > 0 || pruned > 0 {
            debug!(inserted, pruned, "Audit mirror synced");
        }
        Ok(inserted)
    }

    /// Entries recorded for one user, oldest first.
    pub async fn by_user(&self, user_id: &str) -> DbResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, timestamp, user_id, action, payload, details
            FROM audit_log
            WHERE user_id = ?1
            ORDER BY timestamp ASC, rowid ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRow::decode).collect()
    }

    /// Entries of one action kind (e.g. `addItem`), oldest first.
    pub async fn by_action(&self, action: &str) -> DbResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, timestamp, user_id, action, payload, details
            FROM audit_log
            WHERE action = ?1
            ORDER BY timestamp ASC, rowid ASC
            "#,
        )
        .bind(action)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRow::decode).collect()
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
