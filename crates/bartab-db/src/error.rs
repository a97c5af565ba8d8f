//! # Database Error Types
//!
//! ```text
//! sqlx::Error / serde_json::Error
//!       │
//!       ▼
//! DbError ──► CliError (binary) ──► stderr
//! ```

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the requested id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Database file could not be opened or created.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Runtime SQL error reported by SQLite.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored snapshot or audit payload is not valid JSON for the current types.
    #[error("Corrupt payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timed out waiting for a connection.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_json_error_is_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DbError = json_err.into();
        assert!(err.to_string().starts_with("Corrupt payload"));
    }
}
