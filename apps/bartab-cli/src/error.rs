//! # CLI Errors
//!
//! Everything that can stop the binary. Rejected actions are not errors here:
//! the run loop reports them and keeps reading.

use bartab_core::CoreError;
use bartab_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read config: {0}")]
    ConfigLoadFailed(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
}

pub type CliResult<T> = Result<T, CliError>;
