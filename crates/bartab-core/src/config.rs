//! # Engine Configuration
//!
//! Policy knobs of a [`Session`](crate::session::Session).
//!
//! The binary fills this from its own config layers (file, env); the core
//! only needs the plain values.

use serde::{Deserialize, Serialize};

use crate::AUDIT_LOG_CAPACITY;

/// Session policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Allow two tabs with the same name (case-insensitive).
    /// Default: true. A duplicate then only produces a warning.
    pub allow_duplicate_table_names: bool,

    /// Entries kept in the audit trail.
    pub audit_capacity: usize,

    /// Notifications kept in the session inbox before the oldest drop.
    pub notification_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            allow_duplicate_table_names: true,
            audit_capacity: AUDIT_LOG_CAPACITY,
            notification_capacity: 50,
        }
    }
}
