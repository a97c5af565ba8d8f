//! # Repositories
//!
//! ```text
//! Database
//! ├── snapshots() ──► SnapshotRepository   state_snapshots
//! │                   save · load_latest · count · prune
//! └── audit()     ──► AuditRepository      audit_log
//!                     sync · by_user · by_action · count
//! ```

pub mod audit;
pub mod snapshot;
