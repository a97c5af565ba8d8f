//! # bartab-db: Persistence for bartab
//!
//! SQLite storage for state snapshots and the audit trail, using sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        bartab Data Flow                                 │
//! │                                                                         │
//! │  Session::dispatch(action) ──► accepted                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bartab-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ SnapshotRepo   │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ AuditRepo      │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bartab.db (WAL)                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bartab_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bartab.db")).await?;
//! db.snapshots().save(&state).await?;
//! let restored = db.snapshots().load_latest().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::audit::AuditRepository;
pub use repository::snapshot::{SnapshotRepository, StoredSnapshot};
