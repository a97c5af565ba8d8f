//! # bartab-core: Order and Inventory Engine for bartab
//!
//! This crate is the **heart** of bartab. It holds every state transition of
//! the bar (tabs, line items, stock, catalog) as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        bartab Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bartab-cli (binary)                          │   │
//! │  │    stdin actions ──► Session ──► notifications on stdout       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bartab-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │ validation│  │ inventory │  │  orders   │  │   │
//! │  │   │  Money    │  │ Validated │  │  reserve  │  │ transfer  │  │   │
//! │  │   │  Percent  │  │  drafts   │  │  release  │  │  split    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   engine::apply(state, action, ctx) ──► Transition | Rejection │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS IN THE REDUCER         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bartab-db (Persistence)                      │   │
//! │  │              state snapshots + audit trail in SQLite            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, OrderItem, Notification)
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Effective price with manual and happy-hour discounts
//! - [`validation`] - Input sanitizing before actions are built
//! - [`inventory`] - Stock reservation ledger
//! - [`orders`] / [`transfer`] - Order lifecycle and cross-order moves
//! - [`catalog`] - Product and category administration
//! - [`audit`] - Bounded audit trail
//! - [`engine`] - The reducer: one `match` over [`Action`]
//! - [`session`] - Single-writer state container
//! - [`summary`] / [`reports`] - Read-only projections
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same state + action + context = same outcome
//! 2. **No I/O**: the current time and hour come in through [`engine::Context`]
//! 3. **Integer Money**: whole currency units, no floating point
//! 4. **Explicit Refusals**: a rejected action is an `Err`, the state is untouched
//!
//! ## Example Usage
//!
//! ```rust
//! use bartab_core::engine::{apply, Context};
//! use bartab_core::seed::demo_state;
//! use bartab_core::Action;
//!
//! let now = chrono::Utc::now();
//! let state = demo_state(now);
//! let ctx = Context::new(now, 18);
//!
//! let created = apply(&state, &Action::CreateOrder { name: "Barra".into() }, &ctx).unwrap();
//! assert_eq!(created.state.orders.len(), state.orders.len() + 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod action;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod money;
pub mod orders;
pub mod pricing;
pub mod reports;
pub mod seed;
pub mod session;
pub mod state;
pub mod summary;
pub mod transfer;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bartab_core::Money` instead of
// `use bartab_core::money::Money`

pub use action::Action;
pub use audit::{AuditLogEntry, AuditTrail};
pub use config::EngineConfig;
pub use engine::{apply, dispatch, Context, Rejection, Transition};
pub use error::{CoreError, CoreResult, ValidationError, ValidationWarning};
pub use money::Money;
pub use session::Session;
pub use state::AppState;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Actor recorded when no user is attached to an action.
pub const SYSTEM_ACTOR: &str = "system";

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Ceiling for product prices, in whole currency units.
pub const PRICE_MAX: i64 = 999_999;

/// Ceiling for product stock.
pub const STOCK_MAX: u32 = 99_999;

/// Ceiling for the low-stock threshold.
pub const LOW_STOCK_MAX: u32 = 999;

/// Longest accepted table/tab label.
pub const MAX_TABLE_NAME_LEN: usize = 50;

/// Longest accepted product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// Entries kept by the audit trail before the oldest are evicted.
pub const AUDIT_LOG_CAPACITY: usize = 1000;

/// Happy-hour window used when a product leaves its hours unset.
pub const DEFAULT_HAPPY_HOUR_START: u8 = 17;
pub const DEFAULT_HAPPY_HOUR_END: u8 = 19;

/// `RestockLow` adds this many times the threshold to each low product.
pub const RESTOCK_MULTIPLIER: u32 = 2;
