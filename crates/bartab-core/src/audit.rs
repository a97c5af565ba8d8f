//! # Audit Trail
//!
//! A bounded, ordered log of every accepted state mutation.
//!
//! ## Recording Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  engine::dispatch(state, action, ctx)                                   │
//! │       │                                                                 │
//! │       ├── apply() ──Err──► Rejection (nothing recorded)                 │
//! │       │                                                                 │
//! │       ▼ Ok                                                              │
//! │  action.is_internal() ? ──yes──► done                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AuditTrail::record(entry)                                              │
//! │       │                                                                 │
//! │       └── len > capacity ? pop oldest (FIFO)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Recording never fails. A payload that cannot be serialized is stored as
//! `null` and logged.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::action::Action;
use crate::state::AppState;
use crate::types::generate_id;
use crate::AUDIT_LOG_CAPACITY;

// =============================================================================
// Entries
// =============================================================================

/// Collection sizes right before the action was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditDetails {
    pub products_count: u32,
    pub orders_count: u32,
    pub categories_count: u32,
}

impl AuditDetails {
    pub fn of(state: &AppState) -> Self {
        AuditDetails {
            products_count: state.products.len() as u32,
            orders_count: state.orders.len() as u32,
            categories_count: state.categories.len() as u32,
        }
    }
}

/// One recorded action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditLogEntry {
    pub id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    /// Action kind, e.g. `addItem`.
    pub action: String,
    /// Echo of the action payload.
    #[ts(type = "unknown")]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub details: AuditDetails,
}

impl AuditLogEntry {
    /// Builds the entry for `action` applied by `actor` against `prior`.
    pub fn for_action(action: &Action, actor: &str, prior: &AppState, now: DateTime<Utc>) -> Self {
        AuditLogEntry {
            id: generate_id("log"),
            timestamp: now,
            user_id: actor.to_string(),
            action: action.kind().to_string(),
            payload: payload_of(action),
            details: AuditDetails::of(prior),
        }
    }
}

fn payload_of(action: &Action) -> serde_json::Value {
    match serde_json::to_value(action) {
        Ok(serde_json::Value::Object(mut map)) => {
            map.remove("payload").unwrap_or(serde_json::Value::Null)
        }
        Ok(_) => serde_json::Value::Null,
        Err(e) => {
            warn!(action = action.kind(), error = %e, "Audit payload not serializable");
            serde_json::Value::Null
        }
    }
}

// =============================================================================
// Trail
// =============================================================================

/// Fixed-capacity FIFO of audit entries, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default)]
    entries: VecDeque<AuditLogEntry>,
}

fn default_capacity() -> usize {
    AUDIT_LOG_CAPACITY
}

impl Default for AuditTrail {
    fn default() -> Self {
        AuditTrail::with_capacity(AUDIT_LOG_CAPACITY)
    }
}

/// Per-user activity, see [`AuditTrail::user_activity_summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivitySummary {
    pub user_id: String,
    pub total_actions: usize,
    pub action_breakdown: BTreeMap<String, usize>,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Count of one action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCount {
    pub action: String,
    pub count: usize,
}

impl AuditTrail {
    /// Creates an empty trail. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        AuditTrail {
            capacity,
            entries: VecDeque::with_capacity(capacity.min(AUDIT_LOG_CAPACITY)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity, evicting the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an entry, evicting the oldest beyond capacity.
    pub fn record(&mut self, entry: AuditLogEntry) {
        self.entries.push_back(entry);
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &AuditLogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&AuditLogEntry> {
        self.entries.back()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn by_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a AuditLogEntry> {
        self.entries.iter().filter(move |e| e.user_id == user_id)
    }

    pub fn by_action<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a AuditLogEntry> {
        self.entries.iter().filter(move |e| e.action == kind)
    }

    /// Entries with `start <= timestamp <= end`.
    pub fn between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &AuditLogEntry> {
        self.entries
            .iter()
            .filter(move |e| e.timestamp >= start && e.timestamp <= end)
    }

    pub fn user_activity_summary(&self, user_id: &str) -> UserActivitySummary {
        let mut breakdown = BTreeMap::new();
        let mut first = None;
        let mut last = None;
        let mut total = 0;

        for entry in self.by_user(user_id) {
            *breakdown.entry(entry.action.clone()).or_insert(0) += 1;
            first.get_or_insert(entry.timestamp);
            last = Some(entry.timestamp);
            total += 1;
        }

        UserActivitySummary {
            user_id: user_id.to_string(),
            total_actions: total,
            action_breakdown: breakdown,
            first_activity: first,
            last_activity: last,
        }
    }

    /// Action kinds by descending count; ties by name.
    pub fn most_frequent_actions(&self, limit: usize) -> Vec<ActionCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.action.as_str()).or_insert(0) += 1;
        }

        let mut ranked: Vec<ActionCount> = counts
            .into_iter()
            .map(|(action, count)| ActionCount {
                action: action.to_string(),
                count,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.action.cmp(&b.action))
        });
        ranked.truncate(limit);
        ranked
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
