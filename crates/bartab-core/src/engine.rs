//! # Engine
//!
//! The reducer: `(state, action, context) → Transition | Rejection`.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         engine::dispatch                                │
//! │                                                                         │
//! │   &AppState ──clone──► next                                             │
//! │                          │                                              │
//! │                          ▼                                              │
//! │              match action { one arm per variant }                       │
//! │                 │                         │                             │
//! │              Ok(notifications)         Err(CoreError)                   │
//! │                 │                         │                             │
//! │                 ▼                         ▼                             │
//! │   record audit entry          Rejection { reason, notifications }       │
//! │   (unless internal)           next is dropped, caller keeps its state   │
//! │                 │             OutOfStock carries one warn notification  │
//! │                 ▼                                                       │
//! │   Transition { state: next, notifications }                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never reads the clock. Time and the local hour come in through
//! [`Context`], so a replay with the same contexts gives the same states.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::action::Action;
use crate::audit::AuditLogEntry;
use crate::error::CoreError;
use crate::seed::demo_state;
use crate::state::AppState;
use crate::types::Notification;
use crate::{catalog, inventory, orders, transfer, SYSTEM_ACTOR};

// =============================================================================
// Context
// =============================================================================

/// Everything an action needs from outside the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Timestamp stamped on orders, notifications and audit entries.
    pub now: DateTime<Utc>,
    /// Local hour of day (0-23) for happy-hour pricing.
    pub current_hour: u8,
    /// Who performs the action.
    pub actor: String,
}

impl Context {
    /// Context acting as the system actor.
    pub fn new(now: DateTime<Utc>, current_hour: u8) -> Self {
        Context {
            now,
            current_hour: current_hour.min(23),
            actor: SYSTEM_ACTOR.to_string(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Actor to store as an order's creator; the system actor is stored as
    /// nobody.
    pub fn created_by(&self) -> Option<String> {
        if self.actor == SYSTEM_ACTOR {
            None
        } else {
            Some(self.actor.clone())
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// An accepted action: the new state and what to tell the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: AppState,
    pub notifications: Vec<Notification>,
}

/// A refused action. The state it was applied to is still current.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct Rejection {
    pub reason: CoreError,
    /// Empty unless the refusal is something the user should hear about.
    pub notifications: Vec<Notification>,
}

// =============================================================================
// Reducer
// =============================================================================

/// Applies an action without recording it in the audit trail.
pub fn apply(state: &AppState, action: &Action, ctx: &Context) -> Result<Transition, Rejection> {
    let mut next = state.clone();

    let result = match action {
        Action::CreateOrder { name } => orders::create_order(&mut next, name, ctx),
        Action::AddItem {
            order_id,
            product_id,
            notes,
            discount,
        } => orders::add_item(
            &mut next,
            order_id,
            product_id,
            notes.as_deref(),
            *discount,
            ctx,
        ),
        Action::RemoveItem { order_id, item_id } => {
            orders::remove_item(&mut next, order_id, item_id)
        }
        Action::FinalizeOrder { order_id } => orders::finalize_order(&mut next, order_id, ctx),
        Action::CancelOrder { order_id } => orders::cancel_order(&mut next, order_id, ctx),
        Action::ReopenOrder { order_id } => orders::reopen_order(&mut next, order_id, ctx),
        Action::UpdateOrderNotes { order_id, notes } => {
            orders::update_order_notes(&mut next, order_id, notes)
        }
        Action::UpdateItemNotes {
            order_id,
            item_id,
            notes,
        } => orders::update_item_notes(&mut next, order_id, item_id, notes),

        Action::TransferOrder {
            from_order_id,
            to_order_id,
        } => transfer::transfer_order(&mut next, from_order_id, to_order_id, ctx),
        Action::TransferItems {
            from_order_id,
            to_order_id,
            item_ids,
        } => transfer::transfer_items(&mut next, from_order_id, to_order_id, item_ids, ctx),
        Action::SplitOrder {
            order_id,
            item_ids,
            new_order_name,
        } => transfer::split_order(&mut next, order_id, item_ids, new_order_name, ctx),

        Action::AddProduct { product } => catalog::add_product(&mut next, product),
        Action::UpdateProduct { id, patch } => catalog::update_product(&mut next, id, patch),
        Action::DeleteProduct { id } => catalog::delete_product(&mut next, id),
        Action::RestockLow => inventory::restock_low(&mut next, ctx),
        Action::RestockProduct { id, quantity } => {
            inventory::restock_product(&mut next, id, *quantity, ctx)
        }
        Action::BulkUpdateProducts {
            product_ids,
            updates,
        } => inventory::bulk_update_products(&mut next, product_ids, updates, ctx),
        Action::ApplyHappyHour {
            category_id,
            discount,
        } => catalog::apply_happy_hour(&mut next, category_id, *discount, ctx),
        Action::RemoveHappyHour { category_id } => {
            catalog::remove_happy_hour(&mut next, category_id, ctx)
        }
        Action::AddCategory { name, description } => {
            catalog::add_category(&mut next, name, description)
        }
        Action::UpdateCategory {
            id,
            name,
            description,
        } => catalog::update_category(&mut next, id, name.as_deref(), description.as_deref()),
        Action::DeleteCategory { id } => catalog::delete_category(&mut next, id),

        Action::ResetToSeed => {
            let seed = demo_state(ctx.now);
            next.products = seed.products;
            next.categories = seed.categories;
            next.orders = seed.orders;
            Ok(vec![Notification::ok("Demo data restored", ctx.now)])
        }
        Action::RestoreSnapshot(snapshot) => {
            next = (**snapshot).clone();
            Ok(Vec::new())
        }
    };

    match result {
        Ok(notifications) => Ok(Transition {
            state: next,
            notifications,
        }),
        Err(reason) => {
            let notifications = if reason.is_policy_rejection() {
                vec![Notification::warn(reason.to_string(), ctx.now)]
            } else {
                Vec::new()
            };
            debug!(action = action.kind(), reason = %reason, "Action rejected");
            Err(Rejection {
                reason,
                notifications,
            })
        }
    }
}

/// Applies an action and records it in the new state's audit trail.
///
/// Internal actions are not recorded. Recording cannot fail, so the outcome
/// is exactly what [`apply`] decided.
pub fn dispatch(state: &AppState, action: &Action, ctx: &Context) -> Result<Transition, Rejection> {
    let mut transition = apply(state, action, ctx)?;

    if !action.is_internal() {
        let entry = AuditLogEntry::for_action(action, &ctx.actor, state, ctx.now);
        transition.state.audit_log.record(entry);
    }

    debug!(
        action = action.kind(),
        actor = %ctx.actor,
        notifications = transition.notifications.len(),
        "Action applied"
    );
    Ok(transition)
}

/// Replays a sequence of actions, skipping rejected ones.
///
/// Returns the final state and how many actions were rejected.
pub fn replay<'a, I>(state: &AppState, actions: I, ctx: &Context) -> (AppState, usize)
where
    I: IntoIterator<Item = &'a Action>,
{
    let mut current = state.clone();
    let mut rejected = 0;
    for action in actions {
        match dispatch(&current, action, ctx) {
            Ok(transition) => current = transition.state,
            Err(rejection) => {
                warn!(action = action.kind(), reason = %rejection.reason, "Replay skipped action");
                rejected += 1;
            }
        }
    }
    (current, rejected)
}

// =============================================================================
// Unit Tests
// =============================================================================
