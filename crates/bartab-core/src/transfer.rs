//! # Cross-Order Operations
//!
//! Moving lines between tabs: whole-order transfer, partial transfer and
//! split. None of these touch stock; the reservation follows the line.
//!
//! ## Transfer Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transferOrder(A ──► B)                                                 │
//! │    for each line of A:                                                  │
//! │      B has (product_id, price)? ──yes──► B.qty += qty                   │
//! │                                 ──no───► append copy with new id        │
//! │    A: items = [], status = closed, closed_at = now                      │
//! │                                                                         │
//! │  transferItems(A ──► B, ids)                                            │
//! │    selected lines leave A, land at the end of B with new ids            │
//! │    (no merging; A stays open)                                           │
//! │                                                                         │
//! │  splitOrder(A, ids, name)                                               │
//! │    new open order "name" with the selected lines (new ids),             │
//! │    notes "Split from: A.name", placed first in the order list           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Closing A on a whole transfer does not release its stock. The units now
//! belong to B, which releases them if it is ever canceled.

use tracing::debug;

use crate::engine::Context;
use crate::error::{CoreError, CoreResult};
use crate::state::AppState;
use crate::types::{Notification, Order, OrderItem, OrderStatus};

/// Checks that both ends of a transfer are distinct open orders and returns
/// their names.
fn require_transfer_ends(
    state: &AppState,
    from_order_id: &str,
    to_order_id: &str,
) -> CoreResult<(String, String)> {
    if from_order_id == to_order_id {
        return Err(CoreError::SameOrder(from_order_id.to_string()));
    }
    let from = state.require_open_order(from_order_id)?;
    let to = state.require_open_order(to_order_id)?;
    Ok((from.name.clone(), to.name.clone()))
}

/// Detaches the lines whose id is in `item_ids`, keeping the rest in order.
fn take_lines(order: &mut Order, item_ids: &[String]) -> Vec<OrderItem> {
    let (taken, kept): (Vec<_>, Vec<_>) = order
        .items
        .drain(..)
        .partition(|i| item_ids.contains(&i.id));
    order.items = kept;
    taken
}

fn require_selection(state: &AppState, order_id: &str, item_ids: &[String]) -> CoreResult<()> {
    let order = state.require_order(order_id)?;
    if order.items.iter().any(|i| item_ids.contains(&i.id)) {
        Ok(())
    } else {
        Err(CoreError::EmptySelection(order_id.to_string()))
    }
}

/// Moves every line of one open order into another and closes the source.
pub fn transfer_order(
    state: &mut AppState,
    from_order_id: &str,
    to_order_id: &str,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    let (from_name, to_name) = require_transfer_ends(state, from_order_id, to_order_id)?;

    let source = state
        .order_mut(from_order_id)
        .ok_or_else(|| CoreError::OrderNotFound(from_order_id.to_string()))?;
    let moved = std::mem::take(&mut source.items);
    source.status = OrderStatus::Closed;
    source.closed_at = Some(ctx.now);

    let dest = state
        .order_mut(to_order_id)
        .ok_or_else(|| CoreError::OrderNotFound(to_order_id.to_string()))?;
    let lines = moved.len();
    for item in moved {
        match dest
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id && i.price == item.price)
        {
            Some(existing) => existing.qty += item.qty,
            None => dest.items.push(item.reidentified()),
        }
    }

    debug!(from_order_id, to_order_id, lines, "Order transferred");
    Ok(vec![Notification::ok(
        format!("Order transferred from {} to {}", from_name, to_name),
        ctx.now,
    )])
}

/// Moves selected lines between two open orders.
pub fn transfer_items(
    state: &mut AppState,
    from_order_id: &str,
    to_order_id: &str,
    item_ids: &[String],
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    require_transfer_ends(state, from_order_id, to_order_id)?;
    require_selection(state, from_order_id, item_ids)?;

    let source = state
        .order_mut(from_order_id)
        .ok_or_else(|| CoreError::OrderNotFound(from_order_id.to_string()))?;
    let moved = take_lines(source, item_ids);
    let count = moved.len();

    let dest = state
        .order_mut(to_order_id)
        .ok_or_else(|| CoreError::OrderNotFound(to_order_id.to_string()))?;
    dest.items.extend(moved.iter().map(OrderItem::reidentified));

    debug!(from_order_id, to_order_id, count, "Items transferred");
    Ok(vec![Notification::ok(
        format!("{} item(s) transferred", count),
        ctx.now,
    )])
}

/// Splits selected lines of an open order into a new open order.
pub fn split_order(
    state: &mut AppState,
    order_id: &str,
    item_ids: &[String],
    new_order_name: &str,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    let source_name = state.require_open_order(order_id)?.name.clone();
    require_selection(state, order_id, item_ids)?;

    let source = state
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    let moved = take_lines(source, item_ids);

    let mut split = Order::open(new_order_name.trim(), ctx.created_by(), ctx.now);
    split.items = moved.iter().map(OrderItem::reidentified).collect();
    split.notes = format!("Split from: {}", source_name);

    debug!(order_id, new_order_id = %split.id, lines = split.items.len(), "Order split");
    let message = format!("Bill split: {}", split.name);
    state.orders.insert(0, split);

    Ok(vec![Notification::ok(message, ctx.now)])
}

// =============================================================================
// Unit Tests
// =============================================================================
