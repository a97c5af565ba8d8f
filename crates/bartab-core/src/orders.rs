//! # Order Lifecycle
//!
//! Tab operations and the stock reservations that go with them.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   createOrder ──► ┌──────┐  finalizeOrder  ┌────────┐                   │
//! │                   │ open │ ──────────────► │ closed │                   │
//! │    addItem ──────►│      │ ◄────────────── │        │                   │
//! │    removeItem ───►└──┬───┘   reopenOrder   └───┬────┘                   │
//! │                      │                         │                        │
//! │                      │ cancelOrder             │ cancelOrder            │
//! │                      ▼                         ▼                        │
//! │                   ┌──────────────────────────────┐                      │
//! │                   │ canceled (terminal)          │                      │
//! │                   │ every line's qty released    │                      │
//! │                   └──────────────────────────────┘                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every handler either mutates the state it was given and returns the
//! notifications to emit, or returns an error before touching anything.

use tracing::{debug, warn};

use crate::engine::Context;
use crate::error::{CoreError, CoreResult};
use crate::inventory::{low_stock_products, release_by_id, reserve};
use crate::pricing::effective_price;
use crate::state::AppState;
use crate::types::{generate_id, Notification, Order, OrderItem, OrderStatus, Percent};
use crate::MAX_ITEM_QUANTITY;

/// Opens a new, empty tab at the front of the order list.
pub fn create_order(
    state: &mut AppState,
    name: &str,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    let order = Order::open(name.trim(), ctx.created_by(), ctx.now);
    debug!(order_id = %order.id, name = %order.name, "Order created");
    state.orders.insert(0, order);
    Ok(Vec::new())
}

/// Adds one unit of a product to an open order.
///
/// ## Flow
/// ```text
/// order open? ── no ──► InvalidOrderStatus
///      │
/// product known? ── no ──► ProductNotFound
///      │
/// stock > 0? ── no ──► OutOfStock (the engine turns this into a warning)
///      │
/// line for product exists?
///      ├── yes ──► qty += 1 (price stays frozen, notes replaced if given)
///      └── no  ──► new line at effective price
///      │
/// reserve(1)
/// ```
pub fn add_item(
    state: &mut AppState,
    order_id: &str,
    product_id: &str,
    notes: Option<&str>,
    discount: Percent,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    let order = state.require_open_order(order_id)?;
    let product = state.require_product(product_id)?;

    if !product.is_available() {
        warn!(order_id, product_id, "Add refused, product out of stock");
        return Err(CoreError::OutOfStock {
            product_id: product_id.to_string(),
            name: product.name.clone(),
        });
    }

    let existing = order.items.iter().position(|i| i.product_id == product_id);
    if let Some(idx) = existing {
        let requested = order.items[idx].qty + 1;
        if requested > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested,
                max: MAX_ITEM_QUANTITY,
            });
        }
    }

    let new_line = OrderItem {
        id: generate_id("item"),
        product_id: product_id.to_string(),
        qty: 1,
        price: effective_price(product, discount, ctx.current_hour),
        original_price: product.price,
        notes: notes.unwrap_or_default().to_string(),
        discount,
    };

    if let Some(product) = state.product_mut(product_id) {
        reserve(product, 1);
    }

    let order = state
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    match existing {
        Some(idx) => {
            let line = &mut order.items[idx];
            line.qty += 1;
            if let Some(notes) = notes.filter(|n| !n.is_empty()) {
                line.notes = notes.to_string();
            }
        }
        None => order.items.push(new_line),
    }

    debug!(order_id, product_id, "Item added");
    Ok(Vec::new())
}

/// Removes one unit of a line, dropping the line when it reaches zero.
pub fn remove_item(
    state: &mut AppState,
    order_id: &str,
    item_id: &str,
) -> CoreResult<Vec<Notification>> {
    state.require_open_order(order_id)?;

    let order = state
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    let idx = order
        .items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| CoreError::ItemNotFound {
            order_id: order_id.to_string(),
            item_id: item_id.to_string(),
        })?;

    let product_id = order.items[idx].product_id.clone();
    order.items[idx].qty -= 1;
    if order.items[idx].qty == 0 {
        order.items.remove(idx);
    }

    release_by_id(state, &product_id, 1);
    debug!(order_id, item_id, "Item removed");
    Ok(Vec::new())
}

/// Closes an open order. Stock stays consumed.
pub fn finalize_order(
    state: &mut AppState,
    order_id: &str,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    state.require_open_order(order_id)?;

    let order = state
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    order.status = OrderStatus::Closed;
    order.closed_at = Some(ctx.now);

    let mut notifications = vec![Notification::ok(
        format!("Order closed: {}", order.name),
        ctx.now,
    )];

    let low = low_stock_products(&state.products).count();
    if low > 0 {
        notifications.push(Notification::warn(
            format!("{} product(s) low on stock", low),
            ctx.now,
        ));
    }

    debug!(order_id, low_stock = low, "Order finalized");
    Ok(notifications)
}

/// Cancels an open or closed order and returns every held unit to stock.
pub fn cancel_order(
    state: &mut AppState,
    order_id: &str,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    let order = state.require_order(order_id)?;
    if order.status == OrderStatus::Canceled {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order_id.to_string(),
            status: order.status,
        });
    }

    let held: Vec<(String, u32)> = order
        .items
        .iter()
        .map(|i| (i.product_id.clone(), i.qty))
        .collect();
    for (product_id, qty) in &held {
        release_by_id(state, product_id, *qty);
    }

    let order = state
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    order.status = OrderStatus::Canceled;
    order.canceled_at = Some(ctx.now);

    debug!(order_id, lines = held.len(), "Order canceled");
    Ok(vec![Notification::warn(
        format!("Order canceled: {}", order.name),
        ctx.now,
    )])
}

/// Reopens a closed order. No stock is taken again.
pub fn reopen_order(
    state: &mut AppState,
    order_id: &str,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    let order = state.require_order(order_id)?;
    if order.status != OrderStatus::Closed {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order_id.to_string(),
            status: order.status,
        });
    }

    let order = state
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    order.status = OrderStatus::Open;
    order.closed_at = None;

    Ok(vec![Notification::ok(
        format!("Order reopened for editing: {}", order.name),
        ctx.now,
    )])
}

pub fn update_order_notes(
    state: &mut AppState,
    order_id: &str,
    notes: &str,
) -> CoreResult<Vec<Notification>> {
    let order = state
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    order.notes = notes.to_string();
    Ok(Vec::new())
}

pub fn update_item_notes(
    state: &mut AppState,
    order_id: &str,
    item_id: &str,
    notes: &str,
) -> CoreResult<Vec<Notification>> {
    let order = state
        .order_mut(order_id)
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
    let item = order
        .items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| CoreError::ItemNotFound {
            order_id: order_id.to_string(),
            item_id: item_id.to_string(),
        })?;
    item.notes = notes.to_string();
    Ok(Vec::new())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_state;
    use crate::types::NotificationKind;
    use chrono::Utc;

    fn ctx(hour: u8) -> Context {
        Context::new(Utc::now(), hour).with_actor("u_emp1")
    }

    fn fresh_order(state: &mut AppState) -> String {
        create_order(state, "Barra", &ctx(12)).unwrap();
        state.orders[0].id.clone()
    }

    #[test]
    fn test_create_order_prepends_open_tab() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);

        let order = &state.orders[0];
        assert_eq!(order.id, id);
        assert_eq!(order.status, OrderStatus::Open);
        assert!(order.items.is_empty());
        assert_eq!(order.created_by.as_deref(), Some("u_emp1"));
    }

    #[test]
    fn test_add_item_merges_by_product() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);

        add_item(
            &mut state,
            &id,
            "p_club",
            Some("bien fria"),
            Percent::zero(),
            &ctx(12),
        )
        .unwrap();
        add_item(&mut state, &id, "p_club", None, Percent::zero(), &ctx(12)).unwrap();

        let order = state.order(&id).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].qty, 2);
        assert_eq!(order.items[0].notes, "bien fria");
        assert_eq!(state.product("p_club").unwrap().stock, 17 - 2);
    }

    #[test]
    fn test_merged_line_keeps_first_price() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);

        add_item(&mut state, &id, "p_aguila", None, Percent::zero(), &ctx(12)).unwrap();
        // inside happy hour now, but the line price is frozen
        add_item(&mut state, &id, "p_aguila", None, Percent::zero(), &ctx(18)).unwrap();

        let line = &state.order(&id).unwrap().items[0];
        assert_eq!(line.qty, 2);
        assert_eq!(line.price.units(), 6000);
        assert_eq!(line.original_price.units(), 6000);
    }

    #[test]
    fn test_add_item_prices_with_discounts() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);

        add_item(&mut state, &id, "p_club", None, Percent::new(10), &ctx(18)).unwrap();
        let line = &state.order(&id).unwrap().items[0];
        // 8000 → 7200 → 5760
        assert_eq!(line.price.units(), 5760);
        assert_eq!(line.original_price.units(), 8000);
        assert_eq!(line.discount.value(), 10);
    }

    #[test]
    fn test_add_item_out_of_stock() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);
        state.product_mut("p_sal").unwrap().stock = 0;
        let before = state.clone();

        let err = add_item(&mut state, &id, "p_sal", None, Percent::zero(), &ctx(12)).unwrap_err();
        assert_eq!(err.to_string(), "Out of stock: Salchipapa");
        assert_eq!(state, before);
    }

    #[test]
    fn test_add_item_preconditions() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);

        let zero = Percent::zero();
        assert!(matches!(
            add_item(&mut state, "ord_nope", "p_club", None, zero, &ctx(12)),
            Err(CoreError::OrderNotFound(_))
        ));
        assert!(matches!(
            add_item(&mut state, &id, "p_nope", None, Percent::zero(), &ctx(12)),
            Err(CoreError::ProductNotFound(_))
        ));

        finalize_order(&mut state, &id, &ctx(12)).unwrap();
        assert!(matches!(
            add_item(&mut state, &id, "p_club", None, Percent::zero(), &ctx(12)),
            Err(CoreError::InvalidOrderStatus { .. })
        ));
    }

    #[test]
    fn test_add_item_quantity_ceiling() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);
        state.product_mut("p_emp").unwrap().stock = 5_000;
        for _ in 0..MAX_ITEM_QUANTITY {
            add_item(&mut state, &id, "p_emp", None, Percent::zero(), &ctx(12)).unwrap();
        }

        let err = add_item(&mut state, &id, "p_emp", None, Percent::zero(), &ctx(12)).unwrap_err();
        assert_eq!(
            err,
            CoreError::QuantityTooLarge {
                requested: 1000,
                max: 999
            }
        );
        assert_eq!(state.product("p_emp").unwrap().stock, 5_000 - 999);
    }

    #[test]
    fn test_remove_item_releases_and_drops_line() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);
        add_item(&mut state, &id, "p_per", None, Percent::zero(), &ctx(12)).unwrap();
        add_item(&mut state, &id, "p_per", None, Percent::zero(), &ctx(12)).unwrap();
        let item_id = state.order(&id).unwrap().items[0].id.clone();

        remove_item(&mut state, &id, &item_id).unwrap();
        assert_eq!(state.order(&id).unwrap().items[0].qty, 1);
        remove_item(&mut state, &id, &item_id).unwrap();
        assert!(state.order(&id).unwrap().items.is_empty());
        assert_eq!(state.product("p_per").unwrap().stock, 12);

        assert!(matches!(
            remove_item(&mut state, &id, &item_id),
            Err(CoreError::ItemNotFound { .. })
        ));
    }

    #[test]
    fn test_stock_conservation() {
        let mut state = demo_state(Utc::now());
        let initial = state.product("p_poker").unwrap().stock;
        let mut order_ids = Vec::new();
        for _ in 0..3 {
            order_ids.push(fresh_order(&mut state));
        }

        // deterministic pseudo-random walk over add/remove/cancel
        let mut seed: u32 = 7;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let order_id = order_ids[(seed >> 8) as usize % order_ids.len()].clone();
            match (seed >> 16) % 7 {
                0..=3 => {
                    let none = Percent::zero();
                    let _ = add_item(&mut state, &order_id, "p_poker", None, none, &ctx(12));
                }
                4 | 5 => {
                    let item = state
                        .order(&order_id)
                        .and_then(|o| o.items.first())
                        .map(|i| i.id.clone());
                    if let Some(item_id) = item {
                        let _ = remove_item(&mut state, &order_id, &item_id);
                    }
                }
                _ => {
                    let _ = cancel_order(&mut state, &order_id, &ctx(12));
                }
            }

            let held = state.reserved_quantity("p_poker");
            assert_eq!(state.product("p_poker").unwrap().stock + held, initial);
        }
    }

    #[test]
    fn test_finalize_is_not_repeatable() {
        let mut state = demo_state(Utc::now());
        let id = state.orders[0].id.clone();

        let notes = finalize_order(&mut state, &id, &ctx(12)).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Ok);
        let after_first = state.clone();

        assert!(finalize_order(&mut state, &id, &ctx(12)).is_err());
        assert_eq!(state, after_first);
    }

    #[test]
    fn test_finalize_reports_low_stock_globally() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);
        state.product_mut("p_agua").unwrap().stock = 2;
        state.product_mut("p_hielo").unwrap().stock = 1;

        let notes = finalize_order(&mut state, &id, &ctx(12)).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].kind, NotificationKind::Warn);
        assert_eq!(notes[1].message, "2 product(s) low on stock");
    }

    #[test]
    fn test_cancel_releases_every_line() {
        let mut state = demo_state(Utc::now());
        let id = fresh_order(&mut state);
        add_item(&mut state, &id, "p_emp", None, Percent::zero(), &ctx(12)).unwrap();
        add_item(&mut state, &id, "p_emp", None, Percent::zero(), &ctx(12)).unwrap();
        // a second line of the same product (e.g. after a transfer)
        let mut extra = state.order(&id).unwrap().items[0].reidentified();
        extra.qty = 3;
        state.order_mut(&id).unwrap().items.push(extra);
        state.product_mut("p_emp").unwrap().stock -= 3;

        let before = state.product("p_emp").unwrap().stock;
        cancel_order(&mut state, &id, &ctx(12)).unwrap();

        assert_eq!(state.product("p_emp").unwrap().stock, before + 5);
        let order = state.order(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert!(order.canceled_at.is_some());
    }

    #[test]
    fn test_cancel_closed_order_returns_stock() {
        let mut state = demo_state(Utc::now());
        let id = state.orders[0].id.clone();
        finalize_order(&mut state, &id, &ctx(12)).unwrap();

        cancel_order(&mut state, &id, &ctx(12)).unwrap();
        assert_eq!(state.product("p_club").unwrap().stock, 18);

        // terminal
        assert!(cancel_order(&mut state, &id, &ctx(12)).is_err());
        assert!(reopen_order(&mut state, &id, &ctx(12)).is_err());
        assert_eq!(state.product("p_club").unwrap().stock, 18);
    }

    #[test]
    fn test_reopen_only_from_closed() {
        let mut state = demo_state(Utc::now());
        let id = state.orders[0].id.clone();
        let stock_before = state.product("p_club").unwrap().stock;

        assert!(reopen_order(&mut state, &id, &ctx(12)).is_err());
        finalize_order(&mut state, &id, &ctx(12)).unwrap();
        reopen_order(&mut state, &id, &ctx(12)).unwrap();

        let order = state.order(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Open);
        assert!(order.closed_at.is_none());
        assert_eq!(state.product("p_club").unwrap().stock, stock_before);
    }

    #[test]
    fn test_update_notes() {
        let mut state = demo_state(Utc::now());
        let id = state.orders[0].id.clone();
        let item_id = state.orders[0].items[0].id.clone();

        update_order_notes(&mut state, &id, "cumpleaños").unwrap();
        update_item_notes(&mut state, &id, &item_id, "sin hielo").unwrap();

        let order = state.order(&id).unwrap();
        assert_eq!(order.notes, "cumpleaños");
        assert_eq!(order.items[0].notes, "sin hielo");
        let missing = update_item_notes(&mut state, &id, "item_nope", "x");
        assert!(missing.is_err());
        assert!(update_order_notes(&mut state, "ord_nope", "x").is_err());
    }
}
