//! # Inventory Ledger
//!
//! Stock adjustment primitives and administrative restocking.
//!
//! ## Reservation Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Reservation                                    │
//! │                                                                         │
//! │  addItem      ──► reserve(1)   stock -= 1  (floored at 0)               │
//! │  removeItem   ──► release(1)   stock += 1                               │
//! │  cancelOrder  ──► release(qty) for every line                           │
//! │  finalize     ──► (nothing: units stay consumed)                        │
//! │  transfer     ──► (nothing: the reservation changes owner)              │
//! │                                                                         │
//! │  Conservation: stock + Σ qty held by open orders is constant for        │
//! │  any sequence of order operations.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `restock_low`, `restock_product` and `bulk_update_products` touch stock
//! directly. They are administrative and outside the reserve/release pairing.
//! Restocking never takes a product above `STOCK_MAX`.

use tracing::debug;

use crate::action::ProductPatch;
use crate::catalog::apply_patch;
use crate::engine::Context;
use crate::error::{CoreError, CoreResult};
use crate::state::AppState;
use crate::types::{Notification, Product};
use crate::{RESTOCK_MULTIPLIER, STOCK_MAX};

// =============================================================================
// Primitives
// =============================================================================

/// Takes `qty` units out of stock, never going below zero.
///
/// Callers check availability first; an exhausted product is a rejected add,
/// not a call to this function.
#[inline]
pub fn reserve(product: &mut Product, qty: u32) {
    product.stock = product.stock.saturating_sub(qty);
}

/// Puts `qty` previously reserved units back into stock.
#[inline]
pub fn release(product: &mut Product, qty: u32) {
    product.stock = product.stock.saturating_add(qty);
}

/// Releases `qty` units of a product by id. Unknown ids are ignored: the
/// product was deleted while the order held it.
pub fn release_by_id(state: &mut AppState, product_id: &str, qty: u32) {
    match state.product_mut(product_id) {
        Some(product) => release(product, qty),
        None => debug!(product_id, qty, "Released stock of a deleted product"),
    }
}

/// Products at or below their low-stock threshold.
pub fn low_stock_products(products: &[Product]) -> impl Iterator<Item = &Product> {
    products.iter().filter(|p| p.is_low_stock())
}

// =============================================================================
// Administrative Restocking
// =============================================================================

/// Adds `2 × low_stock` to every product at or below its threshold.
pub fn restock_low(state: &mut AppState, ctx: &Context) -> CoreResult<Vec<Notification>> {
    let mut restocked = 0;
    for product in state.products.iter_mut().filter(|p| p.is_low_stock()) {
        let added = product.low_stock.saturating_mul(RESTOCK_MULTIPLIER);
        product.stock = product.stock.saturating_add(added).min(STOCK_MAX);
        restocked += 1;
    }

    debug!(restocked, "Restocked low products");
    Ok(vec![Notification::ok(
        format!("Restocked {} product(s)", restocked),
        ctx.now,
    )])
}

/// Adds `quantity` units to one product.
pub fn restock_product(
    state: &mut AppState,
    id: &str,
    quantity: u32,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    let product = state
        .product_mut(id)
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
    product.stock = product.stock.saturating_add(quantity).min(STOCK_MAX);

    Ok(vec![Notification::ok(
        format!("{}: +{} units", product.name, quantity),
        ctx.now,
    )])
}

/// Applies the same patch to several products. Unknown ids are skipped; if
/// none is known the action is refused.
///
/// A threshold that ends up above the product's stock is lowered to it.
pub fn bulk_update_products(
    state: &mut AppState,
    product_ids: &[String],
    updates: &ProductPatch,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    let mut updated = 0;
    for product in state
        .products
        .iter_mut()
        .filter(|p| product_ids.contains(&p.id))
    {
        apply_patch(product, updates);
        product.low_stock = product.low_stock.min(product.stock);
        updated += 1;
    }

    if updated == 0 {
        return Err(CoreError::ProductNotFound(product_ids.join(",")));
    }

    Ok(vec![Notification::ok(
        format!("{} product(s) updated", updated),
        ctx.now,
    )])
}

// =============================================================================
// Unit Tests
// =============================================================================
