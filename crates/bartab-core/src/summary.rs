//! # Read Projections
//!
//! Views over a snapshot for whatever renders it. Nothing here mutates state.
//!
//! ```text
//! AppState ──► order_summary(order_id) ──► OrderSummary
//!                                           ├── lines  (item + product name/image)
//!                                           └── total  Σ qty × price, recomputed
//! ```
//!
//! Totals are never cached: a summary built after an item is removed always
//! reflects the live lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::state::AppState;
use crate::types::{Category, Notification, NotificationKind, Order, OrderStatus, Percent, Product};

/// One order line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SummaryLine {
    pub item_id: String,
    pub product_id: String,
    /// Product name, or the product id when the product was deleted.
    pub name: String,
    pub image: Option<String>,
    pub qty: u32,
    pub price: Money,
    pub discount: Percent,
    pub notes: String,
    pub line_total: Money,
}

/// An order as shown on the order screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: String,
    pub name: String,
    pub status: OrderStatus,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub lines: Vec<SummaryLine>,
    pub total_quantity: u32,
    pub total: Money,
}

/// Builds the summary of one order.
///
/// # Errors
/// `OrderNotFound` if no order has that id.
pub fn order_summary(state: &AppState, order_id: &str) -> CoreResult<OrderSummary> {
    let order = state.require_order(order_id)?;

    let lines: Vec<SummaryLine> = order
        .items
        .iter()
        .map(|item| {
            let product = state.product(&item.product_id);
            SummaryLine {
                item_id: item.id.clone(),
                product_id: item.product_id.clone(),
                name: product
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| item.product_id.clone()),
                image: product.and_then(|p| p.image.clone()),
                qty: item.qty,
                price: item.price,
                discount: item.discount,
                notes: item.notes.clone(),
                line_total: item.line_total(),
            }
        })
        .collect();

    Ok(OrderSummary {
        order_id: order.id.clone(),
        name: order.name.clone(),
        status: order.status,
        notes: order.notes.clone(),
        created_at: order.created_at,
        created_by: order.created_by.clone(),
        total_quantity: lines.iter().map(|l| l.qty).sum(),
        total: lines.iter().map(|l| l.line_total).sum(),
        lines,
    })
}

// =============================================================================
// Selectors
// =============================================================================

pub fn open_orders(state: &AppState) -> Vec<&Order> {
    state.orders_with_status(OrderStatus::Open).collect()
}

pub fn closed_orders(state: &AppState) -> Vec<&Order> {
    state.orders_with_status(OrderStatus::Closed).collect()
}

pub fn canceled_orders(state: &AppState) -> Vec<&Order> {
    state.orders_with_status(OrderStatus::Canceled).collect()
}

/// Orders opened by one user. Orders without a creator never match.
pub fn orders_by_creator<'a>(state: &'a AppState, user_id: &str) -> Vec<&'a Order> {
    state
        .orders
        .iter()
        .filter(|o| o.created_by.as_deref() == Some(user_id))
        .collect()
}

pub fn products_by_category<'a>(state: &'a AppState, category_id: &str) -> Vec<&'a Product> {
    state
        .products
        .iter()
        .filter(|p| p.category_id.as_deref() == Some(category_id))
        .collect()
}

/// Products with stock left to sell.
pub fn available_products(state: &AppState) -> Vec<&Product> {
    state.products.iter().filter(|p| p.is_available()).collect()
}

/// Products that carry a happy-hour discount, whether or not the window is open.
pub fn happy_hour_products(state: &AppState) -> Vec<&Product> {
    state
        .products
        .iter()
        .filter(|p| !p.happy_hour_discount.is_zero())
        .collect()
}

/// Categories that still have at least one product.
pub fn categories_with_products(state: &AppState) -> Vec<&Category> {
    state
        .categories
        .iter()
        .filter(|c| {
            state
                .products
                .iter()
                .any(|p| p.category_id.as_deref() == Some(c.id.as_str()))
        })
        .collect()
}

/// The newest `limit` notifications, newest first.
pub fn recent_notifications<'a, I>(notifications: I, limit: usize) -> Vec<&'a Notification>
where
    I: IntoIterator<Item = &'a Notification>,
    I::IntoIter: DoubleEndedIterator,
{
    notifications.into_iter().rev().take(limit).collect()
}

pub fn notifications_of_kind<'a, I>(
    notifications: I,
    kind: NotificationKind,
) -> Vec<&'a Notification>
where
    I: IntoIterator<Item = &'a Notification>,
{
    notifications
        .into_iter()
        .filter(|n| n.kind == kind)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_state;

    #[test]
    fn test_summary_joins_products() {
        let state = demo_state(Utc::now());
        let summary = order_summary(&state, "ord_demo_mesa1").unwrap();

        assert_eq!(summary.lines.len(), 3);
        assert_eq!(summary.lines[0].name, "Cerveza Aguila");
        assert_eq!(
            summary.lines[0].image.as_deref(),
            Some("/images/products/aguila.png")
        );
        // 2×6000 + 3×2500 + 1×12000
        assert_eq!(summary.total, Money::from_units(31_500));
        assert_eq!(summary.total_quantity, 6);
    }

    #[test]
    fn test_summary_recomputes_after_change() {
        let mut state = demo_state(Utc::now());
        state.order_mut("ord_demo_mesa1").unwrap().items.remove(2);

        let summary = order_summary(&state, "ord_demo_mesa1").unwrap();
        assert_eq!(summary.total, Money::from_units(19_500));
    }

    #[test]
    fn test_summary_of_deleted_product_falls_back_to_id() {
        let mut state = demo_state(Utc::now());
        state.products.retain(|p| p.id != "p_club");

        let summary = order_summary(&state, "ord_demo_mesa2").unwrap();
        assert_eq!(summary.lines[0].name, "p_club");
        assert!(summary.lines[0].image.is_none());
    }

    #[test]
    fn test_summary_unknown_order() {
        let state = demo_state(Utc::now());
        assert!(order_summary(&state, "nope").is_err());
    }

    #[test]
    fn test_selectors() {
        let mut state = demo_state(Utc::now());
        state.product_mut("p_hielo").unwrap().stock = 0;

        assert_eq!(open_orders(&state).len(), 2);
        assert!(closed_orders(&state).is_empty());
        assert!(canceled_orders(&state).is_empty());
        assert_eq!(orders_by_creator(&state, "u_emp1").len(), 2);
        assert!(orders_by_creator(&state, "u_admin").is_empty());
        assert_eq!(products_by_category(&state, "c_com").len(), 3);
        assert_eq!(available_products(&state).len(), 7);
        assert_eq!(happy_hour_products(&state).len(), 6);

        state.products.retain(|p| p.category_id.as_deref() != Some("c_otr"));
        let names: Vec<_> = categories_with_products(&state)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["Bebidas", "Comidas"]);
    }

    #[test]
    fn test_notification_selectors() {
        let now = Utc::now();
        let inbox = vec![
            Notification::ok("a", now),
            Notification::warn("b", now),
            Notification::ok("c", now),
        ];

        let recent = recent_notifications(&inbox, 2);
        assert_eq!(recent[0].message, "c");
        assert_eq!(recent[1].message, "b");
        assert_eq!(notifications_of_kind(&inbox, NotificationKind::Ok).len(), 2);
    }
}
