//! # Sales Reports
//!
//! Aggregations over closed orders inside a time window.
//!
//! ```text
//! orders ──► closed, closed_at ∈ [start, end] ──┬──► sales_report
//!                                                ├──► top_products
//!                                                ├──► consumption_by_category
//! orders ──► canceled, canceled_at ∈ [start, end]┴──► shift_report
//! ```
//!
//! Revenue always comes from the frozen line prices (`qty × price`), never from
//! the current catalog price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::state::AppState;
use crate::types::{Order, OrderStatus};

/// Top products listed in a shift report.
pub const SHIFT_TOP_PRODUCTS: usize = 5;

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Period { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub period: Period,
    pub total_orders: usize,
    pub total_revenue: Money,
    /// Integer average, rounded down. Zero when there are no orders.
    pub average_order_value: Money,
    pub total_items: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub id: String,
    /// Product name, or the id when the product no longer exists.
    pub name: String,
    pub category_id: Option<String>,
    pub total_qty: u32,
    pub total_revenue: Money,
    /// Closed orders containing the product.
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConsumption {
    pub id: String,
    pub name: String,
    pub total_qty: u32,
    pub total_revenue: Money,
    pub unique_products: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub period: Period,
    pub sales: SalesReport,
    pub canceled_orders: usize,
    /// Canceled / (closed + canceled) × 100, or 0 when nothing happened.
    pub cancellation_rate: f64,
    pub top_products: Vec<ProductSales>,
}

/// Closed orders whose `closed_at` falls inside the period.
pub fn sales_in_period<'a>(
    state: &'a AppState,
    period: &'a Period,
) -> impl Iterator<Item = &'a Order> {
    state
        .orders_with_status(OrderStatus::Closed)
        .filter(move |o| o.closed_at.is_some_and(|at| period.contains(at)))
}

pub fn sales_report(state: &AppState, period: Period) -> SalesReport {
    let mut total_orders = 0usize;
    let mut total_revenue = Money::zero();
    let mut total_items = 0u32;

    for order in sales_in_period(state, &period) {
        total_orders += 1;
        total_revenue += order.total();
        total_items += order.total_quantity();
    }

    let average_order_value = if total_orders == 0 {
        Money::zero()
    } else {
        Money::from_units(total_revenue.units() / total_orders as i64)
    };

    SalesReport {
        period,
        total_orders,
        total_revenue,
        average_order_value,
        total_items,
    }
}

/// Best sellers by revenue, highest first.
pub fn top_products(state: &AppState, period: Period, limit: usize) -> Vec<ProductSales> {
    let mut stats: HashMap<&str, ProductSales> = HashMap::new();

    for order in sales_in_period(state, &period) {
        let mut seen: Vec<&str> = Vec::new();
        for item in &order.items {
            let entry = stats.entry(item.product_id.as_str()).or_insert_with(|| {
                let product = state.product(&item.product_id);
                ProductSales {
                    id: item.product_id.clone(),
                    name: product
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| item.product_id.clone()),
                    category_id: product.and_then(|p| p.category_id.clone()),
                    total_qty: 0,
                    total_revenue: Money::zero(),
                    orders: 0,
                }
            });
            entry.total_qty += item.qty;
            entry.total_revenue += item.line_total();
            if !seen.contains(&item.product_id.as_str()) {
                seen.push(&item.product_id);
                entry.orders += 1;
            }
        }
    }

    let mut ranked: Vec<ProductSales> = stats.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_revenue
            .cmp(&a.total_revenue)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.truncate(limit);
    ranked
}

/// Units and revenue per category, highest revenue first.
///
/// Lines whose product was deleted or detached from its category are not
/// attributed to any category.
pub fn consumption_by_category(state: &AppState, period: Period) -> Vec<CategoryConsumption> {
    let mut totals: HashMap<&str, (u32, Money, Vec<&str>)> = HashMap::new();

    for order in sales_in_period(state, &period) {
        for item in &order.items {
            let Some(category_id) = state
                .product(&item.product_id)
                .and_then(|p| p.category_id.as_deref())
            else {
                continue;
            };
            let (qty, revenue, products) = totals.entry(category_id).or_default();
            *qty += item.qty;
            *revenue += item.line_total();
            if !products.contains(&item.product_id.as_str()) {
                products.push(&item.product_id);
            }
        }
    }

    let mut report: Vec<CategoryConsumption> = state
        .categories
        .iter()
        .filter_map(|category| {
            totals
                .get(category.id.as_str())
                .map(|(qty, revenue, products)| CategoryConsumption {
                    id: category.id.clone(),
                    name: category.name.clone(),
                    total_qty: *qty,
                    total_revenue: *revenue,
                    unique_products: products.len(),
                })
        })
        .collect();

    report.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    report
}

/// Sales, cancellations and best sellers of one shift.
pub fn shift_report(state: &AppState, period: Period) -> ShiftReport {
    let sales = sales_report(state, period);
    let canceled_orders = state
        .orders_with_status(OrderStatus::Canceled)
        .filter(|o| o.canceled_at.is_some_and(|at| period.contains(at)))
        .count();

    let finished = sales.total_orders + canceled_orders;
    let cancellation_rate = if finished == 0 {
        0.0
    } else {
        canceled_orders as f64 / finished as f64 * 100.0
    };

    ShiftReport {
        period,
        top_products: top_products(state, period, SHIFT_TOP_PRODUCTS),
        sales,
        canceled_orders,
        cancellation_rate,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_state;
    use chrono::Duration;

    fn closed_demo() -> (AppState, Period) {
        let now = Utc::now();
        let mut state = demo_state(now);
        for order in &mut state.orders {
            order.status = OrderStatus::Closed;
            order.closed_at = Some(now);
        }
        let period = Period::new(now - Duration::hours(1), now + Duration::hours(1));
        (state, period)
    }

    #[test]
    fn test_sales_report() {
        let (state, period) = closed_demo();
        let report = sales_report(&state, period);

        // Mesa 1: 31,500  Mesa 2: 16,000
        assert_eq!(report.total_orders, 2);
        assert_eq!(report.total_revenue, Money::from_units(47_500));
        assert_eq!(report.average_order_value, Money::from_units(23_750));
        assert_eq!(report.total_items, 9);
    }

    #[test]
    fn test_open_orders_and_outside_window_are_ignored() {
        let (mut state, period) = closed_demo();
        state.orders[0].closed_at = Some(period.end + Duration::minutes(1));
        state.orders[1].status = OrderStatus::Open;
        state.orders[1].closed_at = None;

        let report = sales_report(&state, period);
        assert_eq!(report.total_orders, 0);
        assert_eq!(report.average_order_value, Money::zero());
    }

    #[test]
    fn test_top_products_ranked_by_revenue() {
        let (state, period) = closed_demo();
        let top = top_products(&state, period, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "p_aguila");
        assert_eq!(top[0].total_revenue, Money::from_units(12_000));
        // p_aguila and p_sal tie on revenue; ties break on id
        assert_eq!(top[1].id, "p_sal");
        assert_eq!(top[0].orders, 1);
    }

    #[test]
    fn test_consumption_by_category() {
        let (state, period) = closed_demo();
        let report = consumption_by_category(&state, period);

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].name, "Bebidas");
        assert_eq!(report[0].total_revenue, Money::from_units(28_000));
        assert_eq!(report[0].total_qty, 5);
        assert_eq!(report[0].unique_products, 3);
        assert_eq!(report[1].name, "Comidas");
        assert_eq!(report[1].total_revenue, Money::from_units(19_500));
    }

    #[test]
    fn test_shift_report_cancellation_rate() {
        let (mut state, period) = closed_demo();
        state.orders[0].status = OrderStatus::Canceled;
        state.orders[0].closed_at = None;
        state.orders[0].canceled_at = Some(period.start);

        let report = shift_report(&state, period);
        assert_eq!(report.sales.total_orders, 1);
        assert_eq!(report.canceled_orders, 1);
        assert!((report.cancellation_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.top_products.len(), 3);
    }

    #[test]
    fn test_empty_shift() {
        let state = demo_state(Utc::now());
        let now = Utc::now();
        let report = shift_report(&state, Period::new(now, now));
        assert_eq!(report.cancellation_rate, 0.0);
        assert!(report.top_products.is_empty());
    }
}
