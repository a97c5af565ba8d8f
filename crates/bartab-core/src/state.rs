//! # Application State
//!
//! The full snapshot the engine transforms.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState                                                               │
//! │  ├── products    Vec<Product>   catalog + on-hand stock                 │
//! │  ├── categories  Vec<Category>                                          │
//! │  ├── orders      Vec<Order>     newest first                            │
//! │  └── audit_log   AuditTrail     bounded FIFO                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications are not part of the snapshot; they travel next to it in a
//! [`Transition`](crate::engine::Transition).

use serde::{Deserialize, Serialize};

use crate::audit::AuditTrail;
use crate::error::{CoreError, CoreResult};
use crate::types::{Category, Order, OrderStatus, Product};

/// Products, categories, orders and the audit trail of one bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub products: Vec<Product>,
    #[serde(default)]
    pub categories: Vec<Category>,
    pub orders: Vec<Order>,
    #[serde(default)]
    pub audit_log: AuditTrail,
}

impl AppState {
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn order_mut(&mut self, id: &str) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == id)
    }

    /// Looks up an order, failing with `OrderNotFound`.
    pub fn require_order(&self, id: &str) -> CoreResult<&Order> {
        self.order(id)
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()))
    }

    /// Looks up an order that must be open.
    pub fn require_open_order(&self, id: &str) -> CoreResult<&Order> {
        let order = self.require_order(id)?;
        if !order.is_open() {
            return Err(CoreError::InvalidOrderStatus {
                order_id: id.to_string(),
                status: order.status,
            });
        }
        Ok(order)
    }

    /// Looks up a product, failing with `ProductNotFound`.
    pub fn require_product(&self, id: &str) -> CoreResult<&Product> {
        self.product(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    pub fn orders_with_status(&self, status: OrderStatus) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(move |o| o.status == status)
    }

    /// Units of a product currently held by open orders.
    pub fn reserved_quantity(&self, product_id: &str) -> u32 {
        self.orders_with_status(OrderStatus::Open)
            .map(|o| o.quantity_of(product_id))
            .sum()
    }

    /// Every order name, used for duplicate table-name checks.
    pub fn order_names(&self) -> impl Iterator<Item = &str> {
        self.orders.iter().map(|o| o.name.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
