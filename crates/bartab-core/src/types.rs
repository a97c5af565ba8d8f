//! # Domain Types
//!
//! Core domain types used throughout bartab.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  price          │◄──┼──items[]────────┼──►│  product_id(FK) │       │
//! │  │  stock          │   │  status         │   │  qty            │       │
//! │  │  low_stock      │   │  created_by     │   │  price (frozen) │       │
//! │  │  happy hour     │   │  timestamps     │   │  discount       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Percent      │   │  OrderStatus    │   │  Notification   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  0..=100        │   │  Open           │   │  Ok / Warn /    │       │
//! │  │                 │   │  Closed         │   │  Error          │       │
//! │  └─────────────────┘   │  Canceled       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `OrderItem.price` and `OrderItem.original_price` are copied from the product
//! when the line is created and never recomputed, so later price changes or
//! happy hours never rewrite an existing bill.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::{DEFAULT_HAPPY_HOUR_END, DEFAULT_HAPPY_HOUR_START};

/// Generates a new entity id with a readable prefix (`ord_…`, `item_…`).
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

// =============================================================================
// Percent
// =============================================================================

/// A whole percentage between 0 and 100.
///
/// Used for manual line discounts and happy-hour discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u8);

impl Percent {
    /// Creates a percentage, clamping anything above 100.
    #[inline]
    pub const fn new(value: u8) -> Self {
        if value > 100 {
            Percent(100)
        } else {
            Percent(value)
        }
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Returns the percentage, never above 100 even if deserialized from a
    /// larger raw value.
    #[inline]
    pub const fn value(&self) -> u8 {
        if self.0 > 100 {
            100
        } else {
            self.0
        }
    }

    /// Checks if the percentage is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.value())
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category ("Drinks", "Food", ...). Happy hours are toggled per
/// category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product with finite stock.
///
/// ## Invariants
/// - `stock` is never negative (enforced by `u32`)
/// - `low_stock` may exceed `stock`; that is the low-stock signal, not an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique, stable identifier.
    pub id: String,

    /// Display name shown on tabs and receipts.
    pub name: String,

    /// Owning category, if any.
    pub category_id: Option<String>,

    /// Base price in whole currency units.
    pub price: Money,

    /// Units on hand (not reserved by open orders).
    pub stock: u32,

    /// Threshold at or below which the product counts as low on stock.
    pub low_stock: u32,

    /// Happy-hour discount applied inside the window.
    #[serde(default)]
    pub happy_hour_discount: Percent,

    /// First hour (inclusive) of the happy-hour window. Unset means 17.
    #[serde(default)]
    pub happy_hour_start: Option<u8>,

    /// Last hour (exclusive) of the happy-hour window. Unset means 19.
    #[serde(default)]
    pub happy_hour_end: Option<u8>,

    /// Set by category-wide happy-hour toggles.
    #[serde(default)]
    pub happy_hour_active: bool,

    /// Image reference for the presentation layer.
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    /// Returns the effective happy-hour window `[start, end)`.
    pub fn happy_hour_window(&self) -> (u8, u8) {
        (
            self.happy_hour_start.unwrap_or(DEFAULT_HAPPY_HOUR_START),
            self.happy_hour_end.unwrap_or(DEFAULT_HAPPY_HOUR_END),
        )
    }

    /// Checks whether stock is at or below the low-stock threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock
    }

    /// Checks whether at least one unit can be added to an order.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of a tab.
///
/// ```text
///            finalize            cancel
///   ┌──────┐ ───────► ┌────────┐ ──────► ┌──────────┐
///   │ Open │          │ Closed │         │ Canceled │ (terminal)
///   └──────┘ ◄─────── └────────┘         └──────────┘
///      │      reopen                          ▲
///      └──────────────── cancel ──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Items can be added and removed.
    Open,
    /// Finalized (paid). Stock stays consumed.
    Closed,
    /// Voided. Stock has been returned.
    Canceled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Open => write!(f, "open"),
            OrderStatus::Closed => write!(f, "closed"),
            OrderStatus::Canceled => write!(f, "canceled"),
        }
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// One priced, quantified line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    /// Unique within its order.
    pub id: String,
    pub product_id: String,
    /// Always at least 1 while the line exists.
    pub qty: u32,
    /// Effective unit price when the line was created (frozen).
    pub price: Money,
    /// Undiscounted product price when the line was created (frozen).
    pub original_price: Money,
    #[serde(default)]
    pub notes: String,
    /// Manual discount applied when the line was created.
    #[serde(default)]
    pub discount: Percent,
}

impl OrderItem {
    /// Line total (qty × frozen price).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price * self.qty
    }

    /// Copy of this line with a fresh id, used when a line moves between
    /// orders.
    pub fn reidentified(&self) -> Self {
        OrderItem {
            id: generate_id("item"),
            ..self.clone()
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A tab tied to a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Table or tab label.
    pub name: String,
    pub status: OrderStatus,
    /// Insertion order is display order.
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub canceled_at: Option<DateTime<Utc>>,
    /// Actor that opened the tab.
    pub created_by: Option<String>,
}

impl Order {
    /// Creates an empty open order.
    pub fn open(name: impl Into<String>, created_by: Option<String>, now: DateTime<Utc>) -> Self {
        Order {
            id: generate_id("ord"),
            name: name.into(),
            status: OrderStatus::Open,
            items: Vec::new(),
            notes: String::new(),
            created_at: now,
            closed_at: None,
            canceled_at: None,
            created_by,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Finds a line by id.
    pub fn item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Sum of `qty × price` over the live lines.
    pub fn total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.qty).sum()
    }

    /// Units of one product held by this order, across all its lines.
    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.qty)
            .sum()
    }
}

// =============================================================================
// Notification
// =============================================================================

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Ok,
    Warn,
    Error,
}

/// A user-facing message produced alongside a state transition.
///
/// Ephemeral: not part of the state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[ts(as = "String")]
    pub ts: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Notification {
            id: generate_id("ntf"),
            kind,
            message: message.into(),
            ts,
        }
    }

    pub fn ok(message: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self::new(NotificationKind::Ok, message, ts)
    }

    pub fn warn(message: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self::new(NotificationKind::Warn, message, ts)
    }

    pub fn error(message: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self::new(NotificationKind::Error, message, ts)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, qty: u32, price: i64) -> OrderItem {
        OrderItem {
            id: generate_id("item"),
            product_id: product_id.to_string(),
            qty,
            price: Money::from_units(price),
            original_price: Money::from_units(price),
            notes: String::new(),
            discount: Percent::zero(),
        }
    }

    #[test]
    fn test_percent_clamps() {
        assert_eq!(Percent::new(150).value(), 100);
        assert_eq!(Percent::new(15).value(), 15);
        assert_eq!(Percent::new(20).to_string(), "20%");
    }

    #[test]
    fn test_order_status_display_and_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Open);
        assert_eq!(OrderStatus::Canceled.to_string(), "canceled");
    }

    #[test]
    fn test_order_totals_recomputed_from_lines() {
        let mut order = Order::open("Mesa 1", None, Utc::now());
        order.items.push(item("p_aguila", 2, 6000));
        order.items.push(item("p_emp", 3, 2500));
        order.items.push(item("p_aguila", 1, 5100));

        assert_eq!(order.total().units(), 12000 + 7500 + 5100);
        assert_eq!(order.total_quantity(), 6);
        assert_eq!(order.quantity_of("p_aguila"), 3);
    }

    #[test]
    fn test_reidentified_keeps_everything_but_id() {
        let original = item("p_club", 4, 8000);
        let moved = original.reidentified();
        assert_ne!(moved.id, original.id);
        assert_eq!(moved.qty, 4);
        assert_eq!(moved.price, original.price);
        assert!(moved.id.starts_with("item_"));
    }

    #[test]
    fn test_happy_hour_window_defaults() {
        let product = Product {
            id: "p".into(),
            name: "P".into(),
            category_id: None,
            price: Money::from_units(1000),
            stock: 3,
            low_stock: 3,
            happy_hour_discount: Percent::zero(),
            happy_hour_start: None,
            happy_hour_end: Some(20),
            happy_hour_active: false,
            image: None,
        };
        assert_eq!(product.happy_hour_window(), (17, 20));
        assert!(product.is_low_stock());
        assert!(product.is_available());
    }

    #[test]
    fn test_notification_wire_format() {
        let n = Notification::warn("Out of stock: Hielo", Utc::now());
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "warn");
        assert_eq!(json["message"], "Out of stock: Hielo");
    }
}
