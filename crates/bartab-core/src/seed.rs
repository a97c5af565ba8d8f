//! # Demo Data
//!
//! The catalog and tabs a fresh installation starts with.
//!
//! ```text
//! Bebidas   p_aguila p_poker p_club p_agua
//! Comidas   p_emp p_sal p_per
//! Otros     p_hielo
//!
//! Mesa 1 (open)  2× Aguila, 3× Empanada, 1× Salchipapa
//! Mesa 2 (open)  1× Club Colombia, 2× Agua
//! ```
//!
//! Stock values already exclude what the two demo tabs hold, so
//! stock + reserved equals the catalog's starting stock.

use chrono::{DateTime, Utc};

use crate::audit::AuditTrail;
use crate::money::Money;
use crate::state::AppState;
use crate::types::{Category, Order, OrderItem, OrderStatus, Percent, Product};

/// Demo user that opened the demo tabs.
pub const DEMO_EMPLOYEE: &str = "u_emp1";

fn category(id: &str, name: &str, description: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: &str,
    name: &str,
    category_id: &str,
    price: i64,
    stock: u32,
    low_stock: u32,
    happy_hour: (u8, u8, u8),
    image: &str,
) -> Product {
    let (discount, start, end) = happy_hour;
    let has_window = discount > 0;
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category_id: Some(category_id.to_string()),
        price: Money::from_units(price),
        stock,
        low_stock,
        happy_hour_discount: Percent::new(discount),
        happy_hour_start: has_window.then_some(start),
        happy_hour_end: has_window.then_some(end),
        happy_hour_active: false,
        image: Some(format!("/images/products/{}", image)),
    }
}

fn line(id: &str, product_id: &str, qty: u32, price: i64, notes: &str) -> OrderItem {
    OrderItem {
        id: id.to_string(),
        product_id: product_id.to_string(),
        qty,
        price: Money::from_units(price),
        original_price: Money::from_units(price),
        notes: notes.to_string(),
        discount: Percent::zero(),
    }
}

fn demo_order(
    id: &str,
    name: &str,
    items: Vec<OrderItem>,
    notes: &str,
    now: DateTime<Utc>,
) -> Order {
    Order {
        id: id.to_string(),
        name: name.to_string(),
        status: OrderStatus::Open,
        items,
        notes: notes.to_string(),
        created_at: now,
        closed_at: None,
        canceled_at: None,
        created_by: Some(DEMO_EMPLOYEE.to_string()),
    }
}

/// Builds the demo state, stamping the demo tabs with `now`.
pub fn demo_state(now: DateTime<Utc>) -> AppState {
    let categories = vec![
        category("c_beb", "Bebidas", "Alcoholic and soft drinks"),
        category("c_com", "Comidas", "Main dishes and snacks"),
        category("c_otr", "Otros", "Extras"),
    ];

    // stock = starting stock - units held by the demo tabs
    let products = vec![
        product(
            "p_aguila",
            "Cerveza Aguila",
            "c_beb",
            6000,
            24 - 2,
            8,
            (15, 17, 19),
            "aguila.png",
        ),
        product(
            "p_poker",
            "Cerveza Poker",
            "c_beb",
            6000,
            24,
            8,
            (15, 17, 19),
            "poker.jpg",
        ),
        product(
            "p_club",
            "Club Colombia",
            "c_beb",
            8000,
            18 - 1,
            6,
            (20, 17, 19),
            "club.jpg",
        ),
        product(
            "p_agua",
            "Agua",
            "c_beb",
            4000,
            20 - 2,
            6,
            (0, 0, 0),
            "agua.jpg",
        ),
        product(
            "p_emp",
            "Empanada",
            "c_com",
            2500,
            50 - 3,
            10,
            (10, 15, 17),
            "empanada.png",
        ),
        product(
            "p_sal",
            "Salchipapa",
            "c_com",
            12000,
            10 - 1,
            4,
            (25, 15, 17),
            "salchipapa.jpg",
        ),
        product(
            "p_per",
            "Perro Caliente",
            "c_com",
            10000,
            12,
            4,
            (20, 15, 17),
            "perro.png",
        ),
        product(
            "p_hielo",
            "Hielo",
            "c_otr",
            2000,
            30,
            8,
            (0, 0, 0),
            "hielo.jpg",
        ),
    ];

    // newest first
    let orders = vec![
        demo_order(
            "ord_demo_mesa2",
            "Mesa 2",
            vec![
                line("item_4", "p_club", 1, 8000, "Bien fría"),
                line("item_5", "p_agua", 2, 4000, ""),
            ],
            "",
            now,
        ),
        demo_order(
            "ord_demo_mesa1",
            "Mesa 1",
            vec![
                line("item_1", "p_aguila", 2, 6000, ""),
                line("item_2", "p_emp", 3, 2500, "Extra salsa"),
                line("item_3", "p_sal", 1, 12000, ""),
            ],
            "By the window",
            now,
        ),
    ];

    AppState {
        products,
        categories,
        orders,
        audit_log: AuditTrail::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_reservations_match_starting_stock() {
        let state = demo_state(Utc::now());
        let starting = [
            ("p_aguila", 24),
            ("p_poker", 24),
            ("p_club", 18),
            ("p_agua", 20),
            ("p_emp", 50),
            ("p_sal", 10),
            ("p_per", 12),
            ("p_hielo", 30),
        ];
        for (id, start) in starting {
            let stock = state.product(id).unwrap().stock;
            assert_eq!(stock + state.reserved_quantity(id), start, "{}", id);
        }
    }

    #[test]
    fn test_demo_references_are_consistent() {
        let state = demo_state(Utc::now());
        for order in &state.orders {
            for item in &order.items {
                assert!(state.product(&item.product_id).is_some());
            }
        }
        for product in &state.products {
            let category = product.category_id.as_deref().unwrap();
            assert!(state.category(category).is_some());
        }
        assert_eq!(state.orders[0].name, "Mesa 2");
    }
}
