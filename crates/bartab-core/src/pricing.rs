//! # Pricing Engine
//!
//! Computes the unit price frozen onto an order line.
//!
//! ## Discount Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product.price                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  manual discount > 0 ?  ──yes──► × (1 - manual/100)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  hour in [start, end) and happy_hour_discount > 0 ?                    │
//! │       │                 ──yes──► × (1 - happy/100)                     │
//! │       ▼                                                                 │
//! │  effective price (stacked multiplicatively, rounded half-up once)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The current hour is a parameter. Nothing in here reads the clock, so the
//! same inputs always give the same price.

use crate::money::Money;
use crate::types::{Percent, Product};

/// Checks whether the product's happy-hour discount applies at `hour`.
///
/// The window is `[start, end)` in local hours (0-23); unset bounds fall back
/// to 17-19. A zero discount never applies. The `happy_hour_active` flag is
/// informational and does not gate the discount.
pub fn happy_hour_applies(product: &Product, hour: u8) -> bool {
    if product.happy_hour_discount.is_zero() {
        return false;
    }
    let (start, end) = product.happy_hour_window();
    hour >= start && hour < end
}

/// Effective unit price for a new order line.
///
/// ## Example
/// ```rust
/// use bartab_core::pricing::effective_price;
/// use bartab_core::seed::demo_state;
/// use bartab_core::types::Percent;
///
/// let state = demo_state(chrono::Utc::now());
/// let aguila = state.product("p_aguila").unwrap();
///
/// // 6000, 15% happy hour between 17 and 19
/// assert_eq!(effective_price(aguila, Percent::zero(), 12).units(), 6000);
/// assert_eq!(effective_price(aguila, Percent::zero(), 18).units(), 5100);
/// ```
pub fn effective_price(product: &Product, manual_discount: Percent, hour: u8) -> Money {
    let happy = if happy_hour_applies(product, hour) {
        product.happy_hour_discount
    } else {
        Percent::zero()
    };
    product.price.apply_discounts(&[manual_discount, happy])
}

// =============================================================================
// Unit Tests
// =============================================================================
