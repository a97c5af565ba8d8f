//! # Error Types
//!
//! Domain-specific error types for bartab-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bartab-core errors (this file)                                        │
//! │  ├── CoreError         - Why the engine refused an action              │
//! │  ├── ValidationError   - Input rejected before it reaches the engine   │
//! │  └── ValidationWarning - Input accepted, but corrected or suspicious   │
//! │                                                                         │
//! │  bartab-db errors (separate crate)                                     │
//! │  └── DbError           - Database operation failures                   │
//! │                                                                         │
//! │  Flow: ValidationError ─► caller      (engine never sees bad input)    │
//! │        CoreError ─► Rejection ─► caller (state untouched)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages carry the ids or names involved. The engine never panics on
//! bad input: every refusal is one of the variants below.

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Reasons the engine can refuse an action.
///
/// Apart from [`CoreError::OutOfStock`] these are all "precondition not met":
/// the caller asked for something that does not apply to the current state,
/// and nothing happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Order id does not exist in the state.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Product id does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Category id does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Line item id does not exist in the given order.
    #[error("Item {item_id} not found in order {order_id}")]
    ItemNotFound { order_id: String, item_id: String },

    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding items to a closed order
    /// - Reopening an order that is still open
    /// - Transferring from a canceled order
    #[error("Order {order_id} is {status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        status: OrderStatus,
    },

    /// Product has no units left.
    ///
    /// ## User Workflow
    /// ```text
    /// Tap "Cerveza" on table 4
    ///      │
    ///      ▼
    /// stock == 0
    ///      │
    ///      ▼
    /// OutOfStock { name: "Cerveza" } + warn notification
    /// ```
    #[error("Out of stock: {name}")]
    OutOfStock { product_id: String, name: String },

    /// A line would exceed the per-line quantity ceiling.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u32, max: u32 },

    /// Source and destination of a transfer are the same order.
    #[error("Cannot transfer order {0} into itself")]
    SameOrder(String),

    /// None of the selected items exist in the source order.
    #[error("No matching items selected in order {0}")]
    EmptySelection(String),

    /// Bookkeeping action submitted by an outside caller.
    #[error("Action {0} cannot be dispatched directly")]
    InternalAction(String),

    /// Input that failed a field check.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for the one business-policy refusal that users are told
    /// about. All other variants are silent no-ops.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, CoreError::OutOfStock { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Produced by [`crate::validation`] before an action is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty after trimming.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Low-stock threshold is above the current stock.
    #[error("Low stock threshold ({low_stock}) cannot exceed current stock ({stock})")]
    LowStockAboveStock { low_stock: u32, stock: u32 },

    /// Duplicate value where duplicates are not allowed.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Validation Warning
// =============================================================================

/// Non-blocking findings of validation.
///
/// A value carrying only warnings is valid; the warnings tell the user what
/// was corrected on their behalf.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    /// Value was above its ceiling and has been clamped.
    #[error("{field} was limited to the maximum allowed: {max}")]
    Clamped { field: String, max: i64 },

    /// Low-stock threshold was lowered to the current stock.
    #[error("Low stock threshold was adjusted to the current stock ({stock})")]
    LowStockAdjusted { stock: u32 },

    /// Another entity already uses this name.
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OutOfStock {
            product_id: "p_aguila".to_string(),
            name: "Cerveza Aguila".to_string(),
        };
        assert_eq!(err.to_string(), "Out of stock: Cerveza Aguila");

        let err = CoreError::InvalidOrderStatus {
            order_id: "ord_1".to_string(),
            status: OrderStatus::Closed,
        };
        assert_eq!(
            err.to_string(),
            "Order ord_1 is closed, cannot perform operation"
        );
    }

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::LowStockAboveStock {
            low_stock: 10,
            stock: 5,
        };
        assert_eq!(
            err.to_string(),
            "Low stock threshold (10) cannot exceed current stock (5)"
        );

        let warn = ValidationWarning::Clamped {
            field: "price".to_string(),
            max: 999_999,
        };
        assert_eq!(
            warn.to_string(),
            "price was limited to the maximum allowed: 999999"
        );
    }

    #[test]
    fn test_only_out_of_stock_is_policy_rejection() {
        assert!(CoreError::OutOfStock {
            product_id: "p".into(),
            name: "P".into()
        }
        .is_policy_rejection());
        assert!(!CoreError::OrderNotFound("o".into()).is_policy_rejection());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
