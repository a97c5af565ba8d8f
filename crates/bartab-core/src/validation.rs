//! # Validation Module
//!
//! Sanitizes and bounds-checks raw input before it becomes an [`Action`].
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation                                                 │
//! │  ├── Form inputs, free text, numbers typed as text                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Coerce + clamp numbers (lossy on purpose: junk becomes `min`)     │
//! │  ├── Name rules, duplicate policy                                      │
//! │  └── Auto-corrections reported as warnings                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine                                                       │
//! │  └── Typed actions only (u32 stock, Money, Percent)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ceilings
//! Values above a ceiling are clamped and reported as a warning, never as a
//! hard failure: price ≤ 999,999, stock ≤ 99,999, quantity per line ≤ 999.
//! Happy-hour bounds are hours of the day, 0-23.
//!
//! [`Action`]: crate::action::Action

use serde::{Deserialize, Serialize};

use crate::action::ProductPatch;
use crate::error::{ValidationError, ValidationWarning};
use crate::money::Money;
use crate::types::{Percent, Product};
use crate::{
    LOW_STOCK_MAX, MAX_ITEM_QUANTITY, MAX_PRODUCT_NAME_LEN, MAX_TABLE_NAME_LEN, PRICE_MAX,
    STOCK_MAX,
};

// =============================================================================
// Validation Result
// =============================================================================

/// Outcome of a validation: the sanitized value plus what was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    /// Sanitized (clamped, trimmed, auto-corrected) value.
    pub value: T,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl<T> Validated<T> {
    fn new(value: T) -> Self {
        Validated {
            value,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// True when no errors were emitted.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when at least one error was NOT auto-corrected.
    ///
    /// A low-stock threshold above stock is reported as an error but the
    /// value has already been fixed, so it does not block.
    pub fn has_blocking_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| !matches!(e, ValidationError::LowStockAboveStock { .. }))
    }

    /// Converts into a `Result`, failing only on blocking errors.
    pub fn into_result(self) -> Result<(T, Vec<ValidationWarning>), Vec<ValidationError>> {
        if self.has_blocking_errors() {
            Err(self.errors)
        } else {
            Ok((self.value, self.warnings))
        }
    }
}

// =============================================================================
// Numeric Sanitizers
// =============================================================================

const LAST_HOUR: u8 = 23;

/// Coerces a number into `[min, max]` rounded to `decimal_places`.
///
/// NaN and infinities silently become `min`; no error is raised.
///
/// ## Example
/// ```rust
/// use bartab_core::validation::sanitize_number;
///
/// assert_eq!(sanitize_number(12.6, 0.0, 10.0, 0), 10.0);
/// assert_eq!(sanitize_number(f64::NAN, 1.0, 10.0, 0), 1.0);
/// assert_eq!(sanitize_number(3.14159, 0.0, 10.0, 2), 3.14);
/// ```
pub fn sanitize_number(value: f64, min: f64, max: f64, decimal_places: u32) -> f64 {
    if !value.is_finite() {
        return min;
    }
    let clamped = value.max(min).min(max);
    let factor = 10f64.powi(decimal_places as i32);
    (clamped * factor).round() / factor
}

/// Like [`sanitize_number`] for text input. Anything that does not parse as a
/// number becomes `min`.
pub fn sanitize_text_number(input: &str, min: f64, max: f64, decimal_places: u32) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) => sanitize_number(value, min, max, decimal_places),
        Err(_) => min,
    }
}

// =============================================================================
// Product Validation
// =============================================================================

/// Raw product form input. Numbers are `f64` because they come from
/// free-form inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    /// Set when editing an existing product (excluded from duplicate checks).
    pub id: Option<String>,
    pub name: String,
    pub category_id: Option<String>,
    pub price: f64,
    pub stock: f64,
    pub low_stock: f64,
    pub happy_hour_discount: f64,
    pub happy_hour_start: Option<u8>,
    pub happy_hour_end: Option<u8>,
    pub image: Option<String>,
}

impl ProductDraft {
    /// Draft pre-filled from an existing product, for edits.
    pub fn from_product(product: &Product) -> Self {
        ProductDraft {
            id: Some(product.id.clone()),
            name: product.name.clone(),
            category_id: product.category_id.clone(),
            price: product.price.units() as f64,
            stock: product.stock as f64,
            low_stock: product.low_stock as f64,
            happy_hour_discount: product.happy_hour_discount.value() as f64,
            happy_hour_start: product.happy_hour_start,
            happy_hour_end: product.happy_hour_end,
            image: product.image.clone(),
        }
    }
}

/// A sanitized product, ready to be carried by an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category_id: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub low_stock: u32,
    #[serde(default)]
    pub happy_hour_discount: Percent,
    #[serde(default)]
    pub happy_hour_start: Option<u8>,
    #[serde(default)]
    pub happy_hour_end: Option<u8>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Validates and sanitizes a product draft.
///
/// ## Rules
/// - price, stock and low stock are clamped to their ceilings (warning)
/// - name is required and at most 100 characters (error)
/// - price must be greater than zero (error)
/// - low stock above stock: error, then auto-corrected to `stock` (warning)
/// - another product with the same name: warning only
///
/// ## Example
/// ```rust
/// use bartab_core::validation::{validate_product, ProductDraft};
///
/// let draft = ProductDraft {
///     name: "X".into(),
///     price: 100.0,
///     stock: 5.0,
///     low_stock: 10.0,
///     ..Default::default()
/// };
/// let result = validate_product(&draft, &[]);
/// assert_eq!(result.value.low_stock, 5);
/// assert_eq!(result.errors.len(), 1);
/// assert_eq!(result.warnings.len(), 1);
/// ```
pub fn validate_product(candidate: &ProductDraft, existing: &[Product]) -> Validated<NewProduct> {
    let name = candidate.name.trim().to_string();
    let price = sanitize_number(candidate.price, 0.0, PRICE_MAX as f64, 0) as i64;
    let stock = sanitize_number(candidate.stock, 0.0, STOCK_MAX as f64, 0) as u32;
    let low_stock = sanitize_number(candidate.low_stock, 0.0, LOW_STOCK_MAX as f64, 0) as u32;
    let happy = sanitize_number(candidate.happy_hour_discount, 0.0, 100.0, 0) as u8;

    let mut result = Validated::new(NewProduct {
        name: name.clone(),
        category_id: candidate.category_id.clone(),
        price: Money::from_units(price),
        stock,
        low_stock,
        happy_hour_discount: Percent::new(happy),
        happy_hour_start: candidate.happy_hour_start.map(|h| h.min(LAST_HOUR)),
        happy_hour_end: candidate.happy_hour_end.map(|h| h.min(LAST_HOUR)),
        image: candidate.image.clone(),
    });
    clamp_hour_warnings(
        candidate.happy_hour_start,
        candidate.happy_hour_end,
        &mut result.warnings,
    );

    if name.is_empty() {
        result.errors.push(ValidationError::Required {
            field: "name".to_string(),
        });
    } else if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        result.errors.push(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    if result.value.low_stock > result.value.stock {
        result.errors.push(ValidationError::LowStockAboveStock {
            low_stock: result.value.low_stock,
            stock: result.value.stock,
        });
        result.value.low_stock = result.value.stock;
        result.warnings.push(ValidationWarning::LowStockAdjusted {
            stock: result.value.stock,
        });
    }

    if !result.value.price.is_positive() {
        result.errors.push(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    if candidate.price > PRICE_MAX as f64 {
        result.warnings.push(ValidationWarning::Clamped {
            field: "price".to_string(),
            max: PRICE_MAX,
        });
    }
    if candidate.stock > STOCK_MAX as f64 {
        result.warnings.push(ValidationWarning::Clamped {
            field: "stock".to_string(),
            max: STOCK_MAX as i64,
        });
    }
    if candidate.low_stock > LOW_STOCK_MAX as f64 {
        result.warnings.push(ValidationWarning::Clamped {
            field: "lowStock".to_string(),
            max: LOW_STOCK_MAX as i64,
        });
    }

    let lowered = name.to_lowercase();
    let duplicate = existing.iter().any(|p| {
        candidate.id.as_deref() != Some(p.id.as_str()) && p.name.trim().to_lowercase() == lowered
    });
    if duplicate && !name.is_empty() {
        result.warnings.push(ValidationWarning::Duplicate {
            field: "product name".to_string(),
            value: name,
        });
    }

    result
}

fn clamp_hour_warnings(
    start: Option<u8>,
    end: Option<u8>,
    warnings: &mut Vec<ValidationWarning>,
) {
    for (field, hour) in [("happyHourStart", start), ("happyHourEnd", end)] {
        if hour.is_some_and(|h| h > LAST_HOUR) {
            warnings.push(ValidationWarning::Clamped {
                field: field.to_string(),
                max: LAST_HOUR as i64,
            });
        }
    }
}

/// Sanitizes a patch that is applied to several products at once.
///
/// Ceilings are clamped as in [`validate_product`]. A price of zero and an
/// empty name are errors. Rules that depend on the product it lands on (low
/// stock against stock) are left to a per-product check.
pub fn validate_patch(patch: &ProductPatch) -> Validated<ProductPatch> {
    let mut result = Validated::new(patch.clone());
    let value = &mut result.value;

    if let Some(name) = &mut value.name {
        *name = name.trim().to_string();
        if name.is_empty() {
            result.errors.push(ValidationError::Required {
                field: "name".to_string(),
            });
        } else if name.chars().count() > MAX_PRODUCT_NAME_LEN {
            result.errors.push(ValidationError::TooLong {
                field: "name".to_string(),
                max: MAX_PRODUCT_NAME_LEN,
            });
        }
    }

    if let Some(price) = value.price {
        if !price.is_positive() {
            result.errors.push(ValidationError::MustBePositive {
                field: "price".to_string(),
            });
        } else if price.units() > PRICE_MAX {
            value.price = Some(Money::from_units(PRICE_MAX));
            result.warnings.push(ValidationWarning::Clamped {
                field: "price".to_string(),
                max: PRICE_MAX,
            });
        }
    }

    if value.stock.is_some_and(|s| s > STOCK_MAX) {
        value.stock = Some(STOCK_MAX);
        result.warnings.push(ValidationWarning::Clamped {
            field: "stock".to_string(),
            max: STOCK_MAX as i64,
        });
    }
    if value.low_stock.is_some_and(|l| l > LOW_STOCK_MAX) {
        value.low_stock = Some(LOW_STOCK_MAX);
        result.warnings.push(ValidationWarning::Clamped {
            field: "lowStock".to_string(),
            max: LOW_STOCK_MAX as i64,
        });
    }

    clamp_hour_warnings(
        value.happy_hour_start,
        value.happy_hour_end,
        &mut result.warnings,
    );
    value.happy_hour_start = value.happy_hour_start.map(|h| h.min(LAST_HOUR));
    value.happy_hour_end = value.happy_hour_end.map(|h| h.min(LAST_HOUR));

    result
}

// =============================================================================
// Order Item Validation
// =============================================================================

/// Raw quantity/price input for a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDraft {
    pub qty: f64,
    pub price: f64,
}

/// A sanitized quantity/price pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub qty: u32,
    pub price: Money,
}

/// Validates a line: quantity clamped into `[1, 999]`, price into
/// `[0, 999,999]`.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Waiter types "1500" units of Empanada                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_order_item ← THIS FUNCTION                                   │
/// │       │                                                                 │
/// │       ├── qty clamped to 999 + warning                                 │
/// │       │                                                                 │
/// │       └── 999 × AddItem (each reserves exactly one unit)               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_order_item(candidate: &OrderItemDraft) -> Validated<OrderLine> {
    let qty = sanitize_number(candidate.qty, 1.0, MAX_ITEM_QUANTITY as f64, 0) as u32;
    let price = sanitize_number(candidate.price, 0.0, PRICE_MAX as f64, 0) as i64;

    let mut result = Validated::new(OrderLine {
        qty,
        price: Money::from_units(price),
    });

    if candidate.qty > MAX_ITEM_QUANTITY as f64 {
        result.warnings.push(ValidationWarning::Clamped {
            field: "quantity".to_string(),
            max: MAX_ITEM_QUANTITY as i64,
        });
    }

    if result.value.qty == 0 {
        result.errors.push(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    result
}

// =============================================================================
// Table Name Validation
// =============================================================================

/// Validates a table/tab label.
///
/// ## Rules
/// - trimmed; must not be empty and at most 50 characters
/// - case-insensitive duplicate: error when duplicates are disallowed,
///   warning when they are allowed
///
/// ## Example
/// ```rust
/// use bartab_core::validation::validate_table_name;
///
/// let taken = ["Mesa 1", "Barra"];
/// assert!(validate_table_name("  Mesa 2 ", taken, false).is_valid());
///
/// let dup = validate_table_name("mesa 1", taken, true);
/// assert!(dup.is_valid());
/// assert_eq!(dup.warnings.len(), 1);
///
/// assert!(!validate_table_name("mesa 1", taken, false).is_valid());
/// ```
pub fn validate_table_name<'a, I>(
    name: &str,
    existing: I,
    allow_duplicates: bool,
) -> Validated<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let sanitized = name.trim().to_string();
    let mut result = Validated::new(sanitized.clone());

    if sanitized.is_empty() {
        result.errors.push(ValidationError::Required {
            field: "table name".to_string(),
        });
        return result;
    }

    if sanitized.chars().count() > MAX_TABLE_NAME_LEN {
        result.errors.push(ValidationError::TooLong {
            field: "table name".to_string(),
            max: MAX_TABLE_NAME_LEN,
        });
    }

    let lowered = sanitized.to_lowercase();
    if existing
        .into_iter()
        .any(|n| n.trim().to_lowercase() == lowered)
    {
        if allow_duplicates {
            result.warnings.push(ValidationWarning::Duplicate {
                field: "table name".to_string(),
                value: sanitized,
            });
        } else {
            result.errors.push(ValidationError::Duplicate {
                field: "table name".to_string(),
                value: sanitized,
            });
        }
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
