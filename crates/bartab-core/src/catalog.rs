//! # Catalog Administration
//!
//! Product and category maintenance, and category-wide happy hours.
//!
//! Inputs reaching these handlers are already validated (see
//! [`crate::validation`]); they only check that referenced ids exist.

use tracing::debug;

use crate::action::ProductPatch;
use crate::engine::Context;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::state::AppState;
use crate::types::{generate_id, Category, Notification, Percent, Product};
use crate::validation::NewProduct;

/// Overwrites the fields set in `patch`.
pub fn apply_patch(product: &mut Product, patch: &ProductPatch) {
    if let Some(name) = &patch.name {
        product.name = name.clone();
    }
    if let Some(category_id) = &patch.category_id {
        product.category_id = Some(category_id.clone());
    }
    if let Some(price) = patch.price {
        product.price = price;
    }
    if let Some(stock) = patch.stock {
        product.stock = stock;
    }
    if let Some(low_stock) = patch.low_stock {
        product.low_stock = low_stock;
    }
    if let Some(discount) = patch.happy_hour_discount {
        product.happy_hour_discount = discount;
    }
    if let Some(start) = patch.happy_hour_start {
        product.happy_hour_start = Some(start);
    }
    if let Some(end) = patch.happy_hour_end {
        product.happy_hour_end = Some(end);
    }
    if let Some(active) = patch.happy_hour_active {
        product.happy_hour_active = active;
    }
    if let Some(image) = &patch.image {
        product.image = Some(image.clone());
    }
}

fn require_category(state: &AppState, id: &str) -> CoreResult<()> {
    state
        .category(id)
        .map(|_| ())
        .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))
}

// =============================================================================
// Products
// =============================================================================

/// Adds a product at the front of the catalog with a fresh id.
pub fn add_product(state: &mut AppState, product: &NewProduct) -> CoreResult<Vec<Notification>> {
    if let Some(category_id) = &product.category_id {
        require_category(state, category_id)?;
    }

    let product = Product {
        id: generate_id("p"),
        name: product.name.clone(),
        category_id: product.category_id.clone(),
        price: product.price,
        stock: product.stock,
        low_stock: product.low_stock,
        happy_hour_discount: product.happy_hour_discount,
        happy_hour_start: product.happy_hour_start,
        happy_hour_end: product.happy_hour_end,
        happy_hour_active: false,
        image: product.image.clone(),
    };
    debug!(product_id = %product.id, name = %product.name, "Product added");
    state.products.insert(0, product);
    Ok(Vec::new())
}

pub fn update_product(
    state: &mut AppState,
    id: &str,
    patch: &ProductPatch,
) -> CoreResult<Vec<Notification>> {
    if let Some(category_id) = &patch.category_id {
        require_category(state, category_id)?;
    }
    let product = state
        .product_mut(id)
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
    apply_patch(product, patch);
    Ok(Vec::new())
}

/// Removes a product. Lines that still reference it keep their frozen
/// price; releasing them later is a no-op.
pub fn delete_product(state: &mut AppState, id: &str) -> CoreResult<Vec<Notification>> {
    let before = state.products.len();
    state.products.retain(|p| p.id != id);
    if state.products.len() == before {
        return Err(CoreError::ProductNotFound(id.to_string()));
    }
    Ok(Vec::new())
}

// =============================================================================
// Happy Hour
// =============================================================================

/// Sets the happy-hour discount on every product of a category and marks it
/// active.
pub fn apply_happy_hour(
    state: &mut AppState,
    category_id: &str,
    discount: Percent,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    require_category(state, category_id)?;
    for product in state
        .products
        .iter_mut()
        .filter(|p| p.category_id.as_deref() == Some(category_id))
    {
        product.happy_hour_discount = discount;
        product.happy_hour_active = true;
    }
    Ok(vec![Notification::ok(
        format!("Happy hour applied: {} off", discount),
        ctx.now,
    )])
}

pub fn remove_happy_hour(
    state: &mut AppState,
    category_id: &str,
    ctx: &Context,
) -> CoreResult<Vec<Notification>> {
    require_category(state, category_id)?;
    for product in state
        .products
        .iter_mut()
        .filter(|p| p.category_id.as_deref() == Some(category_id))
    {
        product.happy_hour_discount = Percent::zero();
        product.happy_hour_active = false;
    }
    Ok(vec![Notification::ok("Happy hour removed", ctx.now)])
}

// =============================================================================
// Categories
// =============================================================================

pub fn add_category(
    state: &mut AppState,
    name: &str,
    description: &str,
) -> CoreResult<Vec<Notification>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "category name".to_string(),
        }
        .into());
    }
    state.categories.push(Category {
        id: generate_id("c"),
        name: name.to_string(),
        description: description.to_string(),
    });
    Ok(Vec::new())
}

pub fn update_category(
    state: &mut AppState,
    id: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> CoreResult<Vec<Notification>> {
    let category = state
        .categories
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        category.name = name.to_string();
    }
    if let Some(description) = description {
        category.description = description.to_string();
    }
    Ok(Vec::new())
}

/// Deletes a category. Its products stay in the catalog, uncategorized.
pub fn delete_category(state: &mut AppState, id: &str) -> CoreResult<Vec<Notification>> {
    require_category(state, id)?;
    state.categories.retain(|c| c.id != id);

    let mut detached = 0;
    for product in state
        .products
        .iter_mut()
        .filter(|p| p.category_id.as_deref() == Some(id))
    {
        product.category_id = None;
        detached += 1;
    }
    debug!(category_id = id, detached, "Category deleted");
    Ok(Vec::new())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::seed::demo_state;
    use chrono::Utc;

    fn new_product(name: &str, category: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category_id: category.map(String::from),
            price: Money::from_units(7000),
            stock: 12,
            low_stock: 3,
            happy_hour_discount: Percent::zero(),
            happy_hour_start: None,
            happy_hour_end: None,
            image: None,
        }
    }

    #[test]
    fn test_add_product_prepends_with_fresh_id() {
        let mut state = demo_state(Utc::now());
        add_product(&mut state, &new_product("Mojito", Some("c_beb"))).unwrap();

        let first = &state.products[0];
        assert_eq!(first.name, "Mojito");
        assert!(first.id.starts_with("p_"));
        assert_eq!(state.products.len(), 9);
    }

    #[test]
    fn test_add_product_unknown_category() {
        let mut state = demo_state(Utc::now());
        let result = add_product(&mut state, &new_product("Mojito", Some("c_zzz")));
        assert!(matches!(result, Err(CoreError::CategoryNotFound(_))));
    }

    #[test]
    fn test_update_and_delete_product() {
        let mut state = demo_state(Utc::now());
        let patch = ProductPatch {
            price: Some(Money::from_units(6500)),
            ..Default::default()
        };
        update_product(&mut state, "p_poker", &patch).unwrap();
        assert_eq!(state.product("p_poker").unwrap().price.units(), 6500);
        assert_eq!(state.product("p_poker").unwrap().stock, 24);

        delete_product(&mut state, "p_poker").unwrap();
        assert!(state.product("p_poker").is_none());
        assert!(delete_product(&mut state, "p_poker").is_err());
    }

    #[test]
    fn test_happy_hour_toggles_whole_category() {
        let mut state = demo_state(Utc::now());
        let ctx = Context::new(Utc::now(), 12);

        apply_happy_hour(&mut state, "c_com", Percent::new(30), &ctx).unwrap();
        for id in ["p_emp", "p_sal", "p_per"] {
            let p = state.product(id).unwrap();
            assert_eq!(p.happy_hour_discount.value(), 30);
            assert!(p.happy_hour_active);
        }
        assert!(!state.product("p_club").unwrap().happy_hour_active);

        let notes = remove_happy_hour(&mut state, "c_com", &ctx).unwrap();
        assert_eq!(notes[0].message, "Happy hour removed");
        let empanada = state.product("p_emp").unwrap();
        assert!(empanada.happy_hour_discount.is_zero());
    }

    #[test]
    fn test_delete_category_detaches_products() {
        let mut state = demo_state(Utc::now());
        delete_category(&mut state, "c_otr").unwrap();

        assert!(state.category("c_otr").is_none());
        let hielo = state.product("p_hielo").unwrap();
        assert_eq!(hielo.category_id, None);
        assert_eq!(state.products.len(), 8);
    }

    #[test]
    fn test_category_crud() {
        let mut state = demo_state(Utc::now());
        add_category(&mut state, " Cocteles ", "").unwrap();
        let id = state.categories.last().unwrap().id.clone();
        assert_eq!(state.categories.last().unwrap().name, "Cocteles");

        update_category(&mut state, &id, Some("Cócteles"), Some("Tragos")).unwrap();
        let cat = state.category(&id).unwrap();
        assert_eq!(cat.name, "Cócteles");
        assert_eq!(cat.description, "Tragos");

        assert!(add_category(&mut state, "  ", "").is_err());
        assert!(update_category(&mut state, "c_zzz", None, None).is_err());
    }
}
