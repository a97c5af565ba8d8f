//! # Actions
//!
//! The closed set of intents the engine understands.
//!
//! ## Wire Format
//! Actions are adjacently tagged, so a caller sends:
//! ```json
//! { "type": "addItem", "payload": { "orderId": "ord_1", "productId": "p_club" } }
//! ```
//!
//! ## Action Families
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Orders     createOrder addItem removeItem finalizeOrder cancelOrder    │
//! │             reopenOrder updateOrderNotes updateItemNotes                │
//! │  Transfers  transferOrder transferItems splitOrder                      │
//! │  Catalog    addProduct updateProduct deleteProduct restockLow           │
//! │             restockProduct bulkUpdateProducts applyHappyHour            │
//! │             removeHappyHour addCategory updateCategory deleteCategory   │
//! │  Admin      resetToSeed                                                 │
//! │  Internal   restoreSnapshot (never audited)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::state::AppState;
use crate::types::Percent;
use crate::validation::NewProduct;

/// Partial product update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub happy_hour_discount: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub happy_hour_start: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub happy_hour_end: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub happy_hour_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductPatch {
    /// Patch that overwrites every editable field with a validated product.
    pub fn from_new_product(product: NewProduct) -> Self {
        ProductPatch {
            name: Some(product.name),
            category_id: product.category_id,
            price: Some(product.price),
            stock: Some(product.stock),
            low_stock: Some(product.low_stock),
            happy_hour_discount: Some(product.happy_hour_discount),
            happy_hour_start: product.happy_hour_start,
            happy_hour_end: product.happy_hour_end,
            happy_hour_active: None,
            image: product.image,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }
}

/// Every state transition the engine can perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Action {
    // -- orders ---------------------------------------------------------------
    #[serde(rename_all = "camelCase")]
    CreateOrder { name: String },

    /// Adds exactly one unit of a product.
    #[serde(rename_all = "camelCase")]
    AddItem {
        order_id: String,
        product_id: String,
        #[serde(default)]
        notes: Option<String>,
        #[serde(default)]
        discount: Percent,
    },

    /// Removes exactly one unit of a line.
    #[serde(rename_all = "camelCase")]
    RemoveItem { order_id: String, item_id: String },

    #[serde(rename_all = "camelCase")]
    FinalizeOrder { order_id: String },

    #[serde(rename_all = "camelCase")]
    CancelOrder { order_id: String },

    #[serde(rename_all = "camelCase")]
    ReopenOrder { order_id: String },

    #[serde(rename_all = "camelCase")]
    UpdateOrderNotes { order_id: String, notes: String },

    #[serde(rename_all = "camelCase")]
    UpdateItemNotes {
        order_id: String,
        item_id: String,
        notes: String,
    },

    // -- transfers ------------------------------------------------------------
    #[serde(rename_all = "camelCase")]
    TransferOrder {
        from_order_id: String,
        to_order_id: String,
    },

    #[serde(rename_all = "camelCase")]
    TransferItems {
        from_order_id: String,
        to_order_id: String,
        item_ids: Vec<String>,
    },

    #[serde(rename_all = "camelCase")]
    SplitOrder {
        order_id: String,
        item_ids: Vec<String>,
        new_order_name: String,
    },

    // -- catalog --------------------------------------------------------------
    AddProduct { product: NewProduct },

    UpdateProduct { id: String, patch: ProductPatch },

    DeleteProduct { id: String },

    /// Adds twice the threshold to every product at or below it.
    RestockLow,

    RestockProduct { id: String, quantity: u32 },

    #[serde(rename_all = "camelCase")]
    BulkUpdateProducts {
        product_ids: Vec<String>,
        updates: ProductPatch,
    },

    #[serde(rename_all = "camelCase")]
    ApplyHappyHour {
        category_id: String,
        discount: Percent,
    },

    #[serde(rename_all = "camelCase")]
    RemoveHappyHour { category_id: String },

    AddCategory {
        name: String,
        #[serde(default)]
        description: String,
    },

    UpdateCategory {
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },

    DeleteCategory { id: String },

    // -- admin ----------------------------------------------------------------
    /// Replaces catalog and orders with the demo data. The audit trail stays.
    ResetToSeed,

    /// Replaces the whole state with a persisted snapshot.
    RestoreSnapshot(Box<AppState>),
}

impl Action {
    /// The wire name of the action, used as the audit `action` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::CreateOrder { .. } => "createOrder",
            Action::AddItem { .. } => "addItem",
            Action::RemoveItem { .. } => "removeItem",
            Action::FinalizeOrder { .. } => "finalizeOrder",
            Action::CancelOrder { .. } => "cancelOrder",
            Action::ReopenOrder { .. } => "reopenOrder",
            Action::UpdateOrderNotes { .. } => "updateOrderNotes",
            Action::UpdateItemNotes { .. } => "updateItemNotes",
            Action::TransferOrder { .. } => "transferOrder",
            Action::TransferItems { .. } => "transferItems",
            Action::SplitOrder { .. } => "splitOrder",
            Action::AddProduct { .. } => "addProduct",
            Action::UpdateProduct { .. } => "updateProduct",
            Action::DeleteProduct { .. } => "deleteProduct",
            Action::RestockLow => "restockLow",
            Action::RestockProduct { .. } => "restockProduct",
            Action::BulkUpdateProducts { .. } => "bulkUpdateProducts",
            Action::ApplyHappyHour { .. } => "applyHappyHour",
            Action::RemoveHappyHour { .. } => "removeHappyHour",
            Action::AddCategory { .. } => "addCategory",
            Action::UpdateCategory { .. } => "updateCategory",
            Action::DeleteCategory { .. } => "deleteCategory",
            Action::ResetToSeed => "resetToSeed",
            Action::RestoreSnapshot(_) => "restoreSnapshot",
        }
    }

    /// Bookkeeping actions are never written to the audit trail.
    pub fn is_internal(&self) -> bool {
        matches!(self, Action::RestoreSnapshot(_))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
