//! Value objects for the order domain.

use common::ProductId;
use serde::{Deserialize, Serialize};

/// A line item owned by an order.
///
/// Items are held by value inside the order. Nothing points back at the
/// parent; use the order's index when an item must be addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog product.
    pub product_id: ProductId,

    /// Units ordered.
    pub quantity: u32,

    /// Free-text note for the kitchen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OrderItem {
    /// Creates an item without a note.
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            note: None,
        }
    }

    /// Attaches a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
