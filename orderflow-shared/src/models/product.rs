use serde::{Deserialize, Serialize};

use crate::ProductId;

/// Catalog view of a product: authoritative price and stock on hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub available_quantity: i32,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: f64, available_quantity: i32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            available_quantity,
        }
    }

    pub fn has_stock_for(&self, quantity: i64) -> bool {
        i64::from(self.available_quantity) >= quantity
    }
}
