use serde::{Deserialize, Serialize};

use crate::ProductId;

/// A caller's request to buy `quantity` units of one product at a claimed unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: f64,
}

impl CartItem {
    pub fn new(product_id: ProductId, quantity: i32, price: f64) -> Self {
        Self {
            product_id,
            quantity,
            price,
        }
    }

    /// Claimed price × quantity
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let item = CartItem::new(1, 3, 2.5);
        assert_eq!(item.line_total(), 7.5);
    }

    #[test]
    fn test_deserialize_from_request_shape() {
        let item: CartItem =
            serde_json::from_str(r#"{"product_id": 7, "quantity": 2, "price": 10.0}"#).unwrap();
        assert_eq!(item, CartItem::new(7, 2, 10.0));
    }
}
