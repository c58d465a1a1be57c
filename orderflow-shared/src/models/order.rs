use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DeliveryId, OrderId, ProductId, UserId};

/// Order status.
///
/// Only `pending` is owned here; every later state belongs to the delivery
/// provider's lifecycle and is carried through as the provider spells it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    External(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::External(status) => status,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        if value == "pending" {
            OrderStatus::Pending
        } else {
            OrderStatus::External(value)
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        OrderStatus::from(value.to_string())
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Pending => "pending".to_string(),
            OrderStatus::External(status) => status,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields handed to the order store; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn pending(user_id: UserId, total_price: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            status: OrderStatus::Pending,
            total_price,
            created_at,
        }
    }

    /// Materialize the stored order once the store has picked an id
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            status: self.status,
            total_price: self.total_price,
            created_at: self.created_at,
            delivery_id: None,
        }
    }
}

/// A persisted customer order.
///
/// Everything except `delivery_id` is fixed at creation; the delivery id is
/// written once, after the delivery provider accepted the shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub delivery_id: Option<DeliveryId>,
}

impl Order {
    /// Set the delivery id. Returns `false` if a different id is already attached.
    pub fn attach_delivery(&mut self, delivery_id: &str) -> bool {
        match &self.delivery_id {
            Some(existing) => existing == delivery_id,
            None => {
                self.delivery_id = Some(delivery_id.to_string());
                true
            }
        }
    }

    pub fn has_delivery(&self) -> bool {
        self.delivery_id.is_some()
    }
}

/// One persisted line of an order.
///
/// `line_no` is the 0-based position of the line in the cart it came from;
/// `(order_id, line_no)` identifies the line so a repeated write can be ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub line_no: i32,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}
