pub mod models;

pub use models::cart::CartItem;
pub use models::order::{NewOrder, Order, OrderItem, OrderStatus};
pub use models::product::Product;

/// Identifier of the customer placing an order.
pub type UserId = i64;
/// Identifier assigned by the order store.
pub type OrderId = i64;
pub type ProductId = i64;
/// Opaque handle issued by the delivery gateway.
pub type DeliveryId = String;
