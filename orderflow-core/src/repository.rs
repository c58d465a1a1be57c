use async_trait::async_trait;
use orderflow_shared::{NewOrder, Order, OrderId, OrderItem, Product, ProductId};

use crate::CollaboratorResult;

/// Read access to the product catalog
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// `Ok(None)` when the catalog has no such product.
    async fn get_product(&self, id: ProductId) -> CollaboratorResult<Option<Product>>;
}

/// Durable storage for orders and their line items.
///
/// Implementations own their own concurrency control. Nothing here is
/// transactional across calls.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order and return it with its assigned id.
    async fn create_order(&self, order: &NewOrder) -> CollaboratorResult<Order>;

    /// Persist one line item. A second write for the same
    /// `(order_id, line_no)` must be accepted and ignored.
    async fn add_order_item(&self, item: &OrderItem) -> CollaboratorResult<()>;

    async fn get_order(&self, id: OrderId) -> CollaboratorResult<Option<Order>>;

    /// Line items of an order, ordered by `line_no`.
    async fn list_order_items(&self, order_id: OrderId) -> CollaboratorResult<Vec<OrderItem>>;

    /// Record the delivery id of an order. Re-attaching the same id is a
    /// no-op; attaching a different one fails.
    async fn attach_delivery(&self, order_id: OrderId, delivery_id: &str) -> CollaboratorResult<()>;
}
