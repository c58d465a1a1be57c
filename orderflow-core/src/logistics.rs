use async_trait::async_trait;
use orderflow_shared::{DeliveryId, OrderId};

use crate::CollaboratorResult;

/// Client of the external logistics provider
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Register a shipment for an order.
    ///
    /// Registering the same order twice must hand back the delivery id of the
    /// first registration, so a caller may retry after an ambiguous failure.
    async fn register_delivery(&self, order_id: OrderId, address: &str) -> CollaboratorResult<DeliveryId>;

    /// Current status of a delivery, in the provider's own vocabulary
    async fn get_delivery_status(&self, delivery_id: &str) -> CollaboratorResult<String>;
}
