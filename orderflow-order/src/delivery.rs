use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderflow_core::{CollaboratorResult, CoreError, CoreResult, DeliveryGateway};
use orderflow_shared::{DeliveryId, OrderId};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Status reported for a freshly registered delivery
pub const REGISTERED: &str = "registered";

#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub order_id: OrderId,
    pub address: String,
    pub status: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Default)]
struct DeliveryBook {
    sequence: u64,
    by_order: HashMap<OrderId, DeliveryId>,
    records: HashMap<DeliveryId, DeliveryRecord>,
}

/// Stand-in for the logistics provider.
///
/// Registration is keyed by order id: registering an order again returns the
/// delivery it already has.
#[derive(Default)]
pub struct InMemoryDeliveryGateway {
    book: RwLock<DeliveryBook>,
}

impl InMemoryDeliveryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a delivery to a new provider status (e.g. `in_transit`)
    pub async fn update_status(&self, delivery_id: &str, status: &str) -> CoreResult<()> {
        let mut book = self.book.write().await;
        let record = book
            .records
            .get_mut(delivery_id)
            .ok_or_else(|| CoreError::NotFound(format!("delivery {}", delivery_id)))?;
        record.status = status.to_string();
        Ok(())
    }

    pub async fn delivery(&self, delivery_id: &str) -> Option<DeliveryRecord> {
        self.book.read().await.records.get(delivery_id).cloned()
    }

    pub async fn delivery_for_order(&self, order_id: OrderId) -> Option<DeliveryId> {
        self.book.read().await.by_order.get(&order_id).cloned()
    }

    /// Number of distinct deliveries registered
    pub async fn registrations(&self) -> usize {
        self.book.read().await.records.len()
    }
}

#[async_trait]
impl DeliveryGateway for InMemoryDeliveryGateway {
    async fn register_delivery(&self, order_id: OrderId, address: &str) -> CollaboratorResult<DeliveryId> {
        let mut book = self.book.write().await;
        if let Some(existing) = book.by_order.get(&order_id) {
            return Ok(existing.clone());
        }

        book.sequence += 1;
        // Format: DLV-{sequence}
        let delivery_id = format!("DLV-{:06}", book.sequence);
        book.by_order.insert(order_id, delivery_id.clone());
        book.records.insert(
            delivery_id.clone(),
            DeliveryRecord {
                order_id,
                address: address.to_string(),
                status: REGISTERED.to_string(),
                registered_at: Utc::now(),
            },
        );

        info!(order_id, delivery_id = %delivery_id, "Delivery registered");
        Ok(delivery_id)
    }

    async fn get_delivery_status(&self, delivery_id: &str) -> CollaboratorResult<String> {
        let book = self.book.read().await;
        match book.records.get(delivery_id) {
            Some(record) => Ok(record.status.clone()),
            None => Err(CoreError::NotFound(format!("delivery {}", delivery_id)).into()),
        }
    }
}
