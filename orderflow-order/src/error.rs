use std::fmt;

use orderflow_shared::{OrderId, ProductId};

use crate::resilience::IsTransient;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// External system a workflow step talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    ProductCatalog,
    OrderStore,
    DeliveryGateway,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collaborator::ProductCatalog => "product catalog",
            Collaborator::OrderStore => "order store",
            Collaborator::DeliveryGateway => "delivery gateway",
        };
        f.write_str(name)
    }
}

/// Step that was still outstanding when an order creation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncompleteStage {
    /// Some line items are missing
    Items,
    /// All items stored, delivery not registered or not recorded
    Delivery,
}

impl fmt::Display for IncompleteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompleteStage::Items => f.write_str("order items"),
            IncompleteStage::Delivery => f.write_str("delivery registration"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid order request: {0}")]
    InvalidRequest(String),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i32,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("No delivery registered for order {0}")]
    DeliveryNotRegistered(OrderId),

    /// Nothing was left behind by the failed call; safe to retry from scratch.
    #[error("{collaborator} unavailable: {source}")]
    CollaboratorUnavailable {
        collaborator: Collaborator,
        #[source]
        source: BoxError,
    },

    /// The collaborator answered with a definite refusal; repeating the call
    /// will not help.
    #[error("{collaborator} rejected the call: {source}")]
    CollaboratorRejected {
        collaborator: Collaborator,
        #[source]
        source: BoxError,
    },

    /// Catalog prices of the lines still to be stored no longer add up to
    /// the order total.
    #[error("Prices changed since order {order_id} was placed: total {order_total}, now {repriced_total}")]
    PriceChanged {
        order_id: OrderId,
        order_total: f64,
        repriced_total: f64,
    },

    /// The order exists but is still pending without a delivery; resume it by id.
    #[error("Order {order_id} stored but {stage} did not complete: {source}")]
    Incomplete {
        order_id: OrderId,
        stage: IncompleteStage,
        #[source]
        source: BoxError,
    },
}

impl OrderError {
    /// `CollaboratorUnavailable` for outages, `CollaboratorRejected` otherwise
    pub fn from_collaborator(collaborator: Collaborator, source: BoxError) -> Self {
        if source.is_transient() {
            OrderError::CollaboratorUnavailable { collaborator, source }
        } else {
            OrderError::CollaboratorRejected { collaborator, source }
        }
    }

    pub fn incomplete(order_id: OrderId, stage: IncompleteStage, source: BoxError) -> Self {
        OrderError::Incomplete { order_id, stage, source }
    }

    /// True when the same call may succeed if repeated
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OrderError::CollaboratorUnavailable { .. } | OrderError::Incomplete { .. }
        )
    }

    /// Pending order left behind by a partially successful creation
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            OrderError::Incomplete { order_id, .. } | OrderError::PriceChanged { order_id, .. } => {
                Some(*order_id)
            }
            _ => None,
        }
    }
}
