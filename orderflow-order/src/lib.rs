pub mod error;
pub mod pricing;
pub mod resilience;
pub mod service;
pub mod delivery;

pub use delivery::InMemoryDeliveryGateway;
pub use error::{Collaborator, IncompleteStage, OrderError};
pub use pricing::PricedLine;
pub use resilience::RetryConfig;
pub use service::{OrderService, WorkflowSettings};
pub use orderflow_store::PricingPolicy;
