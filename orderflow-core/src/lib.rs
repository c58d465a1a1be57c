pub mod repository;
pub mod logistics;

pub use logistics::DeliveryGateway;
pub use repository::{OrderRepository, ProductRepository};

/// Result type of every collaborator call.
pub type CollaboratorResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Errors raised by the collaborators shipped in this workspace.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflicting write: {0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl CoreError {
    /// `NotFound` and `Conflict` are answers, not outages: asking again
    /// gives the same result.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Unavailable(_) | CoreError::Timeout(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
