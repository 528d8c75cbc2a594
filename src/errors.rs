use serde::Serialize;

/// Crate-wide error type for the reconciliation engine and its services.
///
/// Policy split (see DESIGN.md): pure computations clamp or guard instead of
/// failing; store transport failures propagate as `StoreError`; missing
/// records are handled leniently by the services and only surface here when a
/// caller explicitly requires the record to exist.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid status transition: {0}")]
    InvalidStatus(String),

    #[error("Inventory error: {0}")]
    InventoryError(String),

    #[error("Order error: {0}")]
    OrderError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// True for failures the caller may reasonably retry (transport-level).
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::StoreError(_) | ServiceError::EventError(_))
    }
}
