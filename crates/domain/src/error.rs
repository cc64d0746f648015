//! Domain error types.

use common::{CustomerId, StatusId};
use row_store::StoreError;
use thiserror::Error;

/// Input that the domain refuses before touching the row source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The requested status is at or above the first status reserved for fulfilment.
    #[error("Cannot change status to a value of {first_forbidden} or higher")]
    InvalidTransition {
        target: StatusId,
        first_forbidden: StatusId,
    },

    /// A required field was missing or blank.
    #[error("{message}")]
    MissingField { field: &'static str, message: String },

    /// A field was present but refers to something unusable.
    #[error("{message}")]
    InvalidField { field: &'static str, message: String },
}

impl ValidationError {
    /// The input field the error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::InvalidTransition { .. } => Some("status_id"),
            ValidationError::MissingField { field, .. }
            | ValidationError::InvalidField { field, .. } => Some(field),
        }
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The addressed entity does not exist, or the request addressed it inconsistently.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A write found its target changed underneath it, and the target still exists.
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(StoreError),

    /// A cascading delete failed; nothing was removed.
    #[error("Unable to delete customer {customer_id}: {source}")]
    Deletion {
        customer_id: CustomerId,
        source: StoreError,
    },

    #[error("Persistence error: {0}")]
    Persistence(StoreError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        if e.is_concurrency_conflict() {
            DomainError::ConcurrencyConflict(e)
        } else {
            DomainError::Persistence(e)
        }
    }
}
