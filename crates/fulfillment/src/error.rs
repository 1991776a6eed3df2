//! Error taxonomy at the engine boundary.
//!
//! Every workflow returns exactly one [`FulfillmentError`]. Lower layers
//! (`DomainError`, `StockError`, `StoreError`) are mapped upward with `From`
//! conversions or, for stock failures, with the item/location codes attached.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use depot_core::DomainError;
use depot_inventory::StockError;

use crate::store::StoreError;

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

/// Stable, serializable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    StateConflict,
    InsufficientStock,
    InsufficientCapacity,
    ConcurrencyConflict,
    NotFound,
    Internal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FulfillmentError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("insufficient stock of {item}{}: available {available}, requested {requested}", at_location(.location))]
    InsufficientStock {
        item: String,
        location: Option<String>,
        available: i64,
        requested: i64,
    },

    #[error("insufficient capacity at {location}: available {available}, requested {requested}")]
    InsufficientCapacity {
        location: String,
        available: i64,
        requested: i64,
    },

    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn at_location(location: &Option<String>) -> String {
    location.as_ref().map(|l| format!(" at {l}")).unwrap_or_default()
}

/// Wire form of an error for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

impl FulfillmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FulfillmentError::Validation(_) => ErrorKind::Validation,
            FulfillmentError::StateConflict(_) => ErrorKind::StateConflict,
            FulfillmentError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            FulfillmentError::InsufficientCapacity { .. } => ErrorKind::InsufficientCapacity,
            FulfillmentError::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,
            FulfillmentError::NotFound(_) => ErrorKind::NotFound,
            FulfillmentError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only concurrency conflicts are worth re-running unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FulfillmentError::ConcurrencyConflict(_))
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        FulfillmentError::NotFound(what.into())
    }

    pub fn state_conflict(msg: impl Into<String>) -> Self {
        FulfillmentError::StateConflict(msg.into())
    }

    /// Attach item and location codes to a ledger/capacity failure.
    pub fn from_stock(err: StockError, item: &str, location: &str) -> Self {
        match err {
            StockError::InsufficientStock {
                available,
                requested,
            } => FulfillmentError::InsufficientStock {
                item: item.to_string(),
                location: Some(location.to_string()),
                available,
                requested,
            },
            StockError::InsufficientCapacity {
                available,
                requested,
            } => FulfillmentError::InsufficientCapacity {
                location: location.to_string(),
                available,
                requested,
            },
            other => FulfillmentError::Validation(format!("{item} at {location}: {other}")),
        }
    }
}

impl From<DomainError> for FulfillmentError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => FulfillmentError::Validation(msg),
            DomainError::NotFound(msg) => FulfillmentError::NotFound(msg),
            DomainError::InvariantViolation(msg) => FulfillmentError::StateConflict(msg),
            err @ DomainError::InvalidTransition { .. } => FulfillmentError::StateConflict(err.to_string()),
            DomainError::Conflict(msg) => FulfillmentError::ConcurrencyConflict(msg),
        }
    }
}

impl From<StoreError> for FulfillmentError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => FulfillmentError::ConcurrencyConflict(msg),
            StoreError::Unavailable(msg) => FulfillmentError::Internal(msg),
        }
    }
}
