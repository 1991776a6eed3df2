use thiserror::Error;

/// Stock and capacity precondition failures.
///
/// Location/item naming is added by the caller, which knows the codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("quantity must be positive (got {quantity})")]
    InvalidQuantity { quantity: i64 },

    #[error("unit cost cannot be negative")]
    NegativeCost,

    #[error("insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("insufficient capacity: available {available}, requested {requested}")]
    InsufficientCapacity { available: i64, requested: i64 },

    #[error("invalid stock status change: {0}")]
    InvalidStatus(String),
}
