//! Error types for order records.

use thiserror::Error;

use crate::OrderId;

/// Errors raised while validating or looking up orders.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Customer name is empty or too long.
    #[error("Invalid customer name: {0}")]
    InvalidCustomerName(String),

    /// Order amount is not a positive value with at most two decimals.
    #[error("Invalid total amount: {0}")]
    InvalidAmount(String),

    /// Currency is not one orders can be placed in.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Unknown order status.
    #[error("Invalid status provided: {0}")]
    InvalidStatus(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Order records could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;
