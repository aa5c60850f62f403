//! Order records and their lifecycle status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{OrderError, Result};
use crate::monetary::OrderCurrency;

/// Maximum length of a customer name.
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;

/// Maximum fractional digits of an order total.
pub const MAX_AMOUNT_DECIMALS: u32 = 2;

/// Unique identifier for an order, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Order placed, not yet processed.
    #[default]
    Pending,
    /// Order being prepared.
    InProgress,
    /// Order handed to the carrier.
    Shipped,
    /// Order received by the customer.
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in-progress",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

/// A purchase order.
///
/// `total_amount` is held in the home currency; `currency` is the currency the
/// customer wants the total displayed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: OrderCurrency,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new pending order from a validated request.
    pub fn new(id: OrderId, request: NewOrder) -> Self {
        let now = Utc::now();
        Self {
            id,
            customer_name: request.customer_name.trim().to_string(),
            total_amount: request.total_amount,
            currency: request.currency,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the order to a new status.
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Request to create an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: OrderCurrency,
}

impl NewOrder {
    /// Check field constraints before the order is stored.
    pub fn validate(&self) -> Result<()> {
        let name = self.customer_name.trim();
        if name.is_empty() {
            return Err(OrderError::InvalidCustomerName(
                "customer name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
            return Err(OrderError::InvalidCustomerName(format!(
                "customer name cannot exceed {} characters",
                MAX_CUSTOMER_NAME_LEN
            )));
        }

        if self.total_amount <= Decimal::ZERO {
            return Err(OrderError::InvalidAmount(
                "total amount must be greater than zero".to_string(),
            ));
        }
        if self.total_amount.normalize().scale() > MAX_AMOUNT_DECIMALS {
            return Err(OrderError::InvalidAmount(format!(
                "total amount cannot have more than {} decimal places",
                MAX_AMOUNT_DECIMALS
            )));
        }

        Ok(())
    }
}

/// Request to change an order's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}
