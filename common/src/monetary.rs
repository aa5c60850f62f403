//! Monetary types for OrderDesk.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OrderError;

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Get the canonical number of fractional digits shown for this currency.
    ///
    /// Only JPY deviates from the two-digit default.
    pub fn decimal_places(&self) -> u32 {
        match self.0.as_str() {
            "PLN" | "USD" | "EUR" | "GBP" => 2,
            "JPY" => 0,
            _ => 2,
        }
    }

    /// Round an amount to this currency's canonical precision.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.decimal_places())
    }

    /// Common currencies
    pub fn pln() -> Self {
        Self::new("PLN")
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Currencies an order may be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderCurrency {
    #[serde(rename = "PLN")]
    Pln,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
}

impl OrderCurrency {
    pub const ALL: [OrderCurrency; 4] = [
        OrderCurrency::Pln,
        OrderCurrency::Usd,
        OrderCurrency::Eur,
        OrderCurrency::Gbp,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            OrderCurrency::Pln => "PLN",
            OrderCurrency::Usd => "USD",
            OrderCurrency::Eur => "EUR",
            OrderCurrency::Gbp => "GBP",
        }
    }

    /// The general currency code for rate lookups.
    pub fn currency(&self) -> Currency {
        Currency::new(self.code())
    }
}

impl fmt::Display for OrderCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrderCurrency {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderCurrency::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or_else(|| OrderError::UnsupportedCurrency(s.to_string()))
    }
}
