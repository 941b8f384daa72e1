//! Monetary amounts as returned by the Storefront API.
//!
//! Amounts are kept as decimal strings to preserve the precision the API
//! sends; arithmetic goes through [`rust_decimal`], never floats.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency_code: currency_code.into(),
        }
    }

    /// Parse the amount as a decimal. Returns `None` if the API sent a
    /// value that is not a valid decimal string.
    #[must_use]
    pub fn amount_decimal(&self) -> Option<Decimal> {
        self.amount.parse().ok()
    }

    /// Whether the amount is a valid, non-negative decimal.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.amount_decimal().is_some_and(|d| d >= Decimal::ZERO)
    }
}
