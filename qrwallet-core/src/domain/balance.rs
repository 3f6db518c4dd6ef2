//! Wallet balance domain model

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::result::{Error, Result};

/// Spendable funds of the signed-in student. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct WalletBalance(Decimal);

impl WalletBalance {
    pub const ZERO: WalletBalance = WalletBalance(Decimal::ZERO);

    /// Create a balance, rejecting negative amounts
    pub fn new(amount: Decimal) -> Result<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(Error::validation(format!(
                "wallet balance cannot be negative: {}",
                amount
            )));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Read the `data` field of a balance response.
    ///
    /// The backend returns either a JSON number or a numeric string. Anything
    /// else (null, objects, negative amounts) is not a trusted balance.
    pub fn from_api_value(value: &JsonValue) -> Option<Self> {
        let amount = match value {
            JsonValue::Number(n) => Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()))
                .ok()?,
            JsonValue::String(s) => Decimal::from_str(s.trim()).ok()?,
            _ => return None,
        };
        Self::new(amount).ok()
    }

    /// Parse a cached balance; unreadable values load as zero
    pub fn parse_cached(raw: &str) -> Self {
        Decimal::from_str(raw.trim())
            .ok()
            .and_then(|d| Self::new(d).ok())
            .unwrap_or_default()
    }

    /// Balance after paying `price`, or None if funds are insufficient
    pub fn checked_debit(&self, price: Decimal) -> Option<Self> {
        if price.is_sign_negative() || price > self.0 {
            return None;
        }
        Some(Self(self.0 - price))
    }
}

impl TryFrom<Decimal> for WalletBalance {
    type Error = Error;

    fn try_from(amount: Decimal) -> Result<Self> {
        Self::new(amount)
    }
}

impl From<WalletBalance> for Decimal {
    fn from(balance: WalletBalance) -> Self {
        balance.0
    }
}

impl fmt::Display for WalletBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
