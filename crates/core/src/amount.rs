//! Amount - Non-negative, whole-unit token amount
//!
//! Token balances are always counted in integral base units (e.g. `ukava`).
//! Derived values (interest, rewards, keeper cuts) are truncated toward zero
//! before they become an `Amount`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount must be a whole number of base units: {0}")]
    FractionalAmount(Decimal),
}

/// A non-negative whole number of base units.
///
/// # Invariant
/// The inner value is always >= 0 and has no fractional part.
///
/// # Example
/// ```
/// use harbor_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
///
/// // Negative and fractional amounts are rejected
/// assert!(Amount::new(Decimal::new(-100, 0)).is_err());
/// assert!(Amount::new(Decimal::new(15, 1)).is_err());
///
/// // Derived values are truncated
/// assert_eq!(Amount::truncate(Decimal::new(15, 1)).unwrap(), Amount::from(1u64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Amount from a Decimal.
    ///
    /// Returns an error if the value is negative or fractional.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_zero() {
            Ok(Self::ZERO)
        } else if value.is_sign_negative() {
            Err(AmountError::NegativeAmount(value))
        } else if !value.fract().is_zero() {
            Err(AmountError::FractionalAmount(value))
        } else {
            Ok(Self(value.normalize()))
        }
    }

    /// Create an Amount by truncating a derived decimal toward zero.
    pub fn truncate(value: Decimal) -> Result<Self, AmountError> {
        Self::new(value.trunc())
    }

    /// Create an Amount without validation.
    ///
    /// # Safety
    /// The caller MUST ensure the value is a non-negative whole number.
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        let result = self.0.checked_sub(other.0)?;
        if result < Decimal::ZERO {
            None
        } else {
            Some(Amount(result))
        }
    }

    /// Subtraction clamped at zero
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        self.checked_sub(other).unwrap_or(Amount::ZERO)
    }

    /// Addition clamped at the largest representable value
    pub fn saturating_add(&self, other: &Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(Decimal::from(value))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100)).unwrap();
        assert_eq!(amount.value(), dec!(100));
    }

    #[test]
    fn test_amount_zero() {
        let amount = Amount::new(Decimal::ZERO).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn test_amount_negative_rejected() {
        let result = Amount::new(dec!(-100));
        assert!(matches!(result, Err(AmountError::NegativeAmount(_))));
    }

    #[test]
    fn test_amount_fraction_rejected() {
        let result = Amount::new(dec!(12.5));
        assert!(matches!(result, Err(AmountError::FractionalAmount(_))));
    }

    #[test]
    fn test_truncate_drops_fraction() {
        assert_eq!(Amount::truncate(dec!(99.999)).unwrap(), Amount::from(99));
        assert!(Amount::truncate(dec!(-0.5)).unwrap().is_zero());
    }

    #[test]
    fn test_checked_sub_prevents_negative() {
        let a = Amount::from(50);
        let b = Amount::from(100);
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(a.saturating_sub(&b), Amount::ZERO);
    }

    #[test]
    fn test_checked_sub_success() {
        let a = Amount::from(100);
        let b = Amount::from(30);
        assert_eq!(a.checked_sub(&b).unwrap(), Amount::from(70));
    }

    #[test]
    fn test_trailing_zero_scale_is_equal() {
        assert_eq!(Amount::new(dec!(100.00)).unwrap(), Amount::from(100));
    }

    #[test]
    fn test_serde_rejects_fraction() {
        let parsed: Result<Amount, _> = serde_json::from_str("\"1.5\"");
        assert!(parsed.is_err());
        let parsed: Amount = serde_json::from_str("\"15\"").unwrap();
        assert_eq!(parsed, Amount::from(15));
    }
}
