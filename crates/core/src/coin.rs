//! Coin and Coins - denominated amounts
//!
//! `Coins` is kept sorted by denom with no zero entries, so two bags holding
//! the same balances always compare equal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::amount::{Amount, AmountError};
use crate::unique::UniqueMap;

/// Errors that can occur when building coins
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("Empty denom")]
    EmptyDenom,

    #[error("Invalid denom (3-128 chars, must start with a letter): {0}")]
    InvalidDenom(String),

    #[error("Duplicate denom: {0}")]
    DuplicateDenom(String),

    #[error("Invalid amount for {denom}: {source}")]
    InvalidAmount {
        denom: String,
        #[source]
        source: AmountError,
    },
}

/// Validate a denomination string.
///
/// Denoms are 3-128 characters, start with a letter and may contain
/// letters, digits and `/ : . _ -`.
pub fn validate_denom(denom: &str) -> Result<(), CoinError> {
    if denom.is_empty() {
        return Err(CoinError::EmptyDenom);
    }
    let mut chars = denom.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = denom
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
    if !(3..=128).contains(&denom.len()) || !starts_with_letter || !valid_chars {
        return Err(CoinError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

/// A single denominated amount
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

impl Coin {
    /// Create a coin from a denom and an amount
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Create a coin from a denom and a number of base units
    pub fn from_units(denom: impl Into<String>, units: u64) -> Self {
        Self::new(denom, Amount::from(units))
    }

    /// Create a coin from a decimal, validating denom and amount
    pub fn parse(denom: impl Into<String>, amount: Decimal) -> Result<Self, CoinError> {
        let denom = denom.into();
        validate_denom(&denom)?;
        let amount = Amount::new(amount).map_err(|source| CoinError::InvalidAmount {
            denom: denom.clone(),
            source,
        })?;
        Ok(Self { denom, amount })
    }

    /// Check the denom is well formed
    pub fn validate(&self) -> Result<(), CoinError> {
        validate_denom(&self.denom)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A sorted, de-duplicated bag of positive coin amounts.
///
/// # Example
/// ```
/// use harbor_core::{Coin, Coins};
///
/// let bag = Coins::from_coins([
///     Coin::from_units("usdx", 5),
///     Coin::from_units("ukava", 10),
///     Coin::from_units("usdx", 5),
/// ]);
/// assert_eq!(bag.to_string(), "10ukava,10usdx");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "UniqueMap<String, Amount>", into = "BTreeMap<String, Amount>")]
pub struct Coins(BTreeMap<String, Amount>);

impl Coins {
    /// An empty bag
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a bag from coins, summing repeated denoms and dropping zeros
    pub fn from_coins(coins: impl IntoIterator<Item = Coin>) -> Self {
        let mut bag = Self::empty();
        for coin in coins {
            bag.add_coin(&coin);
        }
        bag
    }

    /// Build a bag from coins, rejecting invalid and repeated denoms
    pub fn try_from_coins(coins: impl IntoIterator<Item = Coin>) -> Result<Self, CoinError> {
        let mut bag = Self::empty();
        let mut seen = std::collections::BTreeSet::new();
        for coin in coins {
            coin.validate()?;
            if !seen.insert(coin.denom.clone()) {
                return Err(CoinError::DuplicateDenom(coin.denom));
            }
            bag.add_coin(&coin);
        }
        Ok(bag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Amount held of `denom` (zero when absent)
    pub fn amount_of(&self, denom: &str) -> Amount {
        self.0.get(denom).copied().unwrap_or(Amount::ZERO)
    }

    /// Whether `denom` is held with a positive amount
    pub fn contains(&self, denom: &str) -> bool {
        self.0.contains_key(denom)
    }

    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> {
        self.0.iter().map(|(denom, amount)| (denom.as_str(), *amount))
    }

    /// The bag as a list of coins in denom order
    pub fn to_vec(&self) -> Vec<Coin> {
        self.iter().map(|(denom, amount)| Coin::new(denom, amount)).collect()
    }

    /// Set the amount of `denom`, removing the entry when zero
    pub fn set(&mut self, denom: &str, amount: Amount) {
        if amount.is_zero() {
            self.0.remove(denom);
        } else {
            self.0.insert(denom.to_string(), amount);
        }
    }

    pub fn add_coin(&mut self, coin: &Coin) {
        let total = self.amount_of(&coin.denom).saturating_add(&coin.amount);
        self.set(&coin.denom, total);
    }

    /// Sum of two bags
    pub fn add(&self, other: &Coins) -> Coins {
        let mut sum = self.clone();
        for (denom, amount) in other.iter() {
            sum.add_coin(&Coin::new(denom, amount));
        }
        sum
    }

    /// Difference of two bags, or None if any denom would go negative
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut diff = self.clone();
        for (denom, amount) in other.iter() {
            let remaining = self.amount_of(denom).checked_sub(&amount)?;
            diff.set(denom, remaining);
        }
        Some(diff)
    }

    /// Difference of two bags with every denom clamped at zero
    pub fn saturating_sub(&self, other: &Coins) -> Coins {
        let mut diff = self.clone();
        for (denom, amount) in other.iter() {
            diff.set(denom, self.amount_of(denom).saturating_sub(&amount));
        }
        diff
    }

    /// Whether this bag holds at least `other` in every denom
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other
            .iter()
            .all(|(denom, amount)| self.amount_of(denom) >= amount)
    }

    /// Whether every denom held here is also held in `other`
    pub fn denoms_subset_of(&self, other: &Coins) -> bool {
        self.denoms().all(|denom| other.contains(denom))
    }

    /// Keep only the given denom
    pub fn only(&self, denom: &str) -> Coins {
        let mut filtered = Coins::empty();
        filtered.set(denom, self.amount_of(denom));
        filtered
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Coins::from_coins([coin])
    }
}

impl FromIterator<Coin> for Coins {
    fn from_iter<T: IntoIterator<Item = Coin>>(iter: T) -> Self {
        Coins::from_coins(iter)
    }
}

impl TryFrom<BTreeMap<String, Amount>> for Coins {
    type Error = CoinError;

    fn try_from(map: BTreeMap<String, Amount>) -> Result<Self, Self::Error> {
        let mut bag = Coins::empty();
        for (denom, amount) in map {
            validate_denom(&denom)?;
            bag.set(&denom, amount);
        }
        Ok(bag)
    }
}

impl TryFrom<UniqueMap<String, Amount>> for Coins {
    type Error = CoinError;

    fn try_from(map: UniqueMap<String, Amount>) -> Result<Self, Self::Error> {
        Coins::try_from(map.0)
    }
}

impl From<Coins> for BTreeMap<String, Amount> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(denom, amount)| format!("{}{}", amount, denom))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn coins(pairs: &[(&str, u64)]) -> Coins {
        pairs
            .iter()
            .map(|(denom, units)| Coin::from_units(*denom, *units))
            .collect()
    }

    #[test]
    fn test_validate_denom() {
        assert!(validate_denom("ukava").is_ok());
        assert!(validate_denom("ibc/27394FB0").is_ok());
        assert!(matches!(validate_denom(""), Err(CoinError::EmptyDenom)));
        assert!(matches!(validate_denom("1abc"), Err(CoinError::InvalidDenom(_))));
        assert!(matches!(validate_denom("ab"), Err(CoinError::InvalidDenom(_))));
    }

    #[test]
    fn test_coin_parse_rejects_fraction() {
        assert!(Coin::parse("ukava", dec!(10)).is_ok());
        assert!(matches!(
            Coin::parse("ukava", dec!(0.5)),
            Err(CoinError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_zero_coins_are_dropped() {
        let bag = coins(&[("ukava", 0), ("usdx", 3)]);
        assert_eq!(bag.len(), 1);
        assert!(!bag.contains("ukava"));
    }

    #[test]
    fn test_try_from_coins_rejects_duplicates() {
        let result = Coins::try_from_coins([
            Coin::from_units("ukava", 1),
            Coin::from_units("ukava", 2),
        ]);
        assert!(matches!(result, Err(CoinError::DuplicateDenom(_))));
    }

    #[test]
    fn test_checked_sub() {
        let a = coins(&[("ukava", 10), ("usdx", 5)]);
        let b = coins(&[("ukava", 10)]);
        assert_eq!(a.checked_sub(&b).unwrap(), coins(&[("usdx", 5)]));
        assert!(b.checked_sub(&a).is_none());
    }

    #[test]
    fn test_saturating_sub_clamps_each_denom() {
        let a = coins(&[("ukava", 10), ("usdx", 5)]);
        let b = coins(&[("ukava", 20), ("usdx", 2), ("hard", 1)]);
        assert_eq!(a.saturating_sub(&b), coins(&[("usdx", 3)]));
    }

    #[test]
    fn test_denoms_subset_of() {
        let held = coins(&[("ukava", 10), ("usdx", 5)]);
        assert!(coins(&[("usdx", 100)]).denoms_subset_of(&held));
        assert!(!coins(&[("hard", 1)]).denoms_subset_of(&held));
    }

    #[test]
    fn test_serde_as_denom_map() {
        let bag = coins(&[("ukava", 10)]);
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(json, r#"{"ukava":"10"}"#);
        let parsed: Coins = serde_json::from_str(r#"{"ukava":"10","usdx":"0"}"#).unwrap();
        assert_eq!(parsed, bag);
    }

    #[test]
    fn test_coins_reject_repeated_denom_in_json() {
        let result = serde_json::from_str::<Coins>(r#"{"ukava":"10","ukava":"5"}"#);
        assert!(result.is_err());
    }
}
