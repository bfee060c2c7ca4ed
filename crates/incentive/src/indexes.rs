//! Reward indexes
//!
//! A reward index is the cumulative reward paid per unit of source share for
//! one reward denom. Global indexes only grow; a claim keeps a copy of the
//! global indexes as of its last sync, and the difference times the owner's
//! shares is what they earned since.

use harbor_core::{unique, Amount, Coin, Coins};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{IncentiveError, IncentiveResult};

/// Reward factor per reward denom
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardIndexes(#[serde(deserialize_with = "unique::map")] BTreeMap<String, Decimal>);

/// Reward indexes per source id
pub type MultiRewardIndexes = BTreeMap<String, RewardIndexes>;

impl RewardIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes starting at zero for every reward denom in `coins`
    pub fn zero_for(coins: &Coins) -> Self {
        Self(
            coins
                .denoms()
                .map(|denom| (denom.to_string(), Decimal::ZERO))
                .collect(),
        )
    }

    pub fn get(&self, denom: &str) -> Option<Decimal> {
        self.0.get(denom).copied()
    }

    pub fn set(&mut self, denom: &str, factor: Decimal) {
        self.0.insert(denom.to_string(), factor);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(denom, factor)| (denom.as_str(), *factor))
    }

    /// Element-wise sum; denoms missing on either side count as zero
    pub fn add(&self, other: &RewardIndexes) -> RewardIndexes {
        let mut sum = self.clone();
        for (denom, factor) in other.iter() {
            let current = sum.get(denom).unwrap_or(Decimal::ZERO);
            sum.set(denom, current + factor);
        }
        sum
    }

    pub fn validate(&self) -> IncentiveResult<()> {
        for (denom, factor) in self.iter() {
            if factor.is_sign_negative() {
                return Err(IncentiveError::InvalidClaim(format!(
                    "reward factor should be positive, is {} for {}",
                    factor, denom
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, Decimal)> for RewardIndexes {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RewardIndexes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(denom, factor)| format!("{}:{}", denom, factor))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Rewards earned by `shares` between the `user` and `global` indexes.
///
/// Each denom's reward is `(global - user) * shares`, rounded half to even.
/// A user index above the global one, or a user denom the global indexes no
/// longer carry, means global state went backward and is fatal.
pub fn calculate_rewards(
    user: &RewardIndexes,
    global: &RewardIndexes,
    shares: Decimal,
) -> IncentiveResult<Coins> {
    for (denom, _) in user.iter() {
        if global.get(denom).is_none() {
            return Err(IncentiveError::Fatal(format!(
                "global reward index for {} disappeared",
                denom
            )));
        }
    }

    let mut rewards = Coins::empty();
    for (denom, global_factor) in global.iter() {
        let user_factor = user.get(denom).unwrap_or(Decimal::ZERO);
        if global_factor < user_factor {
            return Err(IncentiveError::Fatal(format!(
                "global reward factor for {} decreased from {} to {}",
                denom, user_factor, global_factor
            )));
        }
        let earned = ((global_factor - user_factor) * shares)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        rewards.add_coin(&Coin::new(denom, Amount::new(earned.max(Decimal::ZERO))?));
    }
    Ok(rewards)
}
