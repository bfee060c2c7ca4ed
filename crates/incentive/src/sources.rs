//! Where reward sources get their totals and owner shares
//!
//! Supply and borrow totals come from the money market, delegation totals
//! from staking, pool totals from the swap module. The reward keeper only
//! sees the `RewardSources` contract; the application wires it up.

use harbor_core::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::claim::RewardCategory;

/// Totals and owner shares for every reward source
pub trait RewardSources {
    /// Total shares of a source; zero when unknown
    fn source_total(&self, category: RewardCategory, source_id: &str) -> Decimal;

    /// Shares `owner` holds in a source; zero when none
    fn owner_shares(&self, category: RewardCategory, owner: &Address, source_id: &str) -> Decimal;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BondStatus {
    Unbonded,
    Unbonding,
    Bonded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: String,
    pub status: BondStatus,
    pub tokens: Decimal,
    pub delegator_shares: Decimal,
}

impl Validator {
    /// Tokens backing `shares` of this validator
    pub fn tokens_from_shares(&self, shares: Decimal) -> Decimal {
        if self.delegator_shares.is_zero() {
            return Decimal::ZERO;
        }
        shares * self.tokens / self.delegator_shares
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: Address,
    pub validator: String,
    pub shares: Decimal,
}

/// Read access to staking state
pub trait StakingKeeper {
    fn total_bonded_tokens(&self) -> Decimal;

    fn delegator_delegations(&self, delegator: &Address) -> Vec<Delegation>;

    fn validator(&self, operator: &str) -> Option<Validator>;
}

/// Tokens a delegator has staked with bonded validators.
///
/// Delegations to unbonded or unbonding validators, and to validators
/// without tokens, earn nothing.
pub fn total_delegated(staking: &dyn StakingKeeper, delegator: &Address) -> Decimal {
    staking
        .delegator_delegations(delegator)
        .iter()
        .filter_map(|delegation| {
            let validator = staking.validator(&delegation.validator)?;
            if validator.status != BondStatus::Bonded || validator.tokens <= Decimal::ZERO {
                return None;
            }
            Some(validator.tokens_from_shares(delegation.shares))
        })
        .sum()
}

/// Read access to liquidity pool shares
pub trait PoolShareSource {
    fn total_shares(&self, pool_id: &str) -> Option<Decimal>;

    fn shares_of(&self, pool_id: &str, owner: &Address) -> Option<Decimal>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStaking;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tokens_from_shares() {
        let validator = Validator {
            operator: "val1".to_string(),
            status: BondStatus::Bonded,
            tokens: dec!(900),
            delegator_shares: dec!(1000),
        };
        assert_eq!(validator.tokens_from_shares(dec!(100)), dec!(90));
    }

    #[test]
    fn test_total_delegated_skips_unbonded() {
        let alice = Address::new("kava1alice");
        let mut staking = MockStaking::new();
        staking.add_validator("val1", BondStatus::Bonded, dec!(1000), dec!(1000));
        staking.add_validator("val2", BondStatus::Unbonding, dec!(1000), dec!(1000));
        staking.delegate(&alice, "val1", dec!(300));
        staking.delegate(&alice, "val2", dec!(500));

        assert_eq!(total_delegated(&staking, &alice), dec!(300));
    }
}
