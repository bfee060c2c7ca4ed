//! Reward claims
//!
//! A claim holds an owner's unclaimed rewards and, per reward category, the
//! global indexes it was last synchronized against. Supply, borrow and
//! delegator rewards share the `Hard` claim, so delegator rewards are not
//! told apart from money market rewards once earned.

use harbor_core::{unique, Address, Coins};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

use crate::error::{IncentiveError, IncentiveResult};
use crate::indexes::{calculate_rewards, MultiRewardIndexes, RewardIndexes};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// Money market supply and borrow rewards plus delegator rewards
    Hard,
    /// Liquidity pool rewards
    Swap,
}

impl ClaimType {
    pub const ALL: [ClaimType; 2] = [ClaimType::Hard, ClaimType::Swap];

    /// Reward categories paid into claims of this type
    pub fn categories(self) -> &'static [RewardCategory] {
        match self {
            ClaimType::Hard => &[
                RewardCategory::Supply,
                RewardCategory::Borrow,
                RewardCategory::Delegator,
            ],
            ClaimType::Swap => &[RewardCategory::Pool],
        }
    }
}

/// Activity a reward is earned for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    Supply,
    Borrow,
    Delegator,
    Pool,
}

impl RewardCategory {
    /// Accumulation order of the begin-block pass
    pub const ALL: [RewardCategory; 4] = [
        RewardCategory::Supply,
        RewardCategory::Borrow,
        RewardCategory::Delegator,
        RewardCategory::Pool,
    ];

    pub fn claim_type(self) -> ClaimType {
        match self {
            RewardCategory::Pool => ClaimType::Swap,
            _ => ClaimType::Hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: ClaimType,
    pub owner: Address,
    /// Earned and not yet claimed
    pub reward: Coins,
    /// Snapshot of the global indexes per category and source
    #[serde(default, deserialize_with = "unique::nested_map")]
    pub indexes: BTreeMap<RewardCategory, MultiRewardIndexes>,
}

impl Claim {
    pub fn new(claim_type: ClaimType, owner: Address) -> Self {
        Self {
            claim_type,
            owner,
            reward: Coins::empty(),
            indexes: BTreeMap::new(),
        }
    }

    pub fn source_indexes(&self, category: RewardCategory, source_id: &str) -> Option<&RewardIndexes> {
        self.indexes.get(&category).and_then(|m| m.get(source_id))
    }

    pub fn set_source_indexes(
        &mut self,
        category: RewardCategory,
        source_id: &str,
        indexes: RewardIndexes,
    ) {
        self.indexes
            .entry(category)
            .or_default()
            .insert(source_id.to_string(), indexes);
    }

    pub fn remove_source(&mut self, category: RewardCategory, source_id: &str) {
        if let Some(sources) = self.indexes.get_mut(&category) {
            sources.remove(source_id);
            if sources.is_empty() {
                self.indexes.remove(&category);
            }
        }
    }

    /// Source ids with a snapshot in `category`
    pub fn sources(&self, category: RewardCategory) -> Vec<String> {
        self.indexes
            .get(&category)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Bring one source up to the global indexes.
    ///
    /// Without global indexes the source is not rewarded yet and nothing
    /// changes. A missing snapshot counts as all zero. Returns the newly
    /// earned rewards.
    pub fn synchronize(
        &mut self,
        category: RewardCategory,
        source_id: &str,
        global: Option<&RewardIndexes>,
        shares: Decimal,
    ) -> IncentiveResult<Coins> {
        let Some(global) = global else {
            return Ok(Coins::empty());
        };
        let user = self
            .source_indexes(category, source_id)
            .cloned()
            .unwrap_or_default();
        let earned = calculate_rewards(&user, global, shares)?;
        self.reward = self.reward.add(&earned);
        self.set_source_indexes(category, source_id, global.clone());
        Ok(earned)
    }

    pub fn validate(&self) -> IncentiveResult<()> {
        if self.owner.is_empty() {
            return Err(IncentiveError::InvalidClaim(
                "claim owner cannot be empty".to_string(),
            ));
        }
        for (category, sources) in &self.indexes {
            if category.claim_type() != self.claim_type {
                return Err(IncentiveError::InvalidClaim(format!(
                    "{} claim of {} holds {} indexes",
                    self.claim_type, self.owner, category
                )));
            }
            for (source_id, indexes) in sources {
                if source_id.trim().is_empty() {
                    return Err(IncentiveError::InvalidClaim(
                        "collateral type should not be empty".to_string(),
                    ));
                }
                indexes.validate()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_core::Amount;
    use rust_decimal_macros::dec;

    fn indexes(factor: Decimal) -> RewardIndexes {
        [("hard".to_string(), factor)].into_iter().collect()
    }

    #[test]
    fn test_category_claim_types() {
        assert_eq!(RewardCategory::Delegator.claim_type(), ClaimType::Hard);
        assert_eq!(RewardCategory::Pool.claim_type(), ClaimType::Swap);
        assert!(ClaimType::Hard.categories().contains(&RewardCategory::Borrow));
    }

    #[test]
    fn test_synchronize_without_global_is_noop() {
        let mut claim = Claim::new(ClaimType::Hard, Address::new("kava1alice"));
        let earned = claim
            .synchronize(RewardCategory::Supply, "ukava", None, dec!(100))
            .unwrap();
        assert!(earned.is_empty());
        assert!(claim.source_indexes(RewardCategory::Supply, "ukava").is_none());
    }

    #[test]
    fn test_synchronize_accumulates_and_overwrites_snapshot() {
        let mut claim = Claim::new(ClaimType::Hard, Address::new("kava1alice"));
        claim.set_source_indexes(RewardCategory::Supply, "ukava", indexes(dec!(0.1)));

        claim
            .synchronize(RewardCategory::Supply, "ukava", Some(&indexes(dec!(0.3))), dec!(1000))
            .unwrap();
        claim
            .synchronize(RewardCategory::Supply, "ukava", Some(&indexes(dec!(0.4))), dec!(1000))
            .unwrap();

        assert_eq!(claim.reward.amount_of("hard"), Amount::from(300));
        assert_eq!(
            claim.source_indexes(RewardCategory::Supply, "ukava"),
            Some(&indexes(dec!(0.4)))
        );
    }

    #[test]
    fn test_missing_snapshot_counts_as_zero() {
        let mut claim = Claim::new(ClaimType::Hard, Address::new("kava1alice"));
        let earned = claim
            .synchronize(RewardCategory::Borrow, "usdx", Some(&indexes(dec!(0.2))), dec!(50))
            .unwrap();
        assert_eq!(earned.amount_of("hard"), Amount::from(10));
    }

    #[test]
    fn test_remove_last_source_drops_category() {
        let mut claim = Claim::new(ClaimType::Hard, Address::new("kava1alice"));
        claim.set_source_indexes(RewardCategory::Supply, "ukava", indexes(dec!(0.1)));
        claim.remove_source(RewardCategory::Supply, "ukava");
        assert!(claim.indexes.is_empty());
    }

    #[test]
    fn test_validate_rejects_foreign_category() {
        let mut claim = Claim::new(ClaimType::Swap, Address::new("kava1alice"));
        claim.set_source_indexes(RewardCategory::Supply, "ukava", indexes(dec!(0.1)));
        assert!(matches!(claim.validate(), Err(IncentiveError::InvalidClaim(_))));
    }

    #[test]
    fn test_claim_json_round_trip() {
        let mut claim = Claim::new(ClaimType::Hard, Address::new("kava1alice"));
        claim.set_source_indexes(RewardCategory::Delegator, "ukava", indexes(dec!(0.1)));
        let json = serde_json::to_string(&claim).unwrap();
        let back: Claim = serde_json::from_str(&json).unwrap();
        assert_eq!(back, claim);
    }
}
