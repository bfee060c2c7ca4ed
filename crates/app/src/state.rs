//! Application state and reward source wiring

use harbor_accounts::Bank;
use harbor_core::Address;
use harbor_incentive::{
    total_delegated, IncentiveParams, IncentiveStore, PoolShareSource, RewardCategory,
    RewardSources, StakingKeeper,
};
use harbor_market::{MarketParams, MarketStore};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything a transaction may change.
///
/// Cloned before each unit of work and restored when it fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub market_params: MarketParams,
    pub market: MarketStore,
    pub incentive_params: IncentiveParams,
    pub incentive: IncentiveStore,
    pub bank: Bank,
}

/// Reward source totals and shares read from live state
pub struct StateSources<'a> {
    market: &'a MarketStore,
    staking: &'a dyn StakingKeeper,
    pools: &'a dyn PoolShareSource,
    bond_denom: &'a str,
}

impl<'a> StateSources<'a> {
    pub fn new(
        market: &'a MarketStore,
        staking: &'a dyn StakingKeeper,
        pools: &'a dyn PoolShareSource,
        bond_denom: &'a str,
    ) -> Self {
        Self {
            market,
            staking,
            pools,
            bond_denom,
        }
    }
}

impl RewardSources for StateSources<'_> {
    fn source_total(&self, category: RewardCategory, source_id: &str) -> Decimal {
        match category {
            RewardCategory::Supply => self.market.total_supplied().amount_of(source_id).value(),
            RewardCategory::Borrow => self.market.total_borrowed().amount_of(source_id).value(),
            RewardCategory::Delegator if source_id == self.bond_denom => {
                self.staking.total_bonded_tokens()
            }
            RewardCategory::Delegator => Decimal::ZERO,
            RewardCategory::Pool => self.pools.total_shares(source_id).unwrap_or_default(),
        }
    }

    fn owner_shares(&self, category: RewardCategory, owner: &Address, source_id: &str) -> Decimal {
        match category {
            RewardCategory::Supply => self
                .market
                .deposit(owner)
                .map(|d| d.amount.amount_of(source_id).value())
                .unwrap_or_default(),
            RewardCategory::Borrow => self
                .market
                .borrow(owner)
                .map(|b| b.amount.amount_of(source_id).value())
                .unwrap_or_default(),
            RewardCategory::Delegator if source_id == self.bond_denom => {
                total_delegated(self.staking, owner)
            }
            RewardCategory::Delegator => Decimal::ZERO,
            RewardCategory::Pool => self.pools.shares_of(source_id, owner).unwrap_or_default(),
        }
    }
}
