//! In-memory staking, pool and reward source state for testing
//!
//! The staking and pool mocks take `&self` setters so a test can keep a
//! shared handle and change delegations between blocks.

use harbor_core::Address;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::claim::RewardCategory;
use crate::sources::{BondStatus, Delegation, PoolShareSource, RewardSources, StakingKeeper, Validator};

/// Mock staking module
#[derive(Debug, Default)]
pub struct MockStaking {
    validators: RwLock<BTreeMap<String, Validator>>,
    delegations: RwLock<Vec<Delegation>>,
}

impl MockStaking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_validator(&self, operator: &str, status: BondStatus, tokens: Decimal, shares: Decimal) {
        let mut validators = self.validators.write().unwrap_or_else(|e| e.into_inner());
        validators.insert(
            operator.to_string(),
            Validator {
                operator: operator.to_string(),
                status,
                tokens,
                delegator_shares: shares,
            },
        );
    }

    pub fn set_status(&self, operator: &str, status: BondStatus) {
        let mut validators = self.validators.write().unwrap_or_else(|e| e.into_inner());
        if let Some(v) = validators.get_mut(operator) {
            v.status = status;
        }
    }

    /// Delegate `amount` tokens at a one to one share rate
    pub fn delegate(&self, delegator: &Address, operator: &str, amount: Decimal) {
        {
            let mut validators = self.validators.write().unwrap_or_else(|e| e.into_inner());
            if let Some(v) = validators.get_mut(operator) {
                v.tokens += amount;
                v.delegator_shares += amount;
            }
        }
        let mut delegations = self.delegations.write().unwrap_or_else(|e| e.into_inner());
        match delegations
            .iter_mut()
            .find(|d| &d.delegator == delegator && d.validator == operator)
        {
            Some(existing) => existing.shares += amount,
            None => delegations.push(Delegation {
                delegator: delegator.clone(),
                validator: operator.to_string(),
                shares: amount,
            }),
        }
        tracing::debug!(delegator = %delegator, operator, amount = %amount, "mock delegation");
    }
}

impl StakingKeeper for MockStaking {
    fn total_bonded_tokens(&self) -> Decimal {
        self.validators
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|v| v.status == BondStatus::Bonded)
            .map(|v| v.tokens)
            .sum()
    }

    fn delegator_delegations(&self, delegator: &Address) -> Vec<Delegation> {
        self.delegations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|d| &d.delegator == delegator)
            .cloned()
            .collect()
    }

    fn validator(&self, operator: &str) -> Option<Validator> {
        self.validators
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(operator)
            .cloned()
    }
}

/// Mock liquidity pools
#[derive(Debug, Default)]
pub struct MockPools {
    shares: RwLock<BTreeMap<String, BTreeMap<Address, Decimal>>>,
}

impl MockPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an owner's shares; zero removes them
    pub fn set_shares(&self, pool_id: &str, owner: &Address, shares: Decimal) {
        let mut pools = self.shares.write().unwrap_or_else(|e| e.into_inner());
        let pool = pools.entry(pool_id.to_string()).or_default();
        if shares.is_zero() {
            pool.remove(owner);
        } else {
            pool.insert(owner.clone(), shares);
        }
    }
}

impl PoolShareSource for MockPools {
    fn total_shares(&self, pool_id: &str) -> Option<Decimal> {
        let pools = self.shares.read().unwrap_or_else(|e| e.into_inner());
        pools.get(pool_id).map(|p| p.values().copied().sum())
    }

    fn shares_of(&self, pool_id: &str, owner: &Address) -> Option<Decimal> {
        let pools = self.shares.read().unwrap_or_else(|e| e.into_inner());
        pools.get(pool_id).and_then(|p| p.get(owner)).copied()
    }
}

/// Fixed totals and shares per category and source
#[derive(Debug, Clone, Default)]
pub struct MockSources {
    totals: BTreeMap<(RewardCategory, String), Decimal>,
    shares: BTreeMap<(RewardCategory, Address, String), Decimal>,
}

impl MockSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total(&mut self, category: RewardCategory, source_id: &str, total: Decimal) {
        self.totals.insert((category, source_id.to_string()), total);
    }

    pub fn set_shares(
        &mut self,
        category: RewardCategory,
        owner: &Address,
        source_id: &str,
        shares: Decimal,
    ) {
        self.shares
            .insert((category, owner.clone(), source_id.to_string()), shares);
    }
}

impl RewardSources for MockSources {
    fn source_total(&self, category: RewardCategory, source_id: &str) -> Decimal {
        self.totals
            .get(&(category, source_id.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn owner_shares(&self, category: RewardCategory, owner: &Address, source_id: &str) -> Decimal {
        self.shares
            .get(&(category, owner.clone(), source_id.to_string()))
            .copied()
            .unwrap_or_default()
    }
}
