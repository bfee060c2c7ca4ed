//! Read-only queries
//!
//! Unsynced queries return stored records. Synced queries settle interest and
//! rewards on a clone of the state first; stored state is never written.

use harbor_accounts::BankKeeper;
use harbor_core::{Address, Coins};
use harbor_events::EventLog;
use harbor_incentive::{
    Claim, ClaimType, IncentiveParams, IncentiveResult, RewardCategory, RewardIndexes,
    RewardKeeper,
};
use harbor_market::query as market_query;
use harbor_market::{Borrow, Deposit, InterestFactor, MarketParams, MoneyMarketInterestRate};
use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::error::AppResult;
use crate::state::{AppState, StateSources};

/// Default number of records per page
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// 1-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl Page {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    /// The records of this page. Page 0 is treated as page 1 and a zero limit
    /// as the default limit.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let limit = if self.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            self.limit
        };
        let skip = self.page.max(1).saturating_sub(1).saturating_mul(limit);
        items.into_iter().skip(skip).take(limit).collect()
    }
}

/// Global reward indexes of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardFactor {
    pub category: RewardCategory,
    pub source_id: String,
    pub indexes: RewardIndexes,
}

impl App {
    pub fn market_params(&self) -> &MarketParams {
        &self.state.market_params
    }

    /// Balance of the market module account
    pub fn module_balances(&self) -> Coins {
        let module = Address::module(&self.state.market_params.module_name);
        self.state.bank.balances(&module)
    }

    pub fn deposits(&self, owner: Option<&Address>, denom: Option<&str>, page: Page) -> Vec<Deposit> {
        page.apply(market_query::deposits(&self.state.market, owner, denom))
    }

    /// Deposits with interest accrued to the current block
    pub fn synced_deposits(
        &self,
        owner: Option<&Address>,
        denom: Option<&str>,
        page: Page,
    ) -> AppResult<Vec<Deposit>> {
        let state = self.accrued_state()?;
        let deposits = market_query::deposits(&state.market, owner, denom)
            .iter()
            .map(|d| market_query::synced_deposit(&state.market, d))
            .collect();
        Ok(page.apply(deposits))
    }

    pub fn borrows(&self, owner: Option<&Address>, denom: Option<&str>, page: Page) -> Vec<Borrow> {
        page.apply(market_query::borrows(&self.state.market, owner, denom))
    }

    /// Borrows with interest accrued to the current block
    pub fn synced_borrows(
        &self,
        owner: Option<&Address>,
        denom: Option<&str>,
        page: Page,
    ) -> AppResult<Vec<Borrow>> {
        let state = self.accrued_state()?;
        let borrows = market_query::borrows(&state.market, owner, denom)
            .iter()
            .map(|b| market_query::synced_borrow(&state.market, b))
            .collect();
        Ok(page.apply(borrows))
    }

    pub fn total_deposited(&self, denom: Option<&str>) -> Coins {
        market_query::filter_denom(self.state.market.total_supplied(), denom)
    }

    pub fn total_borrowed(&self, denom: Option<&str>) -> Coins {
        market_query::filter_denom(self.state.market.total_borrowed(), denom)
    }

    pub fn total_reserves(&self, denom: Option<&str>) -> Coins {
        market_query::filter_denom(self.state.market.total_reserves(), denom)
    }

    pub fn interest_rates(&self, denom: Option<&str>) -> Vec<MoneyMarketInterestRate> {
        market_query::interest_rates(
            &self.state.market_params,
            &self.state.market,
            &self.module_balances(),
            denom,
        )
    }

    pub fn interest_factors(&self, denom: Option<&str>) -> Vec<InterestFactor> {
        market_query::interest_factors(&self.state.market, denom)
    }

    pub fn incentive_params(&self) -> &IncentiveParams {
        &self.state.incentive_params
    }

    pub fn claims(&self, claim_type: ClaimType, owner: Option<&Address>, page: Page) -> Vec<Claim> {
        let claims = self
            .state
            .incentive
            .claims(claim_type)
            .values()
            .filter(|c| owner.map_or(true, |o| o == &c.owner))
            .cloned()
            .collect();
        page.apply(claims)
    }

    /// Claims with every source settled against the current global indexes
    pub fn synced_claims(
        &self,
        claim_type: ClaimType,
        owner: Option<&Address>,
        page: Page,
    ) -> AppResult<Vec<Claim>> {
        let mut state = self.accrued_state()?;
        let mut events = EventLog::new();
        let sources = StateSources::new(
            &state.market,
            self.staking.as_ref(),
            self.pools.as_ref(),
            &state.incentive_params.bond_denom,
        );
        let owners: Vec<Address> = state
            .incentive
            .claims(claim_type)
            .keys()
            .filter(|o| owner.map_or(true, |f| f == *o))
            .cloned()
            .collect();
        let keeper = RewardKeeper::new(
            self.ctx,
            &state.incentive_params,
            &mut state.incentive,
            &mut events,
        );
        let claims = owners
            .iter()
            .map(|o| keeper.synchronized_claim(claim_type, o, &sources))
            .collect::<IncentiveResult<Vec<_>>>()?;
        Ok(page.apply(claims.into_iter().flatten().collect()))
    }

    /// Global reward indexes, optionally of one category
    pub fn reward_factors(&self, category: Option<RewardCategory>) -> Vec<RewardFactor> {
        self.state
            .incentive
            .indexes
            .iter()
            .filter(|(c, _)| category.map_or(true, |f| f == **c))
            .flat_map(|(c, sources)| {
                sources.iter().map(move |(source_id, indexes)| RewardFactor {
                    category: *c,
                    source_id: source_id.clone(),
                    indexes: indexes.clone(),
                })
            })
            .collect()
    }

    /// A copy of state with interest and rewards brought up to the current
    /// block time
    fn accrued_state(&self) -> AppResult<AppState> {
        let mut state = self.state.clone();
        let mut events = EventLog::new();
        crate::app::market_keeper(self.ctx, &mut state, self.prices.as_ref(), &mut events)
            .accrue_all_markets()?;
        let sources = StateSources::new(
            &state.market,
            self.staking.as_ref(),
            self.pools.as_ref(),
            &state.incentive_params.bond_denom,
        );
        RewardKeeper::new(
            self.ctx,
            &state.incentive_params,
            &mut state.incentive,
            &mut events,
        )
        .accumulate_all(&sources)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slices_one_based() {
        let items: Vec<u32> = (1..=7).collect();
        assert_eq!(Page::new(1, 3).apply(items.clone()), vec![1, 2, 3]);
        assert_eq!(Page::new(3, 3).apply(items.clone()), vec![7]);
        assert!(Page::new(4, 3).apply(items.clone()).is_empty());
        assert_eq!(Page::new(0, 0).apply(items).len(), 7);
    }

    #[test]
    fn test_page_defaults() {
        let page: Page = serde_json::from_str("{}").unwrap();
        assert_eq!(page, Page::default());
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
    }
}
