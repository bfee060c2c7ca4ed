//! Genesis import, export and validation

use chrono::{DateTime, Utc};
use harbor_accounts::Bank;
use harbor_core::BlockContext;
use harbor_incentive::{ClaimType, IncentiveParams, IncentiveStore, RewardCategory};
use harbor_market::{MarketParams, MarketStore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::app::{register_module_accounts, App};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketGenesis {
    #[serde(default)]
    pub params: MarketParams,
    #[serde(default)]
    pub state: MarketStore,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveGenesis {
    #[serde(default)]
    pub params: IncentiveParams,
    #[serde(default)]
    pub state: IncentiveStore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub genesis_time: DateTime<Utc>,
    #[serde(default)]
    pub market: MarketGenesis,
    #[serde(default)]
    pub incentive: IncentiveGenesis,
    #[serde(default)]
    pub accounts: Bank,
}

impl GenesisState {
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::InvalidGenesis(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::InvalidGenesis(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.genesis_time.timestamp() == 0 {
            return Err(AppError::InvalidGenesis("genesis time must be set".to_string()));
        }
        self.market.params.validate()?;
        self.incentive.params.validate()?;

        let store = &self.market.state;
        for (owner, deposit) in &store.deposits {
            if owner != &deposit.depositor {
                return Err(AppError::InvalidGenesis(format!(
                    "deposit keyed by {} belongs to {}",
                    owner, deposit.depositor
                )));
            }
            if deposit.amount.is_empty() {
                return Err(AppError::InvalidGenesis(format!(
                    "deposit of {} must be positive",
                    owner
                )));
            }
        }
        for (owner, borrow) in &store.borrows {
            if owner != &borrow.borrower {
                return Err(AppError::InvalidGenesis(format!(
                    "borrow keyed by {} belongs to {}",
                    owner, borrow.borrower
                )));
            }
            if borrow.amount.is_empty() {
                return Err(AppError::InvalidGenesis(format!(
                    "borrow of {} must be positive",
                    owner
                )));
            }
        }

        let incentive = &self.incentive.state;
        for (owner, claim) in incentive.hard_claims.iter().chain(&incentive.swap_claims) {
            if owner != &claim.owner {
                return Err(AppError::InvalidGenesis(format!(
                    "claim keyed by {} belongs to {}",
                    owner, claim.owner
                )));
            }
        }
        for (owner, claim) in &incentive.hard_claims {
            if claim.claim_type != ClaimType::Hard {
                return Err(AppError::InvalidGenesis(format!(
                    "claim of {} stored as hard but is {}",
                    owner, claim.claim_type
                )));
            }
        }
        for (owner, claim) in &incentive.swap_claims {
            if claim.claim_type != ClaimType::Swap {
                return Err(AppError::InvalidGenesis(format!(
                    "claim of {} stored as swap but is {}",
                    owner, claim.claim_type
                )));
            }
        }
        incentive.validate()?;
        Ok(())
    }
}

impl App {
    /// Replace the whole state with `genesis`.
    ///
    /// Markets and reward periods without an accrual time start accruing at
    /// the genesis time.
    pub fn init_genesis(&mut self, genesis: GenesisState) -> AppResult<()> {
        genesis.validate()?;
        let GenesisState {
            genesis_time,
            market,
            incentive,
            accounts,
        } = genesis;

        let mut state = AppState {
            market_params: market.params,
            market: market.state,
            incentive_params: incentive.params,
            incentive: incentive.state,
            bank: accounts,
        };

        for denom in state.market_params.denoms() {
            state
                .market
                .accrual_times
                .entry(denom)
                .or_insert(genesis_time);
        }
        for category in RewardCategory::ALL {
            for period in state.incentive_params.periods(category) {
                if state
                    .incentive
                    .accrual_time(category, &period.collateral_type)
                    .is_none()
                {
                    state
                        .incentive
                        .set_accrual_time(category, &period.collateral_type, genesis_time);
                }
            }
        }
        register_module_accounts(&mut state);

        info!(
            genesis_time = %genesis_time,
            markets = state.market_params.money_markets.len(),
            deposits = state.market.deposits.len(),
            borrows = state.market.borrows.len(),
            "Genesis imported"
        );
        self.state = state;
        self.ctx = BlockContext::new(0, genesis_time);
        Ok(())
    }

    /// The full state as a genesis document at the current block time
    pub fn export_genesis(&self) -> GenesisState {
        GenesisState {
            genesis_time: self.ctx.time,
            market: MarketGenesis {
                params: self.state.market_params.clone(),
                state: self.state.market.clone(),
            },
            incentive: IncentiveGenesis {
                params: self.state.incentive_params.clone(),
                state: self.state.incentive.clone(),
            },
            accounts: self.state.bank.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Collaborators;
    use crate::config::AppConfig;
    use chrono::TimeZone;
    use harbor_core::{Address, Coins};
    use harbor_incentive::Claim;
    use harbor_market::Deposit;

    fn genesis() -> GenesisState {
        GenesisState {
            genesis_time: Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap(),
            market: MarketGenesis::default(),
            incentive: IncentiveGenesis::default(),
            accounts: Bank::new(),
        }
    }

    #[test]
    fn test_empty_deposit_rejected() {
        let mut genesis = genesis();
        let alice = Address::new("kava1alice");
        genesis.market.state.deposits.insert(
            alice.clone(),
            Deposit::new(alice, Coins::empty(), Default::default()),
        );
        assert!(matches!(genesis.validate(), Err(AppError::InvalidGenesis(_))));
    }

    #[test]
    fn test_claim_under_wrong_owner_rejected() {
        let mut genesis = genesis();
        genesis.incentive.state.hard_claims.insert(
            Address::new("kava1alice"),
            Claim::new(ClaimType::Hard, Address::new("kava1bob")),
        );
        assert!(matches!(genesis.validate(), Err(AppError::InvalidGenesis(_))));
    }

    #[test]
    fn test_init_sets_context_and_modules() {
        let mut app = App::new(AppConfig::default(), Collaborators::mock()).unwrap();
        let genesis = genesis();
        app.init_genesis(genesis.clone()).unwrap();
        assert_eq!(app.context().time, genesis.genesis_time);
        assert_eq!(app.context().height, 0);

        let exported = app.export_genesis();
        assert_eq!(exported.genesis_time, genesis.genesis_time);
        assert!(exported.accounts.accounts().any(|a| a.address() == &Address::module("hard")));
    }
}
