//! Application - block lifecycle and atomic message execution
//!
//! ```text
//! begin_block(ctx)
//!     │  accrue interest, every market in denom order
//!     │  accumulate supply → borrow → delegator → pool rewards
//!     ▼
//! deliver(msg) ... deliver(msg)
//!     │  validate_basic → snapshot state → execute
//!     │  ok:  keep state, persist events
//!     │  err: restore snapshot, drop events, halt if fatal
//! ```

use harbor_core::{Address, BlockContext};
use harbor_events::{EventLog, EventRecord, EventStore, ModuleEvent};
use harbor_hooks::{HookRegistry, LedgerEvent, PositionKind, SourceShares};
use harbor_incentive::{
    total_delegated, IncentiveParams, MockPools, MockStaking, PoolShareSource, RewardHooks,
    RewardKeeper, StakingKeeper,
};
use harbor_market::auction::AUCTION_MODULE_NAME;
use harbor_market::{AuctionKeeper, MarketParams, MockAuctionHouse, MoneyMarketKeeper};
use harbor_oracle::{MockPriceFeed, PriceFeed};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::msg::Msg;
use crate::state::{AppState, StateSources};

/// External modules the application reads from or hands work to
pub struct Collaborators {
    pub prices: Arc<dyn PriceFeed>,
    pub auctions: Box<dyn AuctionKeeper>,
    pub staking: Arc<dyn StakingKeeper>,
    pub pools: Arc<dyn PoolShareSource>,
}

impl Collaborators {
    /// In-memory collaborators with no prices, validators or pools
    pub fn mock() -> Self {
        Self {
            prices: Arc::new(MockPriceFeed::new()),
            auctions: Box::new(MockAuctionHouse::new()),
            staking: Arc::new(MockStaking::new()),
            pools: Arc::new(MockPools::new()),
        }
    }
}

pub struct App {
    pub(crate) config: AppConfig,
    pub(crate) state: AppState,
    pub(crate) ctx: BlockContext,
    pub(crate) prices: Arc<dyn PriceFeed>,
    auctions: Box<dyn AuctionKeeper>,
    pub(crate) staking: Arc<dyn StakingKeeper>,
    pub(crate) pools: Arc<dyn PoolShareSource>,
    event_store: Option<EventStore>,
    halted: bool,
}

/// A money market keeper over `state` with the reward listener attached
pub(crate) fn market_keeper<'a>(
    ctx: BlockContext,
    state: &'a mut AppState,
    prices: &'a dyn PriceFeed,
    events: &'a mut EventLog,
) -> MoneyMarketKeeper<'a> {
    let AppState {
        market_params,
        market,
        incentive,
        bank,
        ..
    } = state;
    let hooks = HookRegistry::new().with_listener(Box::new(RewardHooks::new(incentive)));
    MoneyMarketKeeper::new(ctx, market_params, market, bank, prices, events).with_hooks(hooks)
}

impl App {
    pub fn new(config: AppConfig, collaborators: Collaborators) -> AppResult<Self> {
        config.validate()?;
        let event_store = match &config.event_store_path {
            Some(path) => Some(EventStore::new(path)?),
            None => None,
        };
        let mut state = AppState::default();
        register_module_accounts(&mut state);
        Ok(Self {
            ctx: BlockContext::new(0, config.genesis_time),
            config,
            state,
            prices: collaborators.prices,
            auctions: collaborators.auctions,
            staking: collaborators.staking,
            pools: collaborators.pools,
            event_store,
            halted: false,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Context of the current block
    pub fn context(&self) -> &BlockContext {
        &self.ctx
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn ensure_running(&self) -> AppResult<()> {
        if self.halted {
            return Err(AppError::Halted);
        }
        Ok(())
    }

    /// Run `f` as one unit of work: all of its state changes and events, or
    /// none of them.
    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self, &mut EventLog) -> AppResult<T>,
    ) -> AppResult<(T, Vec<ModuleEvent>)> {
        self.ensure_running()?;
        let snapshot = self.state.clone();
        let mut log = EventLog::new();

        let result = f(self, &mut log).and_then(|value| {
            let events = log.take();
            self.persist(&events)?;
            Ok((value, events))
        });

        if let Err(err) = &result {
            self.state = snapshot;
            if err.is_fatal() {
                error!(height = self.ctx.height, error = %err, "Fatal invariant violation, halting");
                self.halted = true;
            } else {
                debug!(height = self.ctx.height, error = %err, "Unit of work rolled back");
            }
        }
        result
    }

    fn persist(&mut self, events: &[ModuleEvent]) -> AppResult<()> {
        let ctx = self.ctx;
        if let Some(store) = self.event_store.as_mut() {
            let records: Vec<EventRecord> = events
                .iter()
                .cloned()
                .map(|event| EventRecord::new(ctx.height, ctx.time, event))
                .collect();
            store.append_all(&records)?;
        }
        Ok(())
    }

    /// Start a block: accrue interest on every market, then accumulate every
    /// active reward period.
    pub fn begin_block(&mut self, ctx: BlockContext) -> AppResult<Vec<ModuleEvent>> {
        self.ensure_running()?;
        let previous = self.ctx;
        self.ctx = ctx;

        let result = self.atomically(|app, events| {
            market_keeper(app.ctx, &mut app.state, app.prices.as_ref(), events)
                .accrue_all_markets()?;
            app.accumulate_rewards(events)
        });

        match result {
            Ok(((), events)) => {
                info!(height = ctx.height, time = %ctx.time, events = events.len(), "Block begun");
                Ok(events)
            }
            Err(err) => {
                self.ctx = previous;
                Err(err)
            }
        }
    }

    pub(crate) fn accumulate_rewards(&mut self, events: &mut EventLog) -> AppResult<()> {
        let sources = StateSources::new(
            &self.state.market,
            self.staking.as_ref(),
            self.pools.as_ref(),
            &self.state.incentive_params.bond_denom,
        );
        RewardKeeper::new(
            self.ctx,
            &self.state.incentive_params,
            &mut self.state.incentive,
            events,
        )
        .accumulate_all(&sources)?;
        Ok(())
    }

    /// Execute one message atomically and return its events
    pub fn deliver(&mut self, msg: &Msg) -> AppResult<Vec<ModuleEvent>> {
        self.ensure_running()?;
        msg.validate_basic()?;
        let ((), events) = self.atomically(|app, events| app.execute(msg, events))?;
        Ok(events)
    }

    fn execute(&mut self, msg: &Msg, events: &mut EventLog) -> AppResult<()> {
        let ctx = self.ctx;
        match msg {
            Msg::Deposit { depositor, amount } => {
                market_keeper(ctx, &mut self.state, self.prices.as_ref(), events)
                    .deposit(depositor, amount)?;
            }
            Msg::Withdraw { depositor, amount } => {
                market_keeper(ctx, &mut self.state, self.prices.as_ref(), events)
                    .withdraw(depositor, amount)?;
            }
            Msg::Borrow { borrower, amount } => {
                market_keeper(ctx, &mut self.state, self.prices.as_ref(), events)
                    .borrow(borrower, amount)?;
            }
            Msg::Repay {
                sender,
                owner,
                amount,
            } => {
                market_keeper(ctx, &mut self.state, self.prices.as_ref(), events)
                    .repay(sender, owner, amount)?;
            }
            Msg::Liquidate { keeper, borrower } => {
                market_keeper(ctx, &mut self.state, self.prices.as_ref(), events)
                    .attempt_keeper_liquidation(keeper, borrower, self.auctions.as_mut())?;
            }
            Msg::ClaimReward {
                sender,
                receiver,
                claim_type,
                selections,
            } => {
                let sources = StateSources::new(
                    &self.state.market,
                    self.staking.as_ref(),
                    self.pools.as_ref(),
                    &self.state.incentive_params.bond_denom,
                );
                let mut keeper = RewardKeeper::new(
                    ctx,
                    &self.state.incentive_params,
                    &mut self.state.incentive,
                    events,
                );
                for selection in selections {
                    keeper.claim_reward(
                        *claim_type,
                        sender,
                        receiver,
                        &selection.denom,
                        selection.multiplier()?,
                        &sources,
                        &mut self.state.bank,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn notify(&mut self, event: LedgerEvent) -> AppResult<()> {
        self.atomically(|app, _| {
            HookRegistry::new()
                .with_listener(Box::new(RewardHooks::new(&mut app.state.incentive)))
                .dispatch(&event)?;
            Ok(())
        })?;
        Ok(())
    }

    fn delegation_shares(&self, delegator: &Address) -> SourceShares {
        let bonded = total_delegated(self.staking.as_ref(), delegator);
        [(self.state.incentive_params.bond_denom.clone(), bonded)]
            .into_iter()
            .collect()
    }

    fn pool_shares(&self, owner: &Address, pool_id: &str) -> SourceShares {
        let shares = self.pools.shares_of(pool_id, owner).unwrap_or_default();
        [(pool_id.to_string(), shares)].into_iter().collect()
    }

    /// Called by staking before a delegation is created or its shares change
    pub fn before_delegation_changed(&mut self, delegator: &Address) -> AppResult<()> {
        let shares = self.delegation_shares(delegator);
        self.notify(LedgerEvent::will_change(delegator, PositionKind::Delegation, shares))
    }

    /// Called by staking once a new delegation exists
    pub fn after_delegation_created(&mut self, delegator: &Address) -> AppResult<()> {
        let after = self.delegation_shares(delegator);
        self.notify(LedgerEvent::did_change(
            delegator,
            PositionKind::Delegation,
            SourceShares::new(),
            after,
        ))
    }

    /// Called by the swap module before an owner's pool shares change
    pub fn before_pool_deposit_changed(&mut self, owner: &Address, pool_id: &str) -> AppResult<()> {
        let shares = self.pool_shares(owner, pool_id);
        self.notify(LedgerEvent::will_change(owner, PositionKind::PoolShare, shares))
    }

    /// Called by the swap module once an owner first holds shares of a pool
    pub fn after_pool_deposit_created(&mut self, owner: &Address, pool_id: &str) -> AppResult<()> {
        let after = self.pool_shares(owner, pool_id);
        self.notify(LedgerEvent::did_change(
            owner,
            PositionKind::PoolShare,
            SourceShares::new(),
            after,
        ))
    }

    fn authorize(&self, signer: &Address) -> AppResult<()> {
        if signer != &self.config.authority {
            return Err(AppError::Unauthorized {
                signer: signer.clone(),
                authority: self.config.authority.clone(),
            });
        }
        Ok(())
    }

    /// Replace the money market parameters
    pub fn update_market_params(&mut self, signer: &Address, params: MarketParams) -> AppResult<()> {
        self.ensure_running()?;
        self.authorize(signer)?;
        params.validate()?;
        self.state.bank.register_module(&params.module_name);
        info!(markets = params.money_markets.len(), "Market params updated");
        self.state.market_params = params;
        Ok(())
    }

    /// Replace the incentive parameters
    pub fn update_incentive_params(
        &mut self,
        signer: &Address,
        params: IncentiveParams,
    ) -> AppResult<()> {
        self.ensure_running()?;
        self.authorize(signer)?;
        params.validate()?;
        self.state.bank.register_module(&params.funding_module);
        info!(claim_end = %params.claim_end, "Incentive params updated");
        self.state.incentive_params = params;
        Ok(())
    }
}

/// Module accounts for market custody, auctions and reward funding
pub(crate) fn register_module_accounts(state: &mut AppState) {
    let market_module = state.market_params.module_name.clone();
    let funding_module = state.incentive_params.funding_module.clone();
    state.bank.register_module(&market_module);
    state.bank.register_module(&funding_module);
    state.bank.register_module(AUCTION_MODULE_NAME);
}
