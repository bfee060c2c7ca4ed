//! Money market keeper
//!
//! The keeper borrows everything it touches for the duration of one unit of
//! work: the block context, parameters, the market store, the bank, the
//! price feed, the injected ledger listeners and the event log.

use harbor_accounts::BankKeeper;
use harbor_core::{Address, BlockContext, Coins};
use harbor_events::{EventLog, ModuleEvent};
use harbor_hooks::{shares_from_coins, HookRegistry, LedgerEvent, PositionKind};
use harbor_oracle::PriceFeed;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::trace;

use crate::error::{MarketError, MarketResult};
use crate::interest::sync_position;
use crate::params::{MarketParams, MoneyMarket};
use crate::state::MarketStore;

/// Price and collateral data for one denom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Valuation {
    pub price: Decimal,
    pub loan_to_value: Decimal,
    pub conversion_factor: Decimal,
}

impl Valuation {
    /// USD value of `units` base units
    pub fn usd_value(&self, units: Decimal) -> Decimal {
        units / self.conversion_factor * self.price
    }

    /// Base units worth `usd`
    pub fn units_for(&self, usd: Decimal) -> Decimal {
        usd * self.conversion_factor / self.price
    }
}

pub struct MoneyMarketKeeper<'a> {
    pub(crate) ctx: BlockContext,
    pub(crate) params: &'a MarketParams,
    pub(crate) store: &'a mut MarketStore,
    pub(crate) bank: &'a mut dyn BankKeeper,
    pub(crate) prices: &'a dyn PriceFeed,
    pub(crate) hooks: HookRegistry<'a>,
    pub(crate) events: &'a mut EventLog,
}

impl<'a> MoneyMarketKeeper<'a> {
    pub fn new(
        ctx: BlockContext,
        params: &'a MarketParams,
        store: &'a mut MarketStore,
        bank: &'a mut dyn BankKeeper,
        prices: &'a dyn PriceFeed,
        events: &'a mut EventLog,
    ) -> Self {
        Self {
            ctx,
            params,
            store,
            bank,
            prices,
            hooks: HookRegistry::new(),
            events,
        }
    }

    /// Attach the listeners notified around every position change
    pub fn with_hooks(mut self, hooks: HookRegistry<'a>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn context(&self) -> &BlockContext {
        &self.ctx
    }

    pub fn store(&self) -> &MarketStore {
        self.store
    }

    /// Custody account for deposits and repayments
    pub fn module_address(&self) -> Address {
        Address::module(&self.params.module_name)
    }

    /// Coins held by the module account
    pub fn cash(&self) -> Coins {
        self.bank.balances(&self.module_address())
    }

    pub(crate) fn market(&self, denom: &str) -> MarketResult<&'a MoneyMarket> {
        self.params
            .money_market(denom)
            .ok_or_else(|| MarketError::MarketNotFound(denom.to_string()))
    }

    pub(crate) fn valuation(&self, denom: &str) -> MarketResult<Valuation> {
        let market = self.market(denom)?;
        let price = self
            .prices
            .get_current_price(&market.spot_market_id)
            .map_err(|_| MarketError::PriceNotFound(market.spot_market_id.clone()))?;
        Ok(Valuation {
            price: price.price,
            loan_to_value: market.borrow_limit.loan_to_value,
            conversion_factor: market.conversion_factor,
        })
    }

    /// Valuations for every denom held in either bag
    pub(crate) fn valuations(
        &self,
        deposit: &Coins,
        borrow: &Coins,
    ) -> MarketResult<BTreeMap<String, Valuation>> {
        let mut data = BTreeMap::new();
        for denom in deposit.denoms().chain(borrow.denoms()) {
            if !data.contains_key(denom) {
                data.insert(denom.to_string(), self.valuation(denom)?);
            }
        }
        Ok(data)
    }

    /// USD value of a bag of coins
    pub(crate) fn usd_value(&self, coins: &Coins) -> MarketResult<Decimal> {
        let mut total = Decimal::ZERO;
        for (denom, amount) in coins.iter() {
            total += self.valuation(denom)?.usd_value(amount.value());
        }
        Ok(total)
    }

    /// Sum of each deposit's USD value scaled by its loan-to-value ratio
    pub(crate) fn borrowable_usd(&self, deposit: &Coins) -> MarketResult<Decimal> {
        let mut total = Decimal::ZERO;
        for (denom, amount) in deposit.iter() {
            let valuation = self.valuation(denom)?;
            total += valuation.usd_value(amount.value()) * valuation.loan_to_value;
        }
        Ok(total)
    }

    /// Whether the borrow is covered by the deposit's loan-to-value capacity
    pub fn is_within_valid_ltv_range(&self, deposit: &Coins, borrow: &Coins) -> MarketResult<bool> {
        let data = self.valuations(deposit, borrow)?;
        let borrowable: Decimal = deposit
            .iter()
            .map(|(denom, amount)| {
                let v = &data[denom];
                v.usd_value(amount.value()) * v.loan_to_value
            })
            .sum();
        let borrowed: Decimal = borrow
            .iter()
            .map(|(denom, amount)| data[denom].usd_value(amount.value()))
            .sum();
        Ok(borrowed <= borrowable)
    }

    pub(crate) fn deposit_amount(&self, owner: &Address) -> Coins {
        self.store
            .deposit(owner)
            .map(|d| d.amount.clone())
            .unwrap_or_default()
    }

    pub(crate) fn borrow_amount(&self, owner: &Address) -> Coins {
        self.store
            .borrow(owner)
            .map(|b| b.amount.clone())
            .unwrap_or_default()
    }

    /// Fold accrued supply interest into the owner's deposit
    pub fn sync_supply_interest(&mut self, owner: &Address) {
        if let Some(mut deposit) = self.store.deposit(owner).cloned() {
            let (amount, index) =
                sync_position(&deposit.amount, &deposit.index, &self.store.supply_factors);
            deposit.amount = amount;
            deposit.index = index;
            self.store.set_deposit(deposit);
        }
    }

    /// Fold accrued borrow interest into the owner's borrow
    pub fn sync_borrow_interest(&mut self, owner: &Address) {
        if let Some(mut borrow) = self.store.borrow(owner).cloned() {
            let (amount, index) =
                sync_position(&borrow.amount, &borrow.index, &self.store.borrow_factors);
            borrow.amount = amount;
            borrow.index = index;
            self.store.set_borrow(borrow);
        }
    }

    /// Notify listeners before an existing position changes
    pub(crate) fn before_change(
        &mut self,
        owner: &Address,
        kind: PositionKind,
        current: &Coins,
    ) -> MarketResult<()> {
        if current.is_empty() {
            return Ok(());
        }
        trace!(owner = %owner, kind = %kind, "Position will change");
        self.hooks
            .dispatch(&LedgerEvent::will_change(owner, kind, shares_from_coins(current)))?;
        Ok(())
    }

    /// Notify listeners after a position changed
    pub(crate) fn after_change(
        &mut self,
        owner: &Address,
        kind: PositionKind,
        before: &Coins,
        after: &Coins,
    ) -> MarketResult<()> {
        if before.is_empty() && after.is_empty() {
            return Ok(());
        }
        self.hooks.dispatch(&LedgerEvent::did_change(
            owner,
            kind,
            shares_from_coins(before),
            shares_from_coins(after),
        ))?;
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: ModuleEvent) {
        self.events.emit(event);
    }
}
