//! Deposits

use harbor_core::{Address, Coins};
use harbor_events::{EventKind, ModuleEvent};
use harbor_hooks::PositionKind;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{MarketError, MarketResult};
use crate::keeper::MoneyMarketKeeper;
use crate::state::Deposit;

impl MoneyMarketKeeper<'_> {
    /// Supply `coins` from the depositor into the market
    pub fn deposit(&mut self, depositor: &Address, coins: &Coins) -> MarketResult<()> {
        if coins.is_empty() {
            return Err(MarketError::InvalidDeposit(
                "deposit coins must be positive".to_string(),
            ));
        }

        for denom in coins.denoms() {
            if self.store.supply_factor(denom).is_none() && self.params.money_market(denom).is_some()
            {
                self.store
                    .supply_factors
                    .insert(denom.to_string(), Decimal::ONE);
            }
        }

        let before = self.deposit_amount(depositor);
        self.before_change(depositor, PositionKind::Deposit, &before)?;
        self.sync_supply_interest(depositor);

        self.validate_deposit(coins)?;

        let module = self.module_address();
        self.bank.send(depositor, &module, coins, self.ctx.time)?;

        let mut deposit = self
            .store
            .deposit(depositor)
            .cloned()
            .unwrap_or_else(|| Deposit::new(depositor.clone(), Coins::empty(), Default::default()));
        for denom in coins.denoms() {
            if let Some(factor) = self.store.supply_factor(denom) {
                deposit.index.insert(denom.to_string(), factor);
            }
        }
        deposit.amount = deposit.amount.add(coins);
        let after = deposit.amount.clone();
        self.store.set_deposit(deposit);
        self.store.increment_supplied(coins);

        self.after_change(depositor, PositionKind::Deposit, &before, &after)?;

        info!(depositor = %depositor, amount = %coins, "Deposit");
        self.emit(
            ModuleEvent::new(EventKind::HardDeposit)
                .with("depositor", depositor)
                .with("amount", coins),
        );
        Ok(())
    }

    /// Every deposited denom must have a money market
    pub fn validate_deposit(&self, coins: &Coins) -> MarketResult<()> {
        for denom in coins.denoms() {
            if self.params.money_market(denom).is_none() {
                return Err(MarketError::InvalidDepositDenom(denom.to_string()));
            }
        }
        Ok(())
    }
}
