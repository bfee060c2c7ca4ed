//! Borrows

use harbor_core::{Address, Coins};
use harbor_events::{EventKind, ModuleEvent};
use harbor_hooks::PositionKind;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{MarketError, MarketResult};
use crate::keeper::MoneyMarketKeeper;
use crate::state::Borrow;

impl MoneyMarketKeeper<'_> {
    /// Borrow `coins` against the borrower's deposit
    pub fn borrow(&mut self, borrower: &Address, coins: &Coins) -> MarketResult<()> {
        for denom in coins.denoms() {
            if self.store.borrow_factor(denom).is_none() && self.params.money_market(denom).is_some()
            {
                self.store
                    .borrow_factors
                    .insert(denom.to_string(), Decimal::ONE);
            }
        }

        let deposit_before = self.deposit_amount(borrower);
        let borrow_before = self.borrow_amount(borrower);
        self.before_change(borrower, PositionKind::Deposit, &deposit_before)?;
        self.before_change(borrower, PositionKind::Borrow, &borrow_before)?;

        self.sync_supply_interest(borrower);
        self.sync_borrow_interest(borrower);

        self.validate_borrow(borrower, coins)?;

        let module = self.module_address();
        self.bank.send(&module, borrower, coins, self.ctx.time)?;

        let mut borrow = self
            .store
            .borrow(borrower)
            .cloned()
            .unwrap_or_else(|| Borrow::new(borrower.clone(), Coins::empty(), Default::default()));
        for denom in coins.denoms() {
            if let Some(factor) = self.store.borrow_factor(denom) {
                borrow.index.insert(denom.to_string(), factor);
            }
        }
        borrow.amount = borrow.amount.add(coins);
        let borrow_after = borrow.amount.clone();
        self.store.set_borrow(borrow);

        // Interest already accrued into the totals by the begin-block pass
        self.store.increment_borrowed(coins);

        let deposit_after = self.deposit_amount(borrower);
        self.after_change(borrower, PositionKind::Deposit, &deposit_before, &deposit_after)?;
        self.after_change(borrower, PositionKind::Borrow, &borrow_before, &borrow_after)?;

        info!(borrower = %borrower, amount = %coins, "Borrow");
        self.emit(
            ModuleEvent::new(EventKind::HardBorrow)
                .with("borrower", borrower)
                .with("amount", coins),
        );
        Ok(())
    }

    /// Check a borrow request against protocol and borrower limits
    pub fn validate_borrow(&self, borrower: &Address, coins: &Coins) -> MarketResult<()> {
        if coins.is_empty() {
            return Err(MarketError::BorrowEmptyCoins);
        }

        // Reserves are not available to borrowers
        let cash = self.cash();
        let reserves = self.store.total_reserves();
        let available = cash
            .checked_sub(&reserves)
            .ok_or_else(|| MarketError::ReservesExceedCash {
                reserves: reserves.clone(),
                cash: cash.clone(),
            })?;
        if !available.is_all_gte(coins) {
            return Err(MarketError::ExceedsProtocolBorrowableBalance {
                requested: coins.clone(),
                available,
            });
        }

        let total_borrowed = self.store.total_borrowed();
        let mut proposed_usd = Decimal::ZERO;
        for (denom, amount) in coins.iter() {
            let market = self.market(denom)?;
            let valuation = self.valuation(denom)?;
            if market.borrow_limit.has_max_limit {
                let proposed = total_borrowed.amount_of(denom).value() + amount.value();
                if proposed > market.borrow_limit.maximum_limit {
                    return Err(MarketError::GreaterThanAssetBorrowLimit {
                        denom: denom.to_string(),
                        proposed,
                        limit: market.borrow_limit.maximum_limit,
                    });
                }
            }
            proposed_usd += valuation.usd_value(amount.value());
        }

        let deposit = self
            .store
            .deposit(borrower)
            .ok_or_else(|| MarketError::DepositsNotFound(borrower.clone()))?;
        let borrowable_usd = self.borrowable_usd(&deposit.amount)?;
        let existing_usd = self.usd_value(&self.borrow_amount(borrower))?;

        let total_usd = proposed_usd + existing_usd;
        if total_usd < self.params.minimum_borrow_usd_value {
            return Err(MarketError::BelowMinimumBorrowValue {
                value: total_usd,
                minimum: self.params.minimum_borrow_usd_value,
            });
        }

        let allowed = borrowable_usd - existing_usd;
        if proposed_usd > allowed {
            warn!(borrower = %borrower, %proposed_usd, %allowed, "Borrow exceeds loan-to-value");
            return Err(MarketError::InsufficientLoanToValue {
                proposed: proposed_usd,
                allowed,
            });
        }
        Ok(())
    }
}
