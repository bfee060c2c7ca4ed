//! Withdrawals

use harbor_core::{Address, Coin, Coins};
use harbor_events::{EventKind, ModuleEvent};
use harbor_hooks::PositionKind;
use tracing::info;

use crate::error::{MarketError, MarketResult};
use crate::keeper::MoneyMarketKeeper;

/// Cap each requested denom at the amount available.
///
/// Fails when a requested denom is not held at all.
pub fn calculate_withdraw_amount(available: &Coins, request: &Coins) -> MarketResult<Coins> {
    if !request.denoms_subset_of(available) {
        return Err(MarketError::InvalidWithdrawDenom {
            requested: request.clone(),
            available: available.clone(),
        });
    }
    Ok(request
        .iter()
        .map(|(denom, amount)| Coin::new(denom, amount.min(available.amount_of(denom))))
        .collect())
}

impl MoneyMarketKeeper<'_> {
    /// Withdraw up to `coins` from the depositor's deposit
    pub fn withdraw(&mut self, depositor: &Address, coins: &Coins) -> MarketResult<()> {
        if self.store.deposit(depositor).is_none() {
            return Err(MarketError::DepositNotFound(depositor.clone()));
        }

        let borrow_before = self.borrow_amount(depositor);
        let deposit_before = self.deposit_amount(depositor);
        self.before_change(depositor, PositionKind::Borrow, &borrow_before)?;
        self.before_change(depositor, PositionKind::Deposit, &deposit_before)?;

        self.sync_borrow_interest(depositor);
        self.sync_supply_interest(depositor);

        let mut deposit = self
            .store
            .deposit(depositor)
            .cloned()
            .ok_or_else(|| MarketError::DepositNotFound(depositor.clone()))?;
        let amount = calculate_withdraw_amount(&deposit.amount, coins)?;
        let proposed = deposit.amount.saturating_sub(&amount);

        let borrow = self.borrow_amount(depositor);
        if !self.is_within_valid_ltv_range(&proposed, &borrow)? {
            return Err(MarketError::InvalidWithdrawAmount);
        }

        let module = self.module_address();
        self.bank.send(&module, depositor, &amount, self.ctx.time)?;

        for denom in deposit.amount.denoms() {
            if !proposed.contains(denom) && deposit.index.remove(denom).is_none() {
                return Err(MarketError::InvalidIndexFactorDenom(denom.to_string()));
            }
        }

        self.store.decrement_supplied(&amount)?;
        deposit.amount = proposed.clone();
        self.store.set_deposit(deposit);

        let borrow_after = self.borrow_amount(depositor);
        self.after_change(depositor, PositionKind::Borrow, &borrow_before, &borrow_after)?;
        self.after_change(depositor, PositionKind::Deposit, &deposit_before, &proposed)?;

        info!(depositor = %depositor, amount = %amount, "Withdrawal");
        self.emit(
            ModuleEvent::new(EventKind::HardWithdrawal)
                .with("depositor", depositor)
                .with("amount", &amount),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(pairs: &[(&str, u64)]) -> Coins {
        pairs
            .iter()
            .map(|(denom, units)| Coin::from_units(*denom, *units))
            .collect()
    }

    #[test]
    fn test_withdraw_amount_is_capped() {
        let available = coins(&[("ukava", 10), ("usdx", 5)]);
        let amount = calculate_withdraw_amount(&available, &coins(&[("ukava", 50)])).unwrap();
        assert_eq!(amount, coins(&[("ukava", 10)]));
    }

    #[test]
    fn test_withdraw_unknown_denom() {
        let available = coins(&[("ukava", 10)]);
        let result = calculate_withdraw_amount(&available, &coins(&[("usdx", 1)]));
        assert!(matches!(result, Err(MarketError::InvalidWithdrawDenom { .. })));
    }
}
