//! Repayments

use harbor_core::{Address, Coin, Coins};
use harbor_events::{EventKind, ModuleEvent};
use harbor_hooks::PositionKind;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{MarketError, MarketResult};
use crate::keeper::MoneyMarketKeeper;

/// Cap each payment denom at the amount owed.
///
/// Fails when a payment denom is not owed at all.
pub fn calculate_payment_amount(owed: &Coins, payment: &Coins) -> MarketResult<Coins> {
    if !payment.denoms_subset_of(owed) {
        return Err(MarketError::InvalidRepaymentDenom {
            requested: payment.clone(),
            owed: owed.clone(),
        });
    }
    Ok(payment
        .iter()
        .map(|(denom, amount)| Coin::new(denom, amount.min(owed.amount_of(denom))))
        .collect())
}

impl MoneyMarketKeeper<'_> {
    /// Repay `owner`'s borrow with coins from `sender`
    pub fn repay(&mut self, sender: &Address, owner: &Address, coins: &Coins) -> MarketResult<()> {
        if self.store.borrow(owner).is_none() {
            return Err(MarketError::BorrowNotFound(owner.clone()));
        }

        let before = self.borrow_amount(owner);
        self.before_change(owner, PositionKind::Borrow, &before)?;
        self.sync_borrow_interest(owner);

        let mut borrow = self
            .store
            .borrow(owner)
            .cloned()
            .ok_or_else(|| MarketError::BorrowNotFound(owner.clone()))?;
        let payment = calculate_payment_amount(&borrow.amount, coins)?;
        self.validate_repay(sender, &borrow.amount, &payment)?;

        let module = self.module_address();
        self.bank.send(sender, &module, &payment, self.ctx.time)?;

        for (denom, amount) in payment.iter() {
            if amount == borrow.amount.amount_of(denom) && borrow.index.remove(denom).is_none() {
                return Err(MarketError::InvalidIndexFactorDenom(denom.to_string()));
            }
        }
        borrow.amount = borrow.amount.saturating_sub(&payment);
        let after = borrow.amount.clone();
        self.store.set_borrow(borrow);
        self.store.decrement_borrowed(&payment)?;

        self.after_change(owner, PositionKind::Borrow, &before, &after)?;

        info!(sender = %sender, owner = %owner, amount = %payment, "Repay");
        self.emit(
            ModuleEvent::new(EventKind::HardRepay)
                .with("sender", sender)
                .with("owner", owner)
                .with("amount", &payment),
        );
        Ok(())
    }

    /// The sender must hold the payment, and a partial repayment may not
    /// leave a borrow worth less than the minimum
    pub fn validate_repay(&self, sender: &Address, owed: &Coins, payment: &Coins) -> MarketResult<()> {
        let spendable = self.bank.spendable_coins(sender, self.ctx.time);
        for (denom, amount) in payment.iter() {
            if spendable.amount_of(denom) < amount {
                return Err(MarketError::InsufficientBalanceForRepay {
                    address: sender.clone(),
                    available: spendable.only(denom),
                });
            }
            self.valuation(denom)?;
        }

        let mut remaining_usd = Decimal::ZERO;
        for (denom, amount) in owed.iter() {
            let remaining = amount.saturating_sub(&payment.amount_of(denom));
            remaining_usd += self.valuation(denom)?.usd_value(remaining.value());
        }
        if remaining_usd > Decimal::ZERO && remaining_usd < self.params.minimum_borrow_usd_value {
            return Err(MarketError::BelowMinimumBorrowValue {
                value: remaining_usd,
                minimum: self.params.minimum_borrow_usd_value,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_capped_at_owed() {
        let owed = Coins::from(Coin::from_units("usdx", 100));
        let payment = calculate_payment_amount(&owed, &Coins::from(Coin::from_units("usdx", 250))).unwrap();
        assert_eq!(payment, owed);
    }

    #[test]
    fn test_payment_in_unowed_denom() {
        let owed = Coins::from(Coin::from_units("usdx", 100));
        let result = calculate_payment_amount(&owed, &Coins::from(Coin::from_units("ukava", 1)));
        assert!(matches!(result, Err(MarketError::InvalidRepaymentDenom { .. })));
    }
}
