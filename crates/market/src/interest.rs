//! Interest accrual
//!
//! Each market keeps a supply factor and a borrow factor that start at 1 and
//! only grow. Positions store their amount together with the factor at their
//! last sync, so interest owed since then is `amount / user_factor *
//! global_factor - amount`.

use harbor_core::{elapsed_seconds, Amount, Coin, Coins, SECONDS_PER_YEAR};
use harbor_events::{EventKind, ModuleEvent};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, error};

use crate::error::{MarketError, MarketResult};
use crate::keeper::MoneyMarketKeeper;
use crate::params::InterestRateModel;
use crate::state::InterestFactors;

/// Fraction of lendable funds that is borrowed, clamped to [0, 1]
pub fn utilization_ratio(cash: Decimal, borrows: Decimal, reserves: Decimal) -> Decimal {
    if borrows.is_zero() {
        return Decimal::ZERO;
    }
    let total_supply = cash + borrows - reserves;
    if total_supply <= Decimal::ZERO {
        return Decimal::ONE;
    }
    (borrows / total_supply).min(Decimal::ONE)
}

/// Borrow APY for a utilization ratio
pub fn borrow_rate(model: &InterestRateModel, utilization: Decimal) -> Decimal {
    if utilization <= model.kink {
        utilization * model.base_multiplier + model.base_rate_apy
    } else {
        model.kink * model.base_multiplier
            + model.base_rate_apy
            + (utilization - model.kink) * model.jump_multiplier
    }
}

/// Supply APY realized by depositors
pub fn supply_rate(borrow_rate: Decimal, utilization: Decimal, reserve_factor: Decimal) -> Decimal {
    borrow_rate * utilization * (Decimal::ONE - reserve_factor)
}

/// Bring a position up to the global factors.
///
/// Returns the amount with accrued interest (truncated to whole units) and
/// the refreshed index. A denom the position has no factor for starts at the
/// global factor without interest; a denom without a global factor keeps its
/// stored index.
pub fn sync_position(
    amount: &Coins,
    index: &InterestFactors,
    global: &BTreeMap<String, Decimal>,
) -> (Coins, InterestFactors) {
    let mut synced = amount.clone();
    let mut new_index = InterestFactors::new();
    for (denom, stored) in amount.iter() {
        match global.get(denom) {
            Some(&global_factor) => {
                if let Some(user_factor) = index.get(denom).filter(|f| !f.is_zero()) {
                    let grown = stored.value() / user_factor * global_factor;
                    let interest =
                        Amount::truncate((grown - stored.value()).max(Decimal::ZERO))
                            .unwrap_or(Amount::ZERO);
                    synced.add_coin(&Coin::new(denom, interest));
                }
                new_index.insert(denom.to_string(), global_factor);
            }
            None => {
                if let Some(user_factor) = index.get(denom) {
                    new_index.insert(denom.to_string(), *user_factor);
                }
            }
        }
    }
    (synced, new_index)
}

impl MoneyMarketKeeper<'_> {
    /// Accrue interest for `denom` up to the block time
    pub fn accrue_interest(&mut self, denom: &str) -> MarketResult<()> {
        let now = self.ctx.time;
        let Some(previous) = self.store.accrual_time(denom) else {
            self.store.accrual_times.insert(denom.to_string(), now);
            return Ok(());
        };

        if now < previous {
            error!(denom, %previous, %now, "Accrual time moved backward");
            return Err(MarketError::Fatal(format!(
                "accrual time for {} moved backward from {} to {}",
                denom, previous, now
            )));
        }
        let elapsed = elapsed_seconds(previous, now);
        if elapsed == 0 {
            return Ok(());
        }

        let cash = self.bank.balance(&self.module_address(), denom).value();
        let borrowed = self.store.total_borrowed().amount_of(denom).value();
        if borrowed.is_zero() {
            self.store.accrual_times.insert(denom.to_string(), now);
            return Ok(());
        }
        let reserves = self.store.total_reserves().amount_of(denom).value();

        let market = self
            .params
            .money_market(denom)
            .ok_or_else(|| MarketError::MoneyMarketNotFound(denom.to_string()))?;
        let borrow_factor_prior = self.store.borrow_factor(denom).unwrap_or(Decimal::ONE);
        let supply_factor_prior = self.store.supply_factor(denom).unwrap_or(Decimal::ONE);

        let utilization = utilization_ratio(cash, borrowed, reserves);
        let borrow_apy = borrow_rate(&market.interest_rate_model, utilization);
        let year_fraction = Decimal::from(elapsed) / Decimal::from(SECONDS_PER_YEAR);

        let interest = Amount::truncate(borrowed * borrow_apy * year_fraction)
            .map_err(|e| MarketError::Fatal(format!("negative interest for {}: {}", denom, e)))?;
        if interest.is_zero() && borrow_apy > Decimal::ZERO {
            // Retry once enough time has passed for a whole unit to accrue
            return Ok(());
        }
        let reserves_new = Amount::truncate(interest.value() * market.reserve_factor)
            .map_err(|e| MarketError::Fatal(format!("negative reserves for {}: {}", denom, e)))?;
        let supply_interest = interest.saturating_sub(&reserves_new);

        let supply_apy = supply_rate(borrow_apy, utilization, market.reserve_factor);
        let borrow_factor = borrow_factor_prior * (Decimal::ONE + borrow_apy * year_fraction);
        let supply_factor = supply_factor_prior * (Decimal::ONE + supply_apy * year_fraction);

        self.store
            .borrow_factors
            .insert(denom.to_string(), borrow_factor);
        self.store
            .supply_factors
            .insert(denom.to_string(), supply_factor);
        self.store
            .increment_borrowed(&Coins::from(Coin::new(denom, interest)));
        self.store
            .increment_supplied(&Coins::from(Coin::new(denom, supply_interest)));
        self.store
            .increment_reserves(&Coins::from(Coin::new(denom, reserves_new)));
        if self.store.total_reserves.is_none() {
            self.store.total_reserves = Some(Coins::empty());
        }
        self.store.accrual_times.insert(denom.to_string(), now);

        debug!(
            denom,
            elapsed,
            %utilization,
            %borrow_factor,
            %supply_factor,
            %interest,
            "Interest accrued"
        );
        self.emit(
            ModuleEvent::new(EventKind::InterestAccrued)
                .with("denom", denom)
                .with("interest", interest)
                .with("reserves", reserves_new)
                .with("borrow_factor", borrow_factor)
                .with("supply_factor", supply_factor),
        );
        Ok(())
    }

    /// Accrue every configured market in denom order
    pub fn accrue_all_markets(&mut self) -> MarketResult<()> {
        for denom in self.params.denoms() {
            self.accrue_interest(&denom)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn model() -> InterestRateModel {
        InterestRateModel {
            base_rate_apy: dec!(0.05),
            base_multiplier: dec!(2),
            kink: dec!(0.8),
            jump_multiplier: dec!(10),
        }
    }

    #[test]
    fn test_utilization_edges() {
        assert_eq!(utilization_ratio(dec!(100), Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(utilization_ratio(dec!(60), dec!(40), Decimal::ZERO), dec!(0.4));
        assert_eq!(utilization_ratio(dec!(0), dec!(40), dec!(50)), Decimal::ONE);
        assert_eq!(utilization_ratio(dec!(5), dec!(40), dec!(10)), Decimal::ONE);
    }

    #[test]
    fn test_borrow_rate_below_kink() {
        assert_eq!(borrow_rate(&model(), dec!(0.5)), dec!(1.05));
    }

    #[test]
    fn test_borrow_rate_above_kink() {
        // 0.8 * 2 + 0.05 + 0.1 * 10
        assert_eq!(borrow_rate(&model(), dec!(0.9)), dec!(2.65));
    }

    #[test]
    fn test_supply_rate() {
        assert_eq!(supply_rate(dec!(1), dec!(0.5), dec!(0.1)), dec!(0.45));
    }

    #[test]
    fn test_sync_position_accrues_truncated_interest() {
        let amount = Coins::from(Coin::from_units("usdx", 1_000));
        let index: InterestFactors = [("usdx".to_string(), dec!(1.0))].into_iter().collect();
        let global: BTreeMap<String, Decimal> =
            [("usdx".to_string(), dec!(1.0015))].into_iter().collect();

        let (synced, new_index) = sync_position(&amount, &index, &global);
        assert_eq!(synced.amount_of("usdx"), Amount::from(1_001));
        assert_eq!(new_index.get("usdx"), Some(&dec!(1.0015)));
    }

    #[test]
    fn test_sync_position_new_denom_takes_global_factor() {
        let amount = Coins::from(Coin::from_units("usdx", 1_000));
        let global: BTreeMap<String, Decimal> =
            [("usdx".to_string(), dec!(1.2))].into_iter().collect();

        let (synced, new_index) = sync_position(&amount, &InterestFactors::new(), &global);
        assert_eq!(synced, amount);
        assert_eq!(new_index.get("usdx"), Some(&dec!(1.2)));
    }
}
