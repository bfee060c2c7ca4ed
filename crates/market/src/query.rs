//! Read-only market views
//!
//! Synced views apply the current global factors to stored positions without
//! writing anything back.

use harbor_core::{Address, Coins};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::interest::{borrow_rate, supply_rate, sync_position, utilization_ratio};
use crate::params::MarketParams;
use crate::state::{Borrow, Deposit, MarketStore};

/// Current borrow and supply APY of a market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyMarketInterestRate {
    pub denom: String,
    pub supply_interest_rate: Decimal,
    pub borrow_interest_rate: Decimal,
}

/// Global factors of a denom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestFactor {
    pub denom: String,
    pub supply_interest_factor: Decimal,
    pub borrow_interest_factor: Decimal,
}

fn matches_filter(
    owner: &Address,
    amount: &Coins,
    by_owner: Option<&Address>,
    by_denom: Option<&str>,
) -> bool {
    by_owner.map_or(true, |o| o == owner) && by_denom.map_or(true, |d| amount.contains(d))
}

/// Stored deposits, optionally filtered by owner and denom
pub fn deposits(store: &MarketStore, owner: Option<&Address>, denom: Option<&str>) -> Vec<Deposit> {
    store
        .deposits
        .values()
        .filter(|d| matches_filter(&d.depositor, &d.amount, owner, denom))
        .cloned()
        .collect()
}

/// Stored borrows, optionally filtered by owner and denom
pub fn borrows(store: &MarketStore, owner: Option<&Address>, denom: Option<&str>) -> Vec<Borrow> {
    store
        .borrows
        .values()
        .filter(|b| matches_filter(&b.borrower, &b.amount, owner, denom))
        .cloned()
        .collect()
}

/// A deposit with interest accrued up to the current supply factors
pub fn synced_deposit(store: &MarketStore, deposit: &Deposit) -> Deposit {
    let (amount, index) = sync_position(&deposit.amount, &deposit.index, &store.supply_factors);
    Deposit::new(deposit.depositor.clone(), amount, index)
}

/// A borrow with interest accrued up to the current borrow factors
pub fn synced_borrow(store: &MarketStore, borrow: &Borrow) -> Borrow {
    let (amount, index) = sync_position(&borrow.amount, &borrow.index, &store.borrow_factors);
    Borrow::new(borrow.borrower.clone(), amount, index)
}

/// Coins of the denom only, or all coins
pub fn filter_denom(coins: Coins, denom: Option<&str>) -> Coins {
    match denom {
        Some(denom) => coins.only(denom),
        None => coins,
    }
}

/// Interest rates of every market (or one), given the module's cash
pub fn interest_rates(
    params: &MarketParams,
    store: &MarketStore,
    cash: &Coins,
    denom: Option<&str>,
) -> Vec<MoneyMarketInterestRate> {
    let borrowed = store.total_borrowed();
    let reserves = store.total_reserves();
    params
        .money_markets
        .iter()
        .filter(|m| denom.map_or(true, |d| d == m.denom))
        .map(|market| {
            let utilization = utilization_ratio(
                cash.amount_of(&market.denom).value(),
                borrowed.amount_of(&market.denom).value(),
                reserves.amount_of(&market.denom).value(),
            );
            let borrow_apy = borrow_rate(&market.interest_rate_model, utilization);
            MoneyMarketInterestRate {
                denom: market.denom.clone(),
                supply_interest_rate: supply_rate(borrow_apy, utilization, market.reserve_factor),
                borrow_interest_rate: borrow_apy,
            }
        })
        .collect()
}

/// Global interest factors of every denom that has one
pub fn interest_factors(store: &MarketStore, denom: Option<&str>) -> Vec<InterestFactor> {
    let mut denoms: Vec<&String> = store
        .supply_factors
        .keys()
        .chain(store.borrow_factors.keys())
        .filter(|d| denom.map_or(true, |f| f == d.as_str()))
        .collect();
    denoms.sort();
    denoms.dedup();
    denoms
        .into_iter()
        .map(|d| InterestFactor {
            denom: d.clone(),
            supply_interest_factor: store.supply_factor(d).unwrap_or(Decimal::ONE),
            borrow_interest_factor: store.borrow_factor(d).unwrap_or(Decimal::ONE),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InterestFactors;
    use harbor_core::{Amount, Coin};
    use rust_decimal_macros::dec;

    fn store_with_deposits() -> MarketStore {
        let mut store = MarketStore::new();
        let index: InterestFactors = [("ukava".to_string(), dec!(1))].into_iter().collect();
        store.set_deposit(Deposit::new(
            Address::new("kava1alice"),
            Coins::from(Coin::from_units("ukava", 100)),
            index.clone(),
        ));
        store.set_deposit(Deposit::new(
            Address::new("kava1bob"),
            Coins::from(Coin::from_units("usdx", 100)),
            InterestFactors::new(),
        ));
        store.supply_factors.insert("ukava".to_string(), dec!(1.5));
        store
    }

    #[test]
    fn test_deposit_filters() {
        let store = store_with_deposits();
        assert_eq!(deposits(&store, None, None).len(), 2);
        assert_eq!(deposits(&store, None, Some("usdx")).len(), 1);
        assert_eq!(
            deposits(&store, Some(&Address::new("kava1alice")), Some("usdx")).len(),
            0
        );
    }

    #[test]
    fn test_synced_deposit_does_not_write() {
        let store = store_with_deposits();
        let stored = store.deposit(&Address::new("kava1alice")).unwrap().clone();
        let synced = synced_deposit(&store, &stored);
        assert_eq!(synced.amount.amount_of("ukava"), Amount::from(150));
        assert_eq!(
            store.deposit(&Address::new("kava1alice")).unwrap().amount,
            stored.amount
        );
    }

    #[test]
    fn test_interest_factors_listed_once() {
        let mut store = store_with_deposits();
        store.borrow_factors.insert("ukava".to_string(), dec!(2));
        let factors = interest_factors(&store, None);
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].borrow_interest_factor, dec!(2));
    }
}
