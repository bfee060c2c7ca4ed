//! Money market store
//!
//! Positions are keyed by owner. Interest factors and accrual times are keyed
//! by denom and only change through interest accrual. Aggregate totals are
//! `None` until first recorded, which distinguishes "never recorded" from
//! "recorded and now zero".

use chrono::{DateTime, Utc};
use harbor_core::{unique, Address, Coins};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{MarketError, MarketResult};

/// Per-denom interest factor snapshot held by a position
pub type InterestFactors = BTreeMap<String, Decimal>;

/// Coins supplied by one owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub depositor: Address,
    pub amount: Coins,
    /// Supply factor per denom as of the last interest sync
    #[serde(deserialize_with = "unique::map")]
    pub index: InterestFactors,
}

impl Deposit {
    pub fn new(depositor: Address, amount: Coins, index: InterestFactors) -> Self {
        Self {
            depositor,
            amount,
            index,
        }
    }
}

/// Coins owed by one owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrow {
    pub borrower: Address,
    pub amount: Coins,
    /// Borrow factor per denom as of the last interest sync
    #[serde(deserialize_with = "unique::map")]
    pub index: InterestFactors,
}

impl Borrow {
    pub fn new(borrower: Address, amount: Coins, index: InterestFactors) -> Self {
        Self {
            borrower,
            amount,
            index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStore {
    #[serde(default, deserialize_with = "unique::map")]
    pub deposits: BTreeMap<Address, Deposit>,
    #[serde(default, deserialize_with = "unique::map")]
    pub borrows: BTreeMap<Address, Borrow>,
    #[serde(default, deserialize_with = "unique::map")]
    pub supply_factors: BTreeMap<String, Decimal>,
    #[serde(default, deserialize_with = "unique::map")]
    pub borrow_factors: BTreeMap<String, Decimal>,
    #[serde(default, deserialize_with = "unique::map")]
    pub accrual_times: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    pub total_supplied: Option<Coins>,
    #[serde(default)]
    pub total_borrowed: Option<Coins>,
    #[serde(default)]
    pub total_reserves: Option<Coins>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&self, owner: &Address) -> Option<&Deposit> {
        self.deposits.get(owner)
    }

    pub fn borrow(&self, owner: &Address) -> Option<&Borrow> {
        self.borrows.get(owner)
    }

    /// Store a deposit, deleting it when empty
    pub fn set_deposit(&mut self, deposit: Deposit) {
        if deposit.amount.is_empty() {
            self.deposits.remove(&deposit.depositor);
        } else {
            self.deposits.insert(deposit.depositor.clone(), deposit);
        }
    }

    /// Store a borrow, deleting it when empty
    pub fn set_borrow(&mut self, borrow: Borrow) {
        if borrow.amount.is_empty() {
            self.borrows.remove(&borrow.borrower);
        } else {
            self.borrows.insert(borrow.borrower.clone(), borrow);
        }
    }

    pub fn remove_deposit(&mut self, owner: &Address) -> Option<Deposit> {
        self.deposits.remove(owner)
    }

    pub fn remove_borrow(&mut self, owner: &Address) -> Option<Borrow> {
        self.borrows.remove(owner)
    }

    pub fn supply_factor(&self, denom: &str) -> Option<Decimal> {
        self.supply_factors.get(denom).copied()
    }

    pub fn borrow_factor(&self, denom: &str) -> Option<Decimal> {
        self.borrow_factors.get(denom).copied()
    }

    pub fn accrual_time(&self, denom: &str) -> Option<DateTime<Utc>> {
        self.accrual_times.get(denom).copied()
    }

    pub fn total_supplied(&self) -> Coins {
        self.total_supplied.clone().unwrap_or_default()
    }

    pub fn total_borrowed(&self) -> Coins {
        self.total_borrowed.clone().unwrap_or_default()
    }

    pub fn total_reserves(&self) -> Coins {
        self.total_reserves.clone().unwrap_or_default()
    }

    pub fn increment_supplied(&mut self, coins: &Coins) {
        increment(&mut self.total_supplied, coins);
    }

    pub fn increment_borrowed(&mut self, coins: &Coins) {
        increment(&mut self.total_borrowed, coins);
    }

    pub fn increment_reserves(&mut self, coins: &Coins) {
        increment(&mut self.total_reserves, coins);
    }

    /// Decrease total supplied, clamping each denom at the tracked total
    pub fn decrement_supplied(&mut self, coins: &Coins) -> MarketResult<()> {
        decrement(&mut self.total_supplied, coins, "supplied")
            .ok_or(MarketError::SuppliedCoinsNotFound)
    }

    /// Decrease total borrowed, clamping each denom at the tracked total
    pub fn decrement_borrowed(&mut self, coins: &Coins) -> MarketResult<()> {
        decrement(&mut self.total_borrowed, coins, "borrowed")
            .ok_or(MarketError::BorrowedCoinsNotFound)
    }
}

fn increment(total: &mut Option<Coins>, coins: &Coins) {
    match total {
        Some(current) => *current = current.add(coins),
        None if !coins.is_empty() => *total = Some(coins.clone()),
        None => {}
    }
}

fn decrement(total: &mut Option<Coins>, coins: &Coins, which: &str) -> Option<()> {
    let current = total.as_mut()?;
    if !current.is_all_gte(coins) {
        warn!(total = %current, decrement = %coins, which, "Clamping total at zero");
    }
    *current = current.saturating_sub(coins);
    Some(())
}
