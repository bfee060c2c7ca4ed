//! In-memory bank

use chrono::{DateTime, Utc};
use harbor_core::{unique, Address, Coins};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::account::Account;
use crate::error::{AccountError, AccountResult};
use crate::keeper::{AccountKeeper, BankKeeper};

/// Accounts and balances kept in ordered maps.
///
/// Cloning the bank is how the application snapshots state before a message
/// and restores it when the message fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(deserialize_with = "unique::map")]
    accounts: BTreeMap<Address, Account>,
    #[serde(deserialize_with = "unique::map")]
    balances: BTreeMap<Address, Coins>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the account of module `name` if missing
    pub fn register_module(&mut self, name: &str) -> Address {
        let address = Address::module(name);
        self.accounts
            .entry(address.clone())
            .or_insert_with(|| Account::module(name));
        address
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Every address with a positive balance
    pub fn all_balances(&self) -> impl Iterator<Item = (&Address, &Coins)> {
        self.balances.iter().filter(|(_, coins)| !coins.is_empty())
    }

    /// Sum of all balances
    pub fn supply(&self) -> Coins {
        self.balances
            .values()
            .fold(Coins::empty(), |acc, coins| acc.add(coins))
    }

    fn ensure_account(&mut self, address: &Address) {
        self.accounts
            .entry(address.clone())
            .or_insert_with(|| Account::for_address(address));
    }
}

impl AccountKeeper for Bank {
    fn get_account(&self, address: &Address) -> Option<Account> {
        self.accounts.get(address).cloned()
    }

    fn set_account(&mut self, account: Account) {
        self.accounts.insert(account.address().clone(), account);
    }
}

impl BankKeeper for Bank {
    fn balances(&self, address: &Address) -> Coins {
        self.balances.get(address).cloned().unwrap_or_default()
    }

    fn spendable_coins(&self, address: &Address, now: DateTime<Utc>) -> Coins {
        let balances = self.balances(address);
        match self.accounts.get(address) {
            Some(account) => balances.saturating_sub(&account.locked_coins(now.timestamp())),
            None => balances,
        }
    }

    fn send(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &Coins,
        now: DateTime<Utc>,
    ) -> AccountResult<()> {
        if amount.is_empty() {
            return Ok(());
        }
        let spendable = self.spendable_coins(from, now);
        if !spendable.is_all_gte(amount) {
            return Err(AccountError::InsufficientFunds {
                address: from.clone(),
                available: spendable,
                required: amount.clone(),
            });
        }
        let remaining = self
            .balances(from)
            .checked_sub(amount)
            .ok_or_else(|| AccountError::InsufficientFunds {
                address: from.clone(),
                available: spendable.clone(),
                required: amount.clone(),
            })?;
        self.balances.insert(from.clone(), remaining);

        self.ensure_account(to);
        let credited = self.balances(to).add(amount);
        self.balances.insert(to.clone(), credited);

        debug!(from = %from, to = %to, amount = %amount, "Coins sent");
        Ok(())
    }

    fn mint(&mut self, to: &Address, amount: &Coins) {
        self.ensure_account(to);
        let credited = self.balances(to).add(amount);
        self.balances.insert(to.clone(), credited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vesting::{VestingAccount, VestingPeriod};
    use chrono::TimeZone;
    use harbor_core::Coin;

    fn kava(units: u64) -> Coins {
        Coins::from(Coin::from_units("ukava", units))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_send_moves_coins_and_creates_recipient() {
        let mut bank = Bank::new();
        let alice = Address::new("kava1alice");
        let bob = Address::new("kava1bob");
        bank.mint(&alice, &kava(100));

        bank.send(&alice, &bob, &kava(40), now()).unwrap();

        assert_eq!(bank.balances(&alice), kava(60));
        assert_eq!(bank.balances(&bob), kava(40));
        assert!(bank.get_account(&bob).is_some());
    }

    #[test]
    fn test_send_insufficient_funds() {
        let mut bank = Bank::new();
        let alice = Address::new("kava1alice");
        bank.mint(&alice, &kava(10));

        let result = bank.send(&alice, &Address::new("kava1bob"), &kava(11), now());
        assert!(matches!(result, Err(AccountError::InsufficientFunds { .. })));
        assert_eq!(bank.balances(&alice), kava(10));
    }

    #[test]
    fn test_vesting_coins_are_not_spendable() {
        let mut bank = Bank::new();
        let alice = Address::new("kava1alice");
        bank.mint(&alice, &kava(100));
        let start = now().timestamp();
        bank.set_account(Account::Vesting(VestingAccount::new(
            alice.clone(),
            start,
            vec![VestingPeriod::new(60, kava(70))],
        )));

        assert_eq!(bank.spendable_coins(&alice, now()), kava(30));
        let result = bank.send(&alice, &Address::new("kava1bob"), &kava(31), now());
        assert!(matches!(result, Err(AccountError::InsufficientFunds { .. })));

        let later = now() + chrono::Duration::seconds(60);
        assert_eq!(bank.spendable_coins(&alice, later), kava(100));
    }

    #[test]
    fn test_register_module() {
        let mut bank = Bank::new();
        let addr = bank.register_module("hard");
        assert!(matches!(bank.get_account(&addr), Some(Account::Module(_))));
    }
}
