//! Account sum type

use harbor_core::{Address, Coins};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{AccountError, AccountResult};
use crate::vesting::{VestingAccount, VestingPeriod};

/// Account kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Ordinary user account
    Plain,
    /// User account with a periodic vesting schedule
    Vesting,
    /// Account owned by a module (custody for deposits, rewards, auctions)
    Module,
}

/// A plain user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: Address,
}

/// An account owned by a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAccount {
    pub address: Address,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Account {
    Plain(BaseAccount),
    Vesting(VestingAccount),
    Module(ModuleAccount),
}

impl Account {
    pub fn plain(address: Address) -> Self {
        Account::Plain(BaseAccount { address })
    }

    /// The account of module `name`
    pub fn module(name: &str) -> Self {
        Account::Module(ModuleAccount {
            address: Address::module(name),
            name: name.to_string(),
        })
    }

    /// Default account for an address that has none yet
    pub fn for_address(address: &Address) -> Self {
        match address.as_str().strip_prefix("module/") {
            Some(name) => Account::module(name),
            None => Account::plain(address.clone()),
        }
    }

    pub fn address(&self) -> &Address {
        match self {
            Account::Plain(acc) => &acc.address,
            Account::Vesting(acc) => &acc.address,
            Account::Module(acc) => &acc.address,
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            Account::Plain(_) => AccountKind::Plain,
            Account::Vesting(_) => AccountKind::Vesting,
            Account::Module(_) => AccountKind::Module,
        }
    }

    /// Coins that may not leave the account at `now`
    pub fn locked_coins(&self, now: i64) -> Coins {
        match self {
            Account::Vesting(acc) => acc.vesting_coins(now),
            _ => Coins::empty(),
        }
    }

    /// Turn a plain account into a vesting account holding one period of
    /// `amount` that unlocks `length` seconds after `now`.
    pub fn promote(self, now: i64, amount: &Coins, length: i64) -> AccountResult<Account> {
        match self {
            Account::Plain(acc) => Ok(Account::Vesting(VestingAccount::new(
                acc.address,
                now,
                vec![VestingPeriod::new(length, amount.clone())],
            ))),
            other => Err(AccountError::InvalidAccountType {
                address: other.address().clone(),
                kind: other.kind().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harbor_core::Coin;

    #[test]
    fn test_for_address_detects_module() {
        let acc = Account::for_address(&Address::module("incentive"));
        assert_eq!(acc.kind(), AccountKind::Module);
        let acc = Account::for_address(&Address::new("kava1bob"));
        assert_eq!(acc.kind(), AccountKind::Plain);
    }

    #[test]
    fn test_promote_plain_to_vesting() {
        let amount = Coins::from(Coin::from_units("hard", 100));
        let acc = Account::plain(Address::new("kava1bob"))
            .promote(1_000, &amount, 50)
            .unwrap();
        match acc {
            Account::Vesting(v) => {
                assert_eq!(v.start_time, 1_000);
                assert_eq!(v.end_time, 1_050);
                assert_eq!(v.original_vesting, amount);
                assert_eq!(v.periods.len(), 1);
            }
            other => panic!("expected vesting account, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_promote_module_rejected() {
        let result = Account::module("hard").promote(0, &Coins::empty(), 10);
        assert!(matches!(result, Err(AccountError::InvalidAccountType { .. })));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(AccountKind::Vesting.to_string(), "vesting");
    }
}
