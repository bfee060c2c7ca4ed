//! Account and bank contracts used by the market and incentive modules

use chrono::{DateTime, Utc};
use harbor_core::{Address, Amount, Coins};

use crate::account::Account;
use crate::error::AccountResult;

/// Account lookup and storage
pub trait AccountKeeper {
    fn get_account(&self, address: &Address) -> Option<Account>;

    fn set_account(&mut self, account: Account);
}

/// Balances and transfers.
///
/// `send` moves coins between any two addresses; it creates a default
/// account for a recipient that has none and refuses to move coins that are
/// still locked in a vesting schedule at `now`.
pub trait BankKeeper {
    /// All balances of an address
    fn balances(&self, address: &Address) -> Coins;

    fn balance(&self, address: &Address, denom: &str) -> Amount {
        self.balances(address).amount_of(denom)
    }

    /// Balances minus coins still locked at `now`
    fn spendable_coins(&self, address: &Address, now: DateTime<Utc>) -> Coins;

    fn send(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &Coins,
        now: DateTime<Utc>,
    ) -> AccountResult<()>;

    /// Create new coins in an account
    fn mint(&mut self, to: &Address, amount: &Coins);
}
