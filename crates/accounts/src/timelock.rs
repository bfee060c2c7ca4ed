//! Time-locked transfers from module accounts

use chrono::{DateTime, Utc};
use harbor_core::{Address, Coins};
use tracing::info;

use crate::account::{Account, AccountKind};
use crate::error::{AccountError, AccountResult};
use crate::keeper::{AccountKeeper, BankKeeper};

/// Send `amount` from module account `sender` to `receiver`, locked until
/// `length` seconds after `now`.
///
/// A zero length is a plain transfer. Otherwise a plain receiver is promoted
/// to a vesting account and an existing vesting receiver has the amount
/// spliced into its schedule. Module receivers cannot hold locked coins.
pub fn send_time_locked_coins<K>(
    keeper: &mut K,
    now: DateTime<Utc>,
    sender: &Address,
    receiver: &Address,
    amount: &Coins,
    length: i64,
) -> AccountResult<()>
where
    K: AccountKeeper + BankKeeper + ?Sized,
{
    let available = keeper.balances(sender);
    if !available.is_all_gte(amount) {
        return Err(AccountError::InsufficientModuleAccountBalance {
            module: sender.clone(),
            available,
            required: amount.clone(),
        });
    }

    let account = keeper
        .get_account(receiver)
        .ok_or_else(|| AccountError::AccountNotFound(receiver.clone()))?;

    if length == 0 {
        return keeper.send(sender, receiver, amount, now);
    }

    let unix_now = now.timestamp();
    let locked = match account {
        Account::Module(_) => {
            return Err(AccountError::InvalidAccountType {
                address: receiver.clone(),
                kind: AccountKind::Module.to_string(),
            })
        }
        plain @ Account::Plain(_) => plain.promote(unix_now, amount, length)?,
        Account::Vesting(mut vesting) => {
            vesting.add_to_schedule(unix_now, amount, length);
            Account::Vesting(vesting)
        }
    };

    keeper.send(sender, receiver, amount, now)?;
    keeper.set_account(locked);
    info!(receiver = %receiver, amount = %amount, length, "Time-locked coins sent");
    Ok(())
}
