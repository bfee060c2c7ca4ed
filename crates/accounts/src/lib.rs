//! Harbor Accounts
//!
//! Accounts are a closed sum type: plain user accounts, periodic vesting
//! accounts and module accounts. A plain account becomes a vesting account
//! through a single `promote` step when it first receives time-locked coins.
//!
//! The money market and the reward engine reach balances only through the
//! `AccountKeeper` and `BankKeeper` contracts; `Bank` is the in-memory
//! implementation used by the application.

pub mod account;
pub mod bank;
pub mod error;
pub mod keeper;
pub mod timelock;
pub mod vesting;

pub use account::{Account, AccountKind, BaseAccount, ModuleAccount};
pub use bank::Bank;
pub use error::{AccountError, AccountResult};
pub use keeper::{AccountKeeper, BankKeeper};
pub use timelock::send_time_locked_coins;
pub use vesting::{VestingAccount, VestingPeriod};
