//! Account and bank errors

use harbor_core::{Address, Coins};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Insufficient funds for {address}: spendable {available}, required {required}")]
    InsufficientFunds {
        address: Address,
        available: Coins,
        required: Coins,
    },

    #[error("Insufficient module account balance for {module}: available {available}, required {required}")]
    InsufficientModuleAccountBalance {
        module: Address,
        available: Coins,
        required: Coins,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(Address),

    #[error("Invalid account type for {address}: {kind} accounts cannot receive time-locked coins")]
    InvalidAccountType { address: Address, kind: String },

    #[error("Invalid vesting schedule for {address}: {reason}")]
    InvalidVestingSchedule { address: Address, reason: String },
}

/// Result type for account operations
pub type AccountResult<T> = Result<T, AccountError>;
