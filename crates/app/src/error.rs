//! Application errors

use harbor_accounts::AccountError;
use harbor_core::{Address, CoinError};
use harbor_events::EventError;
use harbor_hooks::HookError;
use harbor_incentive::IncentiveError;
use harbor_market::MarketError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Incentive error: {0}")]
    Incentive(#[from] IncentiveError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Invalid coins: {0}")]
    Coin(#[from] CoinError),

    #[error("Event store error: {0}")]
    Event(#[from] EventError),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Unauthorized: {signer} is not the governance authority {authority}")]
    Unauthorized { signer: Address, authority: Address },

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Application halted after a fatal invariant violation")]
    Halted,
}

/// Result type for application operations
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Check if this error must halt the application
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Market(e) => e.is_fatal(),
            AppError::Incentive(e) => e.is_fatal(),
            AppError::Hook(e) => e.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_passes_through() {
        let err: AppError = MarketError::Fatal("accrual time moved backward".to_string()).into();
        assert!(err.is_fatal());

        let err: AppError = HookError::fatal("incentive", "index decreased").into();
        assert!(err.is_fatal());

        let err: AppError = IncentiveError::ZeroClaim.into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_unauthorized_message() {
        let err = AppError::Unauthorized {
            signer: Address::new("kava1alice"),
            authority: Address::new("kava1gov"),
        };
        assert!(err.to_string().contains("kava1gov"));
    }
}
