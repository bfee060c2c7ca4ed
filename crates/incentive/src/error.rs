//! Incentive errors

use chrono::{DateTime, Utc};
use harbor_accounts::AccountError;
use harbor_core::{Address, AmountError, CoinError};
use thiserror::Error;

use crate::claim::ClaimType;
use crate::params::MultiplierName;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveError {
    #[error("No {claim_type} claim found for {owner}")]
    ClaimNotFound { claim_type: ClaimType, owner: Address },

    #[error("Denom '{denom}' has no multiplier '{name}'")]
    InvalidMultiplier { denom: String, name: MultiplierName },

    #[error("Invalid multiplier name: {0}")]
    InvalidMultiplierName(String),

    #[error("Claim period expired: block time {now} > claim end time {claim_end}")]
    ClaimExpired {
        now: DateTime<Utc>,
        claim_end: DateTime<Utc>,
    },

    #[error("Cannot claim - reward amount is zero")]
    ZeroClaim,

    #[error("Invalid incentive params: {0}")]
    InvalidParams(String),

    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Coin(#[from] CoinError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Corrupted reward state; processing must halt
    #[error("Fatal invariant violation: {0}")]
    Fatal(String),
}

/// Result type for incentive operations
pub type IncentiveResult<T> = Result<T, IncentiveError>;

impl IncentiveError {
    /// Check if this error must halt processing
    pub fn is_fatal(&self) -> bool {
        matches!(self, IncentiveError::Fatal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(IncentiveError::Fatal("index decreased".to_string()).is_fatal());
        assert!(!IncentiveError::ZeroClaim.is_fatal());
    }

    #[test]
    fn test_multiplier_message() {
        let err = IncentiveError::InvalidMultiplier {
            denom: "hard".to_string(),
            name: MultiplierName::Large,
        };
        assert_eq!(err.to_string(), "Denom 'hard' has no multiplier 'large'");
    }
}
