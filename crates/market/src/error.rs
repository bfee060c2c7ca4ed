//! Money market errors

use harbor_accounts::AccountError;
use harbor_core::{Address, CoinError, Coins};
use harbor_hooks::HookError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::auction::AuctionError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("Invalid deposit denom: {0}")]
    InvalidDepositDenom(String),

    #[error("Invalid deposit: {0}")]
    InvalidDeposit(String),

    #[error("No deposit found for {0}")]
    DepositNotFound(Address),

    #[error("Proposed withdraw outside loan-to-value range")]
    InvalidWithdrawAmount,

    #[error("Withdraw denoms {requested} not held in deposit {available}")]
    InvalidWithdrawDenom { requested: Coins, available: Coins },

    #[error("Money market not found: {0}")]
    MoneyMarketNotFound(String),

    #[error("No money market found for denom {0}")]
    MarketNotFound(String),

    #[error("No price found for market {0}")]
    PriceNotFound(String),

    #[error("No deposits found for {0}")]
    DepositsNotFound(Address),

    #[error("Insufficient loan-to-value: proposed {proposed}, allowed {allowed}")]
    InsufficientLoanToValue { proposed: Decimal, allowed: Decimal },

    #[error("Proposed borrow would result in {proposed} {denom} borrowed, above the asset limit {limit}")]
    GreaterThanAssetBorrowLimit {
        denom: String,
        proposed: Decimal,
        limit: Decimal,
    },

    #[error("Cannot borrow zero coins")]
    BorrowEmptyCoins,

    #[error("No borrow found for {0}")]
    BorrowNotFound(Address),

    #[error("Borrow USD value ${value} is below the minimum borrow value ${minimum}")]
    BelowMinimumBorrowValue { value: Decimal, minimum: Decimal },

    #[error("Requested borrow {requested} exceeds available to borrow {available}")]
    ExceedsProtocolBorrowableBalance { requested: Coins, available: Coins },

    #[error("Reserves {reserves} exceed cash {cash}")]
    ReservesExceedCash { reserves: Coins, cash: Coins },

    #[error("Repayment denoms {requested} not held in borrow {owed}")]
    InvalidRepaymentDenom { requested: Coins, owed: Coins },

    #[error("Insufficient balance for repay: {address} can only repay up to {available}")]
    InsufficientBalanceForRepay { address: Address, available: Coins },

    #[error("Borrow of {0} is within valid loan-to-value range")]
    BorrowNotLiquidatable(Address),

    #[error("Insufficient coins to deliver lot {lot}")]
    InsufficientCoins { lot: String },

    #[error("Total supplied coins not found")]
    SuppliedCoinsNotFound,

    #[error("Total borrowed coins not found")]
    BorrowedCoinsNotFound,

    #[error("Interest factor for {0} missing from position index")]
    InvalidIndexFactorDenom(String),

    #[error("Invalid market params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Auction(#[from] AuctionError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Coin(#[from] CoinError),

    /// Corrupted state; processing must halt
    #[error("Fatal invariant violation: {0}")]
    Fatal(String),
}

/// Result type for money market operations
pub type MarketResult<T> = Result<T, MarketError>;

impl MarketError {
    /// Check if this error must halt processing
    pub fn is_fatal(&self) -> bool {
        match self {
            MarketError::Fatal(_) => true,
            MarketError::Hook(err) => err.is_fatal(),
            _ => false,
        }
    }
}
