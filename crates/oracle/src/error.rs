//! Price feed error types

use rust_decimal::Decimal;
use thiserror::Error;

/// Price feed errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// No current price for the market
    #[error("Price not found for market: {market_id}")]
    MarketNotFound { market_id: String },

    /// Price data is unusable
    #[error("Invalid price {price} for {market_id}: {reason}")]
    InvalidPrice {
        market_id: String,
        price: Decimal,
        reason: String,
    },
}
