//! Price feed contract

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OracleError;

/// Current USD price of a market (e.g. `kava:usd`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPrice {
    pub market_id: String,
    pub price: Decimal,
}

impl MarketPrice {
    pub fn new(market_id: impl Into<String>, price: Decimal) -> Self {
        Self {
            market_id: market_id.into(),
            price,
        }
    }
}

/// Price feed contract consumed by the money market
///
/// Implementations must be deterministic within a block: repeated calls for
/// the same market return the same price.
pub trait PriceFeed {
    /// Get the current price for a market
    fn get_current_price(&self, market_id: &str) -> Result<MarketPrice, OracleError>;

    /// Check if a market has a current price
    fn has_price(&self, market_id: &str) -> bool {
        self.get_current_price(market_id).is_ok()
    }
}
