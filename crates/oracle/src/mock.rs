//! Mock price feed for testing
//!
//! Provides configurable fixed prices for collateral valuation tests.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::OracleError;
use crate::types::{MarketPrice, PriceFeed};

/// Mock price feed
///
/// Stores fixed prices that can be updated between blocks.
#[derive(Debug, Default)]
pub struct MockPriceFeed {
    /// Stored prices (market id -> price)
    prices: RwLock<HashMap<String, Decimal>>,
}

impl MockPriceFeed {
    /// Create a new empty price feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style price registration
    pub fn with_price(self, market_id: &str, price: Decimal) -> Self {
        self.set_price(market_id, price);
        self
    }

    /// Set a fixed price for a market
    pub fn set_price(&self, market_id: &str, price: Decimal) {
        let mut prices = self.prices.write().unwrap_or_else(|e| e.into_inner());
        prices.insert(market_id.to_string(), price);
        tracing::debug!(market_id, price = %price, "mock price set");
    }

    /// Remove a price (for testing the price-not-found path)
    pub fn remove_price(&self, market_id: &str) {
        let mut prices = self.prices.write().unwrap_or_else(|e| e.into_inner());
        prices.remove(market_id);
    }

    /// Get number of configured markets
    pub fn market_count(&self) -> usize {
        self.prices.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl PriceFeed for MockPriceFeed {
    fn get_current_price(&self, market_id: &str) -> Result<MarketPrice, OracleError> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        let price = prices
            .get(market_id)
            .copied()
            .ok_or_else(|| OracleError::MarketNotFound {
                market_id: market_id.to_string(),
            })?;
        if price <= Decimal::ZERO {
            return Err(OracleError::InvalidPrice {
                market_id: market_id.to_string(),
                price,
                reason: "price must be positive".to_string(),
            });
        }
        Ok(MarketPrice::new(market_id, price))
    }
}
