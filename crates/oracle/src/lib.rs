//! Harbor Price Feed
//!
//! The money market values collateral and debt through the `PriceFeed`
//! contract. Prices come from an external oracle module; `MockPriceFeed`
//! serves fixed prices for tests.

mod error;
mod mock;
mod types;

pub use error::OracleError;
pub use mock::MockPriceFeed;
pub use types::{MarketPrice, PriceFeed};
