//! Harbor Money Market - over-collateralized lending
//!
//! Users deposit coins into per-denom markets and borrow against them up to
//! each asset's loan-to-value ratio. Interest accrues per denom through
//! monotonic supply and borrow factors; positions that drift outside their
//! loan-to-value range can be liquidated by any keeper.
//!
//! Every balance-changing operation notifies the injected ledger listeners
//! before and after the mutation (see `harbor-hooks`).

pub mod auction;
pub mod borrow;
pub mod deposit;
pub mod error;
pub mod interest;
pub mod keeper;
pub mod liquidation;
pub mod params;
pub mod query;
pub mod repay;
pub mod state;
pub mod withdraw;

pub use auction::{AuctionError, AuctionKeeper, CollateralAuction, LotReturn, MockAuctionHouse};
pub use error::{MarketError, MarketResult};
pub use interest::{borrow_rate, supply_rate, utilization_ratio};
pub use keeper::{MoneyMarketKeeper, Valuation};
pub use liquidation::{LiquidationOutcome, StartedAuction};
pub use params::{BorrowLimit, InterestRateModel, MarketParams, MoneyMarket};
pub use query::{InterestFactor, MoneyMarketInterestRate};
pub use state::{Borrow, Deposit, InterestFactors, MarketStore};
