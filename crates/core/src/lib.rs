//! Harbor Core - Domain types
//!
//! This crate contains the fundamental types shared by every Harbor module:
//! - `Amount`: Non-negative, whole-unit token amount
//! - `Coin` / `Coins`: A single denomination and a sorted multi-denom bag
//! - `Address`: Account and module account identifiers
//! - `BlockContext`: Height and time of the block being processed

pub mod address;
pub mod amount;
pub mod coin;
pub mod context;
pub mod unique;

pub use address::Address;
pub use amount::{Amount, AmountError};
pub use coin::{validate_denom, Coin, CoinError, Coins};
pub use context::{elapsed_seconds, BlockContext, SECONDS_PER_YEAR};
pub use unique::UniqueMap;
