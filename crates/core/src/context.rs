//! Block context and time helpers

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Seconds in a (365 day) year
pub const SECONDS_PER_YEAR: i64 = 31_536_000;

/// Height and time of the block being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockContext {
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// Context for the following block, `seconds` later
    pub fn advance(&self, seconds: i64) -> Self {
        Self {
            height: self.height + 1,
            time: self.time + chrono::Duration::seconds(seconds),
        }
    }
}

/// Whole seconds from `from` to `to`, rounded half to even.
///
/// Negative when `to` is before `from`.
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let millis = Decimal::from((to - from).num_milliseconds());
    (millis / Decimal::from(1000))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .unwrap_or_default()
}
