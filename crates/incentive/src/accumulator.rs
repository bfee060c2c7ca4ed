//! Global reward accumulation
//!
//! The accumulator turns "rewards per second for a source" into growth of the
//! source's reward indexes. It knows nothing about where the source total
//! comes from: total supplied of a denom, total bonded tokens and pool shares
//! all go through the same arithmetic.

use chrono::{DateTime, Utc};
use harbor_core::{elapsed_seconds, Coins};
use rust_decimal::Decimal;
use tracing::error;

use crate::error::{IncentiveError, IncentiveResult};
use crate::indexes::RewardIndexes;
use crate::params::MultiRewardPeriod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
    pub previous_accumulation_time: DateTime<Utc>,
    pub indexes: RewardIndexes,
}

impl Accumulator {
    pub fn new(previous_accumulation_time: DateTime<Utc>, indexes: RewardIndexes) -> Self {
        Self {
            previous_accumulation_time,
            indexes,
        }
    }

    /// Accrue rewards of `period` from the previous accumulation time up to
    /// `now`.
    ///
    /// Only time inside the period counts. With a zero source total the
    /// rewards for the interval are dropped. The accumulation time moves to
    /// `now`, or to the period end if that is earlier, and never backward.
    pub fn accumulate(
        &mut self,
        period: &MultiRewardPeriod,
        source_total: Decimal,
        now: DateTime<Utc>,
    ) -> IncentiveResult<()> {
        let seconds = time_elapsed_within_limits(
            self.previous_accumulation_time,
            now,
            period.start,
            period.end,
        )?;
        let increment = new_rewards(&period.rewards_per_second, source_total, seconds);
        self.indexes = self.indexes.add(&increment);
        self.previous_accumulation_time = self.previous_accumulation_time.max(period.end.min(now));
        Ok(())
    }
}

/// Whole seconds of `[start, end]` that fall inside `[limit_min, limit_max]`
fn time_elapsed_within_limits(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit_min: DateTime<Utc>,
    limit_max: DateTime<Utc>,
) -> IncentiveResult<i64> {
    if start > end {
        error!(%start, %end, "Accumulation time moved backward");
        return Err(IncentiveError::Fatal(format!(
            "start time ({}) cannot be after end time ({})",
            start, end
        )));
    }
    if limit_min > limit_max {
        error!(%limit_min, %limit_max, "Reward period ends before it starts");
        return Err(IncentiveError::Fatal(format!(
            "minimum limit time ({}) cannot be after maximum limit time ({})",
            limit_min, limit_max
        )));
    }
    if start > limit_max || end < limit_min {
        return Ok(0);
    }
    Ok(elapsed_seconds(start.max(limit_min), end.min(limit_max)))
}

/// Index growth for `seconds` of rewards shared by `source_total` units
fn new_rewards(rewards_per_second: &Coins, source_total: Decimal, seconds: i64) -> RewardIndexes {
    if source_total <= Decimal::ZERO {
        return RewardIndexes::new();
    }
    rewards_per_second
        .iter()
        .map(|(denom, rate)| {
            (
                denom.to_string(),
                rate.value() * Decimal::from(seconds) / source_total,
            )
        })
        .collect()
}
