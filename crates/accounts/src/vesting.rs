//! Periodic vesting accounts
//!
//! A vesting account unlocks `original_vesting` over a sequence of periods.
//! Period `i` vests at `start_time + sum(length[0..=i])`. Times are unix
//! seconds.

use harbor_core::{Address, Coins};
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};

/// One step of a vesting schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingPeriod {
    /// Seconds after the previous period ends
    pub length: i64,
    /// Coins that unlock when this period ends
    pub amount: Coins,
}

impl VestingPeriod {
    pub fn new(length: i64, amount: Coins) -> Self {
        Self { length, amount }
    }
}

/// Account whose coins unlock over a schedule of periods.
///
/// # Invariant
/// `end_time - start_time` equals the sum of period lengths and
/// `original_vesting` equals the sum of period amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingAccount {
    pub address: Address,
    pub original_vesting: Coins,
    pub start_time: i64,
    pub end_time: i64,
    pub periods: Vec<VestingPeriod>,
}

impl VestingAccount {
    /// Build an account from a start time and its periods
    pub fn new(address: Address, start_time: i64, periods: Vec<VestingPeriod>) -> Self {
        let end_time = start_time + total_length(&periods);
        let original_vesting = periods
            .iter()
            .fold(Coins::empty(), |acc, period| acc.add(&period.amount));
        Self {
            address,
            original_vesting,
            start_time,
            end_time,
            periods,
        }
    }

    /// Check the schedule adds up
    pub fn validate(&self) -> AccountResult<()> {
        let invalid = |reason: String| AccountError::InvalidVestingSchedule {
            address: self.address.clone(),
            reason,
        };
        if self.periods.iter().any(|p| p.length < 0) {
            return Err(invalid("negative period length".to_string()));
        }
        let length = total_length(&self.periods);
        if self.end_time - self.start_time != length {
            return Err(invalid(format!(
                "period lengths sum to {} but schedule spans {}",
                length,
                self.end_time - self.start_time
            )));
        }
        let scheduled = self
            .periods
            .iter()
            .fold(Coins::empty(), |acc, period| acc.add(&period.amount));
        if scheduled != self.original_vesting {
            return Err(invalid(format!(
                "periods sum to {} but original vesting is {}",
                scheduled, self.original_vesting
            )));
        }
        Ok(())
    }

    /// Coins whose period has ended by `now`
    pub fn vested_coins(&self, now: i64) -> Coins {
        let mut vested = Coins::empty();
        let mut period_end = self.start_time;
        for period in &self.periods {
            period_end += period.length;
            if period_end > now {
                break;
            }
            vested = vested.add(&period.amount);
        }
        vested
    }

    /// Coins still locked at `now`
    pub fn vesting_coins(&self, now: i64) -> Coins {
        self.original_vesting.saturating_sub(&self.vested_coins(now))
    }

    /// Splice `amount` into the schedule so it unlocks `length` seconds
    /// after `now`.
    ///
    /// The schedule is first normalised so that it covers `now`: an already
    /// finished schedule gets the new period appended after the gap, and a
    /// schedule that has not started yet is moved to start at `now` with the
    /// first period stretched to keep every unlock time unchanged.
    pub fn add_to_schedule(&mut self, now: i64, amount: &Coins, length: i64) {
        self.original_vesting = self.original_vesting.add(amount);

        if self.end_time < now {
            self.periods
                .push(VestingPeriod::new(now - self.end_time + length, amount.clone()));
            self.end_time = now + length;
            return;
        }

        if self.start_time > now {
            if let Some(first) = self.periods.first_mut() {
                first.length += self.start_time - now;
            }
            self.start_time = now;
        }

        let remaining = self.end_time - now;
        let elapsed = now - self.start_time;
        if remaining < length {
            self.periods
                .push(VestingPeriod::new(length - remaining, amount.clone()));
            self.end_time = now + length;
            return;
        }

        // The new unlock falls inside the schedule: merge with a period ending
        // at the same instant or split the period that straddles it.
        let target = elapsed + length;
        let mut spliced = Vec::with_capacity(self.periods.len() + 1);
        let mut cumulative = 0;
        let mut periods = std::mem::take(&mut self.periods).into_iter();
        for period in periods.by_ref() {
            cumulative += period.length;
            if cumulative < target {
                spliced.push(period);
            } else if cumulative == target {
                spliced.push(VestingPeriod::new(period.length, period.amount.add(amount)));
                break;
            } else {
                let inserted = target - total_length(&spliced);
                spliced.push(VestingPeriod::new(inserted, amount.clone()));
                spliced.push(VestingPeriod::new(period.length - inserted, period.amount));
                break;
            }
        }
        spliced.extend(periods);
        self.periods = spliced;
    }
}

fn total_length(periods: &[VestingPeriod]) -> i64 {
    periods.iter().map(|p| p.length).sum()
}
