//! Claim payout lockups

use chrono::{DateTime, Datelike, Months, TimeZone, Timelike, Utc};

use crate::error::{IncentiveError, IncentiveResult};

/// Seconds from `now` until the payout of a claim with `months_lockup`
/// unlocks.
///
/// Unlocks fall on the 15th or the 1st of a month at 14:00 UTC: claims made
/// before the 15th at 14:00 unlock on the 15th, later ones on the 1st of the
/// following month, in both cases `months_lockup` months ahead.
pub fn period_length(now: DateTime<Utc>, months_lockup: i64) -> IncentiveResult<i64> {
    if months_lockup == 0 {
        return Ok(0);
    }
    let months = u32::try_from(months_lockup).map_err(|_| {
        IncentiveError::InvalidParams(format!("invalid months lockup {}", months_lockup))
    })?;

    let before_mid_month = now.day() < 15 || (now.day() == 15 && now.hour() < 14);
    let (anchor, extra) = if before_mid_month {
        (Utc.with_ymd_and_hms(now.year(), now.month(), 15, 14, 0, 0), 0)
    } else {
        (Utc.with_ymd_and_hms(now.year(), now.month(), 1, 14, 0, 0), 1)
    };

    let end = months
        .checked_add(extra)
        .zip(anchor.single())
        .and_then(|(months, a)| a.checked_add_months(Months::new(months)))
        .ok_or_else(|| {
            IncentiveError::InvalidParams(format!(
                "cannot compute unlock time {} months after {}",
                months_lockup, now
            ))
        })?;
    Ok(end.timestamp() - now.timestamp())
}
