//! Trailing-hour error histogram bucketing
//!
//! Errors are bucketed by the clock-minute component of their timestamp
//! (UTC), not by minutes elapsed. The axis wraps every hour, so two errors
//! sixty minutes apart that share a clock minute land in the same bucket.
//! Only timestamps strictly after `now - 1h` are counted; there is no upper
//! bound, so timestamps ahead of `now` are counted too.
//!
//! Minutes are always read in UTC, never the viewer's local zone. For zones
//! with a whole-hour offset this makes no difference; for others (e.g.
//! +05:30) the axis is shifted relative to local wall-clock minutes, but it
//! is the same on every machine rendering the dashboard.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

/// Width of the trailing window
pub fn window_span() -> TimeDelta {
    TimeDelta::hours(1)
}

/// The open-below interval `(now - 1h, ..)` used to filter errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingHour {
    after: DateTime<Utc>,
}

impl TrailingHour {
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        let after = now
            .checked_sub_signed(window_span())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { after }
    }

    /// Exclusive lower bound of the window
    pub fn after(&self) -> DateTime<Utc> {
        self.after
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp > self.after
    }

    /// Bucket for `timestamp`, or `None` when it falls outside the window
    pub fn bucket_for(&self, timestamp: DateTime<Utc>) -> Option<u8> {
        self.contains(timestamp).then(|| minute_of(timestamp))
    }
}

/// Clock-minute component of a timestamp, 0..=59
pub fn minute_of(timestamp: DateTime<Utc>) -> u8 {
    // Timelike::minute is always below 60
    timestamp.minute() as u8
}
