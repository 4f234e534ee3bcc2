//! Statistics recomputation
//!
//! `compute` is a pure function of the snapshot and `now`. There is no
//! incremental state: every delivery is recomputed from scratch, which keeps
//! replayed or out-of-order deliveries harmless.

use chrono::{DateTime, Utc};

use super::histogram::TrailingHour;
use super::snapshot::Snapshot;
use crate::domain::log::LogLevel;
use crate::domain::stats::AggregateStats;

/// Compute aggregate statistics for a snapshot in one pass
pub fn compute(snapshot: &Snapshot, now: DateTime<Utc>) -> AggregateStats {
    let window = TrailingHour::ending_at(now);
    let mut stats = AggregateStats::default();

    for record in snapshot.records() {
        stats.total += 1;

        match &record.level {
            Some(LogLevel::Info) => stats.info_count += 1,
            Some(LogLevel::Warn) => stats.warn_count += 1,
            Some(LogLevel::Error) => {
                stats.error_count += 1;

                if let Some(minute) = record.timestamp.and_then(|ts| window.bucket_for(ts)) {
                    stats.errors_by_minute.increment(minute);
                }
            }
            // Unknown and missing levels only count toward the total
            Some(LogLevel::Unknown(_)) | None => {}
        }
    }

    stats
}
