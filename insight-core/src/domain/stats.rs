//! Aggregate statistics derived from a log snapshot

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of clock-minute buckets in the error histogram
pub const HISTOGRAM_BUCKETS: usize = 60;

/// Summary recomputed from scratch for every snapshot
///
/// Unknown or missing levels count toward `total` only, so
/// `error_count + warn_count + info_count <= total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total: u64,
    pub error_count: u64,
    pub warn_count: u64,
    pub info_count: u64,
    pub errors_by_minute: ErrorHistogram,
}

impl AggregateStats {
    /// Records whose level was recognised
    pub fn recognised_count(&self) -> u64 {
        self.error_count + self.warn_count + self.info_count
    }

    /// Records whose level was missing or unrecognised
    pub fn unknown_count(&self) -> u64 {
        self.total.saturating_sub(self.recognised_count())
    }
}

/// Sparse minute-of-hour to error count mapping
///
/// Only minutes with at least one error are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorHistogram(BTreeMap<u8, u64>);

impl ErrorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the bucket for `minute`; minutes outside 0..60 are ignored
    pub fn increment(&mut self, minute: u8) {
        if usize::from(minute) >= HISTOGRAM_BUCKETS {
            return;
        }
        *self.0.entry(minute).or_insert(0) += 1;
    }

    pub fn get(&self, minute: u8) -> u64 {
        self.0.get(&minute).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of non-empty buckets
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Sum over all buckets
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.0.iter().map(|(minute, count)| (*minute, *count))
    }

    /// All 60 buckets in minute order, empty minutes as zero
    pub fn dense(&self) -> [u64; HISTOGRAM_BUCKETS] {
        let mut buckets = [0; HISTOGRAM_BUCKETS];
        for (minute, count) in self.iter() {
            buckets[usize::from(minute)] = count;
        }
        buckets
    }

    /// Axis label for a bucket (`"00"`..`"59"`)
    pub fn label(minute: u8) -> String {
        format!("{:02}", minute)
    }
}
