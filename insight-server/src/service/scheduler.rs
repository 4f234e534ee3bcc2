//! Generation scheduler
//!
//! A repeating timer whose period is drawn from a jitter range on every
//! tick, so generated logs arrive at irregular intervals.

use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::service::log_service;
use crate::state::AppState;

/// Inclusive range a timer delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterRange {
    min: Duration,
    max: Duration,
}

impl JitterRange {
    pub fn new(min: Duration, max: Duration) -> anyhow::Result<Self> {
        if min > max {
            anyhow::bail!(
                "jitter range minimum ({:?}) exceeds maximum ({:?})",
                min,
                max
            );
        }

        if max.is_zero() {
            anyhow::bail!("jitter range maximum must be greater than 0");
        }

        Ok(Self { min, max })
    }

    /// A range with no jitter
    pub fn fixed(period: Duration) -> anyhow::Result<Self> {
        Self::new(period, period)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for JitterRange {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(4),
            max: Duration::from_secs(10),
        }
    }
}

/// Repeating timer with a jittered period
pub struct JitteredInterval<R> {
    range: JitterRange,
    rng: R,
}

impl<R: Rng> JitteredInterval<R> {
    pub fn new(range: JitterRange, rng: R) -> Self {
        Self { range, rng }
    }

    pub fn range(&self) -> JitterRange {
        self.range
    }

    /// Draw the delay until the next tick
    pub fn next_delay(&mut self) -> Duration {
        let min = self.range.min.as_millis() as u64;
        let max = self.range.max.as_millis() as u64;

        if min == max {
            return self.range.min;
        }

        Duration::from_millis(self.rng.random_range(min..=max))
    }

    /// Sleep until the next tick
    pub async fn tick(&mut self) {
        let delay = self.next_delay();
        tokio::time::sleep(delay).await;
    }
}

/// Generate one log immediately, then one per tick until shutdown
///
/// Returns the number of logs that were generated and stored.
pub async fn run_generation_loop<R: Rng>(
    state: AppState,
    mut interval: JitteredInterval<R>,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    info!(
        "Starting log generation (interval: {:?}..={:?})",
        interval.range().min(),
        interval.range().max()
    );

    let mut generated = 0;

    if generate_once(&state).await {
        generated += 1;
    }

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if generate_once(&state).await {
                    generated += 1;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Stopping log generation after {} log(s)", generated);
                    break;
                }
            }
        }
    }

    generated
}

async fn generate_once(state: &AppState) -> bool {
    match log_service::generate_log(state).await {
        Ok(record) => {
            debug!("Generated {} log {}", record.level, record.trace_id);
            true
        }
        Err(e) => {
            error!("Failed to generate log: {}", e);
            false
        }
    }
}
