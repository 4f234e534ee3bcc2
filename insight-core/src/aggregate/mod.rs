//! Aggregation engine
//!
//! The [`Aggregator`] subscribes to a live feed and, on every delivery,
//! ingests the snapshot, recomputes [`AggregateStats`] and publishes the
//! result to a [`StatsBoard`] as one atomic replacement.

pub mod histogram;
pub mod snapshot;
pub mod stats;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::log::LogDocument;
use crate::domain::stats::AggregateStats;
use crate::feed::{Delivery, FeedQuery, LiveFeed, Subscription};
use crate::time::Clock;

pub use snapshot::{SNAPSHOT_LIMIT, Snapshot};
pub use stats::compute;

/// Everything a presentation layer needs for one frame
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub stats: AggregateStats,
    pub snapshot: Snapshot,
    /// `None` until the first snapshot arrives
    pub computed_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// Ingest `documents` and compute stats as of `now`
    pub fn recompute(documents: Vec<LogDocument>, now: DateTime<Utc>) -> Self {
        let snapshot = Snapshot::ingest(documents);
        let stats = compute(&snapshot, now);

        Self {
            stats,
            snapshot,
            computed_at: Some(now),
        }
    }
}

/// Latest published dashboard state
///
/// Consumers either read `latest()` or wait on a receiver from
/// `subscribe()`. Published states are immutable and shared.
#[derive(Clone)]
pub struct StatsBoard {
    tx: Arc<watch::Sender<Arc<DashboardState>>>,
}

impl StatsBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(DashboardState::default()));
        Self { tx: Arc::new(tx) }
    }

    pub fn latest(&self) -> Arc<DashboardState> {
        Arc::clone(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.tx.subscribe()
    }

    fn publish(&self, state: DashboardState) {
        self.tx.send_replace(Arc::new(state));
    }
}

impl Default for StatsBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Binds a live feed subscription to a stats board
///
/// Dropping the aggregator (or calling `detach`) ends the subscription; any
/// recomputation still in flight at that point is discarded.
pub struct Aggregator {
    subscription: Mutex<Option<Subscription>>,
    live: Arc<Mutex<bool>>,
}

impl Aggregator {
    /// Subscribe to the newest `SNAPSHOT_LIMIT` processed logs of `feed`
    pub fn attach<F>(feed: &F, board: StatsBoard, clock: Arc<dyn Clock>) -> Self
    where
        F: LiveFeed + ?Sized,
    {
        let live = Arc::new(Mutex::new(true));
        let callback_live = Arc::clone(&live);

        let subscription = feed.subscribe(
            FeedQuery::latest(SNAPSHOT_LIMIT),
            Arc::new(move |delivery: Delivery| match delivery {
                Ok(documents) => {
                    let state = DashboardState::recompute(documents, clock.now());
                    let (total, errors) = (state.stats.total, state.stats.error_count);

                    // `detach` takes this lock, so it cannot slip in between
                    // the check and the publish
                    let published = {
                        let live = lock(&callback_live);
                        if *live {
                            board.publish(state);
                        }
                        *live
                    };

                    if published {
                        tracing::debug!(total, errors, "Published recomputed stats");
                    } else {
                        tracing::debug!("Discarding stats computed after feed was detached");
                    }
                }
                Err(err) => {
                    tracing::warn!("Live feed delivery failed, keeping last stats: {}", err);
                }
            }),
        );

        Self {
            subscription: Mutex::new(Some(subscription)),
            live,
        }
    }

    pub fn is_attached(&self) -> bool {
        *lock(&self.live)
    }

    /// End the feed subscription; nothing is published once this returns
    pub fn detach(&self) {
        *lock(&self.live) = false;

        let subscription = lock(&self.subscription).take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.detach();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
