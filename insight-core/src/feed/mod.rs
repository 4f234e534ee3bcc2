//! Live collection feed
//!
//! A feed delivers the full ordered top-N snapshot of a collection every time
//! it changes. Subscribing returns a [`Subscription`]; disposing of it
//! permanently stops further callbacks.

pub mod memory;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::domain::log::LogDocument;

pub use memory::{DEFAULT_RETENTION, InMemoryCollection};

/// Collection the processing stage writes to
pub const LOGS_COLLECTION: &str = "processed-logs";

/// Field snapshots are ordered by
pub const ORDER_FIELD: &str = "timestamp";

/// Sort direction of a feed query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// What a subscriber wants delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub collection: String,
    pub order_by: String,
    pub direction: Direction,
    pub limit: usize,
}

impl FeedQuery {
    /// The newest `limit` processed logs, newest first
    pub fn latest(limit: usize) -> Self {
        Self {
            collection: LOGS_COLLECTION.to_string(),
            order_by: ORDER_FIELD.to_string(),
            direction: Direction::Descending,
            limit,
        }
    }
}

/// Errors delivered to subscribers in place of a snapshot
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The underlying transport failed
    #[error("Feed transport failed: {0}")]
    Transport(String),

    /// The feed cannot serve this query
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    /// The feed returned data that is not a snapshot
    #[error("Malformed snapshot: {0}")]
    Malformed(String),
}

/// One delivery: the full snapshot or the reason there is none
pub type Delivery = Result<Vec<LogDocument>, FeedError>;

/// Callback invoked on every delivery
pub type SnapshotCallback = Arc<dyn Fn(Delivery) + Send + Sync>;

/// A subscribable live collection
pub trait LiveFeed: Send + Sync {
    /// Start delivering snapshots for `query` to `callback`
    ///
    /// Implementations deliver the current snapshot as soon as it is known
    /// and again after every change, until the returned subscription is
    /// disposed.
    fn subscribe(&self, query: FeedQuery, callback: SnapshotCallback) -> Subscription;
}

/// Shared liveness flag of a subscription
///
/// Delivery paths check it right before invoking the callback.
#[derive(Debug, Clone)]
pub struct SubscriptionToken(Arc<AtomicBool>);

impl SubscriptionToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for SubscriptionToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Disposal handle returned by [`LiveFeed::subscribe`]
///
/// Dropping it has the same effect as calling `unsubscribe`.
pub struct Subscription {
    token: SubscriptionToken,
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a token together with the feed-specific teardown
    pub fn new(token: SubscriptionToken, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            token,
            teardown: Some(Box::new(teardown)),
        }
    }

    pub fn token(&self) -> SubscriptionToken {
        self.token.clone()
    }

    pub fn is_active(&self) -> bool {
        self.token.is_active()
    }

    /// Permanently stop deliveries
    pub fn unsubscribe(mut self) {
        self.dispose();
    }

    fn dispose(&mut self) {
        self.token.cancel();
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
