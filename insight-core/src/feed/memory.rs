//! In-memory live collection
//!
//! A process-local collection that stores documents and re-delivers the
//! ordered top-N snapshot to every active subscriber after each change.
//! Only documents whose ordering field is a string appear in snapshots.
//! The collection keeps at most `retention` documents, dropping the oldest
//! inserts first.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{
    Delivery, Direction, FeedError, FeedQuery, LiveFeed, SnapshotCallback, Subscription,
    SubscriptionToken,
};
use crate::domain::log::LogDocument;

/// Documents kept when no retention is given
pub const DEFAULT_RETENTION: usize = 1_000;

/// Shared in-memory collection; clones refer to the same data
#[derive(Clone)]
pub struct InMemoryCollection {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    name: String,
    retention: usize,
    documents: VecDeque<Stored>,
    next_seq: u64,
    /// Bumped on every change subscribers are told about
    version: u64,
    subscribers: Vec<Subscriber>,
    next_subscriber: u64,
}

struct Stored {
    seq: u64,
    document: LogDocument,
}

struct Subscriber {
    id: u64,
    query: FeedQuery,
    outbox: Arc<Outbox>,
}

/// A delivery computed under the collection lock, handed out after it
struct Pending {
    outbox: Arc<Outbox>,
    version: u64,
    delivery: Delivery,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_retention(name, DEFAULT_RETENTION)
    }

    /// A collection holding at most `retention` documents (minimum 1)
    pub fn with_retention(name: impl Into<String>, retention: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                name: name.into(),
                retention: retention.max(1),
                documents: VecDeque::new(),
                next_seq: 0,
                version: 0,
                subscribers: Vec::new(),
                next_subscriber: 0,
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of subscriptions that have not been disposed
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Store a document under a fresh id and notify subscribers
    pub fn insert(&self, fields: Map<String, Value>) -> LogDocument {
        let document = LogDocument::new(Uuid::new_v4().to_string(), fields);

        let pending = {
            let mut inner = self.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.documents.push_back(Stored {
                seq,
                document: document.clone(),
            });
            while inner.documents.len() > inner.retention {
                inner.documents.pop_front();
            }
            inner.version += 1;
            inner.pending_deliveries()
        };

        deliver(pending);
        document
    }

    /// Current snapshot for a query
    pub fn query(&self, query: &FeedQuery) -> Delivery {
        self.lock().snapshot(query)
    }

    /// Deliver `error` to every active subscriber
    pub fn fail_subscribers(&self, error: FeedError) {
        let pending: Vec<Pending> = {
            let mut inner = self.lock();
            inner.version += 1;
            let version = inner.version;
            inner
                .subscribers
                .iter()
                .map(|s| Pending {
                    outbox: Arc::clone(&s.outbox),
                    version,
                    delivery: Err(error.clone()),
                })
                .collect()
        };

        deliver(pending);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new(super::LOGS_COLLECTION)
    }
}

impl LiveFeed for InMemoryCollection {
    fn subscribe(&self, query: FeedQuery, callback: SnapshotCallback) -> Subscription {
        let token = SubscriptionToken::new();
        let outbox = Arc::new(Outbox::new(token.clone(), callback));

        let (id, initial) = {
            let mut inner = self.lock();
            let id = inner.next_subscriber;
            inner.next_subscriber += 1;
            let initial = Pending {
                outbox: Arc::clone(&outbox),
                version: inner.version,
                delivery: inner.snapshot(&query),
            };
            inner.subscribers.push(Subscriber { id, query, outbox });
            (id, initial)
        };

        deliver(vec![initial]);

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Subscription::new(token, move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .subscribers
                    .retain(|s| s.id != id);
            }
        })
    }
}

impl Inner {
    fn snapshot(&self, query: &FeedQuery) -> Delivery {
        if query.collection != self.name {
            return Err(FeedError::UnsupportedQuery(format!(
                "collection '{}' is not served here",
                query.collection
            )));
        }

        let mut matching: Vec<(&str, &Stored)> = self
            .documents
            .iter()
            .filter_map(|s| {
                s.document
                    .field_str(&query.order_by)
                    .map(|key| (key, s))
            })
            .collect();

        matching.sort_by(|(key_a, a), (key_b, b)| {
            let by_field = key_a.cmp(key_b).then(a.seq.cmp(&b.seq));
            match query.direction {
                Direction::Ascending => by_field,
                Direction::Descending => by_field.reverse(),
            }
        });

        Ok(matching
            .into_iter()
            .take(query.limit)
            .map(|(_, s)| s.document.clone())
            .collect())
    }

    fn pending_deliveries(&self) -> Vec<Pending> {
        self.subscribers
            .iter()
            .map(|s| Pending {
                outbox: Arc::clone(&s.outbox),
                version: self.version,
                delivery: self.snapshot(&s.query),
            })
            .collect()
    }
}

/// Per-subscriber delivery slot
///
/// Deliveries are versioned under the collection lock but handed out after
/// it is released, so two inserters can race here. Only versions newer than
/// the last one handed out are delivered, in order. Whichever thread finds
/// the outbox idle drains it; others leave their delivery behind and return
/// without waiting, so a callback may itself insert.
struct Outbox {
    token: SubscriptionToken,
    callback: SnapshotCallback,
    state: Mutex<OutboxState>,
}

#[derive(Default)]
struct OutboxState {
    delivered: Option<u64>,
    queued: Option<(u64, Delivery)>,
    draining: bool,
}

impl Outbox {
    fn new(token: SubscriptionToken, callback: SnapshotCallback) -> Self {
        Self {
            token,
            callback,
            state: Mutex::new(OutboxState::default()),
        }
    }

    fn offer(&self, version: u64, delivery: Delivery) {
        let mut state = self.lock();

        let stale = state.delivered.is_some_and(|last| version <= last)
            || state
                .queued
                .as_ref()
                .is_some_and(|(queued, _)| version <= *queued);
        if stale {
            return;
        }

        state.queued = Some((version, delivery));
        if state.draining {
            return;
        }
        state.draining = true;

        loop {
            let Some((version, delivery)) = state.queued.take() else {
                state.draining = false;
                return;
            };
            state.delivered = Some(version);
            drop(state);

            if self.token.is_active() {
                (self.callback)(delivery);
            }

            state = self.lock();
        }
    }

    fn lock(&self) -> MutexGuard<'_, OutboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Invoke callbacks outside the collection lock
fn deliver(pending: Vec<Pending>) {
    for Pending {
        outbox,
        version,
        delivery,
    } in pending
    {
        outbox.offer(version, delivery);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::LOGS_COLLECTION;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn recorder() -> (SnapshotCallback, Arc<StdMutex<Vec<Delivery>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: SnapshotCallback = Arc::new(move |delivery| {
            sink.lock().unwrap().push(delivery);
        });
        (callback, seen)
    }

    fn timestamps(delivery: &Delivery) -> Vec<String> {
        delivery
            .as_ref()
            .unwrap()
            .iter()
            .map(|d| d.field_str("timestamp").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_subscribe_delivers_initial_snapshot() {
        let collection = InMemoryCollection::default();
        collection.insert(fields(json!({"timestamp": "2024-05-01T12:00:00.000Z"})));

        let (callback, seen) = recorder();
        let _subscription = collection.subscribe(FeedQuery::latest(100), callback);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_is_newest_first_and_capped() {
        let collection = InMemoryCollection::default();
        for minute in 0..5 {
            collection.insert(fields(json!({
                "timestamp": format!("2024-05-01T12:0{}:00.000Z", minute)
            })));
        }

        let snapshot = collection.query(&FeedQuery::latest(3));

        assert_eq!(
            timestamps(&snapshot),
            vec![
                "2024-05-01T12:04:00.000Z",
                "2024-05-01T12:03:00.000Z",
                "2024-05-01T12:02:00.000Z"
            ]
        );
    }

    #[test]
    fn test_documents_without_order_field_are_excluded() {
        let collection = InMemoryCollection::default();
        collection.insert(fields(json!({"message": "no timestamp"})));
        collection.insert(fields(json!({"timestamp": "2024-05-01T12:00:00.000Z"})));

        let snapshot = collection.query(&FeedQuery::latest(100)).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_insert_redelivers_full_snapshot() {
        let collection = InMemoryCollection::default();
        let (callback, seen) = recorder();
        let _subscription = collection.subscribe(FeedQuery::latest(100), callback);

        collection.insert(fields(json!({"timestamp": "2024-05-01T12:00:00.000Z"})));
        collection.insert(fields(json!({"timestamp": "2024-05-01T12:01:00.000Z"})));

        let seen = seen.lock().unwrap();
        let sizes: Vec<usize> = seen.iter().map(|d| d.as_ref().unwrap().len()).collect();
        assert_eq!(sizes, vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe_stops_deliveries() {
        let collection = InMemoryCollection::default();
        let (callback, seen) = recorder();
        let subscription = collection.subscribe(FeedQuery::latest(100), callback);
        assert_eq!(collection.subscriber_count(), 1);

        subscription.unsubscribe();
        collection.insert(fields(json!({"timestamp": "2024-05-01T12:00:00.000Z"})));

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(collection.subscriber_count(), 0);
    }

    #[test]
    fn test_unknown_collection_is_rejected() {
        let collection = InMemoryCollection::default();
        let mut query = FeedQuery::latest(10);
        query.collection = "raw-logs".to_string();

        assert!(matches!(
            collection.query(&query),
            Err(FeedError::UnsupportedQuery(_))
        ));
    }

    #[test]
    fn test_fail_subscribers_delivers_error() {
        let collection = InMemoryCollection::default();
        let (callback, seen) = recorder();
        let _subscription = collection.subscribe(FeedQuery::latest(100), callback);

        collection.fail_subscribers(FeedError::Transport("connection reset".to_string()));

        let seen = seen.lock().unwrap();
        assert!(matches!(seen.last(), Some(Err(FeedError::Transport(_)))));
    }

    #[test]
    fn test_non_string_order_field_is_excluded() {
        let collection = InMemoryCollection::default();
        collection.insert(fields(json!({"timestamp": 1714564800})));
        collection.insert(fields(json!({"timestamp": null})));
        collection.insert(fields(json!({"timestamp": "2024-05-01T12:00:00.000Z"})));

        let snapshot = collection.query(&FeedQuery::latest(100)).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_retention_drops_oldest_inserts() {
        let collection = InMemoryCollection::with_retention(LOGS_COLLECTION, 3);
        for minute in 0..5 {
            collection.insert(fields(json!({
                "timestamp": format!("2024-05-01T12:0{}:00.000Z", minute)
            })));
        }

        assert_eq!(collection.len(), 3);
        let snapshot = collection.query(&FeedQuery::latest(100));
        assert_eq!(
            timestamps(&snapshot),
            vec![
                "2024-05-01T12:04:00.000Z",
                "2024-05-01T12:03:00.000Z",
                "2024-05-01T12:02:00.000Z"
            ]
        );
    }

    #[test]
    fn test_insert_from_another_thread_during_delivery_arrives_last() {
        let collection = InMemoryCollection::default();
        let seen = Arc::new(StdMutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let writer = collection.clone();
        let callback: SnapshotCallback = Arc::new(move |delivery: Delivery| {
            let size = delivery.as_ref().map(Vec::len).unwrap_or_default();
            sink.lock().unwrap().push(size);

            // A second writer lands while the first snapshot is being handled
            if size == 1 {
                let writer = writer.clone();
                std::thread::spawn(move || {
                    writer.insert(fields(json!({"timestamp": "2024-05-01T12:01:00.000Z"})));
                })
                .join()
                .unwrap();
            }
        });
        let subscription = collection.subscribe(FeedQuery::latest(100), callback);

        collection.insert(fields(json!({"timestamp": "2024-05-01T12:00:00.000Z"})));

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        subscription.unsubscribe();
    }

    #[test]
    fn test_concurrent_inserts_deliver_in_order() {
        let collection = InMemoryCollection::default();
        let (callback, seen) = recorder();
        let _subscription = collection.subscribe(FeedQuery::latest(500), callback);

        let writers: Vec<_> = (0..2)
            .map(|writer| {
                let collection = collection.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        collection.insert(fields(json!({
                            "timestamp": format!("2024-05-01T12:00:00.{}{:02}Z", writer, i)
                        })));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        let sizes: Vec<usize> = seen.iter().map(|d| d.as_ref().unwrap().len()).collect();
        assert!(sizes.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(sizes.last(), Some(&100));
    }
}
