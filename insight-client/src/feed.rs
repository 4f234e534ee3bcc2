//! HTTP polling live feed
//!
//! Implements [`LiveFeed`] on top of `GET /api/logs`. A background task
//! polls at a fixed interval and delivers a snapshot whenever it differs
//! from the last one delivered.

use std::time::Duration;

use insight_core::domain::log::LogDocument;
use insight_core::feed::{
    Direction, FeedError, FeedQuery, LOGS_COLLECTION, LiveFeed, ORDER_FIELD, SnapshotCallback,
    Subscription, SubscriptionToken,
};
use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};

use crate::{ClientError, InsightClient, Result};

/// Live feed backed by polling the server
#[derive(Debug, Clone)]
pub struct HttpLiveFeed {
    client: InsightClient,
    poll_interval: Duration,
    runtime: Handle,
}

impl HttpLiveFeed {
    /// Create a feed polling through `client`
    ///
    /// Must be called from within a tokio runtime; polling tasks are
    /// spawned onto it.
    pub fn new(client: InsightClient, poll_interval: Duration) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| ClientError::InternalError(format!("No tokio runtime: {}", e)))?;

        Ok(Self {
            client,
            poll_interval,
            runtime,
        })
    }
}

impl LiveFeed for HttpLiveFeed {
    fn subscribe(&self, query: FeedQuery, callback: SnapshotCallback) -> Subscription {
        let token = SubscriptionToken::new();
        let task_token = token.clone();
        let client = self.client.clone();
        let poll_interval = self.poll_interval;

        let handle = self.runtime.spawn(async move {
            if let Err(e) = check_query(&query) {
                if task_token.is_active() {
                    callback(Err(e));
                }
                return;
            }

            tracing::debug!(
                "Polling {} every {:?} (limit: {})",
                client.base_url(),
                poll_interval,
                query.limit
            );

            let mut ticker = time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut last: Option<Vec<LogDocument>> = None;
            let mut failing = false;

            loop {
                ticker.tick().await;

                let result = client.latest_logs(query.limit).await;

                if !task_token.is_active() {
                    break;
                }

                match result {
                    Ok(documents) => {
                        failing = false;
                        if last.as_ref() != Some(&documents) {
                            last = Some(documents.clone());
                            callback(Ok(documents));
                        }
                    }
                    Err(e) => {
                        // Report once per outage
                        if !failing {
                            tracing::warn!("Snapshot poll failed: {}", e);
                            callback(Err(feed_error(e)));
                        }
                        failing = true;
                    }
                }
            }
        });

        Subscription::new(token, move || handle.abort())
    }
}

/// A body that arrived but is not a snapshot is malformed; anything else
/// is a transport failure
fn feed_error(err: ClientError) -> FeedError {
    match err {
        ClientError::ParseError(msg) => FeedError::Malformed(msg),
        other => FeedError::Transport(other.to_string()),
    }
}

/// The server only serves the processed-logs collection, newest first
fn check_query(query: &FeedQuery) -> std::result::Result<(), FeedError> {
    if query.collection != LOGS_COLLECTION {
        return Err(FeedError::UnsupportedQuery(format!(
            "unknown collection '{}'",
            query.collection
        )));
    }
    if query.order_by != ORDER_FIELD || query.direction != Direction::Descending {
        return Err(FeedError::UnsupportedQuery(format!(
            "only '{}' descending is served",
            ORDER_FIELD
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_fixed;
    use insight_core::feed::Delivery;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn channel_callback() -> (SnapshotCallback, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback: SnapshotCallback = Arc::new(move |delivery| {
            let _ = tx.send(delivery);
        });
        (callback, rx)
    }

    #[tokio::test]
    async fn test_unchanged_snapshot_is_delivered_once() {
        let body = r#"[{"id":"a","level":"ERROR","timestamp":"2024-05-01T12:00:00.000Z"}]"#;
        let base = serve_fixed(200, body.to_string()).await;
        let feed = HttpLiveFeed::new(InsightClient::new(base), Duration::from_millis(20)).unwrap();
        let (callback, mut rx) = channel_callback();

        let subscription = feed.subscribe(FeedQuery::latest(100), callback);

        let first = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "a");

        // Several more polls return the same snapshot
        time::sleep(Duration::from_millis(150)).await;
        assert!(rx.try_recv().is_err());

        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_once() {
        let feed = HttpLiveFeed::new(
            InsightClient::new("http://127.0.0.1:9"),
            Duration::from_millis(20),
        )
        .unwrap();
        let (callback, mut rx) = channel_callback();

        let _subscription = feed.subscribe(FeedQuery::latest(100), callback);

        let delivery = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(delivery, Err(FeedError::Transport(_))));

        time::sleep(Duration::from_millis(150)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_non_snapshot_body_is_malformed() {
        let base = serve_fixed(200, r#"{"unexpected": true}"#.to_string()).await;
        let feed = HttpLiveFeed::new(InsightClient::new(base), Duration::from_millis(20)).unwrap();
        let (callback, mut rx) = channel_callback();

        let _subscription = feed.subscribe(FeedQuery::latest(100), callback);

        let delivery = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(delivery, Err(FeedError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unsupported_query() {
        let feed = HttpLiveFeed::new(
            InsightClient::new("http://127.0.0.1:9"),
            Duration::from_millis(20),
        )
        .unwrap();
        let (callback, mut rx) = channel_callback();
        let mut query = FeedQuery::latest(10);
        query.collection = "raw-logs".to_string();

        let _subscription = feed.subscribe(query, callback);

        let delivery = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(delivery, Err(FeedError::UnsupportedQuery(_))));
    }

    #[tokio::test]
    async fn test_no_delivery_after_unsubscribe() {
        let body = r#"[]"#;
        let base = serve_fixed(200, body.to_string()).await;
        let feed = HttpLiveFeed::new(InsightClient::new(base), Duration::from_millis(20)).unwrap();
        let (callback, mut rx) = channel_callback();

        let subscription = feed.subscribe(FeedQuery::latest(100), callback);
        subscription.unsubscribe();

        time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_new_requires_runtime() {
        let result = HttpLiveFeed::new(InsightClient::new("http://localhost:8080"), Duration::from_secs(1));
        assert!(matches!(result, Err(ClientError::InternalError(_))));
    }
}
