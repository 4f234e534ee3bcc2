//! In-memory log store
//!
//! Backs the collection with an [`InMemoryCollection`] when no database
//! is configured.

use async_trait::async_trait;
use insight_core::domain::log::LogDocument;
use insight_core::feed::{FeedQuery, InMemoryCollection};
use serde_json::{Map, Value};

use super::{LogStore, StoreError};

#[derive(Clone, Default)]
pub struct MemoryLogStore {
    collection: InMemoryCollection,
}

impl MemoryLogStore {
    pub fn new(collection: InMemoryCollection) -> Self {
        Self { collection }
    }

    /// The underlying collection, which can also be subscribed to directly
    pub fn collection(&self) -> InMemoryCollection {
        self.collection.clone()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, fields: Map<String, Value>) -> Result<LogDocument, StoreError> {
        Ok(self.collection.insert(fields))
    }

    async fn latest(&self, limit: usize) -> Result<Vec<LogDocument>, StoreError> {
        Ok(self.collection.query(&FeedQuery::latest(limit))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(timestamp: &str) -> Map<String, Value> {
        match json!({"level": "INFO", "message": "m", "timestamp": timestamp}) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_latest() {
        let store = MemoryLogStore::default();
        store.insert(fields("2024-05-01T12:00:00.000Z")).await.unwrap();
        let newest = store.insert(fields("2024-05-01T12:01:00.000Z")).await.unwrap();

        let latest = store.latest(1).await.unwrap();

        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, newest.id);
        assert_eq!(store.collection().len(), 2);
    }

    #[tokio::test]
    async fn test_store_respects_collection_retention() {
        let store = MemoryLogStore::new(InMemoryCollection::with_retention(
            insight_core::feed::LOGS_COLLECTION,
            2,
        ));
        for minute in 0..4 {
            store
                .insert(fields(&format!("2024-05-01T12:0{}:00.000Z", minute)))
                .await
                .unwrap();
        }

        let latest = store.latest(100).await.unwrap();

        assert_eq!(latest.len(), 2);
        assert_eq!(latest[1].field_str("timestamp"), Some("2024-05-01T12:02:00.000Z"));
    }
}
