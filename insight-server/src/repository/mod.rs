//! Repository Module
//!
//! Storage for processed logs. The collection lives in Postgres when a
//! database is configured and in process memory otherwise.

pub mod log;
pub mod memory;

use async_trait::async_trait;
use insight_core::domain::log::LogDocument;
use insight_core::feed::FeedError;
use serde_json::{Map, Value};
use thiserror::Error;

pub use log::PgLogStore;
pub use memory::MemoryLogStore;

/// Storage error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Collection query failed: {0}")]
    Query(#[from] FeedError),

    #[error("Stored document is malformed: {0}")]
    Malformed(String),
}

/// The processed-logs collection
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Store a processed document; storage assigns the id
    async fn insert(&self, fields: Map<String, Value>) -> Result<LogDocument, StoreError>;

    /// The newest `limit` documents ordered by timestamp, newest first
    async fn latest(&self, limit: usize) -> Result<Vec<LogDocument>, StoreError>;
}
