//! Log Repository
//!
//! Postgres-backed processed-logs collection. Documents are stored as JSONB
//! alongside their `timestamp` field, which snapshots are ordered by.

use async_trait::async_trait;
use insight_core::domain::log::LogDocument;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::{LogStore, StoreError};

#[derive(Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn insert(&self, fields: Map<String, Value>) -> Result<LogDocument, StoreError> {
        let document = LogDocument::new(Uuid::new_v4().to_string(), fields);
        let id = Uuid::parse_str(&document.id).map_err(|e| StoreError::Malformed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO processed_logs (id, timestamp, document, created_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(id)
        .bind(document.field_str("timestamp"))
        .bind(Value::Object(document.fields.clone()))
        .execute(&self.pool)
        .await?;

        Ok(document)
    }

    async fn latest(&self, limit: usize) -> Result<Vec<LogDocument>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, document
            FROM processed_logs
            WHERE timestamp IS NOT NULL
            ORDER BY timestamp DESC, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LogDocument::try_from).collect()
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct LogRow {
    id: Uuid,
    document: Value,
}

impl TryFrom<LogRow> for LogDocument {
    type Error = StoreError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        match row.document {
            Value::Object(fields) => Ok(LogDocument::new(row.id.to_string(), fields)),
            other => Err(StoreError::Malformed(format!(
                "document {} is not an object: {}",
                row.id, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_to_document() {
        let id = Uuid::new_v4();
        let row = LogRow {
            id,
            document: json!({"level": "WARN", "timestamp": "2024-05-01T12:00:00.000Z"}),
        };

        let document = LogDocument::try_from(row).unwrap();
        assert_eq!(document.id, id.to_string());
        assert_eq!(document.field_str("level"), Some("WARN"));
    }

    #[test]
    fn test_non_object_row_is_rejected() {
        let row = LogRow {
            id: Uuid::new_v4(),
            document: json!(["not", "an", "object"]),
        };

        assert!(matches!(
            LogDocument::try_from(row),
            Err(StoreError::Malformed(_))
        ));
    }
}
