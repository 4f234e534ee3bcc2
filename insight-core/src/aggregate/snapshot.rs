//! Snapshot ingestion
//!
//! Turns the documents delivered by the live feed into normalized records.
//! Nothing here fails: a missing or unparseable field simply stays `None`
//! and the record is still part of the snapshot.

use chrono::{DateTime, Utc};

use crate::domain::log::{LogDocument, LogLevel};

/// Maximum number of documents the feed delivers per snapshot
pub const SNAPSHOT_LIMIT: usize = 100;

/// A stored document decorated with its parsed fields
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub level: Option<LogLevel>,
    pub timestamp: Option<DateTime<Utc>>,
    pub document: LogDocument,
}

impl NormalizedRecord {
    pub fn from_document(document: LogDocument) -> Self {
        let level = document.field_str("level").map(LogLevel::parse);
        let timestamp = document.field_str("timestamp").and_then(parse_timestamp);

        Self {
            level,
            timestamp,
            document,
        }
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// Ordered, normalized view of one feed delivery
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<NormalizedRecord>,
}

impl Snapshot {
    /// Normalize a delivery, preserving order and ids
    ///
    /// Deliveries above `SNAPSHOT_LIMIT` break the feed contract; they are
    /// processed in full and reported.
    pub fn ingest(documents: Vec<LogDocument>) -> Self {
        if documents.len() > SNAPSHOT_LIMIT {
            tracing::warn!(
                delivered = documents.len(),
                limit = SNAPSHOT_LIMIT,
                "Snapshot exceeds feed limit; processing all delivered records"
            );
        }

        Self {
            records: documents
                .into_iter()
                .map(NormalizedRecord::from_document)
                .collect(),
        }
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    fn doc(id: &str, fields: Value) -> LogDocument {
        let fields: Map<String, Value> = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        LogDocument::new(id, fields)
    }

    #[test]
    fn test_ingest_preserves_order_and_ids() {
        let snapshot = Snapshot::ingest(vec![
            doc("b", json!({"level": "INFO", "timestamp": "2024-05-01T12:00:02.000Z"})),
            doc("a", json!({"level": "WARN", "timestamp": "2024-05-01T12:00:01.000Z"})),
        ]);

        let ids: Vec<&str> = snapshot.records().iter().map(NormalizedRecord::id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(snapshot.records()[1].level, Some(LogLevel::Warn));
    }

    #[test]
    fn test_ingest_tolerates_malformed_fields() {
        let snapshot = Snapshot::ingest(vec![
            doc("missing", json!({"message": "no level, no time"})),
            doc("numeric", json!({"level": 3, "timestamp": 1714564800})),
            doc("garbled", json!({"level": "ERROR", "timestamp": "yesterday"})),
        ]);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.records()[0].level, None);
        assert_eq!(snapshot.records()[1].level, None);
        assert_eq!(snapshot.records()[1].timestamp, None);
        assert_eq!(snapshot.records()[2].level, Some(LogLevel::Error));
        assert_eq!(snapshot.records()[2].timestamp, None);
    }

    #[test]
    fn test_ingest_is_idempotent() {
        let documents = vec![doc(
            "x",
            json!({"level": "ERROR", "timestamp": "2024-05-01T12:00:00+02:00"}),
        )];

        assert_eq!(
            Snapshot::ingest(documents.clone()),
            Snapshot::ingest(documents)
        );
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::ingest(Vec::new());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_parse_timestamp_normalizes_offset() {
        let parsed = parse_timestamp("2024-05-01T14:05:00+02:00").unwrap();
        assert_eq!(parsed, parse_timestamp("2024-05-01T12:05:00Z").unwrap());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_oversized_snapshot_is_not_truncated() {
        let documents: Vec<LogDocument> = (0..SNAPSHOT_LIMIT + 1)
            .map(|i| doc(&i.to_string(), json!({"level": "INFO"})))
            .collect();

        let snapshot = Snapshot::ingest(documents);
        assert_eq!(snapshot.len(), SNAPSHOT_LIMIT + 1);
    }
}
