//! Log endpoints

use insight_core::domain::log::{LogDocument, LogRecord};
use insight_core::dto::log::{GenerateLogResponse, IngestResponse};
use serde_json::Value;

use crate::{InsightClient, Result};

impl InsightClient {
    /// Ask the server to generate, process and store one log
    ///
    /// Returns the record as generated, before processing.
    pub async fn generate_log(&self) -> Result<LogRecord> {
        let url = format!("{}/api/generate-log", self.base_url);
        let response = self.client.post(&url).send().await?;
        let body: GenerateLogResponse = self.handle_response(response).await?;
        Ok(body.log_generated)
    }

    /// Submit a collector entry for processing
    pub async fn ingest(&self, entry: &Value) -> Result<IngestResponse> {
        let url = format!("{}/api/ingest", self.base_url);
        let response = self.client.post(&url).json(entry).send().await?;
        self.handle_response(response).await
    }

    /// Newest processed logs, newest first
    pub async fn latest_logs(&self, limit: usize) -> Result<Vec<LogDocument>> {
        let url = format!("{}/api/logs", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Check that the server is up
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        self.handle_empty_response(response).await
    }
}
