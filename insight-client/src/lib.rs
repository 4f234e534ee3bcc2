//! Insight HTTP Client
//!
//! A small, typed HTTP client for the Insight server, plus [`HttpLiveFeed`],
//! a live feed that polls the server's snapshot endpoint.
//!
//! # Example
//!
//! ```no_run
//! use insight_client::InsightClient;
//!
//! #[tokio::main]
//! async fn main() -> insight_client::Result<()> {
//!     let client = InsightClient::new("http://localhost:8080");
//!
//!     let record = client.generate_log().await?;
//!     println!("Generated {} log: {}", record.level, record.message);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod feed;
mod logs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use feed::HttpLiveFeed;

use insight_core::dto::log::FailureResponse;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Insight server API
#[derive(Debug, Clone)]
pub struct InsightClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl InsightClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use insight_client::InsightClient;
    ///
    /// let client = InsightClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Failed requests carry `{ "success": false, "message": ... }`; the
    /// message is surfaced when present, otherwise the raw body.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<FailureResponse>(&error_text)
                .map(|failure| failure.message)
                .unwrap_or(error_text);
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = InsightClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = InsightClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = InsightClient::with_client("http://localhost:8080", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
