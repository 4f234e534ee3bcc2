//! Configuration module
//!
//! Settings shared by every dashboard command.

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Insight server
    pub server_url: String,
}
