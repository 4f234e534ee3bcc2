//! Commands module
//!
//! Defines all dashboard commands and their handlers.

mod generate;
mod watch;

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show live statistics for the newest processed logs
    Watch {
        /// How often the server is polled, in milliseconds
        #[arg(long, default_value_t = 1000)]
        poll_interval_ms: u64,

        /// Rows shown in the live log table
        #[arg(long, default_value_t = 15)]
        rows: usize,
    },
    /// Trigger log generation on the server
    Generate {
        /// Number of logs to generate
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Check that the server is reachable
    Status,
}

/// Handle a command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Watch {
            poll_interval_ms,
            rows,
        } => watch::watch(config, Duration::from_millis(poll_interval_ms.max(1)), rows).await,
        Commands::Generate { count } => generate::generate(config, count).await,
        Commands::Status => generate::status(config).await,
    }
}
