//! Generate command handlers
//!
//! Fires the server's manual trigger and reports what was produced.

use anyhow::{Context, Result};
use colored::*;
use insight_client::InsightClient;
use insight_core::domain::log::LogRecord;

use crate::config::Config;
use crate::render;

/// Generate `count` logs, one request each
pub async fn generate(config: &Config, count: u32) -> Result<()> {
    let client = InsightClient::new(&config.server_url);

    for _ in 0..count {
        let record = client
            .generate_log()
            .await
            .context("Failed to generate log")?;
        print_generated(&record);
    }

    if count > 1 {
        println!();
        println!("{}", format!("Generated {} logs.", count).green());
    }

    Ok(())
}

/// Report whether the server answers its health check
pub async fn status(config: &Config) -> Result<()> {
    let client = InsightClient::new(&config.server_url);

    match client.health().await {
        Ok(()) => {
            println!("{} {}", "✓".green(), format!("{} is up", client.base_url()).bold());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red(), format!("{} is unreachable", client.base_url()).bold());
            Err(e).context("Health check failed")
        }
    }
}

fn print_generated(record: &LogRecord) {
    println!(
        "  {} {} {} {}",
        "▸".cyan(),
        render::colorize_level(record.level.as_str()),
        record.message,
        record.trace_id.dimmed()
    );
}
