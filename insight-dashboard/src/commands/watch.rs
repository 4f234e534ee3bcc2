//! Watch command
//!
//! Subscribes an [`Aggregator`] to the server through an HTTP polling feed
//! and redraws the dashboard every time the stats board changes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use insight_client::{HttpLiveFeed, InsightClient};
use insight_core::aggregate::{Aggregator, StatsBoard};
use insight_core::time::SystemClock;

use crate::config::Config;
use crate::render;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// Run the live dashboard until Ctrl-C
pub async fn watch(config: &Config, poll_interval: Duration, rows: usize) -> Result<()> {
    let client = InsightClient::new(&config.server_url);
    let feed = HttpLiveFeed::new(client, poll_interval).context("Failed to create live feed")?;

    let board = StatsBoard::new();
    let mut updates = board.subscribe();
    let aggregator = Aggregator::attach(&feed, board, Arc::new(SystemClock));

    tracing::info!(
        "Watching {} (poll interval: {:?})",
        config.server_url,
        poll_interval
    );

    print!(
        "{}{}",
        CLEAR_SCREEN,
        render::frame(&updates.borrow(), &config.server_url, rows)
    );

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = Arc::clone(&updates.borrow_and_update());
                print!("{}{}", CLEAR_SCREEN, render::frame(&state, &config.server_url, rows));
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    aggregator.detach();
    tracing::info!("Dashboard stopped");

    Ok(())
}
