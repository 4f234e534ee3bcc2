//! Insight Server
//!
//! Synthesizes structured log events, runs them through processing and
//! serves the processed-logs collection over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use insight_core::feed::{InMemoryCollection, LOGS_COLLECTION};
use insight_core::time::SystemClock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod state;

use crate::config::Config;
use crate::repository::{LogStore, MemoryLogStore, PgLogStore};
use crate::service::generator::LogGenerator;
use crate::service::scheduler::{self, JitteredInterval};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insight_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Insight Server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    let store = connect_store(&config).await?;

    // One seed drives both the generator and the scheduler
    let mut seeder = match config.generator_seed {
        Some(seed) => {
            tracing::info!("Using fixed generator seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };
    let generator = LogGenerator::new(
        StdRng::seed_from_u64(seeder.random()),
        Arc::new(SystemClock),
    );
    let interval = JitteredInterval::new(
        config.generator_interval,
        StdRng::seed_from_u64(seeder.random()),
    );

    let state = AppState::new(store, generator);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let generation = if config.generator_enabled {
        Some(tokio::spawn(scheduler::run_generation_loop(
            state.clone(),
            interval,
            shutdown_rx,
        )))
    } else {
        tracing::info!("Automatic log generation disabled");
        None
    };

    // Build router with all API endpoints
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!("Log generator service listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = generation {
        if let Err(e) = handle.await {
            tracing::warn!("Generation task ended abnormally: {}", e);
        }
    }

    tracing::info!("Insight Server stopped");
    Ok(())
}

/// Pick the collection backend from configuration
async fn connect_store(config: &Config) -> Result<Arc<dyn LogStore>> {
    match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(database_url)
                .await
                .context("Failed to create database pool")?;

            tracing::info!("Database connection pool created");

            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Ok(Arc::new(PgLogStore::new(pool)))
        }
        None => {
            tracing::info!(
                "DATABASE_URL not set, using in-memory collection (retention: {})",
                config.memory_retention
            );
            Ok(Arc::new(MemoryLogStore::new(
                InMemoryCollection::with_retention(LOGS_COLLECTION, config.memory_retention),
            )))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
