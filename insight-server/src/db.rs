use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Processed logs; the document keeps every field as received
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processed_logs (
            id UUID PRIMARY KEY,
            timestamp TEXT,
            document JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Snapshot queries read the newest rows first
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_processed_logs_timestamp ON processed_logs(timestamp DESC, created_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
