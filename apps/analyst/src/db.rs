use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects the pool backing the suggestion store.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting suggestion store to PostgreSQL (max {MAX_CONNECTIONS} connections)");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
        .context("failed to connect the suggestion store to PostgreSQL")?;

    info!("Suggestion store ready");
    Ok(pool)
}
