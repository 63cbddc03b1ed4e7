use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates the PostgreSQL pool for the records table. Reads only, so the pool is small.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to records database...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    info!("Records database pool established");
    Ok(pool)
}
