use crate::error::DbError;
use configuration::DatabaseConfig;
use dotenvy::dotenv;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The URL comes from `database.url` when configured, otherwise from `DATABASE_URL`
/// (the `.env` file is loaded first if present). The pool can be shared across the
/// entire application.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    // A missing .env file is fine; the variable may be set by the environment.
    dotenv().ok();

    let database_url = match &config.url {
        Some(url) => url.clone(),
        None => env::var("DATABASE_URL").map_err(|_e| {
            DbError::ConnectionConfigError("database.url or DATABASE_URL must be set.".to_string())
        })?,
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&database_url)
        .await?;

    tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL.");
    Ok(pool)
}

/// Applies the embedded migrations, ensuring the schema is up-to-date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
