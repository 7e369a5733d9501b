//! Database pool and per-request transactions.
//!
//! Each handler that touches the database opens one transaction with [`begin`], runs its
//! repository calls on it and commits at the end. Returning early with `?` drops the
//! transaction, which rolls it back.

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;

pub type DbTransaction = Transaction<'static, Postgres>;

/// Builds the pool without opening a connection; the first query connects.
pub fn connect(config: &Config) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&config.database_url)
        .map_err(AppError::from)
}

/// Startup connectivity probe. A failure is logged, not fatal: the server still starts
/// and requests fail until the database is reachable.
pub async fn check_connection(pool: &PgPool) -> bool {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => {
            log::info!("Database connection successful");
            true
        }
        Err(e) => {
            log::warn!(
                "Database connection failed: {}. Database operations will fail until it is fixed",
                e
            );
            false
        }
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations applied");
    Ok(())
}

pub async fn begin(pool: &PgPool) -> Result<DbTransaction, AppError> {
    pool.begin().await.map_err(AppError::from)
}

pub async fn close(pool: &PgPool) {
    pool.close().await;
    log::info!("Database pool closed");
}
