//! PostgreSQL connection pool configuration and setup
//!
//! This module handles the creation and configuration of a connection pool
//! for PostgreSQL database access.

use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use std::time::Duration;
use tokio_postgres::NoTls;

use crate::types::{DatabaseConfig, StartupError};

/// Creates a PostgreSQL connection pool from the database settings
///
/// The pool connects lazily; call [`health_check`] to fail fast at startup.
pub fn create_pool(settings: &DatabaseConfig) -> Result<Pool, StartupError> {
    let mut cfg = Config::new();

    cfg.url = Some(settings.url.clone());
    cfg.pool = Some(PoolConfig::new(settings.max_connections));
    cfg.connect_timeout = Some(Duration::from_secs(settings.connect_timeout_secs));

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| StartupError::Database(format!("Failed to create pool: {}", e)))
}

/// Checks if the database connection is working
pub async fn health_check(pool: &Pool) -> Result<(), StartupError> {
    let client = pool
        .get()
        .await
        .map_err(|e| StartupError::Database(format!("Failed to get database connection: {}", e)))?;

    client
        .query_one("SELECT 1", &[])
        .await
        .map_err(|e| StartupError::Database(format!("Database health check failed: {}", e)))?;

    Ok(())
}
