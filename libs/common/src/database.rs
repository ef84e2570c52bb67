//! Database module for handling SQLite connections and operations
//!
//! This module provides connection pooling, configuration, schema bootstrap
//! and health checks for the SQLite database.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

/// URL of a private in-memory database
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: SQLite connection URL (default: "sqlite://events.db")
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum number of connections (default: 5)
    /// - `DATABASE_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 30)
    pub fn from_env() -> DatabaseResult<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://events.db".to_string());

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let connection_timeout = env::var("DATABASE_CONNECTION_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        if max_connections == 0 {
            return Err(DatabaseError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            connection_timeout,
        })
    }

    /// Configuration for a throwaway in-memory database.
    ///
    /// Every connection to `sqlite::memory:` opens its own database, so the
    /// pool is pinned to one connection that never expires.
    pub fn in_memory() -> Self {
        Self {
            database_url: IN_MEMORY_URL.to_string(),
            max_connections: 1,
            connection_timeout: 5,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

/// Initialize a SQLite connection pool
///
/// Foreign keys are switched on for every connection; the schema relies on
/// `ON DELETE CASCADE` to keep association tables consistent.
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<SqlitePool>` - SQLite connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    info!("Initializing database connection pool");

    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout));

    if config.is_in_memory() {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> DatabaseResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    info!("Database schema is up to date");
    Ok(())
}

/// Open a pool and bring its schema up to date
pub async fn connect(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = init_pool(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Check database connectivity
///
/// # Arguments
///
/// * `pool` - SQLite connection pool
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if the database answered, false otherwise
pub async fn health_check(pool: &SqlitePool) -> DatabaseResult<bool> {
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => Ok(true),
        Err(e) => {
            error!("Database health check failed: {}", e);
            Ok(false)
        }
    }
}

/// Substring pattern for `LIKE ? ESCAPE '\'`; wildcards in `term` match literally
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("loft"), "%loft%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    #[serial]
    fn test_database_config_from_env() {
        unsafe {
            std::env::remove_var("DATABASE_URL");
            std::env::remove_var("DATABASE_MAX_CONNECTIONS");
            std::env::remove_var("DATABASE_CONNECTION_TIMEOUT");
        }

        let config = DatabaseConfig::from_env().expect("Failed to create database config");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.connection_timeout, 30);
        assert_eq!(config.database_url, "sqlite://events.db");
    }

    #[test]
    #[serial]
    fn test_database_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("DATABASE_URL", "sqlite://custom.db");
            std::env::set_var("DATABASE_MAX_CONNECTIONS", "12");
            std::env::set_var("DATABASE_CONNECTION_TIMEOUT", "60");
        }

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.database_url, "sqlite://custom.db");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.connection_timeout, 60);

        unsafe {
            std::env::remove_var("DATABASE_URL");
            std::env::remove_var("DATABASE_MAX_CONNECTIONS");
            std::env::remove_var("DATABASE_CONNECTION_TIMEOUT");
        }
    }

    #[test]
    #[serial]
    fn test_zero_connections_is_rejected() {
        unsafe {
            std::env::set_var("DATABASE_MAX_CONNECTIONS", "0");
        }

        let result = DatabaseConfig::from_env();
        assert!(matches!(result, Err(DatabaseError::Configuration(_))));

        unsafe {
            std::env::remove_var("DATABASE_MAX_CONNECTIONS");
        }
    }

    #[tokio::test]
    async fn test_in_memory_pool_is_healthy() {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        assert!(health_check(&pool).await.unwrap());
    }
}
