//! Common library for the events backend
//!
//! This crate provides shared functionality used by the identity and events
//! services: SQLite connectivity, the embedded schema, and the error
//! taxonomy every store operation reports through.

pub mod database;
pub mod error;

pub use error::{ServiceError, ServiceResult};

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, connect, health_check};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = connect(&config).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
