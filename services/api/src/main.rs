use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{AppConfig, AppState, create_router};
use common::database::{DatabaseConfig, connect, health_check};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting events API service");

    let app_config = AppConfig::from_env()?;

    // Initialize database connection pool and schema
    let db_config = DatabaseConfig::from_env()?;
    let pool = connect(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let app_state = AppState::new(pool, &app_config.auth());

    match app_config.bootstrap_admin() {
        Some((username, password)) => {
            let admin = app_state.auth.ensure_admin(username, password).await?;
            info!("Bootstrap admin {} is ready", admin.username);
        }
        None => warn!("No bootstrap admin configured"),
    }

    let app = create_router(app_state);

    let address = app_config.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Events API listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
