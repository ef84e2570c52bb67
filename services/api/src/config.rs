//! Server configuration

use auth::AuthConfig;
use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Settings for the HTTP server, loaded from `APP_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bind host (default: 0.0.0.0)
    pub host: String,
    /// Bind port (default: 3001)
    pub port: u16,
    /// Lifetime of a session token in seconds (default: 86400)
    pub session_ttl_seconds: i64,
    /// Bootstrap admin created or promoted at startup
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `APP_HOST`, `APP_PORT`: listen address
    /// - `APP_SESSION_TTL_SECONDS`: session lifetime
    /// - `APP_ADMIN_USERNAME`, `APP_ADMIN_PASSWORD`: bootstrap admin
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001)?
            .set_default("session_ttl_seconds", 86_400)?
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.session_ttl_seconds <= 0 {
            return Err(ConfigError::Message(
                "APP_SESSION_TTL_SECONDS must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            session_ttl_seconds: self.session_ttl_seconds,
        }
    }

    /// Bootstrap admin credentials, when both are configured
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}
