//! Identity store configuration

use chrono::Duration;

/// Session settings handed to the identity store by the host service
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of a session token in seconds (default: 1 day)
    pub session_ttl_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: 86_400,
        }
    }
}

impl AuthConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_day() {
        assert_eq!(AuthConfig::default().session_ttl(), Duration::days(1));
    }
}
