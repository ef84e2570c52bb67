//! Session management backed by the sessions table

use chrono::{Duration, Utc};
use common::ServiceResult;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::identity::Identity;
use crate::models::SessionToken;
use crate::repositories::{session, user};

/// Session manager for handling user sessions
#[derive(Clone)]
pub struct SessionManager {
    pool: SqlitePool,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Create a new session for a user inside the caller's transaction
    pub async fn create_session(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> ServiceResult<SessionToken> {
        info!("Creating session for user: {}", user_id);
        session::insert(conn, user_id, self.ttl).await
    }

    /// Resolve a bearer token to the identity that owns it
    ///
    /// Unknown and expired tokens resolve to `None`.
    pub async fn resolve(&self, token: &str) -> ServiceResult<Option<Identity>> {
        let mut conn = self.pool.acquire().await?;

        let Some(found) = session::find_by_token(&mut conn, token).await? else {
            return Ok(None);
        };

        if found.expires_at <= Utc::now() {
            info!("Session for user {} has expired", found.user_id);
            session::delete_by_token(&mut conn, token).await?;
            return Ok(None);
        }

        let owner = user::find_by_id(&mut conn, found.user_id).await?;
        Ok(owner.as_ref().map(Identity::from))
    }

    /// Delete a session; deleting an unknown token is not an error
    pub async fn delete_session(&self, token: &str) -> ServiceResult<()> {
        let mut conn = self.pool.acquire().await?;
        if session::delete_by_token(&mut conn, token).await? {
            info!("Session ended");
        }
        Ok(())
    }

    /// Cleanup expired sessions inside the caller's transaction
    ///
    /// Runs whenever a session is opened, so tokens that are never presented
    /// again do not pile up.
    pub async fn cleanup_expired_sessions(&self, conn: &mut SqliteConnection) -> ServiceResult<u64> {
        let removed = session::delete_expired(conn, Utc::now()).await?;
        if removed > 0 {
            info!("Removed {} expired sessions", removed);
        }
        Ok(removed)
    }
}
