//! Session model and related functionality

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Session entity
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Token handed to the client when a session is established
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn bearer(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }
}
