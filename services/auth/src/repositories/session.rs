//! Session queries

use chrono::{DateTime, Duration, Utc};
use common::ServiceResult;
use rand::{Rng, distributions::Alphanumeric};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqliteConnection};

use crate::models::{Session, SessionToken};

const TOKEN_LENGTH: usize = 48;

/// Hash of a bearer token as stored in the sessions table
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Open a session for `user_id`; only the token hash is persisted
pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: i64,
    ttl: Duration,
) -> ServiceResult<SessionToken> {
    let token = generate_token();
    let now = Utc::now();
    let expires_at = now + ttl;

    sqlx::query(
        r#"
        INSERT INTO sessions (user_id, token_hash, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(expires_at)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(SessionToken::bearer(token, expires_at))
}

pub async fn find_by_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> ServiceResult<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, token_hash, expires_at, created_at
        FROM sessions
        WHERE token_hash = ?
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(Session {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            token_hash: row.try_get("token_hash")?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
        })),
        None => Ok(None),
    }
}

pub async fn delete_by_token(conn: &mut SqliteConnection, token: &str) -> ServiceResult<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_expired(conn: &mut SqliteConnection, now: DateTime<Utc>) -> ServiceResult<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
    }

    #[test]
    fn generated_tokens_are_alphanumeric() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }
}
