//! User queries
//!
//! Every function runs against a caller-supplied connection so the identity
//! service can compose them inside one transaction.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::Utc;
use common::database::like_pattern;
use common::{ServiceError, ServiceResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::info;

use crate::models::{Role, User, UserQuery};

const USER_COLUMNS: &str =
    "id, username, password_hash, role, profile_completed, created_at, last_login";

fn user_from_row(row: &SqliteRow) -> ServiceResult<User> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|_| ServiceError::Internal(format!("Stored role '{}' is invalid", role)))?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role,
        profile_completed: row.try_get("profile_completed")?,
        created_at: row.try_get("created_at")?,
        last_login: row.try_get("last_login")?,
    })
}

/// Hash a plaintext password with a fresh salt
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();
    Ok(password_hash)
}

/// Verify a user's password
pub fn verify_password(user: &User, password: &str) -> ServiceResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ServiceError::Internal(format!("Failed to parse password hash: {}", e)))?;

    let argon2 = Argon2::default();
    let result = argon2.verify_password(password.as_bytes(), &parsed_hash);

    Ok(result.is_ok())
}

/// Create a new user
pub async fn insert(
    conn: &mut SqliteConnection,
    username: &str,
    password: &str,
    role: Role,
) -> ServiceResult<User> {
    info!("Creating new user: {}", username);

    let password_hash = hash_password(password)?;

    let id = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, role, profile_completed, created_at)
        VALUES (?, ?, ?, 0, ?)
        "#,
    )
    .bind(username)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| ServiceError::Internal("Inserted user vanished".to_string()))
}

/// Find a user by ID
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Find a user by exact username
pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> ServiceResult<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn username_exists(conn: &mut SqliteConnection, username: &str) -> ServiceResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

pub async fn touch_last_login(conn: &mut SqliteConnection, id: i64) -> ServiceResult<()> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn mark_profile_completed(conn: &mut SqliteConnection, id: i64) -> ServiceResult<bool> {
    let result = sqlx::query("UPDATE users SET profile_completed = 1 WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_role(conn: &mut SqliteConnection, id: i64, role: Role) -> ServiceResult<bool> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a user; owned venues, artists, events, tours and sessions go with it
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> ServiceResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, role: Option<Role>, completed: Option<bool>) {
    builder.push(" WHERE 1 = 1");
    if let Some(role) = role {
        builder.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(completed) = completed {
        builder.push(" AND profile_completed = ").push_bind(completed);
    }
}

/// Get users with pagination and filtering
pub async fn list(
    conn: &mut SqliteConnection,
    query: &UserQuery,
) -> ServiceResult<(Vec<User>, i64)> {
    let role = query.role.as_deref().map(str::parse::<Role>).transpose()?;

    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users"));
    push_filters(&mut builder, role, query.profile_completed);
    builder
        .push(" ORDER BY id LIMIT ")
        .push_bind(query.per_page() as i64)
        .push(" OFFSET ")
        .push_bind(query.offset());

    let rows = builder.build().fetch_all(&mut *conn).await?;
    let users = rows
        .iter()
        .map(user_from_row)
        .collect::<ServiceResult<Vec<_>>>()?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
    push_filters(&mut count, role, query.profile_completed);
    let total: i64 = count
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    Ok((users, total))
}

/// Case-insensitive substring search on username
pub async fn search(conn: &mut SqliteConnection, term: &str) -> ServiceResult<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) LIKE LOWER(?) ESCAPE '\\' ORDER BY id"
    ))
    .bind(like_pattern(term.trim()))
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(user_from_row).collect()
}
