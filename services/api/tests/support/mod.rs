//! Shared fixtures for the store integration tests

#![allow(dead_code)]

use api::AppState;
use api::models::{NewAttendee, NewEvent, NewVenue};
use auth::{AuthConfig, Identity, Role};
use chrono::Utc;
use common::database::{DatabaseConfig, connect};
use sqlx::SqlitePool;

pub async fn setup() -> (SqlitePool, AppState) {
    let pool = connect(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory database");
    let state = AppState::new(pool.clone(), &AuthConfig::default());
    (pool, state)
}

/// Insert a user row directly; the stores only need its id and name
pub async fn seed_user(pool: &SqlitePool, username: &str, role: Role) -> Identity {
    let id = sqlx::query(
        "INSERT INTO users (username, password_hash, role, profile_completed, created_at) VALUES (?, 'unused', ?, 0, ?)",
    )
    .bind(username)
    .bind(role.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();
    Identity::new(id, username, role)
}

pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
}

pub fn loft() -> NewVenue {
    NewVenue {
        name: "The Loft".into(),
        organizer: "Jane".into(),
        email: "j@x.com".into(),
        earnings: "1000".into(),
        description: None,
    }
}

pub fn event_at(name: &str, venue_id: Option<i64>) -> NewEvent {
    NewEvent {
        name: name.into(),
        date: "2025-03-01".into(),
        time: "20:00".into(),
        location: "Main Hall".into(),
        description: "...".into(),
        event_type: "Karaoke".into(),
        venue_id,
        artist_ids: None,
    }
}

pub fn attendee(first: &str, last: &str, email: &str) -> NewAttendee {
    NewAttendee {
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
        preferred_event_type: None,
        favorite_event_types: vec![],
        social_media: None,
        favorite_event_ids: vec![],
        favorite_artist_ids: vec![],
    }
}
