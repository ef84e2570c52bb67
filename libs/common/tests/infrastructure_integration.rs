//! Integration tests for the infrastructure components
//!
//! These tests verify that the SQLite database is reachable, that the
//! embedded schema applies cleanly, and that foreign-key cascades are live
//! on pooled connections.

use common::database::{DatabaseConfig, connect, health_check};
use sqlx::Row;

/// Test that verifies the pool answers queries and the schema is installed
#[tokio::test]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect(&DatabaseConfig::in_memory()).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i64 = row.get("result");
    assert_eq!(result, 1, "SQLite simple query test failed");

    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(&pool)
            .await?;

    for expected in [
        "artist_events",
        "artists",
        "attendee_events",
        "attendee_favorite_artists",
        "attendee_favorite_events",
        "attendee_venues",
        "attendees",
        "events",
        "sessions",
        "tour_events",
        "tours",
        "users",
        "venues",
    ] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}"
        );
    }

    Ok(())
}

/// Deleting a venue must take its events and their association rows along
#[tokio::test]
async fn test_foreign_key_cascades_are_enforced() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect(&DatabaseConfig::in_memory()).await?;

    let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&pool)
        .await?;
    assert_eq!(fk, 1, "foreign keys must be enabled");

    sqlx::query(
        "INSERT INTO venues (id, name, organizer, email, earnings) VALUES (1, 'Hall', 'Jo', 'jo@x.com', '10')",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "INSERT INTO events (id, name, date, time, location, description, event_type, venue_id)
         VALUES (1, 'Gig', '2025-01-01', '20:00', 'Hall', 'Loud', 'Concert', 1)",
    )
    .execute(&pool)
    .await?;
    sqlx::query("INSERT INTO attendees (id, first_name, last_name, email) VALUES (1, 'A', 'B', 'a@b.com')")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO attendee_events (attendee_id, event_id) VALUES (1, 1)")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO attendee_venues (attendee_id, venue_id, rating) VALUES (1, 1, 4)")
        .execute(&pool)
        .await?;

    sqlx::query("DELETE FROM venues WHERE id = 1")
        .execute(&pool)
        .await?;

    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(&pool)
        .await?;
    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendee_events")
        .fetch_one(&pool)
        .await?;
    let ratings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendee_venues")
        .fetch_one(&pool)
        .await?;

    assert_eq!(events, 0);
    assert_eq!(links, 0);
    assert_eq!(ratings, 0);
    Ok(())
}

/// The rating CHECK constraint backs up application-level validation
#[tokio::test]
async fn test_rating_check_constraint() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect(&DatabaseConfig::in_memory()).await?;

    sqlx::query(
        "INSERT INTO venues (id, name, organizer, email, earnings) VALUES (1, 'Hall', 'Jo', 'jo@x.com', '10')",
    )
    .execute(&pool)
    .await?;
    sqlx::query("INSERT INTO attendees (id, first_name, last_name, email) VALUES (1, 'A', 'B', 'a@b.com')")
        .execute(&pool)
        .await?;

    let result = sqlx::query("INSERT INTO attendee_venues (attendee_id, venue_id, rating) VALUES (1, 1, 6)")
        .execute(&pool)
        .await;
    let err = common::ServiceError::from(result.unwrap_err());
    assert!(matches!(err, common::ServiceError::Validation(_)));

    Ok(())
}
