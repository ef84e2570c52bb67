//! Repositories for database operations
//!
//! Row helpers in each submodule run against a caller-supplied connection.
//! The repository structs own the pool: reads acquire one connection, every
//! mutation runs inside a single transaction.

use common::database::like_pattern;
use common::{ServiceError, ServiceResult};
use sqlx::{Row, SqliteConnection};
use tracing::warn;

use crate::models::CreatorSummary;

pub mod artist;
pub mod association;
pub mod attendee;
pub mod event;
pub mod tour;
pub mod venue;

pub use artist::ArtistRepository;
pub use association::AssociationRepository;
pub use attendee::AttendeeRepository;
pub use event::EventRepository;
pub use tour::TourRepository;
pub use venue::VenueRepository;

/// A many-to-many join table and its two key columns
#[derive(Debug, Clone, Copy)]
pub struct LinkTable {
    pub table: &'static str,
    pub left: &'static str,
    pub right: &'static str,
}

/// Attendee attends event
pub const ATTENDANCE: LinkTable = LinkTable {
    table: "attendee_events",
    left: "attendee_id",
    right: "event_id",
};

pub const FAVORITE_EVENTS: LinkTable = LinkTable {
    table: "attendee_favorite_events",
    left: "attendee_id",
    right: "event_id",
};

pub const FAVORITE_ARTISTS: LinkTable = LinkTable {
    table: "attendee_favorite_artists",
    left: "attendee_id",
    right: "artist_id",
};

/// Artist is booked for event
pub const BOOKINGS: LinkTable = LinkTable {
    table: "artist_events",
    left: "artist_id",
    right: "event_id",
};

pub const TOUR_EVENTS: LinkTable = LinkTable {
    table: "tour_events",
    left: "tour_id",
    right: "event_id",
};

impl LinkTable {
    pub async fn contains(
        &self,
        conn: &mut SqliteConnection,
        left: i64,
        right: i64,
    ) -> ServiceResult<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ? AND {} = ?",
            self.table, self.left, self.right
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(left)
            .bind(right)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count > 0)
    }

    /// Insert the pair unless it is already present; true when a row was added
    pub async fn link(
        &self,
        conn: &mut SqliteConnection,
        left: i64,
        right: i64,
    ) -> ServiceResult<bool> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?, ?)",
            self.table, self.left, self.right
        );
        let result = sqlx::query(&sql)
            .bind(left)
            .bind(right)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn unlink(
        &self,
        conn: &mut SqliteConnection,
        left: i64,
        right: i64,
    ) -> ServiceResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ? AND {} = ?",
            self.table, self.left, self.right
        );
        let result = sqlx::query(&sql)
            .bind(left)
            .bind(right)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop every link of one left-hand row
    pub async fn clear_left(&self, conn: &mut SqliteConnection, left: i64) -> ServiceResult<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", self.table, self.left);
        let result = sqlx::query(&sql).bind(left).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    /// Drop every link of one right-hand row
    pub async fn clear_right(&self, conn: &mut SqliteConnection, right: i64) -> ServiceResult<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", self.table, self.right);
        let result = sqlx::query(&sql).bind(right).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

/// Whether a row with `id` exists in `table`
pub async fn exists(conn: &mut SqliteConnection, table: &'static str, id: i64) -> ServiceResult<bool> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", table);
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

/// Keep the ids that resolve to a row of `table`, in order and without repeats
///
/// Unresolved ids are skipped with a warning.
pub async fn existing_ids(
    conn: &mut SqliteConnection,
    table: &'static str,
    ids: &[i64],
) -> ServiceResult<Vec<i64>> {
    let mut found = Vec::with_capacity(ids.len());
    for &id in ids {
        if found.contains(&id) {
            continue;
        }
        if exists(conn, table, id).await? {
            found.push(id);
        } else {
            warn!("No row {} in {}; skipping", id, table);
        }
    }
    Ok(found)
}

/// `{id, username}` of a creator, if it still exists
pub async fn creator_summary(
    conn: &mut SqliteConnection,
    creator_id: Option<i64>,
) -> ServiceResult<Option<CreatorSummary>> {
    let Some(id) = creator_id else {
        return Ok(None);
    };

    let row = sqlx::query("SELECT id, username FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(Some(CreatorSummary {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
        })),
        None => Ok(None),
    }
}

/// Trim a search term into an escaped substring pattern; blank terms are rejected
pub fn search_pattern(term: &str) -> ServiceResult<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("Search term not provided"));
    }
    Ok(like_pattern(trimmed))
}
