//! Venue repository for database operations

use auth::{Identity, ensure_can_mutate};
use common::{ServiceError, ServiceResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use super::search_pattern;
use crate::models::{AverageRating, NewVenue, Venue, VenueUpdate, VenueView};
use crate::views;

const VENUE_COLUMNS: &str = "id, name, organizer, email, earnings, description, creator_id";

fn venue_from_row(row: &SqliteRow) -> ServiceResult<Venue> {
    Ok(Venue {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        organizer: row.try_get("organizer")?,
        email: row.try_get("email")?,
        earnings: row.try_get("earnings")?,
        description: row.try_get("description")?,
        creator_id: row.try_get("creator_id")?,
    })
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Venue>> {
    let sql = format!("SELECT {} FROM venues WHERE id = ?", VENUE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(venue_from_row).transpose()
}

pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Venue> {
    find(conn, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Venue not found"))
}

async fn insert(conn: &mut SqliteConnection, venue: &Venue) -> ServiceResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO venues (name, organizer, email, earnings, description, creator_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&venue.name)
    .bind(&venue.organizer)
    .bind(&venue.email)
    .bind(&venue.earnings)
    .bind(&venue.description)
    .bind(venue.creator_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn save(conn: &mut SqliteConnection, venue: &Venue) -> ServiceResult<()> {
    sqlx::query(
        r#"
        UPDATE venues
        SET name = ?, organizer = ?, email = ?, earnings = ?, description = ?
        WHERE id = ?
        "#,
    )
    .bind(&venue.name)
    .bind(&venue.organizer)
    .bind(&venue.email)
    .bind(&venue.earnings)
    .bind(&venue.description)
    .bind(venue.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Mean rating of a venue rounded to two decimals
pub async fn average_rating(conn: &mut SqliteConnection, venue_id: i64) -> ServiceResult<AverageRating> {
    let mean: Option<f64> =
        sqlx::query_scalar("SELECT AVG(rating) FROM attendee_venues WHERE venue_id = ?")
            .bind(venue_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(AverageRating::from_mean(mean))
}

/// Venue repository for database operations
#[derive(Clone)]
pub struct VenueRepository {
    pool: SqlitePool,
}

impl VenueRepository {
    /// Create a new venue repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a venue owned by the acting user
    pub async fn create(&self, acting: &Identity, payload: NewVenue) -> ServiceResult<VenueView> {
        let mut venue = payload.into_venue(acting.id)?;

        let mut tx = self.pool.begin().await?;
        venue.id = insert(&mut tx, &venue).await?;
        let view = views::venue(&mut tx, &venue).await?;
        tx.commit().await?;

        info!("Venue {} created by {}", venue.id, acting.username);
        Ok(view)
    }

    pub async fn list(&self) -> ServiceResult<Vec<VenueView>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM venues ORDER BY id", VENUE_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        let mut venues = Vec::with_capacity(rows.len());
        for row in &rows {
            let venue = venue_from_row(row)?;
            venues.push(views::venue(&mut conn, &venue).await?);
        }
        Ok(venues)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<VenueView> {
        let mut conn = self.pool.acquire().await?;
        let venue = fetch(&mut conn, id).await?;
        views::venue(&mut conn, &venue).await
    }

    /// Apply a partial update; admin or creator only
    pub async fn update(
        &self,
        acting: &Identity,
        id: i64,
        update: VenueUpdate,
    ) -> ServiceResult<VenueView> {
        let mut tx = self.pool.begin().await?;
        let mut venue = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, venue.creator_id, "venue")?;

        update.apply(&mut venue)?;
        save(&mut tx, &venue).await?;
        let view = views::venue(&mut tx, &venue).await?;
        tx.commit().await?;

        info!("Venue {} updated by {}", id, acting.username);
        Ok(view)
    }

    /// Delete a venue with its ratings and events, all or nothing
    pub async fn delete(&self, acting: &Identity, id: i64) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let venue = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, venue.creator_id, "venue")?;

        sqlx::query("DELETE FROM attendee_venues WHERE venue_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let events = sqlx::query("DELETE FROM events WHERE venue_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM venues WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "Venue {} deleted by {} along with {} events",
            id, acting.username, events
        );
        Ok(())
    }

    /// Case-insensitive name search; no match is a not-found error
    pub async fn search(&self, term: &str) -> ServiceResult<Vec<VenueView>> {
        let pattern = search_pattern(term)?;
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM venues WHERE LOWER(name) LIKE LOWER(?) ESCAPE '\\' ORDER BY id",
            VENUE_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(&pattern).fetch_all(&mut *conn).await?;
        if rows.is_empty() {
            return Err(ServiceError::not_found("No venues found"));
        }

        let mut venues = Vec::with_capacity(rows.len());
        for row in &rows {
            let venue = venue_from_row(row)?;
            venues.push(views::venue(&mut conn, &venue).await?);
        }
        Ok(venues)
    }

    pub async fn average_rating(&self, venue_id: i64) -> ServiceResult<AverageRating> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, venue_id).await?;
        average_rating(&mut conn, venue_id).await
    }
}
