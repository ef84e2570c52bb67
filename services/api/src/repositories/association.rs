//! Attendance, bookings, tour rosters, favorites and venue ratings

use auth::{Identity, ensure_can_mutate};
use common::{ServiceError, ServiceResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::{ATTENDANCE, BOOKINGS, TOUR_EVENTS, attendee, event, exists, tour, venue};
use crate::models::rating::validate_rating;
use crate::models::{NamedSummary, RatingRequest, RatingRow};

fn rating_from_row(row: &SqliteRow) -> ServiceResult<RatingRow> {
    Ok(RatingRow {
        attendee_id: row.try_get("attendee_id")?,
        venue_id: row.try_get("venue_id")?,
        rating: row.try_get("rating")?,
    })
}

pub async fn ratings_for_venue(
    conn: &mut SqliteConnection,
    venue_id: i64,
) -> ServiceResult<Vec<RatingRow>> {
    let rows = sqlx::query(
        "SELECT attendee_id, venue_id, rating FROM attendee_venues WHERE venue_id = ? ORDER BY attendee_id",
    )
    .bind(venue_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(rating_from_row).collect()
}

pub async fn ratings_by_attendee(
    conn: &mut SqliteConnection,
    attendee_id: i64,
) -> ServiceResult<Vec<RatingRow>> {
    let rows = sqlx::query(
        "SELECT attendee_id, venue_id, rating FROM attendee_venues WHERE attendee_id = ? ORDER BY venue_id",
    )
    .bind(attendee_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(rating_from_row).collect()
}

async fn find_rating(
    conn: &mut SqliteConnection,
    attendee_id: i64,
    venue_id: i64,
) -> ServiceResult<Option<RatingRow>> {
    let row = sqlx::query(
        "SELECT attendee_id, venue_id, rating FROM attendee_venues WHERE attendee_id = ? AND venue_id = ?",
    )
    .bind(attendee_id)
    .bind(venue_id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(rating_from_row).transpose()
}

pub async fn favorite_events(
    conn: &mut SqliteConnection,
    attendee_id: i64,
) -> ServiceResult<Vec<NamedSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT events.id, events.name
        FROM events
        JOIN attendee_favorite_events fav ON fav.event_id = events.id
        WHERE fav.attendee_id = ?
        ORDER BY events.id
        "#,
    )
    .bind(attendee_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| -> ServiceResult<NamedSummary> {
            Ok(NamedSummary {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        })
        .collect()
}

/// Attendance and rating changes are allowed to admins and to whoever created the attendee
async fn ensure_can_act_for(
    conn: &mut SqliteConnection,
    acting: &Identity,
    attendee_id: i64,
) -> ServiceResult<()> {
    let attendee = attendee::fetch(conn, attendee_id).await?;
    ensure_can_mutate(acting, attendee.creator_id, "attendee")
}

/// Repository for every many-to-many relationship
#[derive(Clone)]
pub struct AssociationRepository {
    pool: SqlitePool,
}

impl AssociationRepository {
    /// Create a new association repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register an attendee for an event; registering twice is a no-op
    ///
    /// Admin or the attendee's creator only.
    pub async fn add_attendee_to_event(
        &self,
        acting: &Identity,
        event_id: i64,
        attendee_id: i64,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        event::fetch(&mut tx, event_id).await?;
        ensure_can_act_for(&mut tx, acting, attendee_id).await?;

        if ATTENDANCE.contains(&mut tx, attendee_id, event_id).await? {
            warn!(
                "Attendee {} already registered for event {}",
                attendee_id, event_id
            );
            return Ok(());
        }

        ATTENDANCE.link(&mut tx, attendee_id, event_id).await?;
        tx.commit().await?;

        info!(
            "Attendee {} registered for event {} by {}",
            attendee_id, event_id, acting.username
        );
        Ok(())
    }

    pub async fn remove_attendee_from_event(
        &self,
        acting: &Identity,
        event_id: i64,
        attendee_id: i64,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        event::fetch(&mut tx, event_id).await?;
        ensure_can_act_for(&mut tx, acting, attendee_id).await?;

        if !ATTENDANCE.unlink(&mut tx, attendee_id, event_id).await? {
            return Err(ServiceError::not_found(
                "Attendee is not registered for this event",
            ));
        }
        tx.commit().await?;

        info!(
            "Attendee {} removed from event {} by {}",
            attendee_id, event_id, acting.username
        );
        Ok(())
    }

    pub async fn favorite_events(&self, attendee_id: i64) -> ServiceResult<Vec<NamedSummary>> {
        let mut conn = self.pool.acquire().await?;
        attendee::fetch(&mut conn, attendee_id).await?;
        favorite_events(&mut conn, attendee_id).await
    }

    /// Book an artist for an event; admin or event creator only
    pub async fn add_artist_to_event(
        &self,
        acting: &Identity,
        event_id: i64,
        artist_id: i64,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let found = event::fetch(&mut tx, event_id).await?;
        ensure_can_mutate(acting, found.creator_id, "event")?;
        if !exists(&mut tx, "artists", artist_id).await? {
            return Err(ServiceError::not_found("Artist not found"));
        }

        if !BOOKINGS.link(&mut tx, artist_id, event_id).await? {
            return Err(ServiceError::conflict("Artist already added to this event"));
        }
        tx.commit().await?;

        info!("Artist {} booked for event {}", artist_id, event_id);
        Ok(())
    }

    pub async fn remove_artist_from_event(
        &self,
        acting: &Identity,
        event_id: i64,
        artist_id: i64,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let found = event::fetch(&mut tx, event_id).await?;
        ensure_can_mutate(acting, found.creator_id, "event")?;

        if !BOOKINGS.unlink(&mut tx, artist_id, event_id).await? {
            return Err(ServiceError::not_found(
                "Artist not associated with this event",
            ));
        }
        tx.commit().await?;

        info!("Artist {} removed from event {}", artist_id, event_id);
        Ok(())
    }

    /// Add one event to a tour; admin or tour creator only
    pub async fn add_event_to_tour(
        &self,
        acting: &Identity,
        tour_id: i64,
        event_id: i64,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let found = tour::fetch(&mut tx, tour_id).await?;
        ensure_can_mutate(acting, found.creator_id, "tour")?;
        event::fetch(&mut tx, event_id).await?;

        if !TOUR_EVENTS.link(&mut tx, tour_id, event_id).await? {
            return Err(ServiceError::conflict("Event already part of this tour"));
        }
        tx.commit().await?;

        info!("Event {} added to tour {}", event_id, tour_id);
        Ok(())
    }

    pub async fn remove_event_from_tour(
        &self,
        acting: &Identity,
        tour_id: i64,
        event_id: i64,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let found = tour::fetch(&mut tx, tour_id).await?;
        ensure_can_mutate(acting, found.creator_id, "tour")?;

        if !TOUR_EVENTS.unlink(&mut tx, tour_id, event_id).await? {
            return Err(ServiceError::not_found("Event not part of this tour"));
        }
        tx.commit().await?;

        info!("Event {} removed from tour {}", event_id, tour_id);
        Ok(())
    }

    /// Record an attendee's rating of a venue, replacing any earlier one
    pub async fn rate_venue(
        &self,
        acting: &Identity,
        venue_id: i64,
        request: &RatingRequest,
    ) -> ServiceResult<RatingRow> {
        let rating = validate_rating(request.rating)?;

        let mut tx = self.pool.begin().await?;
        ensure_can_act_for(&mut tx, acting, request.attendee_id).await?;
        venue::fetch(&mut tx, venue_id).await?;

        sqlx::query(
            r#"
            INSERT INTO attendee_venues (attendee_id, venue_id, rating)
            VALUES (?, ?, ?)
            ON CONFLICT (attendee_id, venue_id) DO UPDATE SET rating = excluded.rating
            "#,
        )
        .bind(request.attendee_id)
        .bind(venue_id)
        .bind(rating)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(
            "Attendee {} rated venue {} with {}",
            request.attendee_id, venue_id, rating
        );
        Ok(RatingRow {
            attendee_id: request.attendee_id,
            venue_id,
            rating,
        })
    }

    /// Change an existing rating
    pub async fn update_rating(
        &self,
        acting: &Identity,
        venue_id: i64,
        attendee_id: i64,
        rating: i64,
    ) -> ServiceResult<RatingRow> {
        let rating = validate_rating(rating)?;

        let mut tx = self.pool.begin().await?;
        ensure_can_act_for(&mut tx, acting, attendee_id).await?;
        if find_rating(&mut tx, attendee_id, venue_id).await?.is_none() {
            return Err(ServiceError::not_found("Rating not found"));
        }

        sqlx::query("UPDATE attendee_venues SET rating = ? WHERE attendee_id = ? AND venue_id = ?")
            .bind(rating)
            .bind(attendee_id)
            .bind(venue_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(RatingRow {
            attendee_id,
            venue_id,
            rating,
        })
    }

    pub async fn delete_rating(
        &self,
        acting: &Identity,
        venue_id: i64,
        attendee_id: i64,
    ) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        ensure_can_act_for(&mut tx, acting, attendee_id).await?;

        let removed = sqlx::query("DELETE FROM attendee_venues WHERE attendee_id = ? AND venue_id = ?")
            .bind(attendee_id)
            .bind(venue_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(ServiceError::not_found("Rating not found"));
        }
        tx.commit().await?;

        info!("Rating of venue {} by attendee {} removed", venue_id, attendee_id);
        Ok(())
    }

    pub async fn venue_ratings(&self, venue_id: i64) -> ServiceResult<Vec<RatingRow>> {
        let mut conn = self.pool.acquire().await?;
        venue::fetch(&mut conn, venue_id).await?;
        ratings_for_venue(&mut conn, venue_id).await
    }
}
