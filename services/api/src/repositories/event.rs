//! Event repository for database operations

use auth::{Identity, ensure_can_mutate};
use common::{ServiceError, ServiceResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::{BOOKINGS, exists, existing_ids, search_pattern};
use crate::models::{EVENT_TYPES, Event, EventUpdate, EventView, NewEvent};
use crate::views;

const EVENT_COLUMNS: &str =
    "id, name, date, time, location, description, event_type, venue_id, creator_id";

fn event_from_row(row: &SqliteRow) -> ServiceResult<Event> {
    Ok(Event {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        location: row.try_get("location")?,
        description: row.try_get("description")?,
        event_type: row.try_get("event_type")?,
        venue_id: row.try_get("venue_id")?,
        creator_id: row.try_get("creator_id")?,
    })
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Event>> {
    let sql = format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(event_from_row).transpose()
}

pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Event> {
    find(conn, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Event not found"))
}

/// Whether another event already uses `name`
async fn name_taken(
    conn: &mut SqliteConnection,
    name: &str,
    except: Option<i64>,
) -> ServiceResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE name = ? AND id != ?")
        .bind(name)
        .bind(except.unwrap_or(0))
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

async fn ensure_venue(conn: &mut SqliteConnection, venue_id: Option<i64>) -> ServiceResult<()> {
    if let Some(id) = venue_id {
        if !exists(conn, "venues", id).await? {
            return Err(ServiceError::not_found("Venue ID not found"));
        }
    }
    Ok(())
}

async fn insert(conn: &mut SqliteConnection, event: &Event) -> ServiceResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO events (name, date, time, location, description, event_type, venue_id, creator_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event.name)
    .bind(event.date)
    .bind(&event.time)
    .bind(&event.location)
    .bind(&event.description)
    .bind(&event.event_type)
    .bind(event.venue_id)
    .bind(event.creator_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn save(conn: &mut SqliteConnection, event: &Event) -> ServiceResult<()> {
    sqlx::query(
        r#"
        UPDATE events
        SET name = ?, date = ?, time = ?, location = ?, description = ?, event_type = ?, venue_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&event.name)
    .bind(event.date)
    .bind(&event.time)
    .bind(&event.location)
    .bind(&event.description)
    .bind(&event.event_type)
    .bind(event.venue_id)
    .bind(event.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Book every resolvable artist for the event
async fn book_artists(conn: &mut SqliteConnection, event_id: i64, artist_ids: &[i64]) -> ServiceResult<()> {
    for artist_id in existing_ids(conn, "artists", artist_ids).await? {
        BOOKINGS.link(conn, artist_id, event_id).await?;
    }
    Ok(())
}

/// Event repository for database operations
#[derive(Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    /// Create a new event repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The published event-type vocabulary
    pub fn event_types(&self) -> &'static [&'static str] {
        &EVENT_TYPES
    }

    /// Create an event; the name must be unique and the venue, if any, must exist
    pub async fn create(&self, acting: &Identity, payload: NewEvent) -> ServiceResult<EventView> {
        let mut event = payload.to_event(acting.id)?;

        let mut tx = self.pool.begin().await?;
        ensure_venue(&mut tx, event.venue_id).await?;
        if name_taken(&mut tx, &event.name, None).await? {
            warn!("Event name {} already in use", event.name);
            return Err(ServiceError::conflict("Event with this name already exists"));
        }

        event.id = insert(&mut tx, &event).await?;
        if let Some(artist_ids) = &payload.artist_ids {
            book_artists(&mut tx, event.id, artist_ids).await?;
        }
        let view = views::event(&mut tx, &event).await?;
        tx.commit().await?;

        info!("Event {} created by {}", event.id, acting.username);
        Ok(view)
    }

    pub async fn list(&self) -> ServiceResult<Vec<EventView>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM events ORDER BY id", EVENT_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let event = event_from_row(row)?;
            events.push(views::event(&mut conn, &event).await?);
        }
        Ok(events)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<EventView> {
        let mut conn = self.pool.acquire().await?;
        let event = fetch(&mut conn, id).await?;
        views::event(&mut conn, &event).await
    }

    /// Apply a partial update; `artist_ids` replaces the line-up
    pub async fn update(
        &self,
        acting: &Identity,
        id: i64,
        update: EventUpdate,
    ) -> ServiceResult<EventView> {
        let mut tx = self.pool.begin().await?;
        let mut event = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, event.creator_id, "event")?;

        let previous_name = event.name.clone();
        update.apply(&mut event)?;
        ensure_venue(&mut tx, update.venue_id.flatten()).await?;
        if event.name != previous_name && name_taken(&mut tx, &event.name, Some(id)).await? {
            return Err(ServiceError::conflict("Event with this name already exists"));
        }

        save(&mut tx, &event).await?;
        if let Some(artist_ids) = &update.artist_ids {
            BOOKINGS.clear_right(&mut tx, id).await?;
            book_artists(&mut tx, id, artist_ids).await?;
        }
        let view = views::event(&mut tx, &event).await?;
        tx.commit().await?;

        info!("Event {} updated by {}", id, acting.username);
        Ok(view)
    }

    /// Delete an event; every association row follows by cascade
    pub async fn delete(&self, acting: &Identity, id: i64) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let event = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, event.creator_id, "event")?;

        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Event {} deleted by {}", id, acting.username);
        Ok(())
    }

    /// Search name, location and event type; no match is a not-found error
    pub async fn search(&self, term: &str) -> ServiceResult<Vec<EventView>> {
        let pattern = search_pattern(term)?;
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            r#"
            SELECT {} FROM events
            WHERE LOWER(name) LIKE LOWER(?) ESCAPE '\'
               OR LOWER(location) LIKE LOWER(?) ESCAPE '\'
               OR LOWER(event_type) LIKE LOWER(?) ESCAPE '\'
            ORDER BY id
            "#,
            EVENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&mut *conn)
            .await?;
        if rows.is_empty() {
            return Err(ServiceError::not_found("No events found"));
        }

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let event = event_from_row(row)?;
            events.push(views::event(&mut conn, &event).await?);
        }
        Ok(events)
    }
}
