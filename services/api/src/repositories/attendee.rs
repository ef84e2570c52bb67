//! Attendee repository for database operations

use auth::{Identity, ensure_can_mutate};
use common::{ServiceError, ServiceResult};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::{FAVORITE_ARTISTS, FAVORITE_EVENTS, existing_ids, search_pattern};
use crate::models::{Attendee, AttendeeUpdate, AttendeeView, NewAttendee};
use crate::views;

const ATTENDEE_COLUMNS: &str = "id, first_name, last_name, email, preferred_event_type, \
     favorite_event_types, social_media, creator_id";

fn attendee_from_row(row: &SqliteRow) -> ServiceResult<Attendee> {
    let labels: Json<Vec<String>> = row.try_get("favorite_event_types")?;
    let social_media: Option<Json<serde_json::Value>> = row.try_get("social_media")?;
    Ok(Attendee {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        preferred_event_type: row.try_get("preferred_event_type")?,
        favorite_event_types: labels.0,
        social_media: social_media.map(|json| json.0),
        creator_id: row.try_get("creator_id")?,
    })
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Attendee>> {
    let sql = format!("SELECT {} FROM attendees WHERE id = ?", ATTENDEE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(attendee_from_row).transpose()
}

pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Attendee> {
    find(conn, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Attendee not found"))
}

async fn email_taken(
    conn: &mut SqliteConnection,
    email: &str,
    except: Option<i64>,
) -> ServiceResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM attendees WHERE email = ? AND id != ?")
            .bind(email)
            .bind(except.unwrap_or(0))
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

async fn insert(conn: &mut SqliteConnection, attendee: &Attendee) -> ServiceResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO attendees (first_name, last_name, email, preferred_event_type,
                               favorite_event_types, social_media, creator_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&attendee.first_name)
    .bind(&attendee.last_name)
    .bind(&attendee.email)
    .bind(&attendee.preferred_event_type)
    .bind(Json(&attendee.favorite_event_types))
    .bind(attendee.social_media.as_ref().map(Json))
    .bind(attendee.creator_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn save(conn: &mut SqliteConnection, attendee: &Attendee) -> ServiceResult<()> {
    sqlx::query(
        r#"
        UPDATE attendees
        SET first_name = ?, last_name = ?, email = ?, preferred_event_type = ?,
            favorite_event_types = ?, social_media = ?
        WHERE id = ?
        "#,
    )
    .bind(&attendee.first_name)
    .bind(&attendee.last_name)
    .bind(&attendee.email)
    .bind(&attendee.preferred_event_type)
    .bind(Json(&attendee.favorite_event_types))
    .bind(attendee.social_media.as_ref().map(Json))
    .bind(attendee.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn add_favorites(
    conn: &mut SqliteConnection,
    attendee_id: i64,
    event_ids: &[i64],
    artist_ids: &[i64],
) -> ServiceResult<()> {
    for event_id in existing_ids(conn, "events", event_ids).await? {
        FAVORITE_EVENTS.link(conn, attendee_id, event_id).await?;
    }
    for artist_id in existing_ids(conn, "artists", artist_ids).await? {
        FAVORITE_ARTISTS.link(conn, attendee_id, artist_id).await?;
    }
    Ok(())
}

/// Attendee repository for database operations
#[derive(Clone)]
pub struct AttendeeRepository {
    pool: SqlitePool,
}

impl AttendeeRepository {
    /// Create a new attendee repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an attendee; favorite id lists extend its favorites
    pub async fn create(
        &self,
        acting: &Identity,
        payload: NewAttendee,
    ) -> ServiceResult<AttendeeView> {
        let mut attendee = payload.to_attendee(acting.id)?;

        let mut tx = self.pool.begin().await?;
        if email_taken(&mut tx, &attendee.email, None).await? {
            warn!("Attendee email {} already in use", attendee.email);
            return Err(ServiceError::conflict("Attendee with this email already exists"));
        }

        attendee.id = insert(&mut tx, &attendee).await?;
        add_favorites(
            &mut tx,
            attendee.id,
            &payload.favorite_event_ids,
            &payload.favorite_artist_ids,
        )
        .await?;
        let view = views::attendee(&mut tx, &attendee).await?;
        tx.commit().await?;

        info!("Attendee {} created by {}", attendee.id, acting.username);
        Ok(view)
    }

    pub async fn list(&self) -> ServiceResult<Vec<AttendeeView>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM attendees ORDER BY id", ATTENDEE_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        let mut attendees = Vec::with_capacity(rows.len());
        for row in &rows {
            let attendee = attendee_from_row(row)?;
            attendees.push(views::attendee(&mut conn, &attendee).await?);
        }
        Ok(attendees)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<AttendeeView> {
        let mut conn = self.pool.acquire().await?;
        let attendee = fetch(&mut conn, id).await?;
        views::attendee(&mut conn, &attendee).await
    }

    /// Apply a partial update; favorite id lists replace the current sets
    pub async fn update(
        &self,
        acting: &Identity,
        id: i64,
        update: AttendeeUpdate,
    ) -> ServiceResult<AttendeeView> {
        let mut tx = self.pool.begin().await?;
        let mut attendee = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, attendee.creator_id, "attendee")?;

        let previous_email = attendee.email.clone();
        update.apply(&mut attendee)?;
        if attendee.email != previous_email && email_taken(&mut tx, &attendee.email, Some(id)).await? {
            return Err(ServiceError::conflict("Attendee with this email already exists"));
        }

        save(&mut tx, &attendee).await?;
        if let Some(event_ids) = &update.favorite_event_ids {
            FAVORITE_EVENTS.clear_left(&mut tx, id).await?;
            add_favorites(&mut tx, id, event_ids, &[]).await?;
        }
        if let Some(artist_ids) = &update.favorite_artist_ids {
            FAVORITE_ARTISTS.clear_left(&mut tx, id).await?;
            add_favorites(&mut tx, id, &[], artist_ids).await?;
        }
        let view = views::attendee(&mut tx, &attendee).await?;
        tx.commit().await?;

        info!("Attendee {} updated by {}", id, acting.username);
        Ok(view)
    }

    /// Delete an attendee; ratings and links follow by cascade
    pub async fn delete(&self, acting: &Identity, id: i64) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let attendee = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, attendee.creator_id, "attendee")?;

        sqlx::query("DELETE FROM attendees WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Attendee {} deleted by {}", id, acting.username);
        Ok(())
    }

    /// Search first and last names; no match is an empty list
    pub async fn search(&self, term: &str) -> ServiceResult<Vec<AttendeeView>> {
        let pattern = search_pattern(term)?;
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            r#"
            SELECT {} FROM attendees
            WHERE LOWER(first_name) LIKE LOWER(?) ESCAPE '\'
               OR LOWER(last_name) LIKE LOWER(?) ESCAPE '\'
            ORDER BY id
            "#,
            ATTENDEE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&mut *conn)
            .await?;

        let mut attendees = Vec::with_capacity(rows.len());
        for row in &rows {
            let attendee = attendee_from_row(row)?;
            attendees.push(views::attendee(&mut conn, &attendee).await?);
        }
        Ok(attendees)
    }
}
