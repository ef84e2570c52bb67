//! Tour repository for database operations

use auth::{Identity, ensure_can_mutate};
use common::{ServiceError, ServiceResult};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use super::{TOUR_EVENTS, existing_ids, search_pattern};
use crate::models::{NewTour, Tour, TourUpdate, TourView};
use crate::views;

const TOUR_COLUMNS: &str =
    "tours.id, tours.name, tours.start_date, tours.end_date, tours.description, \
     tours.social_media, tours.creator_id";

fn tour_from_row(row: &SqliteRow) -> ServiceResult<Tour> {
    let social_media: Option<Json<serde_json::Value>> = row.try_get("social_media")?;
    Ok(Tour {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        description: row.try_get("description")?,
        social_media: social_media.map(|json| json.0),
        creator_id: row.try_get("creator_id")?,
    })
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Tour>> {
    let sql = format!("SELECT {} FROM tours WHERE tours.id = ?", TOUR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(tour_from_row).transpose()
}

pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Tour> {
    find(conn, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Tour not found"))
}

async fn insert(conn: &mut SqliteConnection, tour: &Tour) -> ServiceResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO tours (name, start_date, end_date, description, social_media, creator_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&tour.name)
    .bind(tour.start_date)
    .bind(tour.end_date)
    .bind(&tour.description)
    .bind(tour.social_media.as_ref().map(Json))
    .bind(tour.creator_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn save(conn: &mut SqliteConnection, tour: &Tour) -> ServiceResult<()> {
    sqlx::query(
        r#"
        UPDATE tours
        SET name = ?, start_date = ?, end_date = ?, description = ?, social_media = ?
        WHERE id = ?
        "#,
    )
    .bind(&tour.name)
    .bind(tour.start_date)
    .bind(tour.end_date)
    .bind(&tour.description)
    .bind(tour.social_media.as_ref().map(Json))
    .bind(tour.id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn add_events(conn: &mut SqliteConnection, tour_id: i64, event_ids: &[i64]) -> ServiceResult<()> {
    for event_id in existing_ids(conn, "events", event_ids).await? {
        TOUR_EVENTS.link(conn, tour_id, event_id).await?;
    }
    Ok(())
}

/// Tour repository for database operations
#[derive(Clone)]
pub struct TourRepository {
    pool: SqlitePool,
}

impl TourRepository {
    /// Create a new tour repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a tour owned by the acting user
    pub async fn create(&self, acting: &Identity, payload: NewTour) -> ServiceResult<TourView> {
        let mut tour = payload.to_tour(acting.id)?;

        let mut tx = self.pool.begin().await?;
        tour.id = insert(&mut tx, &tour).await?;
        add_events(&mut tx, tour.id, &payload.event_ids).await?;
        let view = views::tour(&mut tx, &tour).await?;
        tx.commit().await?;

        info!("Tour {} created by {}", tour.id, acting.username);
        Ok(view)
    }

    pub async fn list(&self) -> ServiceResult<Vec<TourView>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM tours ORDER BY tours.id", TOUR_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        let mut tours = Vec::with_capacity(rows.len());
        for row in &rows {
            let tour = tour_from_row(row)?;
            tours.push(views::tour(&mut conn, &tour).await?);
        }
        Ok(tours)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<TourView> {
        let mut conn = self.pool.acquire().await?;
        let tour = fetch(&mut conn, id).await?;
        views::tour(&mut conn, &tour).await
    }

    /// Apply a partial update; `event_ids` replaces the roster
    pub async fn update(
        &self,
        acting: &Identity,
        id: i64,
        update: TourUpdate,
    ) -> ServiceResult<TourView> {
        let mut tx = self.pool.begin().await?;
        let mut tour = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, tour.creator_id, "tour")?;

        update.apply(&mut tour)?;
        save(&mut tx, &tour).await?;
        if let Some(event_ids) = &update.event_ids {
            TOUR_EVENTS.clear_left(&mut tx, id).await?;
            add_events(&mut tx, id, event_ids).await?;
        }
        let view = views::tour(&mut tx, &tour).await?;
        tx.commit().await?;

        info!("Tour {} updated by {}", id, acting.username);
        Ok(view)
    }

    pub async fn delete(&self, acting: &Identity, id: i64) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let tour = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, tour.creator_id, "tour")?;

        sqlx::query("DELETE FROM tours WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Tour {} deleted by {}", id, acting.username);
        Ok(())
    }

    /// Search tour names and creator usernames; no match is a not-found error
    pub async fn search(&self, term: &str) -> ServiceResult<Vec<TourView>> {
        let pattern = search_pattern(term)?;
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            r#"
            SELECT {} FROM tours
            LEFT JOIN users ON users.id = tours.creator_id
            WHERE LOWER(tours.name) LIKE LOWER(?) ESCAPE '\'
               OR LOWER(users.username) LIKE LOWER(?) ESCAPE '\'
            ORDER BY tours.id
            "#,
            TOUR_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&mut *conn)
            .await?;
        if rows.is_empty() {
            return Err(ServiceError::not_found("No tours found"));
        }

        let mut tours = Vec::with_capacity(rows.len());
        for row in &rows {
            let tour = tour_from_row(row)?;
            tours.push(views::tour(&mut conn, &tour).await?);
        }
        Ok(tours)
    }
}
