//! Artist repository for database operations

use auth::{Identity, ensure_can_mutate};
use common::{ServiceError, ServiceResult};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use super::search_pattern;
use crate::models::{Artist, ArtistUpdate, ArtistView, NewArtist};
use crate::views;

const ARTIST_COLUMNS: &str = "id, name, age, background, songs, creator_id";

fn artist_from_row(row: &SqliteRow) -> ServiceResult<Artist> {
    let songs: Json<Vec<String>> = row.try_get("songs")?;
    Ok(Artist {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        age: row.try_get("age")?,
        background: row.try_get("background")?,
        songs: songs.0,
        creator_id: row.try_get("creator_id")?,
    })
}

pub async fn find(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<Artist>> {
    let sql = format!("SELECT {} FROM artists WHERE id = ?", ARTIST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(artist_from_row).transpose()
}

pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Artist> {
    find(conn, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Artist not found"))
}

async fn insert(conn: &mut SqliteConnection, artist: &Artist) -> ServiceResult<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO artists (name, age, background, songs, creator_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&artist.name)
    .bind(artist.age)
    .bind(&artist.background)
    .bind(Json(&artist.songs))
    .bind(artist.creator_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn save(conn: &mut SqliteConnection, artist: &Artist) -> ServiceResult<()> {
    sqlx::query("UPDATE artists SET name = ?, age = ?, background = ?, songs = ? WHERE id = ?")
        .bind(&artist.name)
        .bind(artist.age)
        .bind(&artist.background)
        .bind(Json(&artist.songs))
        .bind(artist.id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Artist repository for database operations
#[derive(Clone)]
pub struct ArtistRepository {
    pool: SqlitePool,
}

impl ArtistRepository {
    /// Create a new artist repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, acting: &Identity, payload: NewArtist) -> ServiceResult<ArtistView> {
        let mut artist = payload.into_artist(acting.id)?;

        let mut tx = self.pool.begin().await?;
        artist.id = insert(&mut tx, &artist).await?;
        let view = views::artist(&mut tx, &artist).await?;
        tx.commit().await?;

        info!("Artist {} created by {}", artist.id, acting.username);
        Ok(view)
    }

    pub async fn list(&self) -> ServiceResult<Vec<ArtistView>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {} FROM artists ORDER BY id", ARTIST_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        let mut artists = Vec::with_capacity(rows.len());
        for row in &rows {
            let artist = artist_from_row(row)?;
            artists.push(views::artist(&mut conn, &artist).await?);
        }
        Ok(artists)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<ArtistView> {
        let mut conn = self.pool.acquire().await?;
        let artist = fetch(&mut conn, id).await?;
        views::artist(&mut conn, &artist).await
    }

    /// Apply a partial update; unknown fields are logged and skipped
    pub async fn update(
        &self,
        acting: &Identity,
        id: i64,
        update: ArtistUpdate,
    ) -> ServiceResult<ArtistView> {
        let mut tx = self.pool.begin().await?;
        let mut artist = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, artist.creator_id, "artist")?;

        update.apply(&mut artist)?;
        save(&mut tx, &artist).await?;
        let view = views::artist(&mut tx, &artist).await?;
        tx.commit().await?;

        info!("Artist {} updated by {}", id, acting.username);
        Ok(view)
    }

    /// Delete an artist; bookings and favorites follow by cascade
    pub async fn delete(&self, acting: &Identity, id: i64) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let artist = fetch(&mut tx, id).await?;
        ensure_can_mutate(acting, artist.creator_id, "artist")?;

        sqlx::query("DELETE FROM artists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Artist {} deleted by {}", id, acting.username);
        Ok(())
    }

    /// Case-insensitive name search; no match is a not-found error
    pub async fn search(&self, term: &str) -> ServiceResult<Vec<ArtistView>> {
        let pattern = search_pattern(term)?;
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM artists WHERE LOWER(name) LIKE LOWER(?) ESCAPE '\\' ORDER BY id",
            ARTIST_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(&pattern).fetch_all(&mut *conn).await?;
        if rows.is_empty() {
            return Err(ServiceError::not_found("No artists found"));
        }

        let mut artists = Vec::with_capacity(rows.len());
        for row in &rows {
            let artist = artist_from_row(row)?;
            artists.push(views::artist(&mut conn, &artist).await?);
        }
        Ok(artists)
    }
}
