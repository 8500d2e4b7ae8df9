//! # Song Repository
//!
//! PostgreSQL operations for the `songs` table.
//!
//! ## Listing Query Construction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How list() builds its SQL                            │
//! │                                                                         │
//! │  SELECT id, group_name, song_name, release_date, text, link            │
//! │  FROM songs WHERE 1=1                                                  │
//! │       │                                                                 │
//! │       ├── group?        AND group_name ILIKE $1     ('%muse%')         │
//! │       ├── song?         AND song_name ILIKE $2      ('%hole%')         │
//! │       ├── release_date? AND release_date = $3::date ('2006-07-16')     │
//! │       │                                                                 │
//! │       └── always        LIMIT $n OFFSET $n+1                            │
//! │                                                                         │
//! │  Only non-empty filter fields add a clause; placeholders are numbered  │
//! │  in the order the clauses are appended.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info};

use songbook_core::{paginate_verses, Page, Song, SongFilter, SongId};

use super::SongStore;
use crate::error::{DbError, DbResult};

const SELECT_SONGS: &str =
    "SELECT id, group_name, song_name, release_date, text, link FROM songs WHERE 1=1";

/// Repository for song database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.songs();
///
/// let filter = SongFilter::new(Some("muse".into()), None, None);
/// let songs = repo.list(&filter, Page::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SongRepository {
    pool: PgPool,
}

impl SongRepository {
    /// Creates a new SongRepository.
    pub fn new(pool: PgPool) -> Self {
        SongRepository { pool }
    }
}

/// Builds the listing query for a filter and page.
pub fn list_query(filter: &SongFilter, page: Page) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_SONGS);

    if let Some(group) = filter.group() {
        builder.push(" AND group_name ILIKE ");
        builder.push_bind(like_pattern(group));
    }

    if let Some(song) = filter.song() {
        builder.push(" AND song_name ILIKE ");
        builder.push_bind(like_pattern(song));
    }

    if let Some(date) = filter.release_date() {
        builder.push(" AND release_date = ");
        builder.push_bind(date.to_string());
        builder.push("::date");
    }

    builder.push(" LIMIT ");
    builder.push_bind(page.limit);
    builder.push(" OFFSET ");
    builder.push_bind(page.offset);

    builder
}

/// Wraps a value in `%...%`, escaping LIKE metacharacters so it matches literally.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl SongStore for SongRepository {
    async fn list(&self, filter: &SongFilter, page: Page) -> DbResult<Vec<Song>> {
        debug!(?filter, limit = page.limit, offset = page.offset, "Listing songs");

        let mut builder = list_query(filter, page);
        debug!(query = %builder.sql(), "Executing query");

        let songs = builder
            .build_query_as::<Song>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Error executing list query");
                DbError::from(e)
            })?;

        info!(count = songs.len(), "Fetched songs");
        Ok(songs)
    }

    async fn get_by_id(&self, id: SongId) -> DbResult<Option<Song>> {
        debug!(song_id = id, "Fetching song");

        let song = sqlx::query_as::<_, Song>(
            r#"
            SELECT id, group_name, song_name, release_date, text, link
            FROM songs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(song_id = id, error = %e, "Error fetching song");
            DbError::from(e)
        })?;

        Ok(song)
    }

    async fn lyrics_paginated(&self, id: SongId, page: Page) -> DbResult<Vec<String>> {
        debug!(song_id = id, limit = page.limit, offset = page.offset, "Fetching lyrics");

        let text = sqlx::query_scalar::<_, String>("SELECT text FROM songs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(song_id = id, error = %e, "Error fetching song lyrics");
                DbError::from(e)
            })?
            .ok_or_else(|| DbError::not_found("Song", id))?;

        let verses = paginate_verses(&text, page);
        info!(song_id = id, verses = verses.len(), "Fetched lyrics");
        Ok(verses)
    }

    async fn delete(&self, id: SongId) -> DbResult<u64> {
        debug!(song_id = id, "Deleting song");

        let result = sqlx::query("DELETE FROM songs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(song_id = id, error = %e, "Error deleting song");
                DbError::from(e)
            })?;

        info!(song_id = id, rows = result.rows_affected(), "Deleted song");
        Ok(result.rows_affected())
    }

    async fn update(&self, song: &Song) -> DbResult<u64> {
        debug!(song_id = song.id, "Updating song");

        let result = sqlx::query(
            r#"
            UPDATE songs
            SET group_name = $1, song_name = $2, release_date = $3, text = $4, link = $5
            WHERE id = $6
            "#,
        )
        .bind(&song.group)
        .bind(&song.song)
        .bind(song.release_date)
        .bind(&song.text)
        .bind(&song.link)
        .bind(song.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(song_id = song.id, error = %e, "Error updating song");
            DbError::from(e)
        })?;

        info!(song_id = song.id, rows = result.rows_affected(), "Updated song");
        Ok(result.rows_affected())
    }

    async fn add(&self, song: &Song) -> DbResult<()> {
        debug!(group = %song.group, song = %song.song, "Adding song");

        sqlx::query(
            r#"
            INSERT INTO songs (group_name, song_name, release_date, text, link)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&song.group)
        .bind(&song.song)
        .bind(song.release_date)
        .bind(&song.text)
        .bind(&song.link)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Error adding song");
            DbError::from(e)
        })?;

        info!(group = %song.group, song = %song.song, "Added song");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
