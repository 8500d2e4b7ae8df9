//! In-memory `SongStore`.
//!
//! Same observable semantics as [`super::SongRepository`]: case-insensitive
//! substring filters, exact release dates, silent success for missing IDs on
//! delete/update, `NotFound` for lyrics of a missing song. Songs are kept in
//! insertion order, which stands in for PostgreSQL's unspecified order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use songbook_core::{paginate_verses, Page, Song, SongFilter, SongId};

use super::SongStore;
use crate::error::{DbError, DbResult};

#[derive(Debug, Default)]
struct Inner {
    next_id: SongId,
    songs: BTreeMap<SongId, Song>,
}

#[derive(Debug, Default)]
pub struct MemorySongStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemorySongStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `songs`; IDs are reassigned from 1.
    pub fn with_songs(songs: impl IntoIterator<Item = Song>) -> Self {
        let mut inner = Inner::default();
        for song in songs {
            inner.insert(song);
        }
        MemorySongStore {
            inner: RwLock::new(inner),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulates an outage: every call fails with `ConnectionFailed`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored songs.
    pub async fn len(&self) -> usize {
        self.inner.read().await.songs.len()
    }

    fn check_available(&self) -> DbResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::ConnectionFailed("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl Inner {
    fn insert(&mut self, song: Song) -> SongId {
        self.next_id += 1;
        let id = self.next_id;
        self.songs.insert(id, Song { id, ..song });
        id
    }
}

#[async_trait]
impl SongStore for MemorySongStore {
    async fn list(&self, filter: &SongFilter, page: Page) -> DbResult<Vec<Song>> {
        self.check_available()?;
        debug!(?filter, limit = page.limit, offset = page.offset, "Listing songs in memory");

        let inner = self.inner.read().await;
        let songs = inner
            .songs
            .values()
            .filter(|song| filter.matches(song))
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(songs)
    }

    async fn get_by_id(&self, id: SongId) -> DbResult<Option<Song>> {
        self.check_available()?;
        Ok(self.inner.read().await.songs.get(&id).cloned())
    }

    async fn lyrics_paginated(&self, id: SongId, page: Page) -> DbResult<Vec<String>> {
        self.check_available()?;
        let inner = self.inner.read().await;
        let song = inner
            .songs
            .get(&id)
            .ok_or_else(|| DbError::not_found("Song", id))?;
        Ok(paginate_verses(&song.text, page))
    }

    async fn delete(&self, id: SongId) -> DbResult<u64> {
        self.check_available()?;
        let removed = self.inner.write().await.songs.remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn update(&self, song: &Song) -> DbResult<u64> {
        self.check_available()?;
        let mut inner = self.inner.write().await;
        match inner.songs.get_mut(&song.id) {
            Some(existing) => {
                *existing = song.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn add(&self, song: &Song) -> DbResult<()> {
        self.check_available()?;
        let id = self.inner.write().await.insert(song.clone());
        debug!(song_id = id, "Added song in memory");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.check_available().is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
