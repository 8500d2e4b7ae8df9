//! Song service: the layer between HTTP handlers and the store.
//!
//! ```text
//! handler ──► SongService ──► SongStore
//!              │
//!              └─ debug on entry, info on success, error on failure
//! ```
//!
//! Store errors pass through unchanged; the handler decides the status code.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use songbook_core::{Page, Song, SongFilter, SongId};
use songbook_db::{DbResult, SongStore};

#[async_trait]
pub trait SongService: Send + Sync {
    async fn list_songs(&self, filter: &SongFilter, page: Page) -> DbResult<Vec<Song>>;

    async fn get_song(&self, id: SongId) -> DbResult<Option<Song>>;

    async fn get_lyrics(&self, id: SongId, page: Page) -> DbResult<Vec<String>>;

    /// Deleting a missing ID succeeds.
    async fn delete_song(&self, id: SongId) -> DbResult<()>;

    /// Updating a missing ID succeeds.
    async fn update_song(&self, song: &Song) -> DbResult<()>;

    async fn add_song(&self, song: &Song) -> DbResult<()>;

    async fn is_healthy(&self) -> bool;
}

/// [`SongService`] backed by any [`SongStore`].
#[derive(Clone)]
pub struct SongServiceImpl {
    store: Arc<dyn SongStore>,
}

impl SongServiceImpl {
    pub fn new(store: Arc<dyn SongStore>) -> Self {
        SongServiceImpl { store }
    }
}

#[async_trait]
impl SongService for SongServiceImpl {
    async fn list_songs(&self, filter: &SongFilter, page: Page) -> DbResult<Vec<Song>> {
        debug!(
            ?filter,
            limit = page.limit,
            offset = page.offset,
            "Fetching songs with filters"
        );

        match self.store.list(filter, page).await {
            Ok(songs) => {
                info!(count = songs.len(), "Songs fetched successfully");
                Ok(songs)
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch songs");
                Err(e)
            }
        }
    }

    async fn get_song(&self, id: SongId) -> DbResult<Option<Song>> {
        debug!(song_id = id, "Fetching song");

        let result = self.store.get_by_id(id).await;
        match &result {
            Ok(Some(_)) => info!(song_id = id, "Song fetched successfully"),
            Ok(None) => info!(song_id = id, "Song not found"),
            Err(e) => error!(song_id = id, error = %e, "Failed to fetch song"),
        }
        result
    }

    async fn get_lyrics(&self, id: SongId, page: Page) -> DbResult<Vec<String>> {
        debug!(
            song_id = id,
            limit = page.limit,
            offset = page.offset,
            "Fetching lyrics"
        );

        match self.store.lyrics_paginated(id, page).await {
            Ok(verses) => {
                info!(song_id = id, verses = verses.len(), "Lyrics fetched successfully");
                Ok(verses)
            }
            Err(e) => {
                error!(song_id = id, error = %e, "Failed to fetch lyrics");
                Err(e)
            }
        }
    }

    async fn delete_song(&self, id: SongId) -> DbResult<()> {
        debug!(song_id = id, "Deleting song");

        match self.store.delete(id).await {
            Ok(0) => {
                warn!(song_id = id, "Delete matched no song");
                Ok(())
            }
            Ok(_) => {
                info!(song_id = id, "Song deleted successfully");
                Ok(())
            }
            Err(e) => {
                error!(song_id = id, error = %e, "Failed to delete song");
                Err(e)
            }
        }
    }

    async fn update_song(&self, song: &Song) -> DbResult<()> {
        debug!(song_id = song.id, group = %song.group, song = %song.song, "Updating song");

        match self.store.update(song).await {
            Ok(0) => {
                warn!(song_id = song.id, "Update matched no song");
                Ok(())
            }
            Ok(_) => {
                info!(song_id = song.id, "Song updated successfully");
                Ok(())
            }
            Err(e) => {
                error!(song_id = song.id, error = %e, "Failed to update song");
                Err(e)
            }
        }
    }

    async fn add_song(&self, song: &Song) -> DbResult<()> {
        debug!(group = %song.group, song = %song.song, "Adding new song");

        match self.store.add(song).await {
            Ok(()) => {
                info!(group = %song.group, song = %song.song, "Song added successfully");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to add song");
                Err(e)
            }
        }
    }

    async fn is_healthy(&self) -> bool {
        let healthy = self.store.health_check().await;
        if !healthy {
            warn!("Store health check failed");
        }
        healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songbook_db::{DbError, MemorySongStore};

    fn service_with(store: Arc<MemorySongStore>) -> SongServiceImpl {
        SongServiceImpl::new(store)
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let store = Arc::new(MemorySongStore::new());
        let service = service_with(store.clone());

        service
            .add_song(&Song::new("Muse", "Hysteria"))
            .await
            .unwrap();

        let songs = service
            .list_songs(&SongFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, 1);
        assert_eq!(songs[0].song, "Hysteria");
    }

    #[tokio::test]
    async fn test_missing_ids_succeed() {
        let store = Arc::new(MemorySongStore::new());
        let service = service_with(store);

        let mut ghost = Song::new("Nobody", "Nothing");
        ghost.id = 9;

        assert!(service.delete_song(9).await.is_ok());
        assert!(service.update_song(&ghost).await.is_ok());
        assert_eq!(service.get_song(9).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lyrics_errors_pass_through() {
        let service = service_with(Arc::new(MemorySongStore::new()));

        let err = service.get_lyrics(1, Page::default()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_store_outage() {
        let store = Arc::new(MemorySongStore::new());
        let service = service_with(store.clone());
        assert!(service.is_healthy().await);

        store.set_unavailable(true);
        assert!(!service.is_healthy().await);
        assert!(matches!(
            service.add_song(&Song::new("Muse", "Madness")).await,
            Err(DbError::ConnectionFailed(_))
        ));
    }
}
