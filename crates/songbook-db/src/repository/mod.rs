//! # Repository Module
//!
//! Song store abstraction and its implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SongService (songbook-api)                                            │
//! │       │                                                                 │
//! │       │  store.list(&filter, page)                                      │
//! │       ▼                                                                 │
//! │  dyn SongStore                                                         │
//! │  ├── SongRepository   → PostgreSQL (production)                        │
//! │  └── MemorySongStore  → HashMap behind a RwLock (tests, local runs)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Stores
//!
//! - [`SongRepository`] - PostgreSQL implementation
//! - [`MemorySongStore`] - In-memory implementation

pub mod memory;
pub mod song;

use async_trait::async_trait;
use songbook_core::{Page, Song, SongFilter, SongId};

use crate::error::DbResult;

pub use memory::MemorySongStore;
pub use song::SongRepository;

/// Typed CRUD over the song catalog.
///
/// Dropping a returned future cancels the underlying call; no method retries.
#[async_trait]
pub trait SongStore: Send + Sync {
    /// Lists songs matching every non-empty filter field, one page at a time.
    ///
    /// Order is store-native and not guaranteed across calls.
    async fn list(&self, filter: &SongFilter, page: Page) -> DbResult<Vec<Song>>;

    /// Looks up a single song.
    async fn get_by_id(&self, id: SongId) -> DbResult<Option<Song>>;

    /// Returns one page of verses from the song's lyrics.
    ///
    /// Fails with `DbError::NotFound` when the song doesn't exist.
    async fn lyrics_paginated(&self, id: SongId, page: Page) -> DbResult<Vec<String>>;

    /// Deletes a song. Returns the number of rows removed (0 for a missing ID).
    async fn delete(&self, id: SongId) -> DbResult<u64>;

    /// Overwrites every mutable field of the song with `song.id`.
    /// Returns the number of rows changed (0 for a missing ID).
    async fn update(&self, song: &Song) -> DbResult<u64>;

    /// Inserts a new song. The ID is assigned by the store and `song.id` is ignored.
    async fn add(&self, song: &Song) -> DbResult<()>;

    /// Returns true when the store answers queries.
    async fn health_check(&self) -> bool;
}
