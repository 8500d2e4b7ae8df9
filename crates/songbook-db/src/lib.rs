//! # songbook-db: Database Layer for Songbook
//!
//! This crate provides database access for the Songbook API.
//! It uses PostgreSQL with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Songbook Data Flow                               │
//! │                                                                         │
//! │  SongService (songbook-api)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    songbook-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │   SongStore   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (trait)      │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ PgPool        │◄───│ SongRepository│    │ create_songs │  │   │
//! │  │   │ ping / close  │    │ MemorySongStore│   │ ...          │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL (songs table)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - `SongStore` trait and implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use songbook_db::{Database, DbConfig, SongStore};
//!
//! let config = DbConfig::new("localhost", 5432, "songbook", "secret", "songbook");
//! let db = Database::new(config).await?; // connects, pings, migrates
//!
//! let verses = db.songs().lyrics_paginated(1, Page::new(2, 0)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{MemorySongStore, SongRepository, SongStore};
