//! # songbook-core: Domain Logic for Songbook
//!
//! Pure types and functions shared by the database layer and the HTTP API.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Songbook Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (GET /songs?group_name=muse&limit=5)                     │
//! │       │                                                                 │
//! │       │  SongFilter + Page  ← built here, from raw query strings       │
//! │       ▼                                                                 │
//! │  SongService ──► SongStore (songbook-db) ──► PostgreSQL                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<Song> / Vec<String> (verses)  ← types defined here                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (`Song`, `SongFilter`)
//! - [`pagination`] - `Page` defaults and verse pagination
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for new songs
//!
//! ## Example Usage
//!
//! ```rust
//! use songbook_core::pagination::{paginate_verses, Page};
//!
//! let page = Page::from_params(Some("2"), Some("1"));
//! let verses = paginate_verses("a\nb\nc", page);
//! assert_eq!(verses, vec!["b".to_string(), "c".to_string()]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pagination;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use pagination::{paginate_verses, Page};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when `limit` is missing, non-numeric or not positive.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Offset used when `offset` is missing, non-numeric or negative.
pub const DEFAULT_PAGE_OFFSET: i64 = 0;

/// Delimiter between verses in stored lyrics text.
pub const VERSE_DELIMITER: char = '\n';
