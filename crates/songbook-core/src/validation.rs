//! # Validation Module
//!
//! Input validation for songs and path parameters.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: JSON decoding (axum Json extractor)                          │
//! │  └── Malformed body / wrong types → 400 "Invalid request payload"      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── group and song must be non-blank on create                        │
//! │  └── path IDs must be integers                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (PostgreSQL)                                        │
//! │  └── NOT NULL constraints                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{Song, SongId};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a song before insertion.
///
/// ## Rules
/// - `group` must not be blank
/// - `song` must not be blank
///
/// Other fields are optional.
///
/// ## Example
/// ```rust
/// use songbook_core::Song;
/// use songbook_core::validation::validate_new_song;
///
/// assert!(validate_new_song(&Song::new("Muse", "Uprising")).is_ok());
/// assert!(validate_new_song(&Song::new("", "Uprising")).is_err());
/// ```
pub fn validate_new_song(song: &Song) -> ValidationResult<()> {
    let mut missing = Vec::new();

    if song.group.trim().is_empty() {
        missing.push("group".to_string());
    }
    if song.song.trim().is_empty() {
        missing.push("song".to_string());
    }

    match missing.len() {
        0 => Ok(()),
        1 => Err(ValidationError::Required {
            field: missing.remove(0),
        }),
        _ => Err(ValidationError::RequiredAll { fields: missing }),
    }
}

/// Parses a song ID from a path segment.
pub fn parse_song_id(raw: &str) -> ValidationResult<SongId> {
    raw.trim()
        .parse::<SongId>()
        .map_err(|e| ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: e.to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
