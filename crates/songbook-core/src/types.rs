//! # Domain Types
//!
//! Core domain types used throughout Songbook.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌──────────────────────┐              │
//! │  │        Song          │        │      SongFilter      │              │
//! │  │  ──────────────────  │        │  ──────────────────  │              │
//! │  │  id (store-assigned) │        │  group (substring)   │              │
//! │  │  group / song        │        │  song  (substring)   │              │
//! │  │  release_date        │        │  release_date (==)   │              │
//! │  │  text (verses, \n)   │        │  not persisted       │              │
//! │  │  link                │        └──────────────────────┘              │
//! │  └──────────────────────┘                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Mapping
//! The JSON field names (`group`, `song`) differ from the column names
//! (`group_name`, `song_name`). With the `sqlx` feature enabled, `Song`
//! derives `FromRow` with the column renames applied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned song identifier.
pub type SongId = i64;

// =============================================================================
// Song
// =============================================================================

/// A song in the catalog.
///
/// Request bodies may omit any field: missing strings decode as empty,
/// a missing `release_date` as `None`. Whether the result is acceptable is
/// decided by [`crate::validation`], not by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(default)]
pub struct Song {
    /// Identifier assigned by the store on insert. Ignored on create.
    pub id: SongId,

    /// Performing group or artist.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "group_name"))]
    pub group: String,

    /// Song title.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "song_name"))]
    pub song: String,

    /// Release date, serialized as `YYYY-MM-DD`.
    pub release_date: Option<NaiveDate>,

    /// Lyrics, one verse per line.
    pub text: String,

    /// External link (video, streaming page, ...).
    pub link: String,
}

impl Song {
    /// Creates a song with only the required fields set.
    pub fn new(group: impl Into<String>, song: impl Into<String>) -> Self {
        Song {
            group: group.into(),
            song: song.into(),
            ..Song::default()
        }
    }

    /// Sets the release date.
    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    /// Sets the lyrics text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the external link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }
}

// =============================================================================
// Song Filter
// =============================================================================

/// Request-scoped match criteria for listing songs.
///
/// Empty strings are treated the same as absent values, so a query string
/// like `?group_name=&song_name=x` filters on the title only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    /// Case-insensitive substring of the group name.
    pub group: Option<String>,

    /// Case-insensitive substring of the song title.
    pub song: Option<String>,

    /// Exact release date, used verbatim (e.g. `2006-07-16`).
    pub release_date: Option<String>,
}

impl SongFilter {
    /// Builds a filter from raw query values.
    pub fn new(
        group: Option<String>,
        song: Option<String>,
        release_date: Option<String>,
    ) -> Self {
        SongFilter {
            group,
            song,
            release_date,
        }
    }

    /// Group criterion, if present and non-empty.
    pub fn group(&self) -> Option<&str> {
        non_empty(&self.group)
    }

    /// Title criterion, if present and non-empty.
    pub fn song(&self) -> Option<&str> {
        non_empty(&self.song)
    }

    /// Release date criterion, if present and non-empty.
    pub fn release_date(&self) -> Option<&str> {
        non_empty(&self.release_date)
    }

    /// Checks a song against every non-empty criterion.
    ///
    /// Mirrors the SQL semantics: `ILIKE '%value%'` for group and title,
    /// equality on the ISO date for the release date.
    pub fn matches(&self, song: &Song) -> bool {
        if let Some(group) = self.group() {
            if !contains_ignore_case(&song.group, group) {
                return false;
            }
        }

        if let Some(title) = self.song() {
            if !contains_ignore_case(&song.song, title) {
                return false;
            }
        }

        if let Some(date) = self.release_date() {
            // PostgreSQL's `::date` cast accepts unpadded fields and surrounding blanks
            let wanted = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok();
            match (song.release_date, wanted) {
                (Some(released), Some(wanted)) if released == wanted => {}
                _ => return false,
            }
        }

        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
