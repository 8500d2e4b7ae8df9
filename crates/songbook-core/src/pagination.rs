//! # Pagination
//!
//! Limit/offset defaults for listings and verse pagination over lyrics.
//!
//! ## Defaulting Rules
//! ```text
//! ?limit=abc   → 10      ?offset=abc → 0
//! ?limit=0     → 10      ?offset=-3  → 0
//! ?limit=-1    → 10      (missing)   → 0
//! (missing)    → 10
//! ```
//!
//! ## Verse Pagination
//! Lyrics are stored as a single text blob. Verses are derived on read by
//! splitting on `\n`, then sliced to `[offset, offset + limit)`:
//! ```text
//! "a\nb\nc"  ──split──►  ["a", "b", "c"]
//!                              │
//!          limit=2, offset=1   ▼
//!                         ["b", "c"]
//! ```

use crate::{DEFAULT_PAGE_LIMIT, DEFAULT_PAGE_OFFSET, VERSE_DELIMITER};

/// A validated limit/offset pair.
///
/// Both values are always usable: `limit > 0` and `offset >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: DEFAULT_PAGE_LIMIT,
            offset: DEFAULT_PAGE_OFFSET,
        }
    }
}

impl Page {
    /// Creates a page, replacing out-of-range values with the defaults.
    pub fn new(limit: i64, offset: i64) -> Self {
        Page {
            limit: if limit > 0 { limit } else { DEFAULT_PAGE_LIMIT },
            offset: if offset >= 0 { offset } else { DEFAULT_PAGE_OFFSET },
        }
    }

    /// Builds a page from raw query string values.
    ///
    /// Never fails: anything that does not parse falls back to the default.
    pub fn from_params(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = parse_or(limit, DEFAULT_PAGE_LIMIT);
        let offset = parse_or(offset, DEFAULT_PAGE_OFFSET);
        Page::new(limit, offset)
    }
}

fn parse_or(raw: Option<&str>, fallback: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(fallback)
}

/// Splits lyrics into verses and returns the requested page of them.
///
/// - `offset` at or beyond the verse count yields an empty vector
/// - the upper bound is clamped to the verse count
pub fn paginate_verses(text: &str, page: Page) -> Vec<String> {
    let verses: Vec<&str> = text.split(VERSE_DELIMITER).collect();

    let start = usize::try_from(page.offset).unwrap_or(usize::MAX);
    if start >= verses.len() {
        return Vec::new();
    }

    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    let end = start.saturating_add(limit).min(verses.len());

    verses[start..end].iter().map(|v| v.to_string()).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
