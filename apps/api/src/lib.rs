//! # Songbook API
//!
//! HTTP/JSON front end for the song catalog.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Songbook API                                   │
//! │                                                                         │
//! │  Client ──► middleware ──► handlers ──► SongService ──► SongStore      │
//! │             (router.rs)   (handlers/)   (service.rs)    (songbook-db)  │
//! │                                                              │          │
//! │                                                              ▼          │
//! │                                                          PostgreSQL     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary in `main.rs` wires these together; everything here is usable
//! from tests without a database by plugging in
//! [`songbook_db::MemorySongStore`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod server;
pub mod service;

use std::sync::Arc;

use crate::service::SongService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub songs: Arc<dyn SongService>,
}

impl AppState {
    pub fn new(songs: Arc<dyn SongService>) -> Self {
        AppState { songs }
    }
}

pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;
pub use router::build_router;
pub use service::SongServiceImpl;
