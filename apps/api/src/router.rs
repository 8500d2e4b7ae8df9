//! Route table.

use std::time::Duration;

use axum::routing::get;
use axum::Router;

use crate::handlers::{health, songs};
use crate::middleware;
use crate::AppState;

/// Builds the application router with every route and the middleware stack.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/songs", get(songs::list_songs).post(songs::add_song))
        .route(
            "/songs/{id}",
            get(songs::get_song)
                .put(songs::update_song)
                .delete(songs::delete_song),
        )
        .route("/songs/{id}/lyrics", get(songs::get_lyrics))
        .route("/health", get(health::health))
        .with_state(state);

    middleware::apply(routes, request_timeout)
}
