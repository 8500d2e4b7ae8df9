//! Liveness/readiness probe.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

/// `GET /health`: 200 when the store answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.songs.is_healthy().await {
        (StatusCode::OK, Json(HealthBody { status: "ok" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthBody {
                status: "unavailable",
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    use songbook_db::MemorySongStore;

    use super::*;
    use crate::router::build_router;
    use crate::service::SongServiceImpl;

    async fn probe(store: Arc<MemorySongStore>) -> (StatusCode, serde_json::Value) {
        let state = AppState::new(Arc::new(SongServiceImpl::new(store)));
        let app = build_router(state, Duration::from_secs(5));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_ok() {
        let (status, body) = probe(Arc::new(MemorySongStore::new())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_health_unavailable() {
        let store = Arc::new(MemorySongStore::new());
        store.set_unavailable(true);

        let (status, body) = probe(store).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "status": "unavailable" }));
    }
}
