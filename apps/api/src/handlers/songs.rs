//! `/songs` endpoints.
//!
//! | Method | Path                 | Success                 |
//! |--------|----------------------|-------------------------|
//! | GET    | `/songs`             | 200 + `Song[]`          |
//! | GET    | `/songs/{id}`        | 200 + `Song`            |
//! | GET    | `/songs/{id}/lyrics` | 200 + `string[]`        |
//! | POST   | `/songs`             | 201, empty body         |
//! | PUT    | `/songs/{id}`        | 204, empty body         |
//! | DELETE | `/songs/{id}`        | 204, empty body         |
//!
//! Query parameters are read verbatim: a parameter given several times
//! yields a single value, and unknown parameters are ignored. Nothing here
//! rejects a malformed query string.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

use songbook_core::validation::{parse_song_id, validate_new_song};
use serde_json::Value;

use songbook_core::{CoreError, Page, Song, SongFilter, SongId};

use crate::error::{
    ApiError, MSG_ADD_SONG, MSG_DELETE_SONG, MSG_FETCH_LYRICS, MSG_FETCH_SONG, MSG_FETCH_SONGS,
    MSG_INVALID_PAYLOAD, MSG_UPDATE_SONG,
};
use crate::AppState;

type Params = HashMap<String, String>;

fn param(params: &Params, key: &str) -> Option<String> {
    params.get(key).cloned()
}

fn page_from(params: &Params) -> Page {
    Page::from_params(
        params.get("limit").map(String::as_str),
        params.get("offset").map(String::as_str),
    )
}

fn song_id(raw: &str) -> Result<SongId, ApiError> {
    parse_song_id(raw).map_err(ApiError::from)
}

/// Decodes a song body. Only a JSON object is accepted; serde would
/// otherwise read an array positionally into `Song`.
fn payload(body: Result<Json<Value>, JsonRejection>) -> Result<Song, ApiError> {
    let value = match body {
        Ok(Json(value)) => value,
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "Rejected song payload");
            return Err(ApiError::bad_request(MSG_INVALID_PAYLOAD));
        }
    };

    if !value.is_object() {
        warn!("Rejected song payload: body is not a JSON object");
        return Err(ApiError::bad_request(MSG_INVALID_PAYLOAD));
    }

    serde_json::from_value(value).map_err(|e| {
        warn!(reason = %e, "Rejected song payload");
        ApiError::bad_request(MSG_INVALID_PAYLOAD)
    })
}

/// `GET /songs?group_name=&song_name=&release_date=&limit=&offset=`
pub async fn list_songs(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let filter = SongFilter::new(
        param(&params, "group_name"),
        param(&params, "song_name"),
        param(&params, "release_date"),
    );
    let page = page_from(&params);

    state
        .songs
        .list_songs(&filter, page)
        .await
        .map(Json)
        .map_err(|_| ApiError::internal(MSG_FETCH_SONGS))
}

/// `GET /songs/{id}`
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Song>, ApiError> {
    let id = song_id(&id)?;

    match state.songs.get_song(id).await {
        Ok(Some(song)) => Ok(Json(song)),
        Ok(None) => Err(CoreError::SongNotFound(id).into()),
        Err(_) => Err(ApiError::internal(MSG_FETCH_SONG)),
    }
}

/// `GET /songs/{id}/lyrics?limit=&offset=`
///
/// A missing song is reported like any other store failure (500).
pub async fn get_lyrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<String>>, ApiError> {
    let id = song_id(&id)?;
    let page = page_from(&params);

    state
        .songs
        .get_lyrics(id, page)
        .await
        .map(Json)
        .map_err(|_| ApiError::internal(MSG_FETCH_LYRICS))
}

/// `DELETE /songs/{id}`
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = song_id(&id)?;

    state
        .songs
        .delete_song(id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|_| ApiError::internal(MSG_DELETE_SONG))
}

/// `PUT /songs/{id}`
///
/// Full replacement: fields missing from the body are stored as empty.
/// Any `id` in the body is ignored in favour of the path.
pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = song_id(&id)?;
    let mut song = payload(body)?;
    song.id = id;

    state
        .songs
        .update_song(&song)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|_| ApiError::internal(MSG_UPDATE_SONG))
}

/// `POST /songs`
pub async fn add_song(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let song = payload(body)?;
    validate_new_song(&song)?;

    state
        .songs
        .add_song(&song)
        .await
        .map(|()| StatusCode::CREATED)
        .map_err(|_| ApiError::internal(MSG_ADD_SONG))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, Response};
    use axum::Router;
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use songbook_db::{DbError, DbResult, MemorySongStore, SongStore};

    use super::*;
    use crate::router::build_router;
    use crate::service::SongServiceImpl;

    const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    fn catalog() -> Arc<MemorySongStore> {
        Arc::new(MemorySongStore::with_songs([
            Song::new("Muse", "Supermassive Black Hole")
                .with_release_date(NaiveDate::from_ymd_opt(2006, 7, 16).unwrap())
                .with_text("Ooh baby, don't you know I suffer?\nOoh baby, can you hear me moan?\nYou caught me under false pretenses")
                .with_link("https://www.youtube.com/watch?v=Xsp3_a-PMTw"),
            Song::new("Muse", "Uprising")
                .with_release_date(NaiveDate::from_ymd_opt(2009, 9, 7).unwrap()),
            Song::new("Queen", "Bohemian Rhapsody")
                .with_release_date(NaiveDate::from_ymd_opt(1975, 10, 31).unwrap()),
        ]))
    }

    fn app_with(store: Arc<dyn SongStore>) -> Router {
        let service = SongServiceImpl::new(store);
        build_router(AppState::new(Arc::new(service)), TIMEOUT)
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.oneshot(request.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn assert_error(response: Response<Body>, status: StatusCode, message: &str) {
        assert_eq!(response.status(), status);
        assert_eq!(json_body(response).await, json!({ "error": message }));
    }

    /// Counts calls and fails every one of them.
    #[derive(Default)]
    struct FailingStore {
        calls: AtomicUsize,
    }

    impl FailingStore {
        fn fail(&self) -> DbError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DbError::QueryFailed("boom".into())
        }
    }

    #[async_trait]
    impl SongStore for FailingStore {
        async fn list(&self, _: &SongFilter, _: Page) -> DbResult<Vec<Song>> {
            Err(self.fail())
        }
        async fn get_by_id(&self, _: SongId) -> DbResult<Option<Song>> {
            Err(self.fail())
        }
        async fn lyrics_paginated(&self, _: SongId, _: Page) -> DbResult<Vec<String>> {
            Err(self.fail())
        }
        async fn delete(&self, _: SongId) -> DbResult<u64> {
            Err(self.fail())
        }
        async fn update(&self, _: &Song) -> DbResult<u64> {
            Err(self.fail())
        }
        async fn add(&self, _: &Song) -> DbResult<()> {
            Err(self.fail())
        }
        async fn health_check(&self) -> bool {
            false
        }
    }

    // -------------------------------------------------------------------------
    // GET /songs
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_without_filters_uses_default_page() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let songs = json_body(response).await;
        assert_eq!(songs.as_array().unwrap().len(), 3);
        assert_eq!(songs[0]["group"], "Muse");
        assert_eq!(songs[0]["release_date"], "2006-07-16");
    }

    #[tokio::test]
    async fn test_list_filters_case_insensitively() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs?group_name=muse&song_name=RISING", None).await;

        let songs = json_body(response).await;
        assert_eq!(songs.as_array().unwrap().len(), 1);
        assert_eq!(songs[0]["song"], "Uprising");
    }

    #[tokio::test]
    async fn test_list_filters_by_release_date() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs?release_date=1975-10-31", None).await;

        let songs = json_body(response).await;
        assert_eq!(songs.as_array().unwrap().len(), 1);
        assert_eq!(songs[0]["group"], "Queen");
    }

    #[tokio::test]
    async fn test_list_invalid_pagination_falls_back() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs?limit=abc&offset=-3", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_pages() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs?limit=1&offset=2", None).await;

        let songs = json_body(response).await;
        assert_eq!(songs.as_array().unwrap().len(), 1);
        assert_eq!(songs[0]["song"], "Bohemian Rhapsody");
    }

    #[tokio::test]
    async fn test_list_empty_result_is_array() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs?group_name=abba", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_list_store_failure() {
        let app = app_with(Arc::new(FailingStore::default()));
        let response = send(app, Method::GET, "/songs", None).await;

        assert_error(response, StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch songs").await;
    }

    // -------------------------------------------------------------------------
    // GET /songs/{id}
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_song() {
        let app = app_with(catalog());
        let response = send(app.clone(), Method::GET, "/songs/2", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["song"], "Uprising");

        let missing = send(app, Method::GET, "/songs/99", None).await;
        assert_error(missing, StatusCode::NOT_FOUND, "Song not found").await;
    }

    // -------------------------------------------------------------------------
    // GET /songs/{id}/lyrics
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_lyrics_paginated() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs/1/lyrics?limit=2&offset=1", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([
                "Ooh baby, can you hear me moan?",
                "You caught me under false pretenses"
            ])
        );
    }

    #[tokio::test]
    async fn test_lyrics_offset_past_end_is_empty() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs/1/lyrics?offset=10", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_lyrics_of_empty_text_is_one_empty_verse() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs/2/lyrics", None).await;

        assert_eq!(json_body(response).await, json!([""]));
    }

    #[tokio::test]
    async fn test_lyrics_missing_song_is_server_error() {
        let app = app_with(catalog());
        let response = send(app, Method::GET, "/songs/99/lyrics", None).await;

        assert_error(response, StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch lyrics").await;
    }

    #[tokio::test]
    async fn test_invalid_id_never_reaches_store() {
        let store = Arc::new(FailingStore::default());
        let app = app_with(store.clone());

        for (method, uri) in [
            (Method::GET, "/songs/abc/lyrics"),
            (Method::GET, "/songs/abc"),
            (Method::DELETE, "/songs/abc"),
        ] {
            let response = send(app.clone(), method, uri, None).await;
            assert_error(response, StatusCode::BAD_REQUEST, "Invalid song ID").await;
        }

        let response = send(app, Method::PUT, "/songs/1.5", Some(r#"{"group":"x"}"#)).await;
        assert_error(response, StatusCode::BAD_REQUEST, "Invalid song ID").await;

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    // -------------------------------------------------------------------------
    // POST /songs
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_song() {
        let store = catalog();
        let app = app_with(store.clone());
        let body = r#"{"group":"Muse","song":"Starlight","release_date":"2006-09-04"}"#;

        let response = send(app.clone(), Method::POST, "/songs", Some(body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(to_bytes(response.into_body(), usize::MAX).await.unwrap().is_empty());
        assert_eq!(store.len().await, 4);

        let listed = send(app, Method::GET, "/songs?song_name=starlight", None).await;
        let songs = json_body(listed).await;
        assert_eq!(songs.as_array().unwrap().len(), 1);
        assert_eq!(songs[0]["id"], 4);
        assert_eq!(songs[0]["text"], "");
    }

    #[tokio::test]
    async fn test_add_song_requires_group_and_song() {
        let store = catalog();
        let app = app_with(store.clone());

        for body in [r#"{"group":"","song":"x"}"#, r#"{"group":"Muse"}"#, "{}"] {
            let response = send(app.clone(), Method::POST, "/songs", Some(body)).await;
            assert_error(
                response,
                StatusCode::BAD_REQUEST,
                "Group and song fields are required",
            )
            .await;
        }
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_add_song_malformed_payload() {
        let app = app_with(catalog());

        for body in ["{not json", r#"{"group":1,"song":"x"}"#, r#"{"group":"a","song":"b","release_date":"16.07.2006"}"#] {
            let response = send(app.clone(), Method::POST, "/songs", Some(body)).await;
            assert_error(response, StatusCode::BAD_REQUEST, "Invalid request payload").await;
        }
    }

    #[tokio::test]
    async fn test_add_song_rejects_array_body() {
        let store = catalog();
        let app = app_with(store.clone());

        for body in ["[]", r#"[0,"Queen","Innuendo"]"#, r#""Innuendo""#, "null"] {
            let response = send(app.clone(), Method::POST, "/songs", Some(body)).await;
            assert_error(response, StatusCode::BAD_REQUEST, "Invalid request payload").await;
        }
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_add_song_store_failure() {
        let app = app_with(Arc::new(FailingStore::default()));
        let response = send(app, Method::POST, "/songs", Some(r#"{"group":"a","song":"b"}"#)).await;

        assert_error(response, StatusCode::INTERNAL_SERVER_ERROR, "Failed to add song").await;
    }

    // -------------------------------------------------------------------------
    // PUT /songs/{id}
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_update_song_replaces_all_fields() {
        let store = catalog();
        let app = app_with(store.clone());
        let body = r#"{"id":77,"group":"Muse","song":"Supermassive Black Hole (Live)"}"#;

        let response = send(app, Method::PUT, "/songs/1", Some(body)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let updated = store.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(updated.song, "Supermassive Black Hole (Live)");
        assert_eq!(updated.release_date, None);
        assert_eq!(updated.text, "");
        assert_eq!(store.get_by_id(77).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_missing_song_succeeds() {
        let app = app_with(catalog());
        let response = send(app, Method::PUT, "/songs/99", Some(r#"{"group":"a","song":"b"}"#)).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_update_malformed_payload() {
        let store = catalog();
        let app = app_with(store.clone());

        for body in ["[]", r#"[1,"Queen","Innuendo"]"#, "{broken"] {
            let response = send(app.clone(), Method::PUT, "/songs/1", Some(body)).await;
            assert_error(response, StatusCode::BAD_REQUEST, "Invalid request payload").await;
        }

        let untouched = store.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(untouched.song, "Supermassive Black Hole");
        assert!(untouched.release_date.is_some());
    }

    #[tokio::test]
    async fn test_update_store_failure() {
        let app = app_with(Arc::new(FailingStore::default()));
        let response = send(app, Method::PUT, "/songs/1", Some("{}")).await;

        assert_error(response, StatusCode::INTERNAL_SERVER_ERROR, "Failed to update song").await;
    }

    // -------------------------------------------------------------------------
    // DELETE /songs/{id}
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_delete_song_is_idempotent() {
        let store = catalog();
        let app = app_with(store.clone());

        let first = send(app.clone(), Method::DELETE, "/songs/3", None).await;
        let second = send(app.clone(), Method::DELETE, "/songs/3", None).await;

        assert_eq!(first.status(), StatusCode::NO_CONTENT);
        assert_eq!(second.status(), StatusCode::NO_CONTENT);
        assert_eq!(store.len().await, 2);

        let listed = json_body(send(app, Method::GET, "/songs", None).await).await;
        assert!(listed.as_array().unwrap().iter().all(|song| song["id"] != 3));
    }

    #[tokio::test]
    async fn test_delete_store_failure() {
        let app = app_with(Arc::new(FailingStore::default()));
        let response = send(app, Method::DELETE, "/songs/1", None).await;

        assert_error(response, StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete song").await;
    }
}
