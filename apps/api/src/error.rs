//! HTTP error responses.
//!
//! Every failure leaves the API as `{"error": "<message>"}` with the status
//! carried by [`ApiError`]. Messages are fixed per failure kind; store errors
//! are logged by the service layer and never echoed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use songbook_core::{CoreError, ValidationError};

pub const MSG_FETCH_SONGS: &str = "Failed to fetch songs";
pub const MSG_FETCH_SONG: &str = "Failed to fetch song";
pub const MSG_SONG_NOT_FOUND: &str = "Song not found";
pub const MSG_INVALID_ID: &str = "Invalid song ID";
pub const MSG_FETCH_LYRICS: &str = "Failed to fetch lyrics";
pub const MSG_INVALID_PAYLOAD: &str = "Invalid request payload";
pub const MSG_REQUIRED_FIELDS: &str = "Group and song fields are required";
pub const MSG_ADD_SONG: &str = "Failed to add song";
pub const MSG_DELETE_SONG: &str = "Failed to delete song";
pub const MSG_UPDATE_SONG: &str = "Failed to update song";
pub const MSG_INTERNAL: &str = "Internal server error";
pub const MSG_SHUTTING_DOWN: &str = "Server is shutting down";

/// Wire shape of every error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: &self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidFormat { ref field, .. } if field == "id" => {
                ApiError::bad_request(MSG_INVALID_ID)
            }
            ValidationError::Required { .. } | ValidationError::RequiredAll { .. } => {
                ApiError::bad_request(MSG_REQUIRED_FIELDS)
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SongNotFound(_) => ApiError::not_found(MSG_SONG_NOT_FOUND),
            CoreError::Validation(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::bad_request(MSG_INVALID_ID).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Invalid song ID" }));
    }

    #[test]
    fn test_validation_mapping() {
        let invalid_id = ValidationError::InvalidFormat {
            field: "id".into(),
            reason: "invalid digit".into(),
        };
        assert_eq!(ApiError::from(invalid_id), ApiError::bad_request(MSG_INVALID_ID));

        let missing = ValidationError::RequiredAll {
            fields: vec!["group".into(), "song".into()],
        };
        assert_eq!(
            ApiError::from(missing),
            ApiError::bad_request(MSG_REQUIRED_FIELDS)
        );
    }

    #[test]
    fn test_core_error_mapping() {
        let err = ApiError::from(CoreError::SongNotFound(7));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, MSG_SONG_NOT_FOUND);
    }
}
