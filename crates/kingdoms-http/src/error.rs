use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kingdoms_directory::DirectoryError;
use kingdoms_map::MapError;

/// Errors surfaced by the admin HTTP handlers, mapped to status codes at
/// the response boundary.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("invalid map: {0}")]
    InvalidMap(#[from] MapError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self {
            HttpError::InvalidMap(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HttpError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = axum::Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}
