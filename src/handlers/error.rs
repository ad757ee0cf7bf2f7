use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::studio::{ErrorKind, StudioError};

#[derive(Debug)]
pub enum AppError {
    Studio(StudioError),
    NotFound(String),
}

impl From<StudioError> for AppError {
    fn from(err: StudioError) -> Self {
        AppError::Studio(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Processing => StatusCode::BAD_REQUEST,
        ErrorKind::Refusal => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Api | ErrorKind::Generation => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::Studio(err) => (status_for(err.kind), err.kind.as_str(), err.message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
        };

        let payload = json!({
            "error": { "kind": kind, "message": message }
        });

        (status, Json(payload)).into_response()
    }
}
