use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use tracing::info;

use crate::handlers::error::AppError;
use crate::state::AppState;
use crate::studio::history::{download_filename, HistoryEntry};

pub async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.session.lock().history().entries().to_vec())
}

pub async fn download_history_entry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let payload = state
        .session
        .lock()
        .history()
        .get(id)
        .map(|entry| entry.payload.clone())
        .ok_or_else(|| AppError::NotFound(format!("History entry {id} not found")))?;

    let bytes = payload.decode()?;
    let filename = download_filename(&state.download_prefix, &Local::now().naive_local());
    info!(id, filename = %filename, bytes = bytes.len(), "Serving history download");

    let headers = [
        (header::CONTENT_TYPE, payload.media_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes).into_response())
}
