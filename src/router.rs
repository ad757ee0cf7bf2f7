use std::path::Path;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{generate, history, session};
use crate::state::AppState;

pub fn build_router(
    state: AppState,
    max_upload_bytes: usize,
    static_dir: Option<&Path>,
) -> Router {
    let router = Router::new()
        .route("/api/options", get(session::options))
        .route("/api/state", get(session::snapshot))
        .route(
            "/api/character",
            put(session::upload_character).delete(session::reset_character),
        )
        .route(
            "/api/outfit",
            put(session::upload_outfit).delete(session::reset_outfit),
        )
        .route(
            "/api/outfit/generate",
            post(generate::generate_outfit_from_text),
        )
        .route("/api/generate", post(generate::generate_outfit_change))
        .route("/api/history", get(history::list_history))
        .route(
            "/api/history/:id/download",
            get(history::download_history_entry),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}
