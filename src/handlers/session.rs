use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::handlers::error::AppError;
use crate::state::AppState;
use crate::studio::history::HistoryEntry;
use crate::studio::options::{CAMERA_ANGLES, CUSTOM_OPTION_LABEL, CUSTOM_OPTION_VALUE, POSES};
use crate::studio::{Flow, FlowState, ImagePayload, StudioError};

#[derive(Debug, Serialize)]
pub struct ImageView {
    pub media_type: String,
    pub uri: String,
}

impl From<&ImagePayload> for ImageView {
    fn from(payload: &ImagePayload) -> Self {
        ImageView {
            media_type: payload.media_type().to_string(),
            uri: payload.to_data_uri(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub poses: &'static [&'static str],
    pub camera_angles: &'static [&'static str],
    pub custom_value: &'static str,
    pub custom_label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub character_image: Option<ImageView>,
    pub outfit_image: Option<ImageView>,
    pub outfit_from_text: FlowState,
    pub outfit_change: FlowState,
    pub displayed_result: Option<HistoryEntry>,
    pub history_len: usize,
}

/// JSON alternative to a multipart upload.
#[derive(Debug, Deserialize)]
pub struct DataUriUpload {
    pub data_uri: String,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Character,
    Outfit,
}

impl Slot {
    fn as_str(self) -> &'static str {
        match self {
            Slot::Character => "character",
            Slot::Outfit => "outfit",
        }
    }
}

pub async fn options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        poses: POSES,
        camera_angles: CAMERA_ANGLES,
        custom_value: CUSTOM_OPTION_VALUE,
        custom_label: CUSTOM_OPTION_LABEL,
    })
}

pub async fn snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let session = state.session.lock();
    Json(SessionSnapshot {
        character_image: session.character_image().map(ImageView::from),
        outfit_image: session.outfit_image().map(ImageView::from),
        outfit_from_text: session.flow(Flow::OutfitFromText).clone(),
        outfit_change: session.flow(Flow::OutfitChange).clone(),
        displayed_result: session.displayed_result().cloned(),
        history_len: session.history().len(),
    })
}

/// Reads the `file` field of a multipart upload and encodes it.
async fn read_upload(mut multipart: Multipart) -> Result<ImagePayload, StudioError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| StudioError::processing(format!("Could not read the uploaded file: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let declared_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|err| {
            StudioError::processing(format!("Could not read the uploaded file: {err}"))
        })?;
        return ImagePayload::from_upload(&bytes, declared_type.as_deref());
    }

    Err(StudioError::validation("No file was uploaded."))
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

async fn decode_upload(state: &AppState, request: Request) -> Result<ImagePayload, StudioError> {
    if is_json(&request) {
        let Json(upload) = Json::<DataUriUpload>::from_request(request, state)
            .await
            .map_err(|err| StudioError::processing(format!("Could not read the upload: {err}")))?;
        return ImagePayload::from_data_uri(&upload.data_uri);
    }

    let multipart = Multipart::from_request(request, state)
        .await
        .map_err(|err| StudioError::processing(format!("Could not read the upload: {err}")))?;
    read_upload(multipart).await
}

async fn store_upload(
    state: AppState,
    slot: Slot,
    request: Request,
) -> Result<Json<ImageView>, AppError> {
    let payload = decode_upload(&state, request).await.map_err(|err| {
        warn!("Rejected {} upload: {}", slot.as_str(), err);
        err
    })?;
    info!(
        slot = slot.as_str(),
        media_type = payload.media_type(),
        encoded_len = payload.data().len(),
        "Stored uploaded image"
    );

    let view = ImageView::from(&payload);
    let mut session = state.session.lock();
    match slot {
        Slot::Character => session.set_character_image(payload),
        Slot::Outfit => session.set_outfit_image(payload),
    }
    Ok(Json(view))
}

pub async fn upload_character(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ImageView>, AppError> {
    store_upload(state, Slot::Character, request).await
}

pub async fn upload_outfit(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ImageView>, AppError> {
    store_upload(state, Slot::Outfit, request).await
}

pub async fn reset_character(State(state): State<AppState>) -> StatusCode {
    state.session.lock().clear_character_image();
    StatusCode::NO_CONTENT
}

pub async fn reset_outfit(State(state): State<AppState>) -> StatusCode {
    state.session.lock().clear_outfit_image();
    StatusCode::NO_CONTENT
}
