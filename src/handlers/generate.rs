use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::handlers::error::AppError;
use crate::handlers::session::ImageView;
use crate::state::AppState;
use crate::studio::history::HistoryEntry;
use crate::studio::options::{GenerationOptions, OptionChoice};
use crate::studio::orchestrator::validate_description;
use crate::studio::{Flow, GenerationResult, ImagePayload, StudioError};
use crate::utils::timing::FlowTimer;

#[derive(Debug, Deserialize)]
pub struct OutfitFromTextRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct OutfitChangeRequest {
    pub pose: String,
    #[serde(default)]
    pub custom_pose: Option<String>,
    pub camera_angle: String,
    #[serde(default)]
    pub custom_camera_angle: Option<String>,
    #[serde(default)]
    pub body_measurements: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutfitFromTextResponse {
    pub outfit_image: ImageView,
}

#[derive(Debug, Serialize)]
pub struct OutfitChangeResponse {
    pub result: HistoryEntry,
    pub history_len: usize,
}

fn complete_timer(timer: &mut FlowTimer, result: &GenerationResult) {
    match result {
        Ok(payload) => timer.complete("success", Some(payload.media_type())),
        Err(err) => timer.complete("error", Some(err.kind.as_str())),
    }
}

fn reject(state: &AppState, flow: Flow, timer: &mut FlowTimer, err: StudioError) -> AppError {
    info!(flow = flow.as_str(), "Rejected before request: {}", err);
    state.session.lock().reject(flow, err.clone());
    timer.complete("rejected", Some(err.kind.as_str()));
    AppError::from(err)
}

pub async fn generate_outfit_from_text(
    State(state): State<AppState>,
    Json(request): Json<OutfitFromTextRequest>,
) -> Result<Json<OutfitFromTextResponse>, AppError> {
    let flow = Flow::OutfitFromText;
    let mut timer = FlowTimer::start(flow.as_str(), Some(request.description.clone()));

    if let Err(err) = validate_description(&request.description) {
        return Err(reject(&state, flow, &mut timer, err));
    }

    state.session.lock().begin(flow);
    let result = state
        .orchestrator
        .generate_outfit_from_text(&request.description)
        .await;
    complete_timer(&mut timer, &result);

    let payload = state.session.lock().finish_outfit_from_text(result)?;
    Ok(Json(OutfitFromTextResponse {
        outfit_image: ImageView::from(&payload),
    }))
}

fn prepare_change(
    state: &AppState,
    request: &OutfitChangeRequest,
) -> Result<(ImagePayload, ImagePayload, GenerationOptions), StudioError> {
    let (character, outfit) = state.session.lock().change_inputs()?;
    let pose = OptionChoice::from_selection(&request.pose, request.custom_pose.as_deref());
    let camera_angle = OptionChoice::from_selection(
        &request.camera_angle,
        request.custom_camera_angle.as_deref(),
    );
    let options = GenerationOptions::from_choices(
        &pose,
        &camera_angle,
        request.body_measurements.as_deref(),
    )?;
    Ok((character, outfit, options))
}

pub async fn generate_outfit_change(
    State(state): State<AppState>,
    Json(request): Json<OutfitChangeRequest>,
) -> Result<Json<OutfitChangeResponse>, AppError> {
    let flow = Flow::OutfitChange;
    let mut timer = FlowTimer::start(
        flow.as_str(),
        Some(format!(
            "pose={} camera_angle={}",
            request.pose, request.camera_angle
        )),
    );

    let (character, outfit, options) = match prepare_change(&state, &request) {
        Ok(prepared) => prepared,
        Err(err) => return Err(reject(&state, flow, &mut timer, err)),
    };

    state.session.lock().begin(flow);
    let result = state
        .orchestrator
        .generate_outfit_change(&character, &outfit, &options)
        .await;
    complete_timer(&mut timer, &result);

    let mut session = state.session.lock();
    let entry = session.finish_outfit_change(result)?;
    Ok(Json(OutfitChangeResponse {
        result: entry,
        history_len: session.history().len(),
    }))
}
