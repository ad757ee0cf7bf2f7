use std::sync::Arc;

use tracing::{error, info, warn};

use crate::llm::media::{is_image_mime, normalize_image_mime, DEFAULT_IMAGE_MIME};
use crate::studio::backend::{
    BackendError, ContentRequest, ImageBackend, ImagesRequest, RequestPart, ResponseModality,
    ResponsePart,
};
use crate::studio::error::{GenerationResult, StudioError};
use crate::studio::options::GenerationOptions;
use crate::studio::payload::ImagePayload;
use crate::studio::prompt::{outfit_change_prompt, outfit_from_text_prompt};

pub const OUTFIT_OUTPUT_MEDIA_TYPE: &str = "image/jpeg";
pub const OUTFIT_ASPECT_RATIO: &str = "3:4";

const NO_OUTFIT_IMAGE_MESSAGE: &str =
    "The AI did not return an image. Please try a different description.";
const NO_COMPOSITE_IMAGE_MESSAGE: &str =
    "Could not generate an image. Please try again with different images or options.";
const UNREADABLE_RESPONSE_MESSAGE: &str =
    "The AI returned a response that could not be read. Please try again.";
const UNREADABLE_IMAGE_MESSAGE: &str =
    "The AI returned image data that could not be read. Please try again.";

#[derive(Debug, Clone)]
pub struct StudioModels {
    pub outfit_model: String,
    pub composite_model: String,
}

/// Builds prompts, calls the backend once per request and classifies
/// whatever comes back. Never retries.
pub struct Orchestrator {
    backend: Arc<dyn ImageBackend>,
    models: StudioModels,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn ImageBackend>, models: StudioModels) -> Self {
        Self { backend, models }
    }

    pub async fn generate_outfit_from_text(&self, description: &str) -> GenerationResult {
        validate_description(description)?;

        let request = ImagesRequest {
            model: self.models.outfit_model.clone(),
            prompt: outfit_from_text_prompt(description),
            number_of_images: 1,
            output_media_type: OUTFIT_OUTPUT_MEDIA_TYPE.to_string(),
            aspect_ratio: OUTFIT_ASPECT_RATIO.to_string(),
        };
        info!(
            model = %request.model,
            description_len = description.len(),
            "Generating outfit from text"
        );

        let images = self.backend.generate_images(request).await.map_err(|err| {
            error!("Outfit image generation failed: {}", err);
            backend_failure(err)
        })?;

        let Some(first) = images.into_iter().next() else {
            warn!("Outfit image generation returned no images");
            return Err(StudioError::generation(NO_OUTFIT_IMAGE_MESSAGE));
        };
        if first.data.trim().is_empty() {
            warn!("Outfit image generation returned an image without data");
            return Err(StudioError::generation(NO_OUTFIT_IMAGE_MESSAGE));
        }

        ImagePayload::new(first.data, OUTFIT_OUTPUT_MEDIA_TYPE).map_err(unreadable_image)
    }

    pub async fn generate_outfit_change(
        &self,
        character_image: &ImagePayload,
        outfit_image: &ImagePayload,
        options: &GenerationOptions,
    ) -> GenerationResult {
        options.validate()?;

        let request = ContentRequest {
            model: self.models.composite_model.clone(),
            parts: vec![
                RequestPart::InlineImage(character_image.clone()),
                RequestPart::InlineImage(outfit_image.clone()),
                RequestPart::Text(outfit_change_prompt(options)),
            ],
            response_modalities: vec![ResponseModality::Image, ResponseModality::Text],
        };
        info!(
            model = %request.model,
            pose = %options.pose,
            camera_angle = %options.camera_angle,
            has_measurements = options.body_measurements.is_some(),
            "Generating outfit change"
        );

        let parts = self.backend.generate_content(request).await.map_err(|err| {
            error!("Outfit change generation failed: {}", err);
            backend_failure(err)
        })?;

        classify_content_parts(parts)
    }
}

pub fn validate_description(description: &str) -> Result<(), StudioError> {
    if description.trim().is_empty() {
        return Err(StudioError::validation("Please enter an outfit description."));
    }
    Ok(())
}

/// Transport failures pass their text through; an unreadable success body
/// is a generation failure.
fn backend_failure(err: BackendError) -> StudioError {
    match err {
        BackendError::Transport(detail) => StudioError::api(&detail),
        BackendError::Malformed(_) => StudioError::generation(UNREADABLE_RESPONSE_MESSAGE),
    }
}

fn unreadable_image(err: StudioError) -> StudioError {
    warn!("Model returned an unusable image: {}", err);
    StudioError::generation(UNREADABLE_IMAGE_MESSAGE)
}

fn classify_content_parts(parts: Vec<ResponsePart>) -> GenerationResult {
    let image = parts.iter().find_map(|part| match part {
        ResponsePart::InlineImage { data, media_type } if !data.trim().is_empty() => {
            let media_type = media_type
                .as_deref()
                .map(normalize_image_mime)
                .filter(|mime| !mime.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
            is_image_mime(&media_type).then(|| (data.clone(), media_type))
        }
        _ => None,
    });
    if let Some((data, media_type)) = image {
        return ImagePayload::new(data, &media_type).map_err(unreadable_image);
    }

    let text = parts.iter().find_map(|part| match part {
        ResponsePart::Text(text) if !text.is_empty() => Some(text.as_str()),
        _ => None,
    });
    if let Some(text) = text {
        warn!("Model returned text instead of an image");
        return Err(StudioError::refusal(text));
    }

    warn!("Model returned neither an image nor text");
    Err(StudioError::generation(NO_COMPOSITE_IMAGE_MESSAGE))
}
