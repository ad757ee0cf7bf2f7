use serde::Serialize;

use crate::studio::payload::ImagePayload;

pub const GENERIC_UNEXPECTED_MESSAGE: &str =
    "An unexpected error occurred while communicating with the API.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or unusable user input; raised before any network call.
    Validation,
    /// Transport or external-service failure.
    Api,
    /// The model answered with text instead of an image.
    Refusal,
    /// The model answered, but with neither an image nor refusal text.
    Generation,
    /// An uploaded file could not be read or encoded.
    Processing,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Api => "api",
            ErrorKind::Refusal => "refusal",
            ErrorKind::Generation => "generation",
            ErrorKind::Processing => "processing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct StudioError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StudioError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Processing, message)
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generation, message)
    }

    /// Wraps an underlying transport/API message. A blank message has no
    /// detail worth surfacing, so the generic text is used instead.
    pub fn api(detail: &str) -> Self {
        let detail = detail.trim();
        if detail.is_empty() {
            return Self::new(ErrorKind::Api, GENERIC_UNEXPECTED_MESSAGE);
        }
        Self::new(ErrorKind::Api, format!("API error: {detail}"))
    }

    pub fn refusal(model_text: &str) -> Self {
        Self::new(
            ErrorKind::Refusal,
            format!(
                "The AI could not create the image and responded: \"{model_text}\". Try again with different images or options."
            ),
        )
    }
}

pub type GenerationResult = Result<ImagePayload, StudioError>;
