use async_trait::async_trait;

use crate::studio::payload::ImagePayload;

/// Text-only request: one prompt in, N images out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagesRequest {
    pub model: String,
    pub prompt: String,
    pub number_of_images: u32,
    pub output_media_type: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: String,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseModality {
    Image,
    Text,
}

impl ResponseModality {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseModality::Image => "IMAGE",
            ResponseModality::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    InlineImage(ImagePayload),
    Text(String),
}

/// Multi-part request: images and instruction text in a single turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub model: String,
    pub parts: Vec<RequestPart>,
    pub response_modalities: Vec<ResponseModality>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    InlineImage {
        data: String,
        media_type: Option<String>,
    },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The request never completed or the service answered with an error status.
    #[error("{0}")]
    Transport(String),
    /// The service answered successfully but the body could not be read.
    #[error("{0}")]
    Malformed(String),
}

/// The external generative-image capability.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate_images(
        &self,
        request: ImagesRequest,
    ) -> Result<Vec<GeneratedImage>, BackendError>;

    async fn generate_content(
        &self,
        request: ContentRequest,
    ) -> Result<Vec<ResponsePart>, BackendError>;
}
