use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::studio::backend::{
    BackendError, ContentRequest, GeneratedImage, ImageBackend, ImagesRequest, RequestPart,
    ResponsePart,
};
use crate::utils::http::build_http_client;
use crate::utils::timing::log_llm_timing;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    #[allow(dead_code)]
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct ImagenResponse {
    predictions: Option<Vec<ImagenPrediction>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn redact_api_key(text: &str, key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn summarize_gemini_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let summarized: Vec<Value> = contents
            .iter()
            .map(|content| {
                let role = content
                    .get("role")
                    .and_then(|value| value.as_str())
                    .unwrap_or("user");
                let parts = content
                    .get("parts")
                    .and_then(|value| value.as_array())
                    .map(|parts| summarize_gemini_parts(parts))
                    .unwrap_or_default();
                json!({ "role": role, "parts": parts })
            })
            .collect();
        summary.insert("contents".to_string(), Value::Array(summarized));
    }

    if let Some(instances) = payload.get("instances").and_then(|value| value.as_array()) {
        let prompts: Vec<Value> = instances
            .iter()
            .filter_map(|instance| instance.get("prompt").and_then(|value| value.as_str()))
            .map(|prompt| json!(truncate_for_log(prompt, 200)))
            .collect();
        summary.insert("prompts".to_string(), Value::Array(prompts));
    }

    for key in ["generationConfig", "parameters"] {
        if let Some(config) = payload.get(key) {
            summary.insert(key.to_string(), config.clone());
        }
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut text_preview = None;

    let candidates = response.candidates.as_deref().unwrap_or(&[]);
    for part in candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .filter_map(|content| content.parts.as_ref())
        .flatten()
    {
        match part {
            GeminiPart::Text { text } => {
                text_parts += 1;
                if text_preview.is_none() && !text.trim().is_empty() {
                    text_preview = Some(truncate_for_log(text, 200));
                }
            }
            GeminiPart::InlineData { .. } => image_parts += 1,
            GeminiPart::Other(_) => {}
        }
    }

    json!({
        "candidates": candidates.len(),
        "finishReason": candidates.first().and_then(|candidate| candidate.finish_reason.clone()),
        "blockReason": response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone()),
        "textParts": text_parts,
        "imageParts": image_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn build_predict_payload(request: &ImagesRequest) -> Value {
    json!({
        "instances": [{ "prompt": request.prompt }],
        "parameters": {
            "sampleCount": request.number_of_images,
            "aspectRatio": request.aspect_ratio,
            "outputOptions": { "mimeType": request.output_media_type },
        },
    })
}

fn build_content_payload(request: &ContentRequest) -> Value {
    let parts: Vec<Value> = request
        .parts
        .iter()
        .map(|part| match part {
            RequestPart::InlineImage(image) => json!({
                "inlineData": {
                    "mimeType": image.media_type(),
                    "data": image.data(),
                }
            }),
            RequestPart::Text(text) => json!({ "text": text }),
        })
        .collect();
    let modalities: Vec<&str> = request
        .response_modalities
        .iter()
        .map(|modality| modality.as_str())
        .collect();

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": { "responseModalities": modalities },
    })
}

/// Flattens the first candidate. A prompt blocked before any candidate was
/// produced is reported as text so callers can treat it as a refusal.
fn parts_from_response(response: GeminiResponse) -> Vec<ResponsePart> {
    let block_reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
        .filter(|reason| !reason.trim().is_empty());

    let parts: Vec<ResponsePart> = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| match part {
            GeminiPart::Text { text } => Some(ResponsePart::Text(text)),
            GeminiPart::InlineData { inline_data } => Some(ResponsePart::InlineImage {
                data: inline_data.data,
                media_type: inline_data.mime_type,
            }),
            GeminiPart::Other(_) => None,
        })
        .collect();

    match (parts.is_empty(), block_reason) {
        (true, Some(reason)) => vec![ResponsePart::Text(format!(
            "Request blocked by the model: {reason}"
        ))],
        _ => parts,
    }
}

fn images_from_predictions(response: ImagenResponse) -> Vec<GeneratedImage> {
    response
        .predictions
        .unwrap_or_default()
        .into_iter()
        .filter_map(|prediction| {
            if let Some(reason) = prediction.rai_filtered_reason.as_deref() {
                warn!("Imagen filtered a prediction: {}", reason);
            }
            let data = prediction.bytes_base64_encoded?;
            if data.trim().is_empty() {
                return None;
            }
            Some(GeneratedImage {
                data,
                media_type: prediction.mime_type,
            })
        })
        .collect()
}

/// Generative Language REST client. Built once at startup and handed to
/// the orchestrator.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = build_http_client(Duration::from_secs(config.gemini_timeout_seconds))?;
        Ok(Self {
            http,
            base_url: config.gemini_base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        let model = model.trim().trim_start_matches("models/");
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        payload: &Value,
    ) -> Result<T, BackendError> {
        let url = self.model_url(model, method);

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                target: "llm.gemini",
                model = model,
                method = method,
                payload = %summarize_payload(payload)
            );
        }

        let response = match self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err_text = redact_api_key(&err.to_string(), &self.api_key);
                warn!(
                    "Gemini request failed to send: {} (timeout={}, connect={}, status={:?})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect(),
                    err.status()
                );
                return Err(BackendError::Transport(format!(
                    "Gemini request failed: {err_text}"
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Gemini API error: status={}, body={}", status, body_summary);
            let detail = redact_api_key(&message.unwrap_or(body_summary), &self.api_key);
            return Err(BackendError::Transport(format!(
                "Gemini request failed with status {status}: {detail}"
            )));
        }

        response.json::<T>().await.map_err(|err| {
            let err_text = redact_api_key(&err.to_string(), &self.api_key);
            warn!("Gemini response could not be decoded: {}", err_text);
            BackendError::Malformed(format!("Gemini response could not be decoded: {err_text}"))
        })
    }
}

#[async_trait]
impl ImageBackend for GeminiClient {
    async fn generate_images(
        &self,
        request: ImagesRequest,
    ) -> Result<Vec<GeneratedImage>, BackendError> {
        let payload = build_predict_payload(&request);
        let metadata = json!({ "sampleCount": request.number_of_images });
        log_llm_timing(
            "gemini",
            &request.model,
            "generate_images",
            Some(metadata),
            || async {
                let response: ImagenResponse =
                    self.post_json(&request.model, "predict", &payload).await?;
                let images = images_from_predictions(response);
                debug!(target: "llm.gemini", model = %request.model, images = images.len());
                Ok::<_, BackendError>(images)
            },
        )
        .await
    }

    async fn generate_content(
        &self,
        request: ContentRequest,
    ) -> Result<Vec<ResponsePart>, BackendError> {
        let payload = build_content_payload(&request);
        let metadata = json!({ "parts": request.parts.len() });
        log_llm_timing(
            "gemini",
            &request.model,
            "generate_content",
            Some(metadata),
            || async {
                let response: GeminiResponse = self
                    .post_json(&request.model, "generateContent", &payload)
                    .await?;
                if tracing::enabled!(tracing::Level::DEBUG) {
                    debug!(
                        target: "llm.gemini",
                        model = %request.model,
                        response = %summarize_gemini_response(&response)
                    );
                }
                Ok::<_, BackendError>(parts_from_response(response))
            },
        )
        .await
    }
}
