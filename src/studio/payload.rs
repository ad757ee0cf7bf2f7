use base64::alphabet;
use base64::engine::general_purpose::{self, GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::llm::media::{detect_mime_type, is_image_mime, normalize_image_mime};
use crate::studio::error::StudioError;

static DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:([^;,]+);base64,(.+)$").expect("data URI pattern is valid")
});

/// Accepts padded or unpadded input from either side of the wire.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Base64 image bytes plus the declared image media type.
///
/// Fields are private so every payload in circulation went through
/// validation: non-empty data that decodes and an `image/*` media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePayload {
    data: String,
    media_type: String,
}

impl ImagePayload {
    pub fn new(data: impl Into<String>, media_type: &str) -> Result<Self, StudioError> {
        let data = data.into();
        if data.trim().is_empty() {
            return Err(StudioError::validation("Image data is empty."));
        }
        if let Err(err) = LENIENT.decode(data.as_bytes()) {
            return Err(StudioError::validation(format!(
                "Image data is not valid base64: {err}"
            )));
        }
        let media_type = normalize_image_mime(media_type);
        if !is_image_mime(&media_type) {
            return Err(StudioError::validation(format!(
                "Unsupported image type '{media_type}'."
            )));
        }
        Ok(Self { data, media_type })
    }

    /// Encodes a raw upload. The declared type wins when it names an image;
    /// otherwise the type is sniffed from the bytes.
    pub fn from_upload(bytes: &[u8], declared_type: Option<&str>) -> Result<Self, StudioError> {
        if bytes.is_empty() {
            return Err(StudioError::processing("The uploaded file is empty."));
        }

        let declared = declared_type
            .map(normalize_image_mime)
            .filter(|mime| is_image_mime(mime));
        let media_type = match declared {
            Some(mime) => mime,
            None => detect_mime_type(bytes)
                .map(|mime| normalize_image_mime(&mime))
                .filter(|mime| is_image_mime(mime))
                .ok_or_else(|| {
                    StudioError::processing("The uploaded file is not a recognized image.")
                })?,
        };

        Self::new(general_purpose::STANDARD.encode(bytes), &media_type)
    }

    /// Parses a `data:<type>;base64,<data>` URI as produced by a browser
    /// file reader.
    pub fn from_data_uri(uri: &str) -> Result<Self, StudioError> {
        let captures = DATA_URI
            .captures(uri.trim())
            .ok_or_else(|| StudioError::processing("The image is not a base64 data URI."))?;
        Self::new(&captures[2], &captures[1]).map_err(|err| StudioError::processing(err.message))
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn decode(&self) -> Result<Vec<u8>, StudioError> {
        LENIENT
            .decode(self.data.as_bytes())
            .map_err(|err| {
                StudioError::processing(format!("Image data is not valid base64: {err}"))
            })
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::error::ErrorKind;

    const PNG_BYTES: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
        b'R', 0x00, 0xFF, 0x10,
    ];

    #[test]
    fn upload_then_decode_reproduces_original_bytes() {
        let payload = ImagePayload::from_upload(PNG_BYTES, Some("image/png")).unwrap();
        assert_eq!(payload.media_type(), "image/png");
        assert_eq!(payload.decode().unwrap(), PNG_BYTES);
    }

    #[test]
    fn upload_without_declared_type_is_sniffed() {
        let payload =
            ImagePayload::from_upload(PNG_BYTES, Some("application/octet-stream")).unwrap();
        assert_eq!(payload.media_type(), "image/png");

        let payload = ImagePayload::from_upload(PNG_BYTES, None).unwrap();
        assert_eq!(payload.media_type(), "image/png");
    }

    #[test]
    fn upload_of_non_image_is_a_processing_error() {
        let err = ImagePayload::from_upload(b"just some text", Some("text/plain")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Processing);

        let err = ImagePayload::from_upload(&[], Some("image/png")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Processing);
    }

    #[test]
    fn rejects_empty_data_and_non_image_types() {
        assert_eq!(
            ImagePayload::new("", "image/png").unwrap_err().kind,
            ErrorKind::Validation
        );
        assert_eq!(
            ImagePayload::new("QUJD", "text/plain").unwrap_err().kind,
            ErrorKind::Validation
        );
    }

    #[test]
    fn data_must_decode() {
        let err = ImagePayload::new("!!! not base64 !!!", "image/png").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let payload = ImagePayload::new("ABC123", "image/jpeg").unwrap();
        assert_eq!(payload.decode().unwrap().len(), 4);
        assert_eq!(ImagePayload::new("QUJD", "image/png").unwrap().decode().unwrap(), b"ABC");
    }

    #[test]
    fn data_uri_round_trips_fields() {
        let payload = ImagePayload::new("QUJD", "image/jpeg").unwrap();
        assert_eq!(payload.to_data_uri(), "data:image/jpeg;base64,QUJD");

        let parsed = ImagePayload::from_data_uri(&payload.to_data_uri()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn malformed_data_uri_is_rejected() {
        let err = ImagePayload::from_data_uri("data:image/png,ABC").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Processing);

        let err = ImagePayload::from_data_uri("data:text/plain;base64,QUJD").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Processing);

        let err = ImagePayload::from_data_uri("data:image/png;base64,!!not base64!!").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Processing);
    }
}
