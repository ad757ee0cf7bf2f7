pub const DEFAULT_IMAGE_MIME: &str = "image/png";

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn normalize_image_mime(mime_type: &str) -> String {
    let lowered = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-png" => "image/png".to_string(),
        _ => lowered,
    }
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .strip_prefix("image/")
        .map(|subtype| !subtype.is_empty() && !subtype.contains(char::is_whitespace))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn sniffs_png_magic_bytes() {
        assert_eq!(detect_mime_type(PNG_HEADER).as_deref(), Some("image/png"));
    }

    #[test]
    fn normalizes_jpg_alias_and_parameters() {
        assert_eq!(normalize_image_mime(" Image/JPG "), "image/jpeg");
        assert_eq!(normalize_image_mime("image/png; charset=binary"), "image/png");
    }

    #[test]
    fn only_image_types_pass() {
        assert!(is_image_mime("image/webp"));
        assert!(!is_image_mime("image/"));
        assert!(!is_image_mime("application/pdf"));
        assert!(!is_image_mime(""));
    }
}
