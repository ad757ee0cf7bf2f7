use std::cell::RefCell;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub bind_address: SocketAddr,
    pub gemini_base_url: String,
    pub outfit_image_model: String,
    pub composite_image_model: String,
    pub gemini_timeout_seconds: u64,
    pub max_upload_bytes: usize,
    pub download_prefix: String,
    pub static_dir: Option<PathBuf>,
    /// Problems found while loading, logged once logging is up.
    pub warnings: Vec<String>,
}

struct EnvSource<F> {
    lookup: F,
    warnings: RefCell<Vec<String>>,
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str, default: &str) -> String {
        (self.lookup)(name).unwrap_or_else(|| default.to_string())
    }

    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn invalid(&self, name: &str, value: &str, default: impl std::fmt::Display) {
        self.warnings
            .borrow_mut()
            .push(format!("Invalid {name} value '{value}'; using {default}"));
    }

    fn u64(&self, name: &str, default: u64) -> u64 {
        match (self.lookup)(name) {
            Some(value) => value.trim().parse::<u64>().unwrap_or_else(|_| {
                self.invalid(name, &value, default);
                default
            }),
            None => default,
        }
    }

    fn usize(&self, name: &str, default: usize) -> usize {
        match (self.lookup)(name) {
            Some(value) => value.trim().parse::<usize>().unwrap_or_else(|_| {
                self.invalid(name, &value, default);
                default
            }),
            None => default,
        }
    }
}

fn normalize_base_url(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .with_context(|| format!("GEMINI_BASE_URL is not a valid URL: {value}"))?;
    if parsed.cannot_be_a_base() {
        return Err(anyhow!("GEMINI_BASE_URL must be an absolute http(s) URL: {value}"));
    }
    Ok(trimmed.to_string())
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = EnvSource {
            lookup,
            warnings: RefCell::new(Vec::new()),
        };

        let api_key = source
            .optional("API_KEY")
            .or_else(|| source.optional("GEMINI_API_KEY"))
            .ok_or_else(|| anyhow!("API_KEY environment variable is not set"))?;

        let bind_raw = source.string("BIND_ADDRESS", "127.0.0.1:8080");
        let bind_address = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDRESS is not a valid socket address: {bind_raw}"))?;

        let gemini_base_url = normalize_base_url(&source.string(
            "GEMINI_BASE_URL",
            "https://generativelanguage.googleapis.com/v1beta",
        ))?;

        let mut download_prefix = source.string("DOWNLOAD_PREFIX", "outfit-creation");
        if download_prefix.trim().is_empty() {
            download_prefix = "outfit-creation".to_string();
        }

        let gemini_timeout_seconds = source.u64("GEMINI_TIMEOUT_SECONDS", 120).max(1);
        let max_upload_bytes = source.usize("MAX_UPLOAD_BYTES", 20 * 1024 * 1024);

        Ok(Config {
            api_key,
            log_level: source.string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: PathBuf::from(source.string("LOG_DIR", "logs")),
            bind_address,
            gemini_base_url,
            outfit_image_model: source.string("OUTFIT_IMAGE_MODEL", "imagen-4.0-generate-001"),
            composite_image_model: source.string(
                "COMPOSITE_IMAGE_MODEL",
                "gemini-2.5-flash-image-preview",
            ),
            gemini_timeout_seconds,
            max_upload_bytes,
            download_prefix: download_prefix.trim().to_string(),
            static_dir: source.optional("STATIC_DIR").map(PathBuf::from),
            warnings: source.warnings.into_inner(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("API_KEY"));

        assert!(load(&[("API_KEY", "   ")]).is_err());
    }

    #[test]
    fn falls_back_to_gemini_api_key() {
        let config = load(&[("GEMINI_API_KEY", "secret")]).unwrap();
        assert_eq!(config.api_key, "secret");
    }

    #[test]
    fn defaults_are_applied() {
        let config = load(&[("API_KEY", "secret")]).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.bind_address, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(
            config.gemini_base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.outfit_image_model, "imagen-4.0-generate-001");
        assert_eq!(config.composite_image_model, "gemini-2.5-flash-image-preview");
        assert_eq!(config.download_prefix, "outfit-creation");
        assert_eq!(config.static_dir, None);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn bad_numbers_fall_back_and_bad_addresses_fail() {
        let config = load(&[
            ("API_KEY", "k"),
            ("GEMINI_TIMEOUT_SECONDS", "soon"),
            ("MAX_UPLOAD_BYTES", "lots"),
        ])
        .unwrap();
        assert_eq!(config.gemini_timeout_seconds, 120);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.warnings.len(), 2);
        assert!(config.warnings[0].contains("GEMINI_TIMEOUT_SECONDS"));
        assert!(config.warnings[1].contains("MAX_UPLOAD_BYTES"));

        assert!(load(&[("API_KEY", "k"), ("BIND_ADDRESS", "localhost")]).is_err());
        assert!(load(&[("API_KEY", "k"), ("GEMINI_BASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let config = load(&[
            ("API_KEY", "k"),
            ("GEMINI_BASE_URL", "http://localhost:9000/v1/"),
        ])
        .unwrap();
        assert_eq!(config.gemini_base_url, "http://localhost:9000/v1");
    }
}
