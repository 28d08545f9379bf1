//! Configuration management
//!
//! Everything is read from the environment (after `.env` is loaded in `main`).
//! The two secrets are required; every other value has a default.

use std::path::PathBuf;
use std::time::Duration;

/// Distance above which a dictionary chunk is not considered relevant.
pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 1.5;

/// Number of nearest chunks fetched per lookup.
pub const DEFAULT_TOP_K: usize = 3;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_DICTIONARY_PATH: &str = "rag/data/elenya_dict.pdf";
pub const DEFAULT_STT_LANGUAGE: &str = "ru";

/// Startup configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TELEGRAM_TOKEN (or BOT_TOKEN) is not set")]
    MissingTelegramToken,

    #[error("OPENAI_API_KEY is not set")]
    MissingOpenAiKey,

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token
    pub telegram_token: String,

    /// OpenAI API key
    pub openai_api_key: String,

    /// OpenAI API base URL (no trailing slash)
    pub openai_base_url: String,

    /// Chat model used for translation and image labels
    pub model: String,

    /// Embedding model used for the dictionary index
    pub embedding_model: String,

    /// HTTP timeout for OpenAI calls
    pub request_timeout: Duration,

    /// Reference dictionary (PDF, markdown or plain text)
    pub dictionary_path: PathBuf,

    /// Strict upper bound on chunk distance
    pub relevance_threshold: f32,

    /// Chunks fetched per lookup
    pub top_k: usize,

    /// Splitter chunk size, in characters
    pub chunk_size: usize,

    /// Splitter overlap, in characters
    pub chunk_overlap: usize,

    /// Language hint passed to the transcription endpoint
    pub stt_language: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_token = non_empty("TELEGRAM_TOKEN")
            .or_else(|| non_empty("BOT_TOKEN"))
            .ok_or(ConfigError::MissingTelegramToken)?;

        let openai_api_key = non_empty("OPENAI_API_KEY").ok_or(ConfigError::MissingOpenAiKey)?;

        let openai_base_url = non_empty("OPENAI_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

        let model = non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let embedding_model =
            non_empty("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        let request_timeout = Duration::from_secs(parse_or("OPENAI_TIMEOUT_SECS", &lookup, 60)?);

        let dictionary_path = non_empty("ELENYA_DICTIONARY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DICTIONARY_PATH));

        let relevance_threshold = parse_or(
            "ELENYA_RELEVANCE_THRESHOLD",
            &lookup,
            DEFAULT_RELEVANCE_THRESHOLD,
        )?;
        let top_k = parse_or("ELENYA_TOP_K", &lookup, DEFAULT_TOP_K)?;
        let chunk_size = parse_or("ELENYA_CHUNK_SIZE", &lookup, DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = parse_or("ELENYA_CHUNK_OVERLAP", &lookup, DEFAULT_CHUNK_OVERLAP)?;

        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(ConfigError::InvalidValue {
                name: "ELENYA_CHUNK_OVERLAP",
                value: format!("{} (chunk size {})", chunk_overlap, chunk_size),
            });
        }

        let stt_language =
            non_empty("ELENYA_STT_LANGUAGE").unwrap_or_else(|| DEFAULT_STT_LANGUAGE.to_string());

        Ok(Self {
            telegram_token,
            openai_api_key,
            openai_base_url,
            model,
            embedding_model,
            request_timeout,
            dictionary_path,
            relevance_threshold,
            top_k,
            chunk_size,
            chunk_overlap,
            stt_language,
        })
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.model, "gpt-4-turbo");
        assert_eq!(config.top_k, 3);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert!((config.relevance_threshold - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.stt_language, "ru");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_bot_token_fallback() {
        let config = Config::from_lookup(lookup_from(&[
            ("BOT_TOKEN", "456:def"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(config.telegram_token, "456:def");
    }

    #[test]
    fn test_missing_telegram_token_fails() {
        let err = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTelegramToken));
    }

    #[test]
    fn test_missing_openai_key_fails() {
        let err = Config::from_lookup(lookup_from(&[("TELEGRAM_TOKEN", "123:abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingOpenAiKey));
    }

    #[test]
    fn test_blank_secret_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_TOKEN", "  "),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingTelegramToken));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("OPENAI_API_KEY", "sk-test"),
            ("ELENYA_RELEVANCE_THRESHOLD", "0.8"),
            ("ELENYA_TOP_K", "5"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
        ]))
        .unwrap();
        assert!((config.relevance_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.openai_base_url, "http://localhost:8080/v1");

        let err = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("OPENAI_API_KEY", "sk-test"),
            ("ELENYA_TOP_K", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "ELENYA_TOP_K", .. }));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let err = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("OPENAI_API_KEY", "sk-test"),
            ("ELENYA_CHUNK_SIZE", "50"),
            ("ELENYA_CHUNK_OVERLAP", "50"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
