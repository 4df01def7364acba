use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ChatbotError;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_CORPUS_PATH: &str = "data/prompts.txt";
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Everything the chatbot needs at startup, resolved once and passed by
/// reference.
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    pub api_key: String,
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub top_k: usize,
    pub corpus_path: PathBuf,
    pub embed_batch_size: usize,
    pub request_timeout: Duration,
}

impl ChatbotConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ChatbotError> {
        match dotenv_status(dotenvy::dotenv()) {
            DotenvStatus::Loaded(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            DotenvStatus::Missing => {}
            DotenvStatus::Invalid(reason) => tracing::warn!(%reason, "ignoring unreadable .env"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatbotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(api_key) = get("OPENAI_API_KEY") else {
            return Err(ChatbotError::Configuration("OpenAI API key is missing.".to_string()));
        };

        let temperature = parse_or(&get, "SHOPBOT_TEMPERATURE", DEFAULT_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ChatbotError::Configuration(
                "SHOPBOT_TEMPERATURE must be between 0.0 and 2.0".to_string(),
            ));
        }
        let top_k = parse_or(&get, "SHOPBOT_TOP_K", DEFAULT_TOP_K)?;
        let embed_batch_size =
            parse_or(&get, "SHOPBOT_EMBED_BATCH_SIZE", DEFAULT_EMBED_BATCH_SIZE)?;
        let timeout_secs = parse_or(
            &get,
            "SHOPBOT_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        let config = Self {
            api_key,
            api_base: get("OPENAI_BASE_URL")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            chat_model: get("SHOPBOT_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
            embedding_model: get("SHOPBOT_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            temperature,
            top_k,
            corpus_path: get("SHOPBOT_CORPUS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_PATH)),
            embed_batch_size,
            request_timeout: Duration::from_secs(timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_corpus_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.corpus_path = path.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Result<Self, ChatbotError> {
        self.top_k = top_k;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ChatbotError> {
        let problem = if self.top_k == 0 {
            "SHOPBOT_TOP_K must be at least 1"
        } else if self.embed_batch_size == 0 {
            "SHOPBOT_EMBED_BATCH_SIZE must be at least 1"
        } else {
            return Ok(());
        };
        Err(ChatbotError::Configuration(problem.to_string()))
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ChatbotError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| invalid_value(key, &raw)),
    }
}

fn invalid_value(key: &str, raw: &str) -> ChatbotError {
    ChatbotError::Configuration(format!("{key} has invalid value {raw:?}"))
}

/// What happened when looking for a `.env` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvStatus {
    Loaded(PathBuf),
    Missing,
    Invalid(String),
}

/// Only a missing file counts as absence; parse and read errors are reported.
pub fn dotenv_status(result: Result<PathBuf, dotenvy::Error>) -> DotenvStatus {
    match result {
        Ok(path) => DotenvStatus::Loaded(path),
        Err(e) if e.not_found() => DotenvStatus::Missing,
        Err(e) => DotenvStatus::Invalid(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn status_of(path: &Path) -> DotenvStatus {
        dotenv_status(dotenvy::from_path(path).map(|()| path.to_path_buf()))
    }

    #[test]
    fn absent_dotenv_is_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(status_of(&dir.path().join(".env")), DotenvStatus::Missing);
    }

    #[test]
    fn malformed_dotenv_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "NOT A VALID LINE\n").unwrap();
        assert!(matches!(status_of(&path), DotenvStatus::Invalid(_)));
    }
}
