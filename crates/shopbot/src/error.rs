use std::path::PathBuf;

use shopbot_index::IndexError;
use thiserror::Error;

/// Failures reported by the embedding or chat-completion service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("http error: {0}")]
    Http(String),
    #[error("openai error: {status} {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("empty response")]
    EmptyResponse,
    #[error("mock responses exhausted")]
    MockExhausted,
}

#[derive(Debug, Error)]
pub enum ChatbotError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("terminal i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to load test cases from {}: {reason}", .path.display())]
    TestData { path: PathBuf, reason: String },
}

impl ChatbotError {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatbotError::Configuration(_) => "configuration",
            ChatbotError::Index(IndexError::NotFound(_)) => "not_found",
            ChatbotError::Index(_) => "index",
            ChatbotError::Upstream(_) => "upstream",
            ChatbotError::Io(_) => "io",
            ChatbotError::TestData { .. } => "test_data",
        }
    }
}
