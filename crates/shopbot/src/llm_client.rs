use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::config::ChatbotConfig;
use crate::error::UpstreamError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<LlmMessage>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
}

/// A hosted chat-completion model.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, UpstreamError>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, UpstreamError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| UpstreamError::Http(e.to_string()))
}

pub(crate) async fn check_status(resp: Response) -> Result<Response, UpstreamError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(UpstreamError::Api { status, body })
}

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: &ChatbotConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.api_base.clone(),
            model: config.chat_model.clone(),
            temperature: config.temperature,
            client: http_client(config.request_timeout)?,
        })
    }
}

#[async_trait]
impl Completer for OpenAiClient {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, UpstreamError> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: &req.messages,
            temperature: self.temperature,
        };
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(req.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::Http(e.to_string()))?;
        let parsed: OpenAiResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(UpstreamError::EmptyResponse)?;
        Ok(LlmResponse { content })
    }
}

/// Replays queued responses and records every request it receives.
#[derive(Default)]
pub struct MockLlm {
    responses: Mutex<VecDeque<Result<String, UpstreamError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failure to be returned by the next unanswered call.
    pub fn push_error(&self, err: UpstreamError) {
        lock(&self.responses).push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl Completer for MockLlm {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, UpstreamError> {
        lock(&self.requests).push(req);
        let next = lock(&self.responses).pop_front();
        let content = next.ok_or(UpstreamError::MockExhausted)??;
        Ok(LlmResponse { content })
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}
