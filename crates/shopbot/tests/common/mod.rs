#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shopbot::embeddings::{Embedder, HashingEmbedder};
use shopbot::llm_client::MockLlm;
use shopbot::{Chatbot, ChatbotConfig, UpstreamError};
use shopbot_index::Embedding;

pub const RETURN_POLICY: &str = "Our return policy allows 30 days.";
pub const SHIPPING: &str = "Shipping takes 3-5 business days.";

pub fn corpus_file(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

pub fn config_with(pairs: &[(&str, &str)]) -> ChatbotConfig {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ChatbotConfig::from_lookup(|key| env.get(key).cloned()).unwrap()
}

pub fn test_config(corpus: &std::path::Path) -> ChatbotConfig {
    config_with(&[("OPENAI_API_KEY", "sk-test")]).with_corpus_path(corpus)
}

/// Hashing embedder that counts how many texts it embedded.
#[derive(Default)]
pub struct CountingEmbedder {
    inner: HashingEmbedder,
    texts: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn texts(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed(texts).await
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Embedding>, UpstreamError> {
        Err(UpstreamError::Api {
            status: 429,
            body: "quota exceeded".to_string(),
        })
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

pub async fn mock_bot(
    lines: &[&str],
    responses: Vec<String>,
) -> (Chatbot, Arc<CountingEmbedder>, Arc<MockLlm>) {
    let file = corpus_file(lines);
    let embedder = Arc::new(CountingEmbedder::default());
    let llm = Arc::new(MockLlm::new(responses));
    let bot = Chatbot::with_clients(&test_config(file.path()), embedder.clone(), llm.clone())
        .await
        .unwrap();
    (bot, embedder, llm)
}
