use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shopbot_index::Embedding;

use crate::config::ChatbotConfig;
use crate::error::UpstreamError;
use crate::llm_client::{check_status, http_client};

/// Maps text into a shared vector space. Corpus entries and queries must go
/// through the same embedder.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `texts`, returning one vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, UpstreamError>;

    fn model_id(&self) -> &str;
}

pub struct OpenAiEmbedder {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(config: &ChatbotConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.api_base.clone(),
            model: config.embedding_model.clone(),
            client: http_client(config.request_timeout)?,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, UpstreamError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let resp = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Http(e.to_string()))?;
        let parsed: EmbeddingResponse = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        order_embeddings(parsed.data, texts.len())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// The API tags each vector with its input position; do not trust array order.
fn order_embeddings(
    data: Vec<EmbeddingData>,
    expected: usize,
) -> Result<Vec<Embedding>, UpstreamError> {
    if data.len() != expected {
        let reason = format!("expected {expected} embeddings, got {}", data.len());
        return Err(UpstreamError::Malformed(reason));
    }
    let mut slots: Vec<Option<Embedding>> = vec![None; expected];
    for EmbeddingData { index, embedding } in data {
        let Some(slot) = slots.get_mut(index) else {
            let reason = format!("embedding index {index} out of range");
            return Err(UpstreamError::Malformed(reason));
        };
        if slot.is_some() {
            let reason = format!("duplicate embedding index {index}");
            return Err(UpstreamError::Malformed(reason));
        }
        *slot = Some(embedding);
    }
    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| UpstreamError::Malformed("missing embedding".into()))
}

/// Deterministic offline embedder: a bag of hashed tokens.
///
/// Texts sharing words land close together, which is enough to exercise
/// retrieval without a network.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub const MODEL_ID: &'static str = "hashing-bow";

    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_one(&self, text: &str) -> Embedding {
        let mut v = vec![0.0; self.dimensions];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut head = [0u8; 8];
            head.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(head) % self.dimensions as u64) as usize;
            v[bucket] += 1.0;
        }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, UpstreamError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.len() >= 2)
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddings_are_reordered_by_index() {
        let data = vec![
            EmbeddingData {
                index: 1,
                embedding: vec![2.0],
            },
            EmbeddingData {
                index: 0,
                embedding: vec![1.0],
            },
        ];
        assert_eq!(
            order_embeddings(data, 2).unwrap(),
            vec![vec![1.0], vec![2.0]]
        );
    }

    #[test]
    fn duplicate_or_missing_indices_are_malformed() {
        let dup = vec![
            EmbeddingData {
                index: 0,
                embedding: vec![1.0],
            },
            EmbeddingData {
                index: 0,
                embedding: vec![1.0],
            },
        ];
        let err = order_embeddings(dup, 2).unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed(_)));
        let err = order_embeddings(Vec::new(), 1).unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed(_)));
    }

    #[test]
    fn hashing_is_stable_and_word_based() {
        let e = HashingEmbedder::default();
        assert_eq!(e.embed_one("Return policy"), e.embed_one("return, POLICY!"));
        assert_eq!(e.embed_one("a").iter().sum::<f32>(), 0.0);
        assert_eq!(e.embed_one("return policy").iter().sum::<f32>(), 2.0);
    }
}
