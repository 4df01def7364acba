use std::sync::Arc;
use std::time::Duration;

use shopbot_index::load_prompts;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ChatbotConfig;
use crate::embeddings::{Embedder, OpenAiEmbedder};
use crate::error::ChatbotError;
use crate::llm_client::{Completer, OpenAiClient};
use crate::responder::{is_exit_command, respond, FAREWELL};
use crate::retriever::Retriever;

/// The retrieval-augmented pipeline: corpus index plus chat model.
pub struct Chatbot {
    retriever: Retriever,
    llm: Arc<dyn Completer>,
    request_timeout: Duration,
}

impl Chatbot {
    /// Load the corpus from `config.corpus_path` and index it with the hosted
    /// embedding model.
    pub async fn setup(config: &ChatbotConfig) -> Result<Self, ChatbotError> {
        let embedder = Arc::new(OpenAiEmbedder::new(config)?);
        let llm = Arc::new(OpenAiClient::new(config)?);
        Self::with_clients(config, embedder, llm).await
    }

    /// Like [`Chatbot::setup`] with caller-supplied service clients.
    pub async fn with_clients(
        config: &ChatbotConfig,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn Completer>,
    ) -> Result<Self, ChatbotError> {
        let entries = load_prompts(&config.corpus_path)?;
        let retriever =
            Retriever::build(embedder, entries, config.top_k, config.embed_batch_size).await?;
        Ok(Self {
            retriever,
            llm,
            request_timeout: config.request_timeout,
        })
    }

    /// Answer one query. Exit commands return the farewell without touching
    /// either service.
    pub async fn ask(&self, query: &str) -> Result<String, ChatbotError> {
        if is_exit_command(query) {
            return Ok(FAREWELL.to_string());
        }
        let span = tracing::info_span!("query", trace_id = %Uuid::new_v4());
        async {
            let retrieved = self.retriever.retrieve(query).await?;
            respond(self.llm.as_ref(), &retrieved, query, self.request_timeout).await
        }
        .instrument(span)
        .await
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}
