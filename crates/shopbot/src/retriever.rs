use std::sync::Arc;

use shopbot_index::{IndexError, PromptEntry, ScoredEntry, VectorIndex};

use crate::embeddings::Embedder;
use crate::error::{ChatbotError, UpstreamError};

/// The corpus index together with the embedder that built it.
///
/// Queries are always embedded with the same embedder as the corpus.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    top_k: usize,
}

impl Retriever {
    /// Embed every entry and build the index. Any embedding failure aborts the
    /// build; there is no partial index.
    pub async fn build(
        embedder: Arc<dyn Embedder>,
        entries: Vec<PromptEntry>,
        top_k: usize,
        batch_size: usize,
    ) -> Result<Self, ChatbotError> {
        if entries.is_empty() {
            return Err(IndexError::EmptyCorpus.into());
        }
        let texts: Vec<String> = entries.iter().map(|e| e.text().to_string()).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size.max(1)) {
            let embedded = embedder.embed(batch).await.map_err(|e| {
                tracing::warn!(error = %e, model = embedder.model_id(), "corpus embedding failed");
                e
            })?;
            let (want, got) = (batch.len(), embedded.len());
            if want != got {
                let reason = format!("expected {want} embeddings, got {got}");
                return Err(UpstreamError::Malformed(reason).into());
            }
            vectors.extend(embedded);
        }
        let index = VectorIndex::new(entries, vectors)?;
        tracing::info!(
            entries = index.len(),
            model = embedder.model_id(),
            top_k,
            "retriever ready"
        );
        Ok(Self {
            embedder,
            index,
            top_k,
        })
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredEntry>, ChatbotError> {
        self.retrieve_k(query, self.top_k).await
    }

    pub async fn retrieve_k(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredEntry>, ChatbotError> {
        let texts = [query.to_string()];
        let mut embedded = self.embedder.embed(&texts).await.map_err(|e| {
            tracing::warn!(error = %e, "query embedding failed");
            e
        })?;
        let vector = embedded.pop().ok_or(UpstreamError::EmptyResponse)?;
        let hits = self.index.search(&vector, k)?;
        tracing::debug!(
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved context"
        );
        Ok(hits)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}
