mod common;

use std::collections::HashSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use shopbot::embeddings::HashingEmbedder;
use shopbot::retriever::Retriever;
use shopbot::{ChatbotError, UpstreamError};
use shopbot_index::{parse_prompts, IndexError, PromptEntry};

use common::{CountingEmbedder, FailingEmbedder, RETURN_POLICY, SHIPPING};

fn corpus() -> Vec<PromptEntry> {
    parse_prompts(
        "Our return policy allows 30 days.\n\
         Shipping takes 3-5 business days.\n\
         We accept Visa, Mastercard and PayPal.\n\
         Orders can be tracked from the account page.\n",
    )
}

async fn hashing_retriever(entries: Vec<PromptEntry>, k: usize) -> Retriever {
    let embedder = Arc::new(HashingEmbedder::default());
    Retriever::build(embedder, entries, k, 64).await.unwrap()
}

#[tokio::test]
async fn return_policy_is_top_match() {
    let retriever = hashing_retriever(corpus(), 4).await;
    let hits = retriever.retrieve("What is your return policy?").await.unwrap();
    assert_eq!(hits[0].entry.text(), RETURN_POLICY);
}

#[tokio::test]
async fn shipping_question_finds_shipping_line() {
    let retriever = hashing_retriever(corpus(), 1).await;
    let hits = retriever.retrieve("How long does shipping take?").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.text(), SHIPPING);
}

#[tokio::test]
async fn results_are_bounded_distinct_and_from_corpus() {
    let entries = corpus();
    let retriever = hashing_retriever(entries.clone(), 3).await;
    let queries = [
        "refund",
        "visa card",
        "",
        "completely unrelated words",
        "orders shipping policy",
    ];
    for query in queries {
        let hits = retriever.retrieve(query).await.unwrap();
        assert!(hits.len() <= 3, "query {query:?}");
        let positions: HashSet<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions.len(), hits.len());
        assert!(hits.iter().all(|h| entries.contains(&h.entry)));
    }
}

#[tokio::test]
async fn top_k_larger_than_corpus_returns_everything() {
    let retriever = hashing_retriever(corpus(), 4).await;
    let hits = retriever.retrieve_k("policy", 50).await.unwrap();
    assert_eq!(hits.len(), 4);
}

#[tokio::test]
async fn corpus_is_embedded_in_batches() {
    let embedder = Arc::new(CountingEmbedder::default());
    let retriever = Retriever::build(embedder.clone(), corpus(), 4, 3).await.unwrap();
    assert_eq!(embedder.calls(), 2);
    assert_eq!(embedder.texts(), 4);
    assert_eq!(retriever.index().len(), 4);

    retriever.retrieve("returns").await.unwrap();
    assert_eq!(embedder.calls(), 3);
    assert_eq!(embedder.texts(), 5);
}

#[tokio::test]
async fn empty_corpus_fails_without_embedding() {
    let embedder = Arc::new(CountingEmbedder::default());
    let err = Retriever::build(embedder.clone(), Vec::new(), 4, 10)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ChatbotError::Index(IndexError::EmptyCorpus)));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn embedding_failure_aborts_build() {
    let err = Retriever::build(Arc::new(FailingEmbedder), corpus(), 4, 10)
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err,
        ChatbotError::Upstream(UpstreamError::Api { status: 429, .. })
    ));
}
