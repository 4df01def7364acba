pub mod chatbot;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod harness;
pub mod llm_client;
pub mod logging;
pub mod prompts;
pub mod responder;
pub mod retriever;
pub mod session;

pub use chatbot::Chatbot;
pub use config::ChatbotConfig;
pub use error::{ChatbotError, UpstreamError};
