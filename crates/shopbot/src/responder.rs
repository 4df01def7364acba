use std::time::Duration;

use shopbot_index::ScoredEntry;

use crate::error::ChatbotError;
use crate::llm_client::{Completer, LlmMessage, LlmRequest};
use crate::prompts::{grounding_system_prompt, question_prompt};

pub const FAREWELL: &str = "E-commerce Chatbot: Thank you for visiting. Have a great day!";

const EXIT_COMMANDS: [&str; 2] = ["quit", "bye"];

/// True for `quit` / `bye`, ignoring case and surrounding whitespace.
pub fn is_exit_command(query: &str) -> bool {
    let q = query.trim().to_lowercase();
    EXIT_COMMANDS.contains(&q.as_str())
}

/// Answer `query` from the retrieved context with one model call.
///
/// Exit commands short-circuit to [`FAREWELL`] without calling the model.
/// Model failures are returned unchanged.
pub async fn respond(
    llm: &dyn Completer,
    retrieved: &[ScoredEntry],
    query: &str,
    timeout: Duration,
) -> Result<String, ChatbotError> {
    if is_exit_command(query) {
        return Ok(FAREWELL.to_string());
    }
    let req = LlmRequest {
        messages: vec![
            LlmMessage::system(grounding_system_prompt(retrieved)),
            LlmMessage::user(question_prompt(query)),
        ],
        timeout,
    };
    let resp = llm.complete(req).await.map_err(|e| {
        tracing::warn!(error = %e, "chat completion failed");
        e
    })?;
    Ok(resp.content)
}
