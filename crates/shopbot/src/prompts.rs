use shopbot_index::ScoredEntry;

const GROUNDING_INSTRUCTIONS: &str = "Use the following pieces of context to answer the user's \
question. If you don't know the answer, just say that you don't know, don't try to make up an \
answer.";

/// System prompt carrying the retrieved entries, one per paragraph.
pub fn grounding_system_prompt(retrieved: &[ScoredEntry]) -> String {
    let context = retrieved
        .iter()
        .map(|hit| hit.entry.text())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{GROUNDING_INSTRUCTIONS}\n----------------\n{context}")
}

pub fn question_prompt(query: &str) -> String {
    query.to_string()
}
