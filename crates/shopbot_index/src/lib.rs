pub mod corpus;
pub mod error;
pub mod index;

pub use corpus::{load_prompts, parse_prompts, PromptEntry};
pub use error::IndexError;
pub use index::{Embedding, ScoredEntry, VectorIndex};
