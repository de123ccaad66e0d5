//! Grounded answer generation with citation handling

pub mod answerer;
pub mod citation;
pub mod prompt;

pub use answerer::{Answerer, ERROR_ANSWER_PREFIX, IDK_ANSWER, REFUSAL_ANSWER};
pub use citation::parse_citations;
pub use prompt::{build_context, build_user_prompt, STRICT_SYSTEM_PROMPT, SYSTEM_PROMPT};
