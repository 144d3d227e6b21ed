//! Model-facing layer: response repair, schema normalization, prompts, the
//! generation seam, and the analysis pipeline that ties them together.

pub mod generate;
pub mod lenient;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod repair;
pub mod resolve;

pub use generate::{
    DEFAULT_MODEL, GenerateRequest, Generation, GenerationConfig, Generator, SAFETY_CATEGORIES,
    SAFETY_THRESHOLD,
};
pub use normalize::{Normalized, normalize};
pub use pipeline::{Analysis, Analyzer, ChatReply, analyze_response};
pub use prompt::{ChatMessage, analysis_prompt, chat_prompt};
pub use repair::parse_response;
