//! Generation seam: the only asynchronous boundary of the pipeline.

use async_trait::async_trait;
use resumelens_core::{GroundingMetadata, UpstreamFailure};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";

/// Harm categories sent with every request, all at `BLOCK_ONLY_HIGH`.
pub const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub const SAFETY_THRESHOLD: &str = "BLOCK_ONLY_HIGH";

/// Sampling parameters for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Structured résumé analysis.
    pub fn analysis() -> Self {
        Self {
            temperature: 0.45,
            top_p: 0.84,
            top_k: 72,
            max_output_tokens: 12_000,
        }
    }

    /// Follow-up chat turns.
    pub fn chat() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 8_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub config: GenerationConfig,
}

/// Text returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub grounding: Option<GroundingMetadata>,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            grounding: None,
        }
    }
}

/// A text generation backend.
///
/// Implementations classify their own failures with
/// [`UpstreamFailure::classify`]; the pipeline never retries.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, UpstreamFailure>;
}

#[async_trait]
impl<G: Generator + ?Sized> Generator for std::sync::Arc<G> {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, UpstreamFailure> {
        (**self).generate(request).await
    }
}
