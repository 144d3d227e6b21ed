//! HTTP client for the Gemini `generateContent` endpoint.

use async_trait::async_trait;
use resumelens_ai::{
    GenerateRequest, Generation, GenerationConfig, Generator, SAFETY_CATEGORIES, SAFETY_THRESHOLD,
};
use resumelens_core::{GroundingMetadata, UpstreamFailure, UpstreamKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response blocked: {0}")]
    Blocked(String),
    #[error("no API key configured")]
    MissingApiKey,
    #[error("response contained no text")]
    EmptyResponse,
}

impl From<GeminiError> for UpstreamFailure {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Server { status, body } => UpstreamFailure::classify(Some(status), body),
            GeminiError::Http(e) => {
                UpstreamFailure::classify(e.status().map(|s| s.as_u16()), e.to_string())
            }
            GeminiError::Blocked(reason) => {
                UpstreamFailure::new(UpstreamKind::ContentBlocked, format!("blocked: {reason}"))
            }
            GeminiError::MissingApiKey => {
                UpstreamFailure::new(UpstreamKind::MissingApiKey, "no API key configured")
            }
            other => UpstreamFailure::new(UpstreamKind::Other, other.to_string()),
        }
    }
}

/// Gemini client holding the API key and model name.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_API_BASE.to_string(),
            api_key,
            model,
        }
    }

    /// Point the client at another API base, e.g. a local proxy.
    ///
    /// A trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Send one `generateContent` call.
    pub async fn generate_content(
        &self,
        request: &GenerateRequest,
    ) -> Result<Generation, GeminiError> {
        if self.api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        let url = self.endpoint();
        info!(
            url = %url,
            prompt_chars = request.prompt.chars().count(),
            max_output_tokens = request.config.max_output_tokens,
            "calling gemini"
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let generation = extract_generation(parsed)?;
        info!(chars = generation.text.chars().count(), "gemini response received");
        Ok(generation)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, UpstreamFailure> {
        self.generate_content(request).await.map_err(UpstreamFailure::from)
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    safety_settings: Vec<SafetySetting>,
    generation_config: WireConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl From<GenerationConfig> for WireConfig {
    fn from(c: GenerationConfig) -> Self {
        Self {
            temperature: c.temperature,
            top_p: c.top_p,
            top_k: c.top_k,
            max_output_tokens: c.max_output_tokens,
        }
    }
}

fn request_body(request: &GenerateRequest) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: vec![RequestPart {
                text: &request.prompt,
            }],
        }],
        safety_settings: SAFETY_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: SAFETY_THRESHOLD,
            })
            .collect(),
        generation_config: request.config.into(),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<WireGrounding>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGrounding {
    #[serde(default)]
    web_search_queries: Vec<String>,
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
}

fn extract_generation(response: GenerateContentResponse) -> Result<Generation, GeminiError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GeminiError::Blocked(reason));
    }
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GeminiError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if matches!(reason.as_str(), "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT") => {
                GeminiError::Blocked(reason)
            }
            _ => GeminiError::EmptyResponse,
        });
    }

    let grounding = candidate.grounding_metadata.map(|g| GroundingMetadata {
        queries: g.web_search_queries,
        sources: g
            .grounding_chunks
            .into_iter()
            .filter_map(|c| c.web.and_then(|w| w.uri))
            .collect(),
    });

    Ok(Generation { text, grounding })
}
