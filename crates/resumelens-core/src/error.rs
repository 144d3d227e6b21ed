use std::fmt;

use thiserror::Error;

/// Characters of raw model output kept in diagnostic log lines.
const RAW_PREVIEW_CHARS: usize = 200;

/// The model response could not be coerced into an object.
///
/// Terminal for the current request. `raw` is kept for diagnostics and must
/// never be shown to the end user; use [`MalformedResponse::user_message`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed model response: {reason}")]
pub struct MalformedResponse {
    pub reason: String,
    pub raw: String,
}

impl MalformedResponse {
    pub fn new(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        "Failed to parse analysis response"
    }

    /// Leading slice of the raw text, for log lines.
    pub fn raw_preview(&self) -> &str {
        match self.raw.char_indices().nth(RAW_PREVIEW_CHARS) {
            Some((idx, _)) => &self.raw[..idx],
            None => &self.raw,
        }
    }
}

/// Category of a failed generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    RateLimited,
    ServerError,
    ContentBlocked,
    MissingApiKey,
    Other,
}

impl UpstreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::ContentBlocked => "content_blocked",
            Self::MissingApiKey => "missing_api_key",
            Self::Other => "other",
        }
    }
}

/// The external generation call failed.
///
/// `detail` is the underlying error text; end users only see
/// [`UpstreamFailure::user_message`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("generation failed ({}): {detail}", .kind.as_str())]
pub struct UpstreamFailure {
    pub kind: UpstreamKind,
    pub detail: String,
}

impl UpstreamFailure {
    pub fn new(kind: UpstreamKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Classify a failure from an optional HTTP status and the error text.
    ///
    /// Blocking outranks server errors, which outrank rate limiting, so a
    /// 500 whose body mentions a safety block is reported as blocked.
    pub fn classify(status: Option<u16>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let lower = detail.to_lowercase();

        let kind = if lower.contains("blocked") || lower.contains("safety") {
            UpstreamKind::ContentBlocked
        } else if status.is_some_and(|s| s >= 500) || lower.contains("500") {
            UpstreamKind::ServerError
        } else if status == Some(429)
            || lower.contains("429")
            || lower.contains("quota")
            || lower.contains("rate limit")
        {
            UpstreamKind::RateLimited
        } else if lower.contains("api key") || lower.contains("api_key") {
            UpstreamKind::MissingApiKey
        } else {
            UpstreamKind::Other
        };

        Self { kind, detail }
    }

    pub fn user_message(&self) -> &'static str {
        match self.kind {
            UpstreamKind::RateLimited => "API request limit exceeded - please try again later",
            UpstreamKind::ServerError => "Internal server error - please try a smaller document",
            UpstreamKind::ContentBlocked => "Content blocked by safety filters",
            UpstreamKind::MissingApiKey => "Generation service is not configured",
            UpstreamKind::Other => "Analysis failed - please try again",
        }
    }
}

/// A request-terminating failure of the analysis pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Malformed(#[from] MalformedResponse),

    #[error(transparent)]
    Upstream(#[from] UpstreamFailure),
}

impl PipelineError {
    /// Short category text safe to show to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Malformed(e) => e.user_message(),
            Self::Upstream(e) => e.user_message(),
        }
    }
}

/// How a canonical field ended up with a fallback value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackKind {
    /// No lookup path yielded a value.
    Missing,
    /// A value was found but had the wrong shape.
    WrongType,
    /// The value was replaced by another source (e.g. the original text).
    Substituted,
}

/// A canonical field was resolved from defaults rather than source data.
///
/// Non-fatal; recorded alongside the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldResolutionWarning {
    pub field: String,
    pub kind: FallbackKind,
}

impl FieldResolutionWarning {
    pub fn new(field: impl Into<String>, kind: FallbackKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for FieldResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let how = match self.kind {
            FallbackKind::Missing => "missing, default used",
            FallbackKind::WrongType => "wrong type, default used",
            FallbackKind::Substituted => "blank, substituted",
        };
        write!(f, "{}: {how}", self.field)
    }
}

/// Why a highlight entry was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyContent,
    NotFound,
}

/// A highlight entry that produced no span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSkipped {
    pub content: String,
    pub reason: SkipReason,
}

impl fmt::Display for HighlightSkipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            SkipReason::EmptyContent => write!(f, "highlight skipped: empty content"),
            SkipReason::NotFound => write!(f, "highlight skipped: no free match for {:?}", self.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rate_limit() {
        let e = UpstreamFailure::classify(Some(429), "Too Many Requests");
        assert_eq!(e.kind, UpstreamKind::RateLimited);
        assert_eq!(
            e.user_message(),
            "API request limit exceeded - please try again later"
        );
    }

    #[test]
    fn classify_from_message_text() {
        let e = UpstreamFailure::classify(None, "[GoogleGenerativeAI Error]: [500 Internal]");
        assert_eq!(e.kind, UpstreamKind::ServerError);

        let e = UpstreamFailure::classify(None, "Resource has been exhausted (e.g. check quota).");
        assert_eq!(e.kind, UpstreamKind::RateLimited);
    }

    #[test]
    fn classify_blocked_outranks_status() {
        let e = UpstreamFailure::classify(Some(500), "Response was blocked due to SAFETY");
        assert_eq!(e.kind, UpstreamKind::ContentBlocked);
        assert_eq!(e.user_message(), "Content blocked by safety filters");
    }

    #[test]
    fn classify_unknown() {
        let e = UpstreamFailure::classify(Some(404), "model not found");
        assert_eq!(e.kind, UpstreamKind::Other);
    }

    #[test]
    fn malformed_hides_raw_text() {
        let err = PipelineError::from(MalformedResponse::new("expected value", "secret raw"));
        assert_eq!(err.user_message(), "Failed to parse analysis response");
        assert!(!err.user_message().contains("secret"));
    }

    #[test]
    fn raw_preview_truncates_on_char_boundary() {
        let raw = "é".repeat(500);
        let err = MalformedResponse::new("bad", raw);
        assert_eq!(err.raw_preview().chars().count(), 200);
    }

    #[test]
    fn warning_display() {
        let w = FieldResolutionWarning::new("originalScore", FallbackKind::Missing);
        assert_eq!(w.to_string(), "originalScore: missing, default used");
    }
}
