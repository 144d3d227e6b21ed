//! Analysis orchestration: prompt → generate → repair → normalize → render.

use resumelens_core::{
    CanonicalRecord, FieldResolutionWarning, JobContext, MalformedResponse, PipelineError,
    UpstreamFailure,
};
use resumelens_render::{AnnotatedDocument, render_document, sanitize};
use tracing::{info, warn};

use crate::generate::{GenerateRequest, GenerationConfig, Generator};
use crate::normalize::normalize;
use crate::prompt::{ChatMessage, analysis_prompt, chat_prompt};
use crate::repair::parse_response;

/// Result of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub record: CanonicalRecord,
    /// Sanitized, annotated optimized résumé.
    pub document: AnnotatedDocument,
    pub warnings: Vec<FieldResolutionWarning>,
}

/// Reply to a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Markdown as returned by the model.
    pub text: String,
    /// Sanitized HTML rendering of `text`.
    pub html: String,
}

/// Runs analyses and chat turns against a [`Generator`].
pub struct Analyzer<G> {
    generator: G,
}

impl<G: Generator> Analyzer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Analyze `source_text` for `job`.
    ///
    /// Fails only when the generation call fails or its response cannot be
    /// repaired into an object; every other problem degrades the record.
    pub async fn analyze(
        &self,
        job: &JobContext,
        source_text: &str,
    ) -> Result<Analysis, PipelineError> {
        let request = GenerateRequest {
            prompt: analysis_prompt(job, source_text),
            config: GenerationConfig::analysis(),
        };
        info!(
            job_title = %job.title,
            company = %job.company,
            source_chars = source_text.chars().count(),
            "requesting analysis"
        );

        let generation = self.generator.generate(&request).await.inspect_err(|e| {
            warn!(kind = e.kind.as_str(), detail = %e.detail, "analysis generation failed");
        })?;

        let mut analysis = analyze_response(&generation.text, job, source_text)?;
        analysis.record.grounding_metadata = generation.grounding;
        Ok(analysis)
    }

    /// Answer a follow-up question about `record`.
    pub async fn chat(
        &self,
        record: &CanonicalRecord,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<ChatReply, UpstreamFailure> {
        let request = GenerateRequest {
            prompt: chat_prompt(record, history, message),
            config: GenerationConfig::chat(),
        };
        info!(history = history.len(), "requesting chat reply");

        let generation = self.generator.generate(&request).await.inspect_err(|e| {
            warn!(kind = e.kind.as_str(), detail = %e.detail, "chat generation failed");
        })?;

        let html = sanitize(&generation.text);
        Ok(ChatReply {
            text: generation.text,
            html,
        })
    }
}

/// Run repair, normalization, and rendering on raw model text.
pub fn analyze_response(
    raw: &str,
    job: &JobContext,
    source_text: &str,
) -> Result<Analysis, MalformedResponse> {
    let candidate = parse_response(raw)?;
    let normalized = normalize(&candidate, job, source_text);
    let document = render_document(&normalized.record);

    info!(
        original_score = normalized.record.original_score,
        optimized_score = normalized.record.optimized_score,
        sections = normalized.record.section_feedback.len(),
        highlights = normalized.record.highlights.len(),
        warnings = normalized.warnings.len(),
        "analysis complete"
    );

    Ok(Analysis {
        record: normalized.record,
        document,
        warnings: normalized.warnings,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use resumelens_core::{GroundingMetadata, UpstreamKind};

    use super::*;
    use crate::generate::Generation;

    struct FakeGenerator {
        reply: Result<Generation, UpstreamFailure>,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    impl FakeGenerator {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(Generation::text(text)),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16, detail: &str) -> Self {
            Self {
                reply: Err(UpstreamFailure::classify(Some(status), detail)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn generate(&self, request: &GenerateRequest) -> Result<Generation, UpstreamFailure> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    fn job() -> JobContext {
        JobContext {
            title: "Engineering Manager".into(),
            level: "Senior".into(),
            company: "Acme".into(),
            description: "Lead a team of engineers".into(),
        }
    }

    #[test]
    fn labelled_fenced_response_clamps_score() {
        let analysis = analyze_response(
            "JSON: ```{\"scoring\":{\"originalScore\":150}}```",
            &job(),
            "Jane Doe",
        )
        .unwrap();
        assert_eq!(analysis.record.original_score, 100);
        assert_eq!(analysis.record.section_feedback.len(), 1);
        assert_eq!(analysis.record.optimized_resume, "Jane Doe");
    }

    #[test]
    fn highlight_wraps_phrase_in_document() {
        let raw = r#"```json
{
  "optimizedResume": "Managed budgets and successfully led team of 5 engineers.",
  "highlights": [{"type": "modified", "content": "led team", "reason": "Leadership"}]
}
```"#;
        let analysis = analyze_response(raw, &job(), "source").unwrap();
        let html = &analysis.document.html;

        assert!(analysis.document.skipped.is_empty());
        assert!(html.starts_with("<p>Managed budgets and successfully <span class=\"highlight-modified\""));
        assert!(html.ends_with("\">led team</span> of 5 engineers.</p>"));
        assert_eq!(html.matches("<span").count(), 1);
    }

    #[test]
    fn unparseable_response_is_malformed() {
        let err = analyze_response("Sorry, no analysis today.", &job(), "x").unwrap_err();
        assert_eq!(err.raw, "Sorry, no analysis today.");
    }

    #[tokio::test]
    async fn analyze_uses_analysis_config_and_grounding() {
        let mut fake = FakeGenerator::replying(r#"{"originalScore": 42, "optimizedScore": 77}"#);
        if let Ok(generation) = fake.reply.as_mut() {
            generation.grounding = Some(GroundingMetadata {
                queries: vec!["engineering manager skills".into()],
                sources: vec![],
            });
        }
        let analyzer = Analyzer::new(fake);

        let analysis = analyzer.analyze(&job(), "Jane Doe resume").await.unwrap();
        assert_eq!(analysis.record.original_score, 42);
        assert_eq!(analysis.record.optimized_score, 77);
        assert_eq!(analysis.record.job, job());
        assert_eq!(
            analysis.record.grounding_metadata.unwrap().queries,
            vec!["engineering manager skills"]
        );

        let seen = analyzer.generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].config, GenerationConfig::analysis());
        assert!(seen[0].prompt.ends_with("Resume Content:\nJane Doe resume"));
    }

    #[tokio::test]
    async fn analyze_propagates_upstream_failure() {
        let analyzer = Analyzer::new(FakeGenerator::failing(429, "Too Many Requests"));
        let err = analyzer.analyze(&job(), "x").await.unwrap_err();
        match &err {
            PipelineError::Upstream(e) => assert_eq!(e.kind, UpstreamKind::RateLimited),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.user_message(), "API request limit exceeded - please try again later");
    }

    #[tokio::test]
    async fn analyze_propagates_malformed_response() {
        let analyzer = Analyzer::new(FakeGenerator::replying("[]"));
        let err = analyzer.analyze(&job(), "x").await.unwrap_err();
        assert!(matches!(err, PipelineError::Malformed(_)));
        assert_eq!(err.user_message(), "Failed to parse analysis response");
    }

    #[tokio::test]
    async fn chat_renders_reply() {
        let analyzer = Analyzer::new(FakeGenerator::replying("**Start with Kubernetes.**\n\n* Take a course"));
        let record = analyze_response("{}", &job(), "Jane").unwrap().record;

        let reply = analyzer
            .chat(&record, &[ChatMessage::user("Hi")], "Which skill first?")
            .await
            .unwrap();
        assert_eq!(reply.text, "**Start with Kubernetes.**\n\n* Take a course");
        assert!(reply.html.contains("<strong>Start with Kubernetes.</strong>"));
        assert!(reply.html.contains("<li>Take a course</li>"));

        let seen = analyzer.generator.seen.lock().unwrap();
        assert_eq!(seen[0].config, GenerationConfig::chat());
        assert!(seen[0].prompt.contains("user: Hi"));
    }

    #[tokio::test]
    async fn chat_reply_markup_is_filtered() {
        let analyzer = Analyzer::new(FakeGenerator::replying(
            "Focus on <em>Rust</em><script>steal()</script> <div>first</div>",
        ));
        let record = analyze_response("{}", &job(), "Jane").unwrap().record;

        let reply = analyzer.chat(&record, &[], "Where to start?").await.unwrap();
        assert_eq!(reply.html, "<p>Focus on <em>Rust</em> first</p>");
    }
}
