//! Display-side processing of a canonical record: Markdown expansion to an
//! allow-listed HTML subset, and highlight span injection.

pub mod annotate;
pub mod sanitize;
pub mod tooltip;

use resumelens_core::{CanonicalRecord, HighlightSkipped};
use tracing::info;

pub use annotate::{Annotated, annotate};
pub use sanitize::{ALLOWED_TAGS, sanitize, sanitize_html};
pub use tooltip::{TooltipPayload, render_tooltip_card};

/// Optimized résumé rendered to sanitized HTML with highlight spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedDocument {
    pub html: String,
    pub skipped: Vec<HighlightSkipped>,
}

/// Render the record's optimized text, annotate its text nodes, then filter
/// the result once more.
///
/// Spans are inserted after Markdown expansion so that no block construct
/// (indented or fenced code in particular) can turn them back into text.
pub fn render_document(record: &CanonicalRecord) -> AnnotatedDocument {
    let rendered = sanitize(&record.optimized_resume);
    let annotated = annotate(&rendered, &record.highlights);
    let html = sanitize_html(&annotated.text);

    info!(
        highlights = record.highlights.len(),
        applied = annotated.applied,
        skipped = annotated.skipped.len(),
        bytes = html.len(),
        "rendered optimized resume"
    );

    AnnotatedDocument {
        html,
        skipped: annotated.skipped,
    }
}

/// Sanitized HTML of the optimized text without highlight spans.
pub fn render_optimized_text(record: &CanonicalRecord) -> String {
    sanitize(&record.optimized_resume)
}

#[cfg(test)]
mod tests {
    use resumelens_core::{HighlightEntry, HighlightKind, JobContext, SectionFeedback};

    use super::*;

    fn record(optimized: &str, highlights: Vec<HighlightEntry>) -> CanonicalRecord {
        CanonicalRecord {
            original_score: 55,
            optimized_score: 82,
            section_feedback: vec![SectionFeedback {
                section: "Experience".into(),
                matches: vec![],
                misses: vec![],
                suggestions: "No specific suggestions provided".into(),
                sources: vec![],
            }],
            missing_skills: vec![],
            career_paths: vec![],
            optimized_resume: optimized.into(),
            highlights,
            original_text: optimized.into(),
            job: JobContext::default(),
            grounding_metadata: None,
        }
    }

    fn led_team() -> HighlightEntry {
        HighlightEntry {
            kind: HighlightKind::Modified,
            content: "led team".into(),
            reason: "Stronger ownership".into(),
            requirement: "Team leadership".into(),
            impact: "Improved hiring potential".into(),
            recommendations: Some("Consider rephrasing for clarity and impact".into()),
        }
    }

    #[test]
    fn span_survives_sanitizer() {
        let rec = record(
            "Managed budgets and successfully led team of 5 engineers.",
            vec![led_team()],
        );
        let doc = render_document(&rec);

        assert!(doc.skipped.is_empty());
        assert!(doc.html.starts_with(
            "<p>Managed budgets and successfully <span class=\"highlight-modified\" data-tooltip=\"{&quot;type&quot;:&quot;Modified&quot;"
        ), "{}", doc.html);
        assert!(doc.html.ends_with("\">led team</span> of 5 engineers.</p>"), "{}", doc.html);
    }

    #[test]
    fn rendered_document_is_stable_under_sanitize() {
        let rec = record(
            "## Experience\n\n* Successfully led team of 5\n* Cut costs by 20%",
            vec![led_team()],
        );
        let doc = render_document(&rec);
        assert!(doc.html.contains("<h2>Experience</h2>"));
        assert!(doc.html.contains("<li>Successfully <span class=\"highlight-modified\""));
        assert_eq!(sanitize(&doc.html), doc.html);
    }

    #[test]
    fn model_markup_is_filtered_not_shown() {
        let rec = record(
            "Skills: <strong>Rust</strong> and <div>Go</div>\n\nBuilt <script>alert(1)</script> tools & R&D",
            vec![],
        );
        let html = render_optimized_text(&rec);
        assert!(html.contains("<strong>Rust</strong>"), "{html}");
        assert!(!html.contains("div"), "{html}");
        assert!(!html.contains("script"), "{html}");
        assert!(!html.contains("alert"), "{html}");
        assert!(!html.contains("&lt;"), "{html}");
        assert!(html.contains("tools &amp; R&amp;D"), "{html}");
    }

    fn assert_annotated(optimized: &str) -> String {
        let doc = render_document(&record(optimized, vec![led_team()]));
        assert!(doc.skipped.is_empty(), "{optimized:?}: {:?}", doc.skipped);
        assert!(!doc.html.contains("&lt;span"), "{}", doc.html);
        assert!(doc.html.contains("\">led team</span>"), "{}", doc.html);
        assert_eq!(sanitize_html(&doc.html), doc.html);
        doc.html
    }

    #[test]
    fn highlight_on_indented_line() {
        let html = assert_annotated("Experience\n\n    led team of 5 engineers");
        assert!(html.starts_with("<p>Experience</p>"), "{html}");
        assert!(html.contains("<p><span class=\"highlight-modified\""), "{html}");
    }

    #[test]
    fn highlight_in_fenced_block() {
        assert_annotated("```\nled team of 5\n```");
    }

    #[test]
    fn highlight_on_heading_line() {
        let html = assert_annotated("## led team lead\n\nDetails");
        assert!(html.starts_with("<h2><span class=\"highlight-modified\""), "{html}");
    }

    #[test]
    fn highlight_at_list_item_start() {
        let html = assert_annotated("* led team of 5\n* Cut costs");
        assert!(html.contains("<li><span class=\"highlight-modified\""), "{html}");
    }

    #[test]
    fn highlight_next_to_inline_markup() {
        let html = assert_annotated("Successfully **led team** of 5");
        assert!(html.contains("<strong><span class=\"highlight-modified\""), "{html}");
    }

    #[test]
    fn unmatched_highlight_reported() {
        let rec = record("Wrote documentation", vec![led_team()]);
        let doc = render_document(&rec);
        assert_eq!(doc.skipped.len(), 1);
        assert_eq!(doc.html, "<p>Wrote documentation</p>");
    }
}
