//! Schema normalizer: candidate object → canonical record.
//!
//! Never fails. Every field is resolved through [`crate::resolve`]; anything
//! absent or of the wrong shape gets a typed default and a
//! [`FieldResolutionWarning`].

use std::collections::HashSet;

use resumelens_core::escape::{escape_double_quotes, escape_html};
use resumelens_core::{
    CanonicalRecord, CareerPath, FallbackKind, FieldResolutionWarning, HighlightEntry,
    HighlightKind, JobContext, MissingSkill, SectionFeedback, clamp_score,
};
use serde_json::Value;
use tracing::warn;

use crate::resolve::{self, FieldPaths, entry_list, entry_text};

pub const DEFAULT_SECTION_NAME: &str = "General Feedback";
pub const DEFAULT_SUGGESTIONS: &str = "No specific suggestions provided";
pub const DEFAULT_SECTION_SOURCE: &str = "ATS Analysis Standards";
pub const DEFAULT_CAREER_TITLE: &str = "Recommended Career Path";
pub const DEFAULT_REASON: &str = "Improvement suggestion";
pub const DEFAULT_REQUIREMENT: &str = "Job requirement alignment";
pub const DEFAULT_IMPACT: &str = "Improved hiring potential";
pub const DEFAULT_MODIFIED_RECOMMENDATION: &str = "Consider rephrasing for clarity and impact";

const SKILL_NAME_KEYS: &[&str] = &["skill", "name", "area"];

/// A canonical record plus the fallbacks taken while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: CanonicalRecord,
    pub warnings: Vec<FieldResolutionWarning>,
}

/// Build a canonical record from a repaired candidate object.
///
/// `source_text` is the extracted résumé text; it becomes `originalText` and
/// stands in for the optimized résumé when the model returned none.
pub fn normalize(candidate: &Value, job: &JobContext, source_text: &str) -> Normalized {
    let mut warnings = Warnings::default();

    let original_score = score(candidate, &resolve::ORIGINAL_SCORE, &mut warnings);
    let optimized_score = score(candidate, &resolve::OPTIMIZED_SCORE, &mut warnings);
    let section_feedback = section_feedback(candidate, &mut warnings);
    let missing_skills = missing_skills(candidate, &mut warnings);
    let career_paths = list(candidate, &resolve::CAREER_PATHS, &mut warnings)
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            career_path(entry, &entry_at(&resolve::CAREER_PATHS, idx), &mut warnings)
        })
        .collect();

    let optimized_resume = match resolve::OPTIMIZED_RESUME.text(candidate) {
        Ok(text) => text,
        Err(_) => {
            warnings.push(resolve::OPTIMIZED_RESUME.field, FallbackKind::Substituted);
            source_text.to_string()
        }
    };

    let highlights = list(candidate, &resolve::HIGHLIGHTS, &mut warnings)
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            highlight(entry, &entry_at(&resolve::HIGHLIGHTS, idx), &mut warnings)
        })
        .collect();

    Normalized {
        record: CanonicalRecord {
            original_score,
            optimized_score,
            section_feedback,
            missing_skills,
            career_paths,
            optimized_resume,
            highlights,
            original_text: source_text.to_string(),
            job: job.clone(),
            grounding_metadata: None,
        },
        warnings: warnings.0,
    }
}

#[derive(Default)]
struct Warnings(Vec<FieldResolutionWarning>);

impl Warnings {
    fn push(&mut self, field: &str, kind: FallbackKind) {
        let warning = FieldResolutionWarning::new(field, kind);
        warn!(field, "{warning}");
        self.0.push(warning);
    }

    /// `value`, or `default()` with a warning for the entry field `at.key`.
    fn or_default<T>(
        &mut self,
        value: Option<T>,
        at: &str,
        key: &str,
        default: impl FnOnce() -> T,
    ) -> T {
        value.unwrap_or_else(|| {
            self.push(&format!("{at}.{key}"), FallbackKind::Missing);
            default()
        })
    }
}

/// Path-like name of one list entry, e.g. `highlights[2]`.
fn entry_at(paths: &FieldPaths, idx: usize) -> String {
    format!("{}[{idx}]", paths.field)
}

fn score(candidate: &Value, paths: &FieldPaths, warnings: &mut Warnings) -> u8 {
    match paths.number(candidate) {
        Ok(raw) => clamp_score(raw),
        Err(kind) => {
            warnings.push(paths.field, kind);
            0
        }
    }
}

fn list<'a>(candidate: &'a Value, paths: &FieldPaths, warnings: &mut Warnings) -> &'a [Value] {
    match paths.array(candidate) {
        Ok(items) => items,
        Err(kind) => {
            warnings.push(paths.field, kind);
            &[]
        }
    }
}

/// Optional secondary list; absence is not worth a warning.
fn extra_list<'a>(candidate: &'a Value, paths: &FieldPaths) -> &'a [Value] {
    paths.array(candidate).unwrap_or(&[])
}

/// Scalars or arrays of scalars, joined with newlines.
fn joined_text(entry: &Value, keys: &[&str]) -> Option<String> {
    entry_list(entry, keys)
        .map(|items| items.join("\n"))
        .filter(|s| !s.is_empty())
}

// ── Section feedback ────────────────────────────────────────────────────────

fn section_feedback(candidate: &Value, warnings: &mut Warnings) -> Vec<SectionFeedback> {
    let nested = list(candidate, &resolve::SECTION_FEEDBACK, warnings);
    let flat = extra_list(candidate, &resolve::FLAT_ANALYSIS);

    let mut sections = Vec::new();
    let sources = [
        (&resolve::SECTION_FEEDBACK, nested),
        (&resolve::FLAT_ANALYSIS, flat),
    ];
    for (paths, entries) in sources {
        for (idx, entry) in entries.iter().enumerate() {
            sections.extend(section_entry(entry, &entry_at(paths, idx), warnings));
        }
    }

    if sections.is_empty() {
        warnings.push(resolve::SECTION_FEEDBACK.field, FallbackKind::Substituted);
        sections.push(diagnostic_section());
    }
    sections
}

/// Empty match and miss lists are valid feedback and default silently.
fn section_entry(entry: &Value, at: &str, warnings: &mut Warnings) -> Option<SectionFeedback> {
    if !entry.is_object() {
        return None;
    }
    Some(SectionFeedback {
        section: warnings.or_default(entry_text(entry, resolve::SECTION_NAME), at, "section", || {
            DEFAULT_SECTION_NAME.to_string()
        }),
        matches: entry_list(entry, resolve::SECTION_MATCHES).unwrap_or_default(),
        misses: entry_list(entry, resolve::SECTION_MISSES).unwrap_or_default(),
        suggestions: warnings.or_default(
            joined_text(entry, resolve::SECTION_SUGGESTIONS),
            at,
            "suggestions",
            || DEFAULT_SUGGESTIONS.to_string(),
        ),
        sources: warnings.or_default(
            entry_list(entry, resolve::SECTION_SOURCES).filter(|s| !s.is_empty()),
            at,
            "sources",
            || vec![DEFAULT_SECTION_SOURCE.to_string()],
        ),
    })
}

/// Stand-in entry when the model returned no usable section feedback.
pub fn diagnostic_section() -> SectionFeedback {
    SectionFeedback {
        section: "System Generated Feedback".into(),
        matches: vec!["Basic resume structure detected".into()],
        misses: vec!["Detailed analysis unavailable".into()],
        suggestions: "The analysis system encountered limitations processing this resume. \
                      Please verify:\n1. Resume text is selectable\n2. Proper section headers\n\
                      3. Relevant content"
            .into(),
        sources: vec!["Analysis System".into()],
    }
}

// ── Missing skills ──────────────────────────────────────────────────────────

/// Merge both skill sources, de-duplicated on the folded skill name. The
/// first occurrence wins.
fn missing_skills(candidate: &Value, warnings: &mut Warnings) -> Vec<MissingSkill> {
    let primary = list(candidate, &resolve::MISSING_SKILLS, warnings);
    let secondary = extra_list(candidate, &resolve::IMPROVEMENT_AREAS);

    let mut seen = HashSet::new();
    primary
        .iter()
        .chain(secondary)
        .filter_map(missing_skill)
        .filter(|skill| seen.insert(skill.dedup_key()))
        .collect()
}

fn missing_skill(entry: &Value) -> Option<MissingSkill> {
    let skill = match entry {
        Value::Object(_) => MissingSkill {
            skill: entry_text(entry, SKILL_NAME_KEYS)?,
            category: entry_text(entry, &["category"]),
            priority: entry_text(entry, &["priority"]),
            reason: entry_text(entry, &["reason", "description"]),
        },
        other => MissingSkill::named(resolve::scalar_text(other)?.trim()),
    };
    (!skill.skill.is_empty()).then_some(skill)
}

// ── Career paths ────────────────────────────────────────────────────────────

fn career_path(entry: &Value, at: &str, warnings: &mut Warnings) -> Option<CareerPath> {
    if !entry.is_object() {
        return None;
    }
    Some(CareerPath {
        title: warnings.or_default(entry_text(entry, resolve::CAREER_TITLE), at, "title", || {
            DEFAULT_CAREER_TITLE.to_string()
        }),
        description: entry_text(entry, resolve::CAREER_DESCRIPTION).unwrap_or_default(),
        required_skills: entry_list(entry, resolve::CAREER_SKILLS).unwrap_or_default(),
        potential_employers: entry_list(entry, resolve::CAREER_EMPLOYERS).unwrap_or_default(),
    })
}

// ── Highlights ──────────────────────────────────────────────────────────────

fn highlight(entry: &Value, at: &str, warnings: &mut Warnings) -> Option<HighlightEntry> {
    if !entry.is_object() {
        return None;
    }
    let kind = entry_text(entry, resolve::HIGHLIGHT_KIND).map(|tag| HighlightKind::from_tag(&tag));
    let kind = warnings.or_default(kind, at, "type", || HighlightKind::Retained);
    let content = warnings.or_default(
        entry_text(entry, resolve::HIGHLIGHT_CONTENT),
        at,
        "content",
        String::new,
    );

    let mut free_text = |keys: &[&str], key: &str, default: &str| {
        let text = warnings.or_default(entry_text(entry, keys), at, key, || default.to_string());
        escape_double_quotes(&text)
    };
    let reason = free_text(resolve::HIGHLIGHT_REASON, "reason", DEFAULT_REASON);
    let requirement = free_text(resolve::HIGHLIGHT_REQUIREMENT, "requirement", DEFAULT_REQUIREMENT);
    let impact = free_text(resolve::HIGHLIGHT_IMPACT, "impact", DEFAULT_IMPACT);

    let recommendations = match joined_text(entry, resolve::HIGHLIGHT_RECOMMENDATIONS) {
        Some(text) => Some(text),
        None if kind == HighlightKind::Modified => Some(warnings.or_default(
            None,
            at,
            "recommendations",
            || DEFAULT_MODIFIED_RECOMMENDATION.to_string(),
        )),
        None => None,
    }
    .map(|s| escape_double_quotes(&s));

    Some(HighlightEntry {
        kind,
        content: escape_html(&content),
        reason,
        requirement,
        impact,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn job() -> JobContext {
        JobContext {
            title: "Backend Engineer".into(),
            level: "Senior".into(),
            company: "Acme".into(),
            description: "Rust, Kubernetes".into(),
        }
    }

    fn run(candidate: Value) -> Normalized {
        normalize(&candidate, &job(), "Jane Doe\nEngineer")
    }

    #[test]
    fn clamps_nested_score() {
        let out = run(json!({"scoring": {"originalScore": 150, "optimizedScore": -30}}));
        assert_eq!(out.record.original_score, 100);
        assert_eq!(out.record.optimized_score, 0);
    }

    #[test]
    fn score_from_string_and_flat_path() {
        let out = run(json!({"originalScore": "57", "optimizedScore": 72.6}));
        assert_eq!(out.record.original_score, 57);
        assert_eq!(out.record.optimized_score, 73);
    }

    #[test]
    fn null_score_falls_through() {
        let out = run(json!({"scoring": {"originalScore": null}, "originalScore": 61}));
        assert_eq!(out.record.original_score, 61);
    }

    #[test]
    fn empty_object_yields_complete_record() {
        let out = run(json!({}));
        let rec = &out.record;

        assert_eq!(rec.original_score, 0);
        assert_eq!(rec.optimized_score, 0);
        assert_eq!(rec.section_feedback, vec![diagnostic_section()]);
        assert!(rec.missing_skills.is_empty());
        assert!(rec.career_paths.is_empty());
        assert_eq!(rec.optimized_resume, "Jane Doe\nEngineer");
        assert_eq!(rec.original_text, "Jane Doe\nEngineer");
        assert_eq!(rec.job, job());

        let json = serde_json::to_value(rec).unwrap();
        for key in [
            "originalScore",
            "optimizedScore",
            "sectionFeedback",
            "missingSkills",
            "careerPaths",
            "optimizedResume",
            "highlights",
            "originalText",
        ] {
            assert!(json.get(key).is_some_and(|v| !v.is_null()), "{key} absent");
        }

        assert!(out.warnings.contains(&FieldResolutionWarning::new(
            "optimizedResume",
            FallbackKind::Substituted
        )));
        assert!(out.warnings.contains(&FieldResolutionWarning::new(
            "originalScore",
            FallbackKind::Missing
        )));
    }

    #[test]
    fn exactly_one_diagnostic_section() {
        let out = run(json!({"sectionFeedback": [], "analysis": "none", "sections": [1, 2]}));
        assert_eq!(out.record.section_feedback.len(), 1);
        assert_eq!(out.record.section_feedback[0].section, "System Generated Feedback");
    }

    #[test]
    fn nested_then_flat_sections_concatenated() {
        let out = run(json!({
            "sectionBySectionAnalysis": [{"section": "Skills", "strongPoints": ["Rust"]}],
            "analysis": [{"name": "Experience", "weakPoints": "No metrics"}]
        }));
        let sections = &out.record.section_feedback;
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section, "Skills");
        assert_eq!(sections[0].matches, vec!["Rust"]);
        assert_eq!(sections[1].section, "Experience");
        assert_eq!(sections[1].misses, vec!["No metrics"]);
    }

    #[test]
    fn section_defaults_and_joined_suggestions() {
        let out = run(json!({"sectionFeedback": [
            {},
            {"section": "Summary", "suggestions": ["Add metrics", "Use action verbs"], "sources": ["STAR method"]}
        ]}));
        let s = &out.record.section_feedback;
        assert_eq!(s[0].section, DEFAULT_SECTION_NAME);
        assert!(s[0].matches.is_empty());
        assert_eq!(s[0].suggestions, DEFAULT_SUGGESTIONS);
        assert_eq!(s[0].sources, vec![DEFAULT_SECTION_SOURCE]);
        assert_eq!(s[1].suggestions, "Add metrics\nUse action verbs");
        assert_eq!(s[1].sources, vec!["STAR method"]);
    }

    #[test]
    fn entry_defaults_are_reported_with_entry_path() {
        let out = run(json!({
            "sectionFeedback": [{"section": "Skills", "suggestions": "Add Rust", "sources": ["ATS"]}, {}],
            "analysis": [{"name": "Summary"}],
            "careerPaths": [{"description": "Infra"}],
            "highlights": [{"type": "modified", "content": "led team", "reason": "Ownership"}]
        }));
        let fields: Vec<&str> = out.warnings.iter().map(|w| w.field.as_str()).collect();

        for field in [
            "sectionFeedback[1].section",
            "sectionFeedback[1].suggestions",
            "sectionFeedback[1].sources",
            "analysis[0].suggestions",
            "careerPaths[0].title",
            "highlights[0].requirement",
            "highlights[0].impact",
            "highlights[0].recommendations",
        ] {
            assert!(fields.contains(&field), "{field} not reported in {fields:?}");
        }
        assert!(!fields.iter().any(|f| f.starts_with("sectionFeedback[0]")));
        assert!(!fields.contains(&"highlights[0].reason"));
        assert!(!fields.contains(&"analysis[0].section"));
        assert!(out.warnings.iter().all(|w| !w.field.contains('[') || w.kind == FallbackKind::Missing));
    }

    #[test]
    fn missing_skills_merged_and_deduplicated() {
        let out = run(json!({
            "skillsGapAnalysis": {"missingSkills": [
                {"skill": "Kubernetes", "category": "Technical", "priority": "High", "reason": "Listed twice"},
                "Terraform"
            ]},
            "improvementAreas": ["kubernetes ", "Public speaking"]
        }));
        let skills: Vec<&str> = out.record.missing_skills.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(skills, vec!["Kubernetes", "Terraform", "Public speaking"]);
        assert_eq!(out.record.missing_skills[0].priority.as_deref(), Some("High"));
    }

    #[test]
    fn missing_skills_alternate_path() {
        let out = run(json!({"skillGaps": ["Go", "go", ""]}));
        assert_eq!(out.record.missing_skills, vec![MissingSkill::named("Go")]);
    }

    #[test]
    fn career_paths_with_alternate_keys() {
        let out = run(json!({"careerOptions": [
            {"skills": ["Rust"], "companies": ["Acme"]},
            {"title": "Platform Engineer", "description": "Infra focus"}
        ]}));
        let paths = &out.record.career_paths;
        assert_eq!(paths[0].title, DEFAULT_CAREER_TITLE);
        assert_eq!(paths[0].description, "");
        assert_eq!(paths[0].required_skills, vec!["Rust"]);
        assert_eq!(paths[0].potential_employers, vec!["Acme"]);
        assert_eq!(paths[1].title, "Platform Engineer");
    }

    #[test]
    fn optimized_resume_alternate_source() {
        let out = run(json!({"optimizedResume": " ", "optimizedContent": {"optimizedResume": "## Jane"}}));
        assert_eq!(out.record.optimized_resume, "## Jane");
    }

    #[test]
    fn highlight_escaping_and_defaults() {
        let out = run(json!({"optimizedContent": {"highlights": [
            {"changeType": "modify", "content": "R&D <lead> \"ops\"", "reason": "Say \"led\""},
            {"type": "removed", "content": "Hobbies", "suggestions": ["Drop it", "Use space"]},
            {"type": "retained", "content": "Rust"}
        ]}}));
        let h = &out.record.highlights;

        assert_eq!(h[0].kind, HighlightKind::Modified);
        assert_eq!(h[0].content, "R&amp;D &lt;lead&gt; &quot;ops&quot;");
        assert_eq!(h[0].reason, "Say &quot;led&quot;");
        assert_eq!(h[0].requirement, DEFAULT_REQUIREMENT);
        assert_eq!(h[0].impact, DEFAULT_IMPACT);
        assert_eq!(h[0].recommendations.as_deref(), Some(DEFAULT_MODIFIED_RECOMMENDATION));

        assert_eq!(h[1].kind, HighlightKind::Removed);
        assert_eq!(h[1].reason, DEFAULT_REASON);
        assert_eq!(h[1].recommendations.as_deref(), Some("Drop it\nUse space"));

        assert_eq!(h[2].kind, HighlightKind::Retained);
        assert!(h[2].recommendations.is_none());
    }

    #[test]
    fn highlight_alternate_keys() {
        let out = run(json!({"highlights": [
            {"type": "modified", "content": "x", "relatedRequirement": "Leadership", "expectedImpact": "Keyword hit"}
        ]}));
        assert_eq!(out.record.highlights[0].requirement, "Leadership");
        assert_eq!(out.record.highlights[0].impact, "Keyword hit");
    }

    #[test]
    fn wrong_shapes_default_without_panicking() {
        let out = run(json!({
            "scoring": "high",
            "sectionFeedback": {"section": "Skills"},
            "missingSkills": 42,
            "careerPaths": [null, "Engineer"],
            "optimizedResume": ["not", "text"],
            "highlights": "none"
        }));
        assert_eq!(out.record.original_score, 0);
        assert_eq!(out.record.section_feedback.len(), 1);
        assert!(out.record.missing_skills.is_empty());
        assert!(out.record.career_paths.is_empty());
        assert_eq!(out.record.optimized_resume, "Jane Doe\nEngineer");
        assert!(out.record.highlights.is_empty());
        assert!(out.warnings.contains(&FieldResolutionWarning::new(
            "missingSkills",
            FallbackKind::WrongType
        )));
    }
}
