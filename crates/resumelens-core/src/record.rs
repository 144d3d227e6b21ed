//! Canonical analysis record shared by the normalizer, renderer, and CLI.
//!
//! Every field is always present: the normalizer substitutes defaults for
//! anything the model left out, so consumers never branch on absence.

use serde::{Deserialize, Serialize};

/// The job an analysis was requested for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobContext {
    pub title: String,
    pub level: String,
    pub company: String,
    pub description: String,
}

/// Validated output of one analysis.
///
/// Serialized in camelCase; this JSON shape is the only contract the UI
/// depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// 0..=100.
    pub original_score: u8,
    /// 0..=100.
    pub optimized_score: u8,
    pub section_feedback: Vec<SectionFeedback>,
    pub missing_skills: Vec<MissingSkill>,
    pub career_paths: Vec<CareerPath>,
    /// Markdown source of the optimized résumé.
    pub optimized_resume: String,
    pub highlights: Vec<HighlightEntry>,
    /// Extracted source text the analysis ran on.
    pub original_text: String,
    #[serde(default)]
    pub job: JobContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFeedback {
    pub section: String,
    pub matches: Vec<String>,
    pub misses: Vec<String>,
    /// Newline-joined suggestion text.
    pub suggestions: String,
    pub sources: Vec<String>,
}

/// A skill the résumé lacks for the target job.
///
/// Models return either bare strings or objects; bare strings become an
/// entry with only `skill` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingSkill {
    pub skill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MissingSkill {
    pub fn named(skill: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            category: None,
            priority: None,
            reason: None,
        }
    }

    /// Key used for set semantics: trimmed, case-folded skill name.
    pub fn dedup_key(&self) -> String {
        self.skill.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPath {
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub potential_employers: Vec<String>,
}

/// Classification of a highlighted passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Removed,
    Modified,
    Retained,
}

impl HighlightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Retained => "retained",
        }
    }

    /// Capitalized label shown in tooltips.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Removed => "Removed",
            Self::Modified => "Modified",
            Self::Retained => "Retained",
        }
    }

    /// Map a model-supplied change tag onto a kind.
    ///
    /// Accepts both verb (`remove`, `modify`) and participle forms; anything
    /// unrecognised is treated as retained.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "remove" | "removed" | "delete" | "deleted" => Self::Removed,
            "modify" | "modified" | "change" | "changed" => Self::Modified,
            _ => Self::Retained,
        }
    }
}

/// A literal passage of the optimized text plus the explanation attached to it.
///
/// `content` is fully HTML-escaped; the free-text fields have double quotes
/// escaped so they survive inside attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightEntry {
    #[serde(rename = "type")]
    pub kind: HighlightKind,
    pub content: String,
    pub reason: String,
    pub requirement: String,
    pub impact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

/// Search grounding reported by the generation backend, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub queries: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}
