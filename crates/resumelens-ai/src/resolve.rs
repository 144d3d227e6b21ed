//! Resolution table for drifting response schemas.
//!
//! Each canonical field has an ordered list of dotted lookup paths. The first
//! path that yields a defined, correctly shaped value wins. `null` counts as
//! undefined.

use resumelens_core::FallbackKind;
use resumelens_core::score::parse_score_text;
use serde_json::Value;

/// A canonical field and the paths it may be found under, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct FieldPaths {
    pub field: &'static str,
    pub paths: &'static [&'static str],
}

// ── Record fields ───────────────────────────────────────────────────────────

pub const ORIGINAL_SCORE: FieldPaths = FieldPaths {
    field: "originalScore",
    paths: &["scoring.originalScore", "originalScore"],
};

pub const OPTIMIZED_SCORE: FieldPaths = FieldPaths {
    field: "optimizedScore",
    paths: &["scoring.optimizedScore", "optimizedScore"],
};

/// Nested section feedback shapes.
pub const SECTION_FEEDBACK: FieldPaths = FieldPaths {
    field: "sectionFeedback",
    paths: &["sectionFeedback", "sectionBySectionAnalysis", "sections"],
};

/// Flat section list, concatenated after [`SECTION_FEEDBACK`].
pub const FLAT_ANALYSIS: FieldPaths = FieldPaths {
    field: "analysis",
    paths: &["analysis"],
};

pub const MISSING_SKILLS: FieldPaths = FieldPaths {
    field: "missingSkills",
    paths: &[
        "skillsGapAnalysis.missingSkills",
        "skillsGapAnalysis",
        "missingSkills",
        "skillGaps",
    ],
};

/// Secondary source merged into the missing-skill set.
pub const IMPROVEMENT_AREAS: FieldPaths = FieldPaths {
    field: "improvementAreas",
    paths: &["improvementAreas"],
};

pub const CAREER_PATHS: FieldPaths = FieldPaths {
    field: "careerPaths",
    paths: &["careerPaths", "careerOptions"],
};

pub const OPTIMIZED_RESUME: FieldPaths = FieldPaths {
    field: "optimizedResume",
    paths: &[
        "optimizedResume",
        "optimizedContent.optimizedResume",
        "enhancedResume",
        "improvedContent",
    ],
};

pub const HIGHLIGHTS: FieldPaths = FieldPaths {
    field: "highlights",
    paths: &["highlights", "optimizedContent.highlights"],
};

// ── Entry keys ──────────────────────────────────────────────────────────────

pub const SECTION_NAME: &[&str] = &["section", "name", "title"];
pub const SECTION_MATCHES: &[&str] = &["matches", "strongPoints", "strengths"];
pub const SECTION_MISSES: &[&str] = &["misses", "weakPoints", "weaknesses"];
pub const SECTION_SUGGESTIONS: &[&str] = &["suggestions", "suggestion", "recommendations"];
pub const SECTION_SOURCES: &[&str] = &["sources", "references"];

pub const SKILL_NAME: &[&str] = &["skill", "name"];

pub const CAREER_TITLE: &[&str] = &["title", "role", "name"];
pub const CAREER_DESCRIPTION: &[&str] = &["description", "summary"];
pub const CAREER_SKILLS: &[&str] = &["requiredSkills", "skills"];
pub const CAREER_EMPLOYERS: &[&str] = &["potentialEmployers", "companies", "employers"];

pub const HIGHLIGHT_KIND: &[&str] = &["type", "changeType"];
pub const HIGHLIGHT_CONTENT: &[&str] = &["content", "text"];
pub const HIGHLIGHT_REASON: &[&str] = &["reason"];
pub const HIGHLIGHT_REQUIREMENT: &[&str] = &["requirement", "relatedRequirement"];
pub const HIGHLIGHT_IMPACT: &[&str] = &["impact", "expectedImpact"];
pub const HIGHLIGHT_RECOMMENDATIONS: &[&str] = &["recommendations", "suggestions", "recommendation"];

// ── Lookup ──────────────────────────────────────────────────────────────────

/// Follow a dotted path. Missing keys, non-object parents, and `null`
/// leaves all resolve to `None`.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, key| node.get(key))
        .filter(|v| !v.is_null())
}

impl FieldPaths {
    /// First path whose value `coerce` accepts.
    ///
    /// On failure reports [`FallbackKind::WrongType`] if some path held a
    /// value of the wrong shape, [`FallbackKind::Missing`] otherwise.
    pub fn resolve<'a, T>(
        &self,
        root: &'a Value,
        coerce: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<T, FallbackKind> {
        let mut seen = false;
        for path in self.paths {
            if let Some(value) = lookup(root, path) {
                seen = true;
                if let Some(out) = coerce(value) {
                    return Ok(out);
                }
            }
        }
        Err(if seen {
            FallbackKind::WrongType
        } else {
            FallbackKind::Missing
        })
    }

    pub fn number(&self, root: &Value) -> Result<f64, FallbackKind> {
        self.resolve(root, as_number)
    }

    pub fn array<'a>(&self, root: &'a Value) -> Result<&'a [Value], FallbackKind> {
        self.resolve(root, |v| v.as_array().map(Vec::as_slice))
    }

    /// First non-blank string.
    pub fn text(&self, root: &Value) -> Result<String, FallbackKind> {
        self.resolve(root, |v| {
            v.as_str()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        })
    }
}

// ── Coercion ────────────────────────────────────────────────────────────────

/// A JSON number, or a string holding one (`"85"`, `"72.5%"`).
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_score_text(s),
        _ => None,
    }
}

/// Scalars as text; other shapes yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerce a value into a list of strings.
///
/// A single scalar becomes a one-element list; non-scalar array items are
/// dropped, as are blank strings.
pub fn string_list(value: &Value) -> Vec<String> {
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// First key of `entry` holding a non-blank scalar.
pub fn entry_text(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| entry.get(k).and_then(scalar_text))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// First key of `entry` holding a non-null value, as a string list.
pub fn entry_list(entry: &Value, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter()
        .filter_map(|k| entry.get(k).filter(|v| !v.is_null()))
        .map(string_list)
        .next()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_dotted_path() {
        let v = json!({"scoring": {"originalScore": 40}});
        assert_eq!(lookup(&v, "scoring.originalScore"), Some(&json!(40)));
        assert_eq!(lookup(&v, "scoring.missing"), None);
        assert_eq!(lookup(&v, "originalScore"), None);
    }

    #[test]
    fn lookup_treats_null_as_undefined() {
        let v = json!({"scoring": null, "optimizedScore": null});
        assert_eq!(lookup(&v, "scoring.originalScore"), None);
        assert_eq!(lookup(&v, "optimizedScore"), None);
    }

    #[test]
    fn first_path_wins() {
        let v = json!({"scoring": {"originalScore": 40}, "originalScore": 90});
        assert_eq!(ORIGINAL_SCORE.number(&v), Ok(40.0));
    }

    #[test]
    fn falls_through_null_and_wrong_type() {
        let v = json!({"scoring": {"originalScore": null}, "originalScore": "88"});
        assert_eq!(ORIGINAL_SCORE.number(&v), Ok(88.0));

        let v = json!({"scoring": {"originalScore": "high"}});
        assert_eq!(ORIGINAL_SCORE.number(&v), Err(FallbackKind::WrongType));

        assert_eq!(ORIGINAL_SCORE.number(&json!({})), Err(FallbackKind::Missing));
    }

    #[test]
    fn array_skips_non_arrays() {
        let v = json!({"sectionFeedback": "n/a", "sections": [{"section": "Skills"}]});
        assert_eq!(SECTION_FEEDBACK.array(&v).map(<[Value]>::len), Ok(1));
    }

    #[test]
    fn text_skips_blank() {
        let v = json!({"optimizedResume": "   ", "enhancedResume": "# Jane"});
        assert_eq!(OPTIMIZED_RESUME.text(&v), Ok("# Jane".to_string()));
    }

    #[test]
    fn string_list_coercion() {
        assert_eq!(string_list(&json!(["a", 1, true, {"x": 1}, " "])), vec!["a", "1", "true"]);
        assert_eq!(string_list(&json!("single")), vec!["single"]);
        assert!(string_list(&json!({"x": 1})).is_empty());
    }

    #[test]
    fn entry_helpers() {
        let e = json!({"name": "  ", "title": "Backend", "strengths": "Rust"});
        assert_eq!(entry_text(&e, SECTION_NAME), Some("Backend".to_string()));
        assert_eq!(entry_list(&e, SECTION_MATCHES), Some(vec!["Rust".to_string()]));
        assert_eq!(entry_list(&e, SECTION_MISSES), None);
    }
}
