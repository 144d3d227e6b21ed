//! Metadata carried by each highlight span.

use resumelens_core::escape::escape_text;
use resumelens_core::{HighlightEntry, HighlightKind};
use serde::{Deserialize, Serialize};

/// Tooltip data serialized into a span's `data-tooltip` attribute.
///
/// Values are already HTML text (highlight content is escaped at
/// normalization time), so the presentation layer may insert them as markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipPayload {
    /// Capitalized kind label, e.g. `Modified`.
    #[serde(rename = "type")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
    pub reason: String,
    pub requirement: String,
    pub impact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl TooltipPayload {
    /// Build the payload for `entry`, whose content matched `matched` in the
    /// document.
    ///
    /// Modified and removed passages carry the matched text as `original`;
    /// for modified passages the recommendation is reported as the `change`.
    pub fn for_entry(entry: &HighlightEntry, matched: &str) -> Self {
        let original = match entry.kind {
            HighlightKind::Modified | HighlightKind::Removed => Some(matched.to_string()),
            HighlightKind::Retained => None,
        };
        let (change, recommendation) = match entry.kind {
            HighlightKind::Modified => (entry.recommendations.clone(), None),
            _ => (None, entry.recommendations.clone()),
        };
        Self {
            label: entry.kind.label().to_string(),
            original,
            change,
            reason: entry.reason.clone(),
            requirement: entry.requirement.clone(),
            impact: entry.impact.clone(),
            recommendation,
        }
    }

    /// Compact JSON form.
    pub fn to_json(&self) -> String {
        // Plain strings and options only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Render the hover card the presentation layer shows for a span.
pub fn render_tooltip_card(payload: &TooltipPayload) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"tooltip-card\">");
    html.push_str(&format!(
        "<div class=\"tooltip-header {}\"><span class=\"tooltip-type\">{}</span></div>",
        escape_text(&payload.label.to_lowercase()),
        escape_text(&payload.label),
    ));
    html.push_str("<div class=\"tooltip-content\">");

    let sections = [
        ("Original", payload.original.as_deref()),
        ("Change", payload.change.as_deref()),
        ("Reason", Some(payload.reason.as_str())),
        ("Requirement", Some(payload.requirement.as_str())),
        ("Impact", Some(payload.impact.as_str())),
        ("Recommendation", payload.recommendation.as_deref()),
    ];
    for (label, text) in sections {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        html.push_str(&format!(
            "<div class=\"tooltip-section\"><div class=\"tooltip-label\">{label}</div>\
             <div class=\"tooltip-text\">{}</div></div>",
            escape_text(text)
        ));
    }

    html.push_str("</div></div>");
    html
}
