//! Repair parser: raw model text → candidate object.
//!
//! Ordered fallback chain:
//!
//! 1. Strip noise: code fences, a leading `JSON:` label, stray backticks,
//!    and whitespace runs (newlines and tabs collapse to one space)
//! 2. Keep the span from the first `{` to the last `}`
//! 3. Normalise typography: escaped apostrophes, en/em dashes, curly quotes
//! 4. Strict parse with `serde_json`
//! 5. Tolerant parse with [`crate::lenient`]
//!
//! Only a JSON object is accepted as a candidate.

use once_cell::sync::Lazy;
use regex::Regex;
use resumelens_core::MalformedResponse;
use serde_json::Value;
use tracing::{debug, warn};

use crate::lenient::parse_lenient;

static RE_FENCE_JSON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```json\s*").unwrap());
static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*").unwrap());
static RE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^[ \t]*JSON:[ \t]*").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_ESCAPED_APOSTROPHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\+'(\w)").unwrap());

/// Recover a candidate object from raw model output.
pub fn parse_response(raw: &str) -> Result<Value, MalformedResponse> {
    let cleaned = clean_response(raw);
    if cleaned.is_empty() {
        return Err(malformed("empty response", raw));
    }

    let strict_err = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => return require_object(value, raw),
        Err(e) => e,
    };
    debug!(error = %strict_err, "strict parse failed, trying repair parse");

    match parse_lenient(&cleaned) {
        Ok(value) => require_object(value, raw),
        Err(e) => Err(malformed(
            format!("strict parse: {strict_err}; repair parse: {e}"),
            raw,
        )),
    }
}

/// Apply the noise-stripping, extraction, and typography steps.
pub fn clean_response(raw: &str) -> String {
    let s = strip_noise(raw);
    let s = extract_braces(&s);
    normalize_typography(s)
}

// ── Step 1: Strip noise ─────────────────────────────────────────────────────

fn strip_noise(raw: &str) -> String {
    let s = RE_FENCE_JSON.replace_all(raw, "");
    let s = RE_FENCE.replace_all(&s, "");
    let s = RE_LABEL.replace_all(&s, "");
    let s = s.replace('`', "").replace('\r', "");
    RE_WHITESPACE.replace_all(&s, " ").trim().to_string()
}

// ── Step 2: Extract the outermost braces ────────────────────────────────────

fn extract_braces(s: &str) -> &str {
    match (s.find('{'), s.rfind('}')) {
        (Some(start), Some(end)) if start < end => &s[start..=end],
        _ => s,
    }
}

// ── Step 3: Typography ──────────────────────────────────────────────────────

fn normalize_typography(s: &str) -> String {
    let s = RE_ESCAPED_APOSTROPHE.replace_all(s, "'$1");
    s.chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' => '-',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            c => c,
        })
        .collect()
}

fn require_object(value: Value, raw: &str) -> Result<Value, MalformedResponse> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(malformed(
            format!("expected an object, found {}", kind_name(&value)),
            raw,
        ))
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn malformed(reason: impl Into<String>, raw: &str) -> MalformedResponse {
    let err = MalformedResponse::new(reason, raw);
    warn!(reason = %err.reason, raw = err.raw_preview(), "model response could not be parsed");
    err
}
