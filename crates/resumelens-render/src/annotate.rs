//! Highlight span injection.
//!
//! Works on sanitized HTML. The document is held as a sequence of text, tag
//! and mark segments; each highlight entry only searches text segments, so
//! markup, text already wrapped by a longer entry, and the marker's own
//! attributes are never matched again and markers never nest.

use std::ops::Range;

use regex::{Regex, RegexBuilder};
use resumelens_core::escape::{escape_html, unescape_html};
use resumelens_core::{HighlightEntry, HighlightSkipped, SkipReason};
use tracing::debug;

use crate::tooltip::TooltipPayload;

/// Result of annotating a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub text: String,
    /// Number of spans inserted.
    pub applied: usize,
    pub skipped: Vec<HighlightSkipped>,
}

enum Segment {
    /// Escaped text node content.
    Text(String),
    /// A start or end tag, carried through unchanged.
    Tag(String),
    /// An inserted highlight span.
    Mark(String),
}

/// Wrap the first boundary-respecting occurrence of each entry's content in
/// a highlight span.
///
/// `html` is sanitized output: text nodes are escaped and tags are well
/// formed. Entries are applied longest content first; ties keep their input
/// order. Matching is case-insensitive and literal, and never crosses a tag.
/// A match must be preceded by whitespace, a tag or the start of the
/// document, and followed by whitespace, a tag or the end of the document.
pub fn annotate(html: &str, highlights: &[HighlightEntry]) -> Annotated {
    let mut ordered: Vec<&HighlightEntry> = highlights.iter().collect();
    ordered.sort_by_key(|h| std::cmp::Reverse(h.content.chars().count()));

    let mut segments = split_html(html);
    let mut applied = 0;
    let mut skipped = Vec::new();

    for entry in ordered {
        let target = entry.content.trim();
        if target.is_empty() {
            debug!("highlight with empty content skipped");
            skipped.push(HighlightSkipped {
                content: entry.content.clone(),
                reason: SkipReason::EmptyContent,
            });
            continue;
        }

        let re = match literal_pattern(target) {
            Ok(re) => re,
            Err(e) => {
                debug!(error = %e, "highlight pattern rejected");
                skipped.push(HighlightSkipped {
                    content: entry.content.clone(),
                    reason: SkipReason::NotFound,
                });
                continue;
            }
        };

        if apply(&mut segments, &re, entry) {
            applied += 1;
        } else {
            debug!(content = target, "highlight content not found");
            skipped.push(HighlightSkipped {
                content: entry.content.clone(),
                reason: SkipReason::NotFound,
            });
        }
    }

    let text = segments
        .into_iter()
        .map(|s| match s {
            Segment::Text(t) | Segment::Tag(t) | Segment::Mark(t) => t,
        })
        .collect();

    Annotated {
        text,
        applied,
        skipped,
    }
}

/// Split sanitized HTML into text and tag segments.
fn split_html(html: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = html;
    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            segments.push(Segment::Text(rest.to_string()));
            break;
        };
        if lt > 0 {
            segments.push(Segment::Text(rest[..lt].to_string()));
        }
        let Some(gt) = rest[lt..].find('>') else {
            segments.push(Segment::Text(rest[lt..].to_string()));
            break;
        };
        segments.push(Segment::Tag(rest[lt..lt + gt + 1].to_string()));
        rest = &rest[lt + gt + 1..];
    }
    segments
}

/// Case-insensitive pattern for `target` (stored HTML-escaped) as it can
/// appear in an escaped text node. Quotes may be raw or written as a
/// character reference.
fn literal_pattern(target: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(target.len() * 2);
    let mut buf = [0u8; 4];
    for c in unescape_html(target).chars() {
        match c {
            '&' => pattern.push_str("&amp;"),
            '<' => pattern.push_str("&lt;"),
            '>' => pattern.push_str("&gt;"),
            '"' => pattern.push_str(r#"(?:"|&quot;|&#0*34;|&#x0*22;)"#),
            '\'' => pattern.push_str("(?:'|&apos;|&#0*39;|&#x0*27;)"),
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

/// Wrap the first free match of `re`; returns whether one was found.
fn apply(segments: &mut Vec<Segment>, re: &Regex, entry: &HighlightEntry) -> bool {
    let hit = segments.iter().enumerate().find_map(|(idx, seg)| match seg {
        Segment::Text(s) => {
            let open_start = idx == 0 || matches!(segments[idx - 1], Segment::Tag(_));
            let open_end = segments
                .get(idx + 1)
                .is_none_or(|next| matches!(next, Segment::Tag(_)));
            find_bounded(re, s, open_start, open_end).map(|r| (idx, r))
        }
        Segment::Tag(_) | Segment::Mark(_) => None,
    });
    let Some((idx, range)) = hit else {
        return false;
    };

    let Segment::Text(text) = segments.remove(idx) else {
        return false;
    };
    let mut replacement = Vec::with_capacity(3);
    if range.start > 0 {
        replacement.push(Segment::Text(text[..range.start].to_string()));
    }
    replacement.push(Segment::Mark(span(entry, &text[range.clone()])));
    if range.end < text.len() {
        replacement.push(Segment::Text(text[range.end..].to_string()));
    }
    segments.splice(idx..idx, replacement);
    true
}

/// First match of `re` in `hay` with whitespace (or an open edge) on both
/// sides. An edge is open when the segment touches a tag or the document
/// edge.
fn find_bounded(re: &Regex, hay: &str, open_start: bool, open_end: bool) -> Option<Range<usize>> {
    let mut from = 0;
    while from <= hay.len() {
        let m = re.find_at(hay, from)?;
        let before = if m.start() == 0 {
            open_start
        } else {
            hay[..m.start()].chars().next_back().is_some_and(char::is_whitespace)
        };
        let after = if m.end() == hay.len() {
            open_end
        } else {
            hay[m.end()..].chars().next().is_some_and(char::is_whitespace)
        };
        if before && after && !m.is_empty() {
            return Some(m.range());
        }
        from = m.start() + hay[m.start()..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn span(entry: &HighlightEntry, matched: &str) -> String {
    let payload = TooltipPayload::for_entry(entry, matched);
    format!(
        "<span class=\"highlight-{}\" data-tooltip=\"{}\">{matched}</span>",
        entry.kind.as_str(),
        escape_html(&payload.to_json()),
    )
}
