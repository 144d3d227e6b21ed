//! Markdown → allow-listed HTML.
//!
//! Two stages:
//!
//! 1. [`expand_markup`]: `pulldown-cmark` renders the lightweight markup
//!    (headers, bullet lists, emphasis) to HTML, with soft breaks turned into
//!    line breaks.
//! 2. [`filter_html`]: a small byte scanner re-emits only the allow-listed
//!    tags and attributes, drops script-like containers with their content,
//!    and rebalances the tag structure.
//!
//! The result is deterministic and idempotent: sanitized output contains no
//! blank lines and always starts with a block tag, so a second pass sees one
//! raw HTML block and the filter reproduces it byte for byte.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Options, Parser, html};
use regex::Regex;
use resumelens_core::escape::{escape_attr, escape_text};

/// Tags that survive sanitization.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "span", "ul", "ol", "li", "strong", "em", "h1", "h2", "h3", "br",
];

/// Attributes that survive, per tag.
const ALLOWED_ATTRS: &[(&str, &[&str])] = &[("span", &["class", "data-tooltip"])];

/// Elements removed together with everything inside them.
const DROP_CONTENT_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "noscript", "template", "textarea", "title", "svg",
    "math",
];

const BLOCK_TAGS: &[&str] = &["p", "ul", "ol", "li", "h1", "h2", "h3"];
const HEADING_TAGS: &[&str] = &["h1", "h2", "h3"];
const VOID_TAGS: &[&str] = &["br"];

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Render lightweight markup to HTML restricted to [`ALLOWED_TAGS`].
///
/// Never fails: anything the filter cannot read as a tag is emitted as
/// escaped text.
pub fn sanitize(markup: &str) -> String {
    sanitize_html(&expand_markup(markup))
}

/// Filter already-expanded HTML, skipping the Markdown stage.
///
/// Used after annotation, when the text must not be read as markup again.
pub fn sanitize_html(html: &str) -> String {
    let filtered = filter_html(html);
    RE_BLANK_LINES
        .replace_all(&filtered, "\n")
        .trim()
        .to_string()
}

/// Expand Markdown to unrestricted HTML.
pub fn expand_markup(markup: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markup, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(markup.len() + markup.len() / 2);
    html::push_html(&mut out, parser);
    out
}

/// Re-emit `input` keeping only allow-listed tags and attributes.
///
/// Structure rules:
/// - end tags with no matching open element are dropped
/// - elements still open at the end are closed
/// - a block start tag closes an open paragraph; a heading closes a heading
/// - `li` closes an open `li` of the same list
/// - text or inline tags outside any element open an implied `<p>`
pub fn filter_html(input: &str) -> String {
    let mut filter = TagFilter {
        input,
        out: String::with_capacity(input.len()),
        open: Vec::new(),
    };
    filter.run();
    filter.out
}

struct TagFilter<'a> {
    input: &'a str,
    out: String,
    open: Vec<&'static str>,
}

/// A parsed start or end tag.
struct RawTag<'a> {
    name: String,
    end: bool,
    attrs: Vec<(String, &'a str)>,
    /// Byte offset just past the closing `>`.
    next: usize,
}

impl<'a> TagFilter<'a> {
    fn run(&mut self) {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'<' {
                let start = i;
                while i < bytes.len() && bytes[i] != b'<' {
                    i += 1;
                }
                self.text(&input[start..i]);
                continue;
            }

            // `<` is ASCII, so every offset below stays on a char boundary.
            if input[i..].starts_with(COMMENT_START) {
                i = match input[i + COMMENT_START.len()..].find(COMMENT_END) {
                    Some(end) => i + COMMENT_START.len() + end + COMMENT_END.len(),
                    None => bytes.len(),
                };
                continue;
            }
            if matches!(bytes.get(i + 1), Some(b'!' | b'?')) {
                i = match input[i..].find('>') {
                    Some(end) => i + end + 1,
                    None => bytes.len(),
                };
                continue;
            }

            match parse_tag(input, i) {
                Some(tag) => {
                    i = tag.next;
                    if tag.end {
                        self.end_tag(&tag.name);
                    } else if DROP_CONTENT_TAGS.contains(&tag.name.as_str()) {
                        i = skip_element_content(input, i, &tag.name);
                    } else {
                        self.start_tag(&tag);
                    }
                }
                None => {
                    self.text("<");
                    i += 1;
                }
            }
        }

        while let Some(name) = self.open.pop() {
            self.close(name);
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.open.is_empty() {
            let body = text.trim_start();
            let lead = &text[..text.len() - body.len()];
            self.out.push_str(lead);
            if body.is_empty() {
                return;
            }
            self.open_tag("p", &[]);
            self.out.push_str(&escape_text(body));
        } else {
            self.out.push_str(&escape_text(text));
        }
    }

    fn start_tag(&mut self, tag: &RawTag<'_>) {
        let Some(name) = allowed(&tag.name) else {
            return;
        };

        if BLOCK_TAGS.contains(&name) {
            if name == "li" {
                self.close_open_item();
            } else if self.open.contains(&"p") {
                self.close_through("p");
            }
            if HEADING_TAGS.contains(&name)
                && self.open.last().is_some_and(|top| HEADING_TAGS.contains(top))
            {
                let top = self.open.pop().unwrap_or(name);
                self.close(top);
            }
        } else if self.open.is_empty() {
            self.open_tag("p", &[]);
        }

        let attrs: Vec<(&str, &str)> = tag
            .attrs
            .iter()
            .filter(|(attr, _)| attr_allowed(name, attr))
            .map(|(attr, value)| (attr.as_str(), *value))
            .collect();
        self.open_tag(name, &attrs);
    }

    fn end_tag(&mut self, name: &str) {
        let Some(name) = allowed(name) else {
            return;
        };
        if VOID_TAGS.contains(&name) || !self.open.contains(&name) {
            return;
        }
        self.close_through(name);
    }

    fn open_tag(&mut self, name: &'static str, attrs: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(name);
        let mut seen: Vec<&str> = Vec::with_capacity(attrs.len());
        for &(attr, value) in attrs {
            if seen.contains(&attr) {
                continue;
            }
            seen.push(attr);
            self.out.push(' ');
            self.out.push_str(attr);
            self.out.push_str("=\"");
            self.out.push_str(&escape_attr(value));
            self.out.push('"');
        }
        self.out.push('>');
        if !VOID_TAGS.contains(&name) {
            self.open.push(name);
        }
    }

    fn close(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    /// Pop and close elements down to and including the innermost `name`.
    fn close_through(&mut self, name: &str) {
        while let Some(top) = self.open.pop() {
            self.close(top);
            if top == name {
                break;
            }
        }
    }

    /// Close an `li` left open in the current list before starting a new one.
    fn close_open_item(&mut self) {
        let item_open = self
            .open
            .iter()
            .rev()
            .take_while(|tag| !matches!(**tag, "ul" | "ol"))
            .any(|tag| *tag == "li");
        if item_open {
            self.close_through("li");
        }
    }
}

fn allowed(name: &str) -> Option<&'static str> {
    ALLOWED_TAGS.iter().copied().find(|tag| *tag == name)
}

fn attr_allowed(tag: &str, attr: &str) -> bool {
    ALLOWED_ATTRS
        .iter()
        .any(|(t, attrs)| *t == tag && attrs.contains(&attr))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}

/// Parse a start or end tag beginning at `input[start] == '<'`.
///
/// Returns `None` when the bytes do not form a complete tag, in which case
/// the caller treats `<` as text.
fn parse_tag(input: &str, start: usize) -> Option<RawTag<'_>> {
    let bytes = input.as_bytes();
    let mut i = start + 1;
    let end = bytes.get(i) == Some(&b'/');
    if end {
        i += 1;
    }
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    let name_start = i;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = input[name_start..i].to_ascii_lowercase();

    let mut attrs = Vec::new();
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i)? {
            b'>' => {
                return Some(RawTag {
                    name,
                    end,
                    attrs,
                    next: i + 1,
                });
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let attr = input[attr_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut value = "";
        if bytes.get(i) == Some(&b'=') {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match *bytes.get(i)? {
                quote @ (b'"' | b'\'') => {
                    let close = input[i + 1..].find(quote as char)?;
                    value = &input[i + 1..i + 1 + close];
                    i += close + 2;
                }
                _ => {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = &input[value_start..i];
                }
            }
        }
        if !attr.is_empty() {
            attrs.push((attr, value));
        }
    }
}

/// Offset just past the `</name ...>` closing a dropped element, or the end
/// of input when it is never closed.
fn skip_element_content(input: &str, from: usize, name: &str) -> usize {
    let bytes = input.as_bytes();
    let close = format!("</{name}");
    let mut i = from;
    while let Some(rel) = input[i..].find("</") {
        let at = i + rel;
        let candidate = &bytes[at..];
        if candidate.len() >= close.len()
            && candidate[..close.len()].eq_ignore_ascii_case(close.as_bytes())
            && !candidate.get(close.len()).is_some_and(|b| is_name_byte(*b))
        {
            return match input[at..].find('>') {
                Some(end) => at + end + 1,
                None => bytes.len(),
            };
        }
        i = at + 2;
    }
    bytes.len()
}
