//! HTML escaping helpers.
//!
//! Two families: the strict escapes (`escape_html`, `escape_double_quotes`)
//! treat their input as plain text, while the entity-preserving escapes
//! (`escape_text`, `escape_attr`) leave existing character references alone
//! so that running them twice is a no-op.

/// Escape `& < > " '` for use as HTML text or attribute content.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_html`].
pub fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Escape only double quotes.
pub fn escape_double_quotes(s: &str) -> String {
    s.replace('"', "&quot;")
}

/// Escape text-node content, keeping character references intact.
pub fn escape_text(s: &str) -> String {
    escape_preserving(s, false)
}

/// Escape an attribute value, keeping character references intact.
pub fn escape_attr(s: &str) -> String {
    escape_preserving(s, true)
}

fn escape_preserving(s: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' if entity_len(&s[i..]).is_some() => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            '\'' if quotes => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Length in bytes of the character reference at the start of `s`, if any.
///
/// Recognises `&name;`, `&#123;`, and `&#x1F;`. Names are limited to 32
/// alphanumerics; no table lookup is done.
pub fn entity_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }
    let body = &bytes[1..];
    let digits_end = |start: usize, pred: fn(&u8) -> bool| {
        body[start..]
            .iter()
            .position(|b| !pred(b))
            .map(|p| start + p)
    };

    let end = match body.first()? {
        b'#' => match body.get(1)? {
            b'x' | b'X' => digits_end(2, u8::is_ascii_hexdigit).filter(|&e| e > 2)?,
            _ => digits_end(1, u8::is_ascii_digit).filter(|&e| e > 1)?,
        },
        b if b.is_ascii_alphabetic() => digits_end(0, u8::is_ascii_alphanumeric)?,
        _ => return None,
    };

    if end > 33 || body.get(end) != Some(&b';') {
        return None;
    }
    Some(end + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_all_specials() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn escape_html_plain_passthrough() {
        assert_eq!(escape_html("led team of 5"), "led team of 5");
    }

    #[test]
    fn unescape_html_inverts_escape_html() {
        for s in [r#"<a href="x">Tom & Jerry's</a>"#, "&lt; literal", "plain"] {
            assert_eq!(unescape_html(&escape_html(s)), s);
        }
    }

    #[test]
    fn escape_double_quotes_only() {
        assert_eq!(escape_double_quotes(r#"say "hi" & <go>"#), "say &quot;hi&quot; & <go>");
    }

    #[test]
    fn escape_text_keeps_entities() {
        assert_eq!(escape_text("AT&amp;T & R&D <b>"), "AT&amp;T &amp; R&amp;D &lt;b&gt;");
        assert_eq!(escape_text("&#039; &#x27; &quot;"), "&#039; &#x27; &quot;");
    }

    #[test]
    fn escape_text_is_idempotent() {
        let once = escape_text("a < b && c > d \"q\"");
        assert_eq!(escape_text(&once), once);
    }

    #[test]
    fn escape_attr_escapes_quotes() {
        assert_eq!(escape_attr(r#"{"a":'b'}"#), "{&quot;a&quot;:&#039;b&#039;}");
        let once = escape_attr(r#"x="1" & y"#);
        assert_eq!(escape_attr(&once), once);
    }

    #[test]
    fn entity_len_forms() {
        assert_eq!(entity_len("&amp; rest"), Some(5));
        assert_eq!(entity_len("&#039;"), Some(6));
        assert_eq!(entity_len("&#x1F600;"), Some(9));
        assert_eq!(entity_len("&"), None);
        assert_eq!(entity_len("& amp;"), None);
        assert_eq!(entity_len("&#;"), None);
        assert_eq!(entity_len("&#x;"), None);
        assert_eq!(entity_len("&amp"), None);
    }
}
