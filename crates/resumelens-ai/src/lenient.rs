//! Tolerant parser for near-JSON model output.
//!
//! Accepts what `serde_json` rejects but a model commonly emits:
//! trailing or missing commas, unquoted keys, single-quoted strings,
//! `//` and `/* */` comments, Python/JS literals (`True`, `None`,
//! `undefined`, `NaN`), raw control characters and unknown escapes inside
//! strings, unescaped inner quotes, and truncated input. Unterminated
//! strings and containers are closed at end of input.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Containers nested deeper than this are rejected.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LenientError {
    #[error("no value found in input")]
    Empty,

    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
}

/// Parse `input` as leniently as possible.
///
/// Content after the first complete top-level value is ignored.
pub fn parse_lenient(input: &str) -> Result<Value, LenientError> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
        depth: 0,
    };
    parser.skip_trivia();
    parser.value()?.ok_or(LenientError::Empty)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) | (Some('#'), _) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while self.pos < self.chars.len()
                        && !(self.peek() == Some('*') && self.peek_at(1) == Some('/'))
                    {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.chars.len());
                }
                _ => return,
            }
        }
    }

    /// Parse one value; `None` at end of input.
    fn value(&mut self) -> Result<Option<Value>, LenientError> {
        self.skip_trivia();
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let value = match c {
            '{' => self.object()?,
            '[' => self.array()?,
            '"' | '\'' => Value::String(self.string(c)),
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            _ => self.bareword(),
        };
        Ok(Some(value))
    }

    fn enter(&mut self) -> Result<(), LenientError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(LenientError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn object(&mut self) -> Result<Value, LenientError> {
        self.enter()?;
        self.pos += 1;
        let mut map = Map::new();

        loop {
            self.skip_trivia();
            let Some(c) = self.peek() else { break };
            match c {
                '}' => {
                    self.pos += 1;
                    break;
                }
                // Mismatched close; leave it for the enclosing array.
                ']' => break,
                ',' => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let key = match c {
                '"' | '\'' => self.string(c),
                _ => self.key_word(),
            };
            if key.is_empty() && !matches!(self.peek(), Some(':' | '=')) {
                // Not a key at all; drop the character and resync.
                self.pos += 1;
                continue;
            }

            self.skip_trivia();
            match self.peek() {
                Some(':' | '=') => self.pos += 1,
                Some(',' | '}') | None => {
                    map.insert(key, Value::Null);
                    continue;
                }
                _ => {}
            }

            match self.value()? {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.insert(key, Value::Null);
                    break;
                }
            }
        }

        self.depth -= 1;
        Ok(Value::Object(map))
    }

    fn array(&mut self) -> Result<Value, LenientError> {
        self.enter()?;
        self.pos += 1;
        let mut items = Vec::new();

        loop {
            self.skip_trivia();
            match self.peek() {
                None => break,
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some('}') => break,
                Some(',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }
            match self.value()? {
                Some(value) => items.push(value),
                None => break,
            }
        }

        self.depth -= 1;
        Ok(Value::Array(items))
    }

    /// Quoted string starting at `quote`. A quote only terminates the string
    /// when what follows it could end a value; otherwise it is kept as text.
    fn string(&mut self, quote: char) -> String {
        self.pos += 1;
        let mut out = String::new();

        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    let Some(esc) = self.peek() else { break };
                    self.pos += 1;
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'u' => out.push(self.unicode_escape()),
                        // `\"`, `\\`, `\/`, `\'` and unknown escapes keep the char.
                        other => out.push(other),
                    }
                }
                c if c == quote => {
                    if self.closes_string() {
                        return out;
                    }
                    out.push(c);
                }
                c => out.push(c),
            }
        }
        out
    }

    fn closes_string(&self) -> bool {
        let mut i = self.pos;
        while let Some(c) = self.chars.get(i) {
            if !c.is_whitespace() {
                return matches!(c, ',' | ':' | '}' | ']' | '"' | '\'' | '/');
            }
            i += 1;
        }
        true
    }

    fn hex4(&mut self) -> Option<u32> {
        let digits: String = self.chars.get(self.pos..self.pos + 4)?.iter().collect();
        let code = u32::from_str_radix(&digits, 16).ok()?;
        self.pos += 4;
        Some(code)
    }

    fn unicode_escape(&mut self) -> char {
        let Some(high) = self.hex4() else {
            return 'u';
        };
        if (0xD800..0xDC00).contains(&high)
            && self.peek() == Some('\\')
            && self.peek_at(1) == Some('u')
        {
            let save = self.pos;
            self.pos += 2;
            if let Some(low) = self.hex4().filter(|l| (0xDC00..0xE000).contains(l)) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
            }
            self.pos = save;
        }
        char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn number(&mut self) -> Value {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        // `85%` or `3 years`: not a number after all.
        if self.peek().is_some_and(|c| !is_delimiter(c) && !c.is_whitespace()) {
            self.pos = start;
            return self.bareword();
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        let text = text.trim_start_matches('+');
        if let Ok(i) = text.parse::<i64>() {
            return Value::Number(i.into());
        }
        if let Ok(u) = text.parse::<u64>() {
            return Value::Number(u.into());
        }
        match text.parse::<f64>().ok().and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            None => Value::Null,
        }
    }

    /// Unquoted value: a literal keyword, or free text up to the next
    /// delimiter.
    fn bareword(&mut self) -> Value {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ',' | '}' | ']' | '\n') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            // Empty value. A closer belongs to the enclosing container.
            if self.peek() == Some(',') {
                self.pos += 1;
            }
            return Value::Null;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.trim() {
            "true" | "True" | "TRUE" => Value::Bool(true),
            "false" | "False" | "FALSE" => Value::Bool(false),
            "null" | "None" | "undefined" | "nil" | "NaN" | "Infinity" | "-Infinity" => {
                Value::Null
            }
            other => Value::String(other.to_string()),
        }
    }

    fn key_word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ':' || c == '=' || is_delimiter(c) {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ',' | '}' | ']' | '{' | '[' | '"' | '\'')
}
