//! OpenStep plist tokenizer
//!
//! Besides building [`Plist`] values, the root-level parse records byte
//! spans for every root dictionary value and for every element of a
//! root-level array. The write path uses those spans to splice edited
//! regions back into the original text.

use super::{Dict, Plist};
use indexmap::IndexMap;
use std::fmt;
use std::ops::Range;

/// A syntax error with a 1-based line and column
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.message, self.line, self.column)
    }
}

impl std::error::Error for SyntaxError {}

/// Byte span of a root dictionary value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpan {
    pub value: Range<usize>,
    /// Element spans, only filled in when the value is an array
    pub items: Vec<Range<usize>>,
}

/// Spans of the root dictionary of a document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootSpans {
    pub entries: IndexMap<String, ValueSpan>,
    /// Offset of the closing brace of the root dictionary
    pub close: usize,
}

/// Parse a complete plist document
pub fn parse(text: &str) -> Result<Plist, SyntaxError> {
    let mut parser = Parser::new(text);
    let value = parser.parse_value()?;
    parser.expect_end()?;
    Ok(value)
}

/// Parse a document whose root is a dictionary, recording spans
pub fn parse_with_spans(text: &str) -> Result<(Plist, RootSpans), SyntaxError> {
    let mut parser = Parser::new(text);
    parser.skip_trivia()?;
    if parser.peek() != Some(b'{') {
        return Err(parser.error("expected a dictionary at the document root"));
    }
    parser.pos += 1;

    let mut dict = Dict::new();
    let mut spans = RootSpans::default();
    loop {
        parser.skip_trivia()?;
        if parser.peek() == Some(b'}') {
            spans.close = parser.pos;
            parser.pos += 1;
            break;
        }
        let key = parser.parse_key()?;
        parser.expect(b'=')?;
        parser.skip_trivia()?;
        let start = parser.pos;
        let (value, items) = if parser.peek() == Some(b'(') {
            let (items, item_spans) = parser.parse_array_with_spans()?;
            (Plist::Array(items), item_spans)
        } else {
            (parser.parse_value()?, Vec::new())
        };
        let end = parser.pos;
        parser.expect(b';')?;
        spans.entries.insert(
            key.clone(),
            ValueSpan {
                value: start..end,
                items,
            },
        );
        dict.insert(key, value);
    }
    parser.expect_end()?;
    Ok((Plist::Dict(dict), spans))
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

fn is_unquoted(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'$' | b'+' | b'/' | b':' | b'.' | b'-')
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        // A leading byte order mark is not part of the document
        let pos = if text.starts_with('\u{feff}') { 3 } else { 0 };
        Self {
            text,
            bytes: text.as_bytes(),
            pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let consumed = &self.text[..self.pos.min(self.text.len())];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        SyntaxError {
            message: message.into(),
            line,
            column,
        }
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'*') => {
                    let rest = &self.text[self.pos + 2..];
                    match rest.find("*/") {
                        Some(offset) => self.pos += offset + 4,
                        None => return Err(self.error("unterminated comment")),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), SyntaxError> {
        self.skip_trivia()?;
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    fn expect_end(&mut self) -> Result<(), SyntaxError> {
        self.skip_trivia()?;
        if self.pos < self.bytes.len() {
            return Err(self.error("unexpected content after the document root"));
        }
        Ok(())
    }

    fn parse_key(&mut self) -> Result<String, SyntaxError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'"') => self.parse_quoted(),
            Some(b) if is_unquoted(b) => Ok(self.take_unquoted().to_string()),
            _ => Err(self.error("expected a dictionary key")),
        }
    }

    fn parse_value(&mut self) -> Result<Plist, SyntaxError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'{') => self.parse_dict(),
            Some(b'(') => self.parse_array_with_spans().map(|(items, _)| Plist::Array(items)),
            Some(b'"') => self.parse_quoted().map(Plist::String),
            Some(b'<') => self.parse_data(),
            Some(b) if is_unquoted(b) => Ok(classify_token(self.take_unquoted())),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_dict(&mut self) -> Result<Plist, SyntaxError> {
        self.pos += 1;
        let mut dict = Dict::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Plist::Dict(dict));
                }
                None => return Err(self.error("unterminated dictionary")),
                _ => {}
            }
            let key = self.parse_key()?;
            self.expect(b'=')?;
            let value = self.parse_value()?;
            self.expect(b';')?;
            dict.insert(key, value);
        }
    }

    fn parse_array_with_spans(&mut self) -> Result<(Vec<Plist>, Vec<Range<usize>>), SyntaxError> {
        self.pos += 1;
        let mut items = Vec::new();
        let mut spans = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok((items, spans));
                }
                None => return Err(self.error("unterminated array")),
                _ => {}
            }
            let start = self.pos;
            items.push(self.parse_value()?);
            spans.push(start..self.pos);
            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {}
                _ => return Err(self.error("expected ',' or ')' in array")),
            }
        }
    }

    fn take_unquoted(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_unquoted) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    fn parse_quoted(&mut self) -> Result<String, SyntaxError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let rest = &self.text[self.pos..];
            let Some(offset) = rest.find(['"', '\\']) else {
                return Err(self.error("unterminated string"));
            };
            out.push_str(&rest[..offset]);
            self.pos += offset;
            if self.bytes[self.pos] == b'"' {
                self.pos += 1;
                return Ok(out);
            }
            self.pos += 1;
            self.parse_escape(&mut out)?;
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), SyntaxError> {
        let Some(byte) = self.peek() else {
            return Err(self.error("unterminated escape"));
        };
        self.pos += 1;
        match byte {
            b'n' => out.push('\n'),
            b't' => out.push('\t'),
            b'r' => out.push('\r'),
            b'a' => out.push('\u{7}'),
            b'b' => out.push('\u{8}'),
            b'f' => out.push('\u{c}'),
            b'v' => out.push('\u{b}'),
            b'0'..=b'7' => {
                let mut value = u32::from(byte - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            b'U' | b'u' => {
                let end = (self.pos + 4).min(self.bytes.len());
                let value = self
                    .text
                    .get(self.pos..end)
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| self.error("invalid unicode escape"))?;
                self.pos = end;
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            _ => {
                // Covers \\ and \" as well as any other escaped character
                let ch = self.text[self.pos - 1..].chars().next().unwrap_or('\u{fffd}');
                self.pos += ch.len_utf8() - 1;
                out.push(ch);
            }
        }
        Ok(())
    }

    fn parse_data(&mut self) -> Result<Plist, SyntaxError> {
        self.pos += 1;
        let rest = &self.text[self.pos..];
        let Some(end) = rest.find('>') else {
            return Err(self.error("unterminated data"));
        };
        let hex: Vec<u8> = rest[..end]
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        if hex.len() % 2 != 0 {
            return Err(self.error("odd number of hex digits in data"));
        }
        let mut data = Vec::with_capacity(hex.len() / 2);
        for pair in hex.chunks(2) {
            let digits = std::str::from_utf8(pair).map_err(|_| self.error("invalid data"))?;
            let byte = u8::from_str_radix(digits, 16).map_err(|_| self.error("invalid data"))?;
            data.push(byte);
        }
        self.pos += end + 1;
        Ok(Plist::Data(data))
    }
}

fn classify_token(token: &str) -> Plist {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(value) = token.parse::<i64>() {
            return Plist::Integer(value);
        }
    }
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    if let Some(fraction) = parts.next() {
        let numeric = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !(whole.is_empty() && fraction.is_empty()) && numeric(whole) && numeric(fraction) {
            if let Ok(value) = token.parse::<f64>() {
                return Plist::Float(value);
            }
        }
    }
    Plist::String(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        let value = parse("{a = 1; b = -2.5; c = .notdef; d = \"x y\"; e = 0041;}").unwrap();
        assert_eq!(value.get("a"), Some(&Plist::Integer(1)));
        assert_eq!(value.get("b"), Some(&Plist::Float(-2.5)));
        assert_eq!(value.get("c"), Some(&Plist::String(".notdef".into())));
        assert_eq!(value.get("d"), Some(&Plist::String("x y".into())));
        // leading zeros are lost, callers reading hex go through to_text
        assert_eq!(value.get("e"), Some(&Plist::Integer(41)));
    }

    #[test]
    fn test_parse_nested_and_trailing_comma() {
        let value = parse("{nodes = ((1,2,l),(3,4,o),);}").unwrap();
        let nodes = value.get("nodes").and_then(Plist::as_array).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[1],
            Plist::Array(vec![Plist::Integer(3), Plist::Integer(4), Plist::String("o".into())])
        );
    }

    #[test]
    fn test_escapes_and_comments() {
        let value = parse("// header\n{ /* note */ s = \"a\\\"b\\nc\\012\\U00e9\"; }").unwrap();
        assert_eq!(value.get("s").and_then(Plist::as_str), Some("a\"b\nc\né"));
    }

    #[test]
    fn test_data() {
        let value = parse("{d = <0aff 10>;}").unwrap();
        assert_eq!(value.get("d"), Some(&Plist::Data(vec![0x0a, 0xff, 0x10])));
    }

    #[test]
    fn test_error_position() {
        let error = parse("{\na = 1;\nb = ;\n}").unwrap_err();
        assert_eq!(error.line, 3);
        assert_eq!(error.column, 5);
    }

    #[test]
    fn test_root_spans() {
        let text = "{\nfamilyName = Test;\nglyphs = (\n{\nglyphname = A;\n},\n{\nglyphname = B;\n}\n);\n}\n";
        let (value, spans) = parse_with_spans(text).unwrap();
        assert!(value.get("glyphs").is_some());

        let family = &spans.entries["familyName"];
        assert_eq!(&text[family.value.clone()], "Test");

        let glyphs = &spans.entries["glyphs"];
        assert_eq!(glyphs.items.len(), 2);
        assert_eq!(&text[glyphs.items[1].clone()], "{\nglyphname = B;\n}");
        assert!(text[glyphs.value.clone()].starts_with('('));
        assert_eq!(&text[spans.close..spans.close + 1], "}");
    }

    #[test]
    fn test_rejects_trailing_garbage() {
        assert!(parse("{a = 1;} x").is_err());
    }
}
