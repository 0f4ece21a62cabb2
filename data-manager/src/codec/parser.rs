//! Recursive-descent reader for literal TypeScript exports
//!
//! Accepts strings (single or double quoted), numbers, booleans, `null`,
//! arrays and objects, with trailing commas, bare or quoted keys and
//! comments. Nothing is ever evaluated: any other expression is rejected.

use serde_json::{Map, Number, Value};

use crate::error::DataError;

/// Deepest array/object nesting accepted before giving up
const MAX_DEPTH: usize = 256;

/// Locate `export const <export_name>` in `text` and parse its literal value
pub fn parse_export(text: &str, export_name: &str) -> Result<Value, DataError> {
    let start = find_export(text, export_name)
        .ok_or_else(|| DataError::Parse(format!("Export {export_name} not found")))?;

    let mut parser = Parser::new(text, start);
    parser.skip_type_annotation()?;
    let value = parser.parse_value()?;

    parser.end_statement()?;
    Ok(value)
}

/// Byte offset just past the exported identifier, if present
///
/// Only code is searched: comments and quoted strings are skipped.
fn find_export(text: &str, export_name: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match (bytes[i], bytes.get(i + 1)) {
            (b'/', Some(b'/')) => {
                i = text[i..].find('\n').map_or(bytes.len(), |n| i + n);
            }
            (b'/', Some(b'*')) => {
                i = text[i + 2..].find("*/").map_or(bytes.len(), |n| i + n + 4);
            }
            (q @ (b'\'' | b'"' | b'`'), _) => i = skip_quoted(bytes, i, q),
            _ => {
                if let Some(end) = export_at(text, i, export_name) {
                    return Some(end);
                }
                i += 1;
            }
        }
    }
    None
}

/// Index just past the string opened by `quote` at `open`
fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Match `export const <export_name>` starting exactly at `idx`
fn export_at(text: &str, idx: usize, export_name: &str) -> Option<usize> {
    let rest = text.get(idx..)?.strip_prefix("export")?;
    if text[..idx].chars().next_back().is_some_and(is_ident_char) {
        return None;
    }
    let after = strip_keyword(rest, "const")?
        .trim_start()
        .strip_prefix(export_name)?;
    if after.chars().next().is_some_and(is_ident_char) {
        return None;
    }
    Some(text.len() - after.len())
}

/// Strip leading whitespace plus `keyword`, requiring whitespace on both sides
fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let trimmed = s.trim_start();
    if trimmed.len() == s.len() {
        return None;
    }
    let rest = trimmed.strip_prefix(keyword)?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos, depth: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, want: char) -> Result<(), DataError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(&format!("Expected '{want}', found '{c}'"))),
            None => Err(self.error(&format!("Expected '{want}', found end of input"))),
        }
    }

    fn error(&self, msg: &str) -> DataError {
        let consumed = &self.src[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let col = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |l| l.chars().count())
            + 1;
        DataError::Parse(format!("{msg} at line {line}, column {col}"))
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<(), DataError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let open = self.pos;
                    self.pos += 2;
                    match self.src[self.pos..].find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => {
                            self.pos = open;
                            return Err(self.error("Unterminated block comment"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip `: Type` up to and including the assignment `=`
    fn skip_type_annotation(&mut self) -> Result<(), DataError> {
        self.skip_trivia()?;
        if self.peek() == Some(':') {
            while let Some(c) = self.peek() {
                if c == '=' && self.peek_second() != Some('>') {
                    break;
                }
                self.bump();
            }
        }
        self.expect('=')
    }

    /// The literal must end its statement: `;`, end of input, or a new
    /// statement on a later line
    fn end_statement(&mut self) -> Result<(), DataError> {
        let literal_end = self.pos;
        self.skip_trivia()?;
        match self.peek() {
            None | Some(';') => Ok(()),
            Some(c) if is_ident_start(c) && self.src[literal_end..self.pos].contains('\n') => {
                Ok(())
            }
            Some(c) => Err(self.error(&format!("Unexpected '{c}' after literal"))),
        }
    }

    fn parse_value(&mut self) -> Result<Value, DataError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.nested(Self::parse_object),
            Some('[') => self.nested(Self::parse_array),
            Some(q @ ('\'' | '"')) => self.parse_string(q).map(Value::String),
            Some(c) if c == '-' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let word = self.parse_identifier();
                match word {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    other => {
                        self.pos = start;
                        Err(self.error(&format!("Unexpected identifier '{other}'")))
                    }
                }
            }
            Some(c) => Err(self.error(&format!("Unexpected character '{c}'"))),
            None => Err(self.error("Unexpected end of input")),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, DataError>,
    ) -> Result<Value, DataError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(&format!("Nesting deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn parse_object(&mut self) -> Result<Value, DataError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }

            let key = self.parse_key()?;
            self.skip_trivia()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                Some(c) => return Err(self.error(&format!("Expected ',' or '}}', found '{c}'"))),
                None => return Err(self.error("Unterminated object")),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, DataError> {
        match self.peek() {
            Some(q @ ('\'' | '"')) => self.parse_string(q),
            Some(c) if is_ident_start(c) => Ok(self.parse_identifier().to_string()),
            Some(c) if c.is_ascii_digit() => match self.parse_number()? {
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(self.error("Invalid numeric key")),
            },
            Some(c) => Err(self.error(&format!("Unexpected character '{c}' in object key"))),
            None => Err(self.error("Unterminated object")),
        }
    }

    fn parse_array(&mut self) -> Result<Value, DataError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                Some(c) => return Err(self.error(&format!("Expected ',' or ']', found '{c}'"))),
                None => return Err(self.error("Unterminated array")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, DataError> {
        let start = self.pos;
        let mut integral = true;

        if self.peek() == Some('-') {
            self.bump();
        }
        let int_digits = self.skip_digits();
        let mut frac_digits = 0;
        if self.peek() == Some('.') {
            integral = false;
            self.bump();
            frac_digits = self.skip_digits();
        }
        if int_digits == 0 && frac_digits == 0 {
            self.pos = start;
            return Err(self.error("Invalid number"));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            integral = false;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.skip_digits() == 0 {
                self.pos = start;
                return Err(self.error("Invalid number exponent"));
            }
        }
        if self.peek().is_some_and(is_ident_char) {
            self.pos = start;
            return Err(self.error("Unsupported numeric literal"));
        }

        let text = &self.src[start..self.pos];
        if integral {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if let Ok(n) = text.parse::<u64>() {
                return Ok(Value::Number(n.into()));
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                self.error(&format!("Number out of range: {text}"))
            })
    }

    fn skip_digits(&mut self) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            count += 1;
        }
        count
    }

    fn parse_string(&mut self, quote: char) -> Result<String, DataError> {
        let open = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    self.pos = open;
                    return Err(self.error("Unterminated string"));
                }
                Some(c) if c == quote => return Ok(out),
                Some('\n') | Some('\r') => {
                    self.pos = open;
                    return Err(self.error("Line break inside string"));
                }
                Some('\\') => self.parse_escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), DataError> {
        let Some(c) = self.bump() else {
            return Err(self.error("Unterminated escape sequence"));
        };
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.parse_hex(2)?;
                out.push(self.char_from(code)?);
            }
            'u' => {
                let ch = self.parse_unicode_escape()?;
                out.push(ch);
            }
            // Line continuation
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            c if c.is_ascii_digit() => {
                return Err(self.error("Octal escape sequences are not supported"));
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn parse_unicode_escape(&mut self) -> Result<char, DataError> {
        if self.peek() == Some('{') {
            self.bump();
            let src = self.src;
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &src[start..self.pos];
            self.expect('}')?;
            let code = u32::from_str_radix(digits, 16)
                .map_err(|_| self.error("Invalid unicode escape"))?;
            return self.char_from(code);
        }

        let code = self.parse_hex(4)?;
        if (0xD800..0xDC00).contains(&code) {
            let pair = self.src[self.pos..].starts_with("\\u");
            if pair {
                self.pos += 2;
                let low = self.parse_hex(4)?;
                if (0xDC00..0xE000).contains(&low) {
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    return self.char_from(combined);
                }
            }
            return Err(self.error("Unpaired surrogate in unicode escape"));
        }
        self.char_from(code)
    }

    fn parse_hex(&mut self, len: usize) -> Result<u32, DataError> {
        let start = self.pos;
        for _ in 0..len {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.bump();
                }
                _ => return Err(self.error("Invalid hexadecimal escape")),
            }
        }
        u32::from_str_radix(&self.src[start..self.pos], 16)
            .map_err(|_| self.error("Invalid hexadecimal escape"))
    }

    fn char_from(&self, code: u32) -> Result<char, DataError> {
        char::from_u32(code).ok_or_else(|| self.error("Invalid character code in escape"))
    }
}
