// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Catalog parsing.
//!
//! Extract a named collection out of the catalog file. The catalog file is a
//! hand-authored UI source file that embeds each collection as a literal array
//! assignment:
//!
//! ```text
//! const projects = [
//!   {
//!     title: "First Motion Design Animation",
//!     category: "Motion Graphics",
//!     ...
//!   },
//! ];
//! ```
//!
//! # Scanning
//!
//! The assignment is located by matching the `const <name> = [` token
//! sequence, and then scanning forward while balancing bracket, brace, and
//! parenthesis depth until the array closes and a `;` follows. Strings and
//! comments are tokenized along the way, so brackets inside them never count.
//! The file content is never evaluated.
//!
//! # Entries
//!
//! Entries must be flat object literals whose keys come from the fixed field
//! set of a [`VideoRecord`], and whose values are plain or back-quoted string
//! literals. Nested structures inside an entry are not supported, and are
//! reported as malformed entries.

use crate::catalog::record::{thumbnail_url, Collection, VideoRecord, STREAMABLE};

use std::{collections::VecDeque, ops::Range};
use tracing::{debug, instrument};

/// Collection parsed out of the catalog file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCollection {
    /// Collection that was parsed.
    pub collection: Collection,

    /// Records in display order.
    pub records: Vec<VideoRecord>,

    /// Byte span of the whole assignment, from `const` through `;`.
    pub span: Range<usize>,
}

/// Parse target collection out of catalog file text.
///
/// # Errors
///
/// - Return [`ParseError::NotFound`] if no assignment for the collection
///   exists.
/// - Return [`ParseError::Unterminated`] if the array never closes, or is not
///   followed by `;`.
/// - Return [`ParseError::Syntax`] if a string, comment, or escape sequence
///   inside the array is broken.
/// - Return [`ParseError::MalformedEntry`] if an entry cannot be decomposed
///   into the expected fields.
#[instrument(skip(text), level = "debug")]
pub fn parse_collection(text: &str, collection: Collection) -> Result<ParsedCollection> {
    let name = collection.name();
    let (start, body_start) = locate(text, name).ok_or(ParseError::NotFound { name })?;
    let (body, end) = scan_array(text, name, start, body_start)?;
    let records = EntryDecoder::new(text, collection, &body).decode()?;
    debug!("parsed {} entries from {name} at {start}..{end}", records.len());

    Ok(ParsedCollection {
        collection,
        records,
        span: start..end,
    })
}

/// Find `const <name> = [`, returning the offset of `const` and the offset
/// just past `[`.
///
/// The whole file is tokenized from the start, so declarations that sit inside
/// comments or string literals never match. Code outside the catalog arrays
/// may not lex cleanly, e.g., apostrophes in markup text, so lexing resumes
/// past any broken string instead of giving up.
fn locate(text: &str, name: &str) -> Option<(usize, usize)> {
    let mut lexer = Lexer::lenient(text, 0);
    let mut window: VecDeque<Lexeme> = VecDeque::with_capacity(4);
    loop {
        let lexeme = match lexer.next_lexeme() {
            Ok(Some(lexeme)) => lexeme,
            Ok(None) => return None,
            Err(LexError {
                kind: LexErrorKind::UnterminatedComment,
                ..
            }) => return None,
            Err(LexError {
                kind: LexErrorKind::UnterminatedString,
                offset,
            }) => {
                // INVARIANT: Broken strings are reported at a single-byte quote or `$`.
                lexer.pos = offset + 1;
                window.clear();
                continue;
            }
            Err(_) => {
                window.clear();
                continue;
            }
        };

        if window.len() == 4 {
            window.pop_front();
        }
        window.push_back(lexeme);

        if let [keyword, ident, assign, open] = window.make_contiguous() {
            if keyword.token == Token::Ident("const".into())
                && ident.token == Token::Ident(name.into())
                && assign.token == Token::Punct('=')
                && open.token == Token::Punct('[')
            {
                return Some((keyword.start, open.end));
            }
        }
    }
}

/// Collect array body up to the balancing `]`, and find the end of the
/// assignment after `;`.
fn scan_array(
    text: &str,
    name: &'static str,
    start: usize,
    body_start: usize,
) -> Result<(Vec<Lexeme>, usize)> {
    let unterminated = || ParseError::Unterminated {
        name,
        line: line_of(text, start),
    };
    let syntax = |error: LexError| ParseError::Syntax {
        name,
        line: line_of(text, error.offset),
        reason: error.kind.to_string(),
    };

    let mut lexer = Lexer::new(text, body_start);
    let mut body = Vec::new();
    let mut depth = 0usize;
    loop {
        let lexeme = lexer.next_lexeme().map_err(syntax)?.ok_or_else(unterminated)?;
        match lexeme.token {
            Token::Punct('[' | '{' | '(') => depth += 1,
            Token::Punct(']') if depth == 0 => break,
            Token::Punct(']' | '}' | ')') if depth > 0 => depth -= 1,
            Token::Punct(close @ ('}' | ')')) => {
                return Err(ParseError::Syntax {
                    name,
                    line: line_of(text, lexeme.start),
                    reason: format!("unbalanced {close:?}"),
                });
            }
            _ => {}
        }
        body.push(lexeme);
    }

    match lexer.next_lexeme().map_err(syntax)? {
        Some(Lexeme {
            token: Token::Punct(';'),
            end,
            ..
        }) => Ok((body, end)),
        _ => Err(unterminated()),
    }
}

/// Decode flat object literals into video records.
struct EntryDecoder<'a> {
    text: &'a str,
    collection: Collection,
    tokens: &'a [Lexeme],
    cursor: usize,
    index: usize,
}

impl<'a> EntryDecoder<'a> {
    fn new(text: &'a str, collection: Collection, tokens: &'a [Lexeme]) -> Self {
        Self {
            text,
            collection,
            tokens,
            cursor: 0,
            index: 0,
        }
    }

    fn decode(mut self) -> Result<Vec<VideoRecord>> {
        let mut records = Vec::new();
        while let Some(lexeme) = self.bump() {
            if lexeme.token != Token::Punct('{') {
                return Err(self.malformed(lexeme.start, "expected `{` to open entry"));
            }

            records.push(self.decode_entry(lexeme.start)?);
            self.index += 1;

            match self.bump() {
                None => break,
                Some(Lexeme {
                    token: Token::Punct(','),
                    ..
                }) => continue,
                Some(lexeme) => {
                    return Err(self.malformed(lexeme.start, "expected `,` between entries"));
                }
            }
        }

        Ok(records)
    }

    fn decode_entry(&mut self, open: usize) -> Result<VideoRecord> {
        let mut fields = EntryFields::default();
        loop {
            let Some(lexeme) = self.bump() else {
                return Err(self.malformed(open, "entry is never closed"));
            };
            let key = match &lexeme.token {
                Token::Punct('}') => break,
                Token::Ident(key) | Token::Str(key) => key.clone(),
                _ => return Err(self.malformed(lexeme.start, "expected field name")),
            };
            let key_at = lexeme.start;

            match self.bump() {
                Some(Lexeme {
                    token: Token::Punct(':'),
                    ..
                }) => {}
                _ => return Err(self.malformed(key_at, format!("expected `:` after {key:?}"))),
            }

            let value = match self.bump() {
                Some(Lexeme {
                    token: Token::Str(value),
                    ..
                }) => value.clone(),
                Some(Lexeme {
                    token: Token::Punct('{' | '['),
                    start,
                    ..
                }) => {
                    let reason = format!("nested value for {key:?} is not supported");
                    return Err(self.malformed(*start, reason));
                }
                _ => {
                    let reason = format!("expected string value for {key:?}");
                    return Err(self.malformed(key_at, reason));
                }
            };

            fields
                .insert(&key, value)
                .map_err(|reason| self.malformed(key_at, reason))?;

            match self.bump() {
                Some(Lexeme {
                    token: Token::Punct(','),
                    ..
                }) => continue,
                Some(Lexeme {
                    token: Token::Punct('}'),
                    ..
                }) => break,
                Some(lexeme) => {
                    let start = lexeme.start;
                    return Err(self.malformed(start, "expected `,` or `}` after field"));
                }
                None => return Err(self.malformed(open, "entry is never closed")),
            }
        }

        fields
            .into_record(self.collection)
            .map_err(|reason| self.malformed(open, reason))
    }

    fn bump(&mut self) -> Option<&'a Lexeme> {
        let lexeme = self.tokens.get(self.cursor)?;
        self.cursor += 1;
        Some(lexeme)
    }

    fn malformed(&self, offset: usize, reason: impl Into<String>) -> ParseError {
        ParseError::MalformedEntry {
            name: self.collection.name(),
            index: self.index,
            line: line_of(self.text, offset),
            reason: reason.into(),
        }
    }
}

/// Field values of one entry as they are read.
#[derive(Debug, Default)]
struct EntryFields {
    title: Option<String>,
    category: Option<String>,
    video_url: Option<String>,
    embed_id: Option<String>,
    thumbnail: Option<String>,
    platform: Option<String>,
}

impl EntryFields {
    fn insert(&mut self, key: &str, value: String) -> std::result::Result<(), String> {
        let slot = match key {
            "title" => &mut self.title,
            "category" => &mut self.category,
            "videoUrl" => &mut self.video_url,
            "embedId" => &mut self.embed_id,
            "thumbnail" => &mut self.thumbnail,
            "platform" => &mut self.platform,
            _ => return Err(format!("unknown field {key:?}")),
        };

        if slot.replace(value).is_some() {
            return Err(format!("duplicate field {key:?}"));
        }

        Ok(())
    }

    fn into_record(self, collection: Collection) -> std::result::Result<VideoRecord, String> {
        let title = self.title.ok_or("missing field \"title\"")?;
        let video_url = self.video_url.ok_or("missing field \"videoUrl\"")?;
        let embed_id = self.embed_id.ok_or("missing field \"embedId\"")?;

        // INVARIANT: Category present if and only if collection is projects.
        match (collection.requires_category(), self.category.is_some()) {
            (true, false) => return Err("missing field \"category\"".into()),
            (false, true) => return Err(format!("field \"category\" not allowed in {collection}")),
            _ => {}
        }

        Ok(VideoRecord {
            thumbnail: self.thumbnail.unwrap_or_else(|| thumbnail_url(&embed_id)),
            platform: self.platform.unwrap_or_else(|| STREAMABLE.into()),
            title,
            category: self.category,
            video_url,
            embed_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Punct(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Lexeme {
    token: Token,
    start: usize,
    end: usize,
}

/// Tokenizer for the literal subset of the catalog file.
struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    lenient: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            pos,
            lenient: false,
        }
    }

    /// Lexer that steps over template interpolation instead of rejecting it.
    fn lenient(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            pos,
            lenient: true,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, offset: usize, kind: LexErrorKind) -> LexError {
        LexError { offset, kind }
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
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
                    let start = self.pos;
                    self.pos += 2;
                    match self.src[self.pos..].find("*/") {
                        Some(close) => self.pos += close + 2,
                        None => return Err(self.error(start, LexErrorKind::UnterminatedComment)),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_lexeme(&mut self) -> Result<Option<Lexeme>, LexError> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let token = match c {
            '"' | '\'' | '`' => Token::Str(self.read_string(c, start)?),
            c if is_ident_start(c) => {
                while self.peek().is_some_and(is_ident_char) {
                    self.bump();
                }
                Token::Ident(self.src[start..self.pos].to_string())
            }
            c => Token::Punct(c),
        };

        Ok(Some(Lexeme {
            token,
            start,
            end: self.pos,
        }))
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<String, LexError> {
        let mut out = String::new();
        loop {
            let at = self.pos;
            let c = self
                .bump()
                .ok_or_else(|| self.error(start, LexErrorKind::UnterminatedString))?;
            match c {
                c if c == quote => return Ok(out),
                '\\' => self.read_escape(&mut out)?,
                '\n' if quote != '`' => {
                    return Err(self.error(start, LexErrorKind::UnterminatedString));
                }
                '$' if quote == '`' && self.peek() == Some('{') && self.lenient => {
                    self.skip_interpolation(at)?;
                }
                '$' if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error(at, LexErrorKind::Interpolation));
                }
                c => out.push(c),
            }
        }
    }

    fn skip_interpolation(&mut self, at: usize) -> Result<(), LexError> {
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' if depth == 1 => return Ok(()),
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        Err(self.error(at, LexErrorKind::UnterminatedString))
    }

    fn read_escape(&mut self, out: &mut String) -> Result<(), LexError> {
        let at = self.pos - 1;
        let c = self
            .bump()
            .ok_or_else(|| self.error(at, LexErrorKind::BadEscape))?;
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // Line continuation.
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            'x' => {
                let code = self.read_hex(2, at)?;
                let code = char::from_u32(code)
                    .ok_or_else(|| self.error(at, LexErrorKind::BadEscape))?;
                out.push(code);
            }
            'u' => {
                let code = self.read_unicode(at)?;
                out.push(code);
            }
            other => out.push(other),
        }

        Ok(())
    }

    fn read_unicode(&mut self, at: usize) -> Result<char, LexError> {
        if self.peek() == Some('{') {
            self.bump();
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[digits_start..self.pos];
            if self.bump() != Some('}') || digits.is_empty() {
                return Err(self.error(at, LexErrorKind::BadEscape));
            }
            return u32::from_str_radix(digits, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| self.error(at, LexErrorKind::BadEscape));
        }

        let high = self.read_hex(4, at)?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high).ok_or_else(|| self.error(at, LexErrorKind::BadEscape));
        }

        // INVARIANT: High surrogate must be followed by an escaped low surrogate.
        if self.bump() != Some('\\') || self.bump() != Some('u') {
            return Err(self.error(at, LexErrorKind::BadEscape));
        }
        let low = self.read_hex(4, at)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(self.error(at, LexErrorKind::BadEscape));
        }

        char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
            .ok_or_else(|| self.error(at, LexErrorKind::BadEscape))
    }

    fn read_hex(&mut self, count: usize, at: usize) -> Result<u32, LexError> {
        let start = self.pos;
        for _ in 0..count {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => {}
                _ => return Err(self.error(at, LexErrorKind::BadEscape)),
            }
        }

        u32::from_str_radix(&self.src[start..self.pos], 16)
            .map_err(|_| self.error(at, LexErrorKind::BadEscape))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LexError {
    offset: usize,
    kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("invalid escape sequence")]
    BadEscape,

    #[error("template interpolation is not supported")]
    Interpolation,
}

/// Catalog file is not in the expected shape.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No assignment for the collection exists.
    #[error("could not find {name} array in catalog file")]
    NotFound { name: &'static str },

    /// Array is never closed, or not terminated by `;`.
    #[error("{name} array starting at line {line} is not terminated by `];`")]
    Unterminated { name: &'static str, line: usize },

    /// Broken string, comment, or escape sequence inside the array.
    #[error("{name} array has invalid syntax at line {line}: {reason}")]
    Syntax {
        name: &'static str,
        line: usize,
        reason: String,
    },

    /// Entry cannot be decomposed into the expected fields.
    #[error("{name} entry {index} at line {line} is malformed: {reason}")]
    MalformedEntry {
        name: &'static str,
        index: usize,
        line: usize,
        reason: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ParseError> = std::result::Result<T, E>;
