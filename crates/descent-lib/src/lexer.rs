//! Tokeniser for `.desc` sources.
//!
//! A source is a sequence of `|`-delimited parts, possibly spanning lines.
//! Lexing runs in three stages: comment stripping (newline-preserving),
//! pipe splitting (quote- and bracket-aware), and part parsing into
//! `(tag, id, rest)` records. Every token keeps the line number of its
//! first non-blank character.

use crate::util::is_screaming_snake;

/// One `|`-delimited part of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Directive or command head (`function`, `c`, `->`, `/emit_pair(:k)`, …).
    pub tag: String,
    /// Content of the bracket immediately following the tag, if any.
    pub id: String,
    /// Free text after the bracket (or after the tag when there is none).
    pub rest: String,
    pub lineno: u32,
}

/// Lexical failure, fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LexError {
    pub line: u32,
    pub message: String,
}

impl LexError {
    fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Tokenises a complete source into a flat token stream.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let stripped = strip_comments(source);
    let mut tokens = Vec::new();
    for part in split_parts(&stripped)? {
        if let Some(token) = parse_part(&part.text, part.lineno)? {
            tokens.push(token);
        }
    }
    Ok(tokens)
}

/// Removes `;` comments, preserving line structure.
///
/// A `;` starts a comment unless it sits inside single quotes, double
/// quotes, `[...]`, or `(...)`. The stripped text contains exactly the
/// newlines of the original.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut bracket_depth = 0u32;
    let mut paren_depth = 0u32;

    while let Some(c) = chars.next() {
        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }
        match c {
            '\\' if in_single || in_double => {
                escaped = true;
                out.push(c);
            }
            '\'' if !in_double => {
                in_single = !in_single;
                out.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                out.push(c);
            }
            '[' if !in_single && !in_double => {
                bracket_depth += 1;
                out.push(c);
            }
            ']' if !in_single && !in_double => {
                bracket_depth = bracket_depth.saturating_sub(1);
                out.push(c);
            }
            '(' if !in_single && !in_double => {
                paren_depth += 1;
                out.push(c);
            }
            ')' if !in_single && !in_double => {
                paren_depth = paren_depth.saturating_sub(1);
                out.push(c);
            }
            ';' if !in_single && !in_double && bracket_depth == 0 && paren_depth == 0 => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

struct RawPart {
    text: String,
    lineno: u32,
}

/// Splits on `|`, skipping pipes inside `[...]` or quoted literals.
fn split_parts(source: &str) -> Result<Vec<RawPart>, LexError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_line: Option<u32> = None;

    let mut line = 1u32;
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut quote_open_line = 0u32;
    let mut bracket_depth = 0u32;
    let mut bracket_open_line = 0u32;

    for c in source.chars() {
        if c == '\n' {
            line += 1;
        }
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' if in_single || in_double => {
                escaped = true;
                current.push(c);
            }
            '\'' if !in_double => {
                if !in_single {
                    quote_open_line = line;
                }
                in_single = !in_single;
                note_start(&mut current_line, line);
                current.push(c);
            }
            '"' if !in_single => {
                if !in_double {
                    quote_open_line = line;
                }
                in_double = !in_double;
                note_start(&mut current_line, line);
                current.push(c);
            }
            '[' if !in_single && !in_double => {
                if bracket_depth == 0 {
                    bracket_open_line = line;
                }
                bracket_depth += 1;
                note_start(&mut current_line, line);
                current.push(c);
            }
            ']' if !in_single && !in_double => {
                bracket_depth = bracket_depth.saturating_sub(1);
                note_start(&mut current_line, line);
                current.push(c);
            }
            '|' if !in_single && !in_double && bracket_depth == 0 => {
                flush_part(&mut parts, &mut current, &mut current_line);
            }
            _ => {
                if !c.is_whitespace() {
                    note_start(&mut current_line, line);
                }
                current.push(c);
            }
        }
    }

    if in_single || in_double {
        return Err(LexError::new(quote_open_line, "unterminated quote"));
    }
    if bracket_depth > 0 {
        return Err(LexError::new(bracket_open_line, "unterminated bracket"));
    }
    flush_part(&mut parts, &mut current, &mut current_line);
    Ok(parts)
}

fn note_start(current_line: &mut Option<u32>, line: u32) {
    if current_line.is_none() {
        *current_line = Some(line);
    }
}

fn flush_part(parts: &mut Vec<RawPart>, current: &mut String, current_line: &mut Option<u32>) {
    let text = std::mem::take(current);
    let trimmed = text.trim();
    if let Some(lineno) = current_line.take() {
        if !trimmed.is_empty() {
            parts.push(RawPart {
                text: trimmed.to_string(),
                lineno,
            });
        }
    }
}

/// Splits a part into `(tag, id, rest)`.
///
/// The tag runs to the first space or `[`, except that a parenthesised
/// tail (`/name(args)`, `TERM(2)`, `Float('x')`) is captured whole, with
/// case preserved inside the parentheses. SCREAMING_SNAKE heads are
/// lowercased so `LETTER` and `letter` read the same downstream;
/// PascalCase heads are kept (they denote inline event emits).
fn parse_part(text: &str, lineno: u32) -> Result<Option<Token>, LexError> {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0usize;

    // tag
    let mut tag = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut paren_depth = 0u32;
    while pos < chars.len() {
        let c = chars[pos];
        if escaped {
            escaped = false;
            tag.push(c);
            pos += 1;
            continue;
        }
        match c {
            '\\' if in_single || in_double => {
                escaped = true;
                tag.push(c);
            }
            '\'' if !in_double => {
                in_single = !in_single;
                tag.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                tag.push(c);
            }
            '(' if !in_single && !in_double => {
                paren_depth += 1;
                tag.push(c);
            }
            ')' if !in_single && !in_double => {
                paren_depth = paren_depth.saturating_sub(1);
                tag.push(c);
            }
            ' ' | '\t' | '\n' | '\r' if paren_depth == 0 && !in_single && !in_double => break,
            '[' if paren_depth == 0 && !in_single && !in_double => break,
            _ => tag.push(c),
        }
        pos += 1;
    }
    if in_single || in_double {
        return Err(LexError::new(lineno, "unterminated quote"));
    }
    let tag = normalize_tag(&tag);

    // id: only when `[` immediately follows the tag
    let mut id = String::new();
    if pos < chars.len() && chars[pos] == '[' {
        pos += 1;
        let mut depth = 1u32;
        let mut in_single = false;
        let mut in_double = false;
        let mut escaped = false;
        let mut closed = false;
        while pos < chars.len() {
            let c = chars[pos];
            pos += 1;
            if escaped {
                escaped = false;
                id.push(c);
                continue;
            }
            match c {
                '\\' if in_single || in_double => {
                    escaped = true;
                    id.push(c);
                }
                '\'' if !in_double => {
                    in_single = !in_single;
                    id.push(c);
                }
                '"' if !in_single => {
                    in_double = !in_double;
                    id.push(c);
                }
                '[' if !in_single && !in_double => {
                    depth += 1;
                    id.push(c);
                }
                ']' if !in_single && !in_double => {
                    depth -= 1;
                    if depth == 0 {
                        closed = true;
                        break;
                    }
                    id.push(c);
                }
                _ => id.push(c),
            }
        }
        if !closed {
            return Err(LexError::new(lineno, "unterminated bracket"));
        }
    }

    let rest: String = chars[pos..].iter().collect();
    let token = Token {
        tag,
        id: id.trim().to_string(),
        rest: rest.trim().to_string(),
        lineno,
    };
    if token.tag.is_empty() && token.id.is_empty() && token.rest.is_empty() {
        return Ok(None);
    }
    Ok(Some(token))
}

/// Lowercases a SCREAMING_SNAKE head while preserving any parenthesised
/// tail (and anything that is not SCREAMING_SNAKE, notably PascalCase
/// inline-emit names and `/call(...)` forms).
fn normalize_tag(tag: &str) -> String {
    let (head, tail) = match tag.find('(') {
        Some(i) => tag.split_at(i),
        None => (tag, ""),
    };
    if is_screaming_snake(head) {
        format!("{}{}", head.to_lowercase(), tail)
    } else {
        tag.to_string()
    }
}
