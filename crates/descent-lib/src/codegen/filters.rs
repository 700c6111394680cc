//! Template filters: the only extension surface shared with templates.

use minijinja::Environment;

use crate::ast::parse::split_args;
use crate::chars;
use crate::util::to_pascal_case;

pub(super) fn register(env: &mut Environment<'_>) {
    env.add_filter("escape_rust_char", escape_rust_char);
    env.add_filter("pascalcase", |s: String| pascalcase(&s));
    env.add_filter("rust_expr", |s: String| rust_expr(&s));
    env.add_filter("transform_call_args", |s: String| transform_call_args(&s));
}

/// Byte value → Rust byte-literal token.
fn escape_rust_char(b: u32) -> String {
    chars::rust_byte_literal(b as u8)
}

/// Identifier → PascalCase, preserving existing PascalCase runs.
pub fn pascalcase(s: &str) -> String {
    to_pascal_case(s)
}

/// Expands a DSL expression into Rust source.
///
/// Handles, in one scan: `/name(args)` calls (args transformed
/// recursively, so a `self.col()` introduced for an argument never
/// confuses the outer parse), the special variables `COL`/`LINE`/`PREV`,
/// `:param` references, `<P>`-style escape tokens, and character
/// literals. Existing `b'…'`/`b"…"` literals pass through untouched.
pub fn rust_expr(expr: &str) -> String {
    let chars_vec: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len());
    let mut i = 0;

    while i < chars_vec.len() {
        let c = chars_vec[i];

        // /name(args) → self.parse_name(args, on_event)
        if c == '/' && peek_ident(&chars_vec, i + 1) {
            let (name, after_name) = read_ident(&chars_vec, i + 1);
            let (inner, next) = match chars_vec.get(after_name) {
                Some('(') => read_parens(&chars_vec, after_name),
                _ => (None, after_name),
            };
            let args = inner.as_deref().map(transform_call_args).unwrap_or_default();
            if args.is_empty() {
                out.push_str(&format!("self.parse_{name}(on_event)"));
            } else {
                out.push_str(&format!("self.parse_{name}({args}, on_event)"));
            }
            i = next;
            continue;
        }

        if c == '\'' || c == '"' {
            let (literal, next) = read_quoted(&chars_vec, i);
            out.push_str(&render_char_literal(&literal));
            i = next;
            continue;
        }

        if c == '<' {
            if let Some((byte, next)) = read_escape_token(&chars_vec, i) {
                out.push_str(&chars::rust_byte_literal(byte));
                i = next;
                continue;
            }
        }

        if c == ':' && peek_ident(&chars_vec, i + 1) {
            let (name, next) = read_ident(&chars_vec, i + 1);
            out.push_str(&name);
            i = next;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let (word, next) = read_ident(&chars_vec, i);
            // an adjacent quote after `b` is an already-rendered literal
            if word == "b" && matches!(chars_vec.get(next), Some('\'') | Some('"')) {
                let (literal, after) = read_quoted(&chars_vec, next);
                out.push('b');
                out.push_str(&literal);
                i = after;
                continue;
            }
            match word.as_str() {
                "COL" => out.push_str("self.col()"),
                "LINE" => out.push_str("self.line as i32"),
                "PREV" => out.push_str("self.prev()"),
                _ => out.push_str(&word),
            }
            i = next;
            continue;
        }

        out.push(c);
        i += 1;
    }
    out
}

/// Splits an argument list on top-level commas (quotes and `<>` classes
/// kept whole) and expands each argument.
pub fn transform_call_args(args: &str) -> String {
    split_args(args)
        .iter()
        .map(|arg| rust_expr(arg))
        .collect::<Vec<_>>()
        .join(", ")
}

fn peek_ident(chars: &[char], i: usize) -> bool {
    chars
        .get(i)
        .is_some_and(|c| c.is_ascii_alphabetic() || *c == '_')
}

fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while chars
        .get(end)
        .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_')
    {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

/// Reads a balanced `(...)` group, respecting quoted content. Returns the
/// inner text and the index past the closing paren.
fn read_parens(chars: &[char], start: usize) -> (Option<String>, usize) {
    let mut depth = 0u32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut inner = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if escaped {
            escaped = false;
            inner.push(c);
            continue;
        }
        match c {
            '\\' if quote.is_some() => {
                escaped = true;
                inner.push(c);
            }
            '\'' | '"' => {
                match quote {
                    None => quote = Some(c),
                    Some(q) if q == c => quote = None,
                    Some(_) => {}
                }
                inner.push(c);
            }
            '(' if quote.is_none() => {
                depth += 1;
                if depth > 1 {
                    inner.push(c);
                }
            }
            ')' if quote.is_none() => {
                depth -= 1;
                if depth == 0 {
                    return (Some(inner), i);
                }
                inner.push(c);
            }
            _ => inner.push(c),
        }
    }
    (Some(inner), i)
}

/// Reads a quoted literal including its quotes.
fn read_quoted(chars: &[char], start: usize) -> (String, usize) {
    let quote = chars[start];
    let mut literal = String::new();
    literal.push(quote);
    let mut escaped = false;
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        literal.push(c);
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            break;
        }
    }
    (literal, i)
}

/// A quoted DSL literal becomes a byte literal (single byte) or a
/// byte-string literal. Unparseable input passes through unchanged.
fn render_char_literal(literal: &str) -> String {
    match chars::parse(literal) {
        Ok(spec) => {
            if spec.bytes.len() == 1 {
                chars::rust_byte_literal(spec.bytes[0])
            } else {
                chars::rust_bytes_literal(&spec.bytes)
            }
        }
        Err(_) => literal.to_string(),
    }
}

/// `<P>` and friends: reserved single-character names usable inside
/// expressions without quoting.
fn read_escape_token(chars: &[char], start: usize) -> Option<(u8, usize)> {
    let mut end = start + 1;
    while chars.get(end).is_some_and(|c| c.is_ascii_alphanumeric()) {
        end += 1;
    }
    if chars.get(end) != Some(&'>') || end == start + 1 {
        return None;
    }
    let name: String = chars[start + 1..end].iter().collect();
    let byte = match name.as_str() {
        "P" => b'|',
        "L" => b'<',
        "R" => b'>',
        "LB" => b'[',
        "RB" => b']',
        "LP" => b'(',
        "RP" => b')',
        "SQ" => b'\'',
        "DQ" => b'"',
        "BS" => b'\\',
        _ => return None,
    };
    Some((byte, end + 1))
}
