//! The character/string/class literal sublanguage.
//!
//! Every site that consumes byte content — `c[...]` selectors, `->[...]`,
//! call arguments, `PREPEND`, inline emit payloads — routes through this
//! one parser. The normalised result carries both the set form (`chars`)
//! and the ordered string form (`bytes`), plus markers for parameter
//! references and classes that only the generated parser can resolve.

use indexmap::IndexSet;

/// Failure while parsing a character expression. The caller attaches the
/// originating line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CharError(pub String);

/// Unicode classes resolved at parse time by the generated parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialClass {
    XidStart,
    XidCont,
    XlblStart,
    XlblCont,
}

impl SpecialClass {
    pub fn name(self) -> &'static str {
        match self {
            SpecialClass::XidStart => "xid_start",
            SpecialClass::XidCont => "xid_cont",
            SpecialClass::XlblStart => "xlbl_start",
            SpecialClass::XlblCont => "xlbl_cont",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "XID_START" => Some(SpecialClass::XidStart),
            "XID_CONT" => Some(SpecialClass::XidCont),
            "XLBL_START" => Some(SpecialClass::XlblStart),
            "XLBL_CONT" => Some(SpecialClass::XlblCont),
            _ => None,
        }
    }
}

/// Normalised result of parsing a character expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharSpec {
    /// Unordered byte set (class form).
    pub chars: IndexSet<u8>,
    /// Unicode class, when one appeared.
    pub special_class: Option<SpecialClass>,
    /// `:name` parameter reference.
    pub param_ref: Option<String>,
    /// Ordered byte string (literal form). Empty for pure classes built
    /// from named ranges.
    pub bytes: Vec<u8>,
    /// Set when the whole expression was a single predefined ASCII class
    /// (`letter`, `digit`, …); lets the generator call a helper instead of
    /// expanding the byte set.
    pub named_class: Option<String>,
}

impl CharSpec {
    pub fn is_empty_class(&self) -> bool {
        self.chars.is_empty()
            && self.special_class.is_none()
            && self.param_ref.is_none()
            && self.bytes.is_empty()
    }

    /// The unique byte this expression matches, when there is one.
    pub fn single_byte(&self) -> Option<u8> {
        if self.special_class.is_some() || self.param_ref.is_some() {
            return None;
        }
        if self.bytes.len() == 1 {
            return Some(self.bytes[0]);
        }
        if self.chars.len() == 1 && self.bytes.is_empty() {
            return self.chars.iter().next().copied();
        }
        None
    }

    /// Canonical byte literal for the single-byte form. The empty class
    /// produces the never-match sentinel `0u8`.
    pub fn emit_byte(&self) -> Result<String, CharError> {
        self.reject_unresolved("a byte literal")?;
        if self.is_empty_class() {
            return Ok("0u8".to_string());
        }
        match self.single_byte() {
            Some(b) => Ok(rust_byte_literal(b)),
            None => Err(CharError("expected a single character".to_string())),
        }
    }

    /// Canonical byte-string literal. The empty class produces `b""`.
    pub fn emit_bytes(&self) -> Result<String, CharError> {
        self.reject_unresolved("a byte string")?;
        if !self.bytes.is_empty() {
            return Ok(rust_bytes_literal(&self.bytes));
        }
        let set: Vec<u8> = self.chars.iter().copied().collect();
        Ok(rust_bytes_literal(&set))
    }

    fn reject_unresolved(&self, wanted: &str) -> Result<(), CharError> {
        if let Some(class) = self.special_class {
            return Err(CharError(format!(
                "class `{}` cannot be coerced to {wanted}",
                class.name()
            )));
        }
        if let Some(param) = &self.param_ref {
            return Err(CharError(format!(
                "parameter `:{param}` cannot be coerced to {wanted}"
            )));
        }
        Ok(())
    }
}

/// Parses a character expression: a quoted literal, a `<...>` class, a
/// `:param` reference, or a bare identifier.
pub fn parse(input: &str) -> Result<CharSpec, CharError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(CharSpec::default());
    }
    if let Some(stripped) = input.strip_prefix(':') {
        return parse_param_ref(stripped);
    }
    if input.starts_with('\'') || input.starts_with('"') {
        let bytes = parse_quoted(input)?;
        let chars: IndexSet<u8> = bytes.iter().copied().collect();
        return Ok(CharSpec {
            chars,
            bytes,
            ..CharSpec::default()
        });
    }
    if let Some(inner) = input.strip_prefix('<') {
        let inner = inner
            .strip_suffix('>')
            .ok_or_else(|| CharError("unterminated class, expected `>`".to_string()))?;
        return parse_class(inner);
    }
    parse_bare(input)
}

fn parse_param_ref(name: &str) -> Result<CharSpec, CharError> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(CharError(format!("malformed parameter reference `:{name}`")));
    }
    Ok(CharSpec {
        param_ref: Some(name.to_string()),
        ..CharSpec::default()
    })
}

/// `<...>` contents: space-separated tokens, each parsed recursively,
/// unioned into one set.
fn parse_class(inner: &str) -> Result<CharSpec, CharError> {
    let mut spec = CharSpec::default();
    let tokens = split_class_tokens(inner)?;
    let single = tokens.len() == 1;
    for token in tokens {
        let sub = parse(&token)?;
        if sub.param_ref.is_some() {
            return Err(CharError(format!(
                "parameter reference `{token}` is not allowed inside a class"
            )));
        }
        if let Some(class) = sub.special_class {
            spec.special_class = Some(class);
        }
        spec.chars.extend(sub.chars.iter().copied());
        if single {
            spec.named_class = sub.named_class;
        }
    }
    spec.bytes = spec.chars.iter().copied().collect();
    if spec.special_class.is_some() {
        spec.bytes.clear();
    }
    Ok(spec)
}

fn parse_bare(input: &str) -> Result<CharSpec, CharError> {
    if let Some(class) = SpecialClass::from_name(input) {
        return Ok(CharSpec {
            special_class: Some(class),
            ..CharSpec::default()
        });
    }
    if let Some(bytes) = named_range(input) {
        let chars: IndexSet<u8> = bytes.iter().copied().collect();
        return Ok(CharSpec {
            chars,
            ..CharSpec::default()
        });
    }
    if let Some((name, bytes)) = named_class(input) {
        let chars: IndexSet<u8> = bytes.iter().copied().collect();
        return Ok(CharSpec {
            chars,
            named_class: Some(name.to_string()),
            ..CharSpec::default()
        });
    }
    if let Some(b) = reserved_char(input) {
        let mut chars = IndexSet::new();
        chars.insert(b);
        return Ok(CharSpec {
            chars,
            bytes: vec![b],
            ..CharSpec::default()
        });
    }
    // every bare character stands for itself
    for c in input.chars() {
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(CharError(format!(
                "unquoted special character `{c}` (quote it or use a named class)"
            )));
        }
    }
    let bytes: Vec<u8> = input.bytes().collect();
    let chars: IndexSet<u8> = bytes.iter().copied().collect();
    Ok(CharSpec {
        chars,
        bytes,
        ..CharSpec::default()
    })
}

fn named_range(name: &str) -> Option<Vec<u8>> {
    let range = match name {
        "0-9" => b'0'..=b'9',
        "1-9" => b'1'..=b'9',
        "a-z" => b'a'..=b'z',
        "A-Z" => b'A'..=b'Z',
        "a-f" => b'a'..=b'f',
        "A-F" => b'A'..=b'F',
        _ => return None,
    };
    Some(range.collect())
}

fn named_class(name: &str) -> Option<(&'static str, Vec<u8>)> {
    match name.to_ascii_uppercase().as_str() {
        "LETTER" => Some(("letter", ascii_letters())),
        "DIGIT" => Some(("digit", (b'0'..=b'9').collect())),
        "HEX_DIGIT" => {
            let mut bytes: Vec<u8> = (b'0'..=b'9').collect();
            bytes.extend(b'a'..=b'f');
            bytes.extend(b'A'..=b'F');
            Some(("hex_digit", bytes))
        }
        "LABEL_CONT" => {
            let mut bytes = ascii_letters();
            bytes.extend(b'0'..=b'9');
            bytes.push(b'_');
            bytes.push(b'-');
            Some(("label_cont", bytes))
        }
        "WS" => Some(("ws", vec![b' ', b'\t'])),
        "NL" => Some(("nl", vec![b'\n', b'\r'])),
        _ => None,
    }
}

fn ascii_letters() -> Vec<u8> {
    let mut bytes: Vec<u8> = (b'a'..=b'z').collect();
    bytes.extend(b'A'..=b'Z');
    bytes
}

/// Reserved single-character names, usable where quoting would be noisy.
fn reserved_char(name: &str) -> Option<u8> {
    match name {
        "P" => Some(b'|'),
        "L" => Some(b'<'),
        "R" => Some(b'>'),
        "LB" => Some(b'['),
        "RB" => Some(b']'),
        "LP" => Some(b'('),
        "RP" => Some(b')'),
        "SQ" => Some(b'\''),
        "DQ" => Some(b'"'),
        "BS" => Some(b'\\'),
        _ => None,
    }
}

/// Decodes a quoted literal (single or double quotes) into bytes.
fn parse_quoted(input: &str) -> Result<Vec<u8>, CharError> {
    let mut chars = input.chars();
    let quote = chars.next().expect("caller checked the prefix");
    let mut bytes = Vec::new();
    loop {
        let c = chars
            .next()
            .ok_or_else(|| CharError("unterminated quote".to_string()))?;
        if c == quote {
            break;
        }
        if c == '\\' {
            let esc = chars
                .next()
                .ok_or_else(|| CharError("dangling escape".to_string()))?;
            match esc {
                'n' => bytes.push(b'\n'),
                't' => bytes.push(b'\t'),
                'r' => bytes.push(b'\r'),
                '0' => bytes.push(0),
                '\\' => bytes.push(b'\\'),
                '\'' => bytes.push(b'\''),
                '"' => bytes.push(b'"'),
                'x' => {
                    let hi = chars.next();
                    let lo = chars.next();
                    let (Some(hi), Some(lo)) = (hi, lo) else {
                        return Err(CharError("truncated \\x escape".to_string()));
                    };
                    let value = u8::from_str_radix(&format!("{hi}{lo}"), 16)
                        .map_err(|_| CharError(format!("invalid \\x escape `\\x{hi}{lo}`")))?;
                    bytes.push(value);
                }
                'u' => {
                    let mut hex = String::new();
                    for _ in 0..4 {
                        hex.push(
                            chars
                                .next()
                                .ok_or_else(|| CharError("truncated \\u escape".to_string()))?,
                        );
                    }
                    let value = u32::from_str_radix(&hex, 16)
                        .map_err(|_| CharError(format!("invalid \\u escape `\\u{hex}`")))?;
                    let c = char::from_u32(value)
                        .ok_or_else(|| CharError(format!("invalid code point `\\u{hex}`")))?;
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                other => return Err(CharError(format!("invalid escape `\\{other}`"))),
            }
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }
    if chars.next().is_some() {
        return Err(CharError("trailing characters after quoted literal".to_string()));
    }
    Ok(bytes)
}

/// Splits `<...>` contents on whitespace, keeping quoted tokens whole.
fn split_class_tokens(inner: &str) -> Result<Vec<String>, CharError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in inner.chars() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' if quote.is_some() => {
                escaped = true;
                current.push(c);
            }
            '\'' | '"' => {
                match quote {
                    None => quote = Some(c),
                    Some(q) if q == c => quote = None,
                    Some(_) => {}
                }
                current.push(c);
            }
            c if c.is_whitespace() && quote.is_none() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if quote.is_some() {
        return Err(CharError("unterminated quote in class".to_string()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Renders a byte as a Rust byte literal.
pub fn rust_byte_literal(b: u8) -> String {
    match b {
        b'\n' => "b'\\n'".to_string(),
        b'\t' => "b'\\t'".to_string(),
        b'\r' => "b'\\r'".to_string(),
        b'\\' => "b'\\\\'".to_string(),
        b'\'' => "b'\\''".to_string(),
        0x20..=0x7e => format!("b'{}'", b as char),
        _ => format!("b'\\x{b:02x}'"),
    }
}

/// Renders a byte slice as a Rust byte-string literal.
pub fn rust_bytes_literal(bytes: &[u8]) -> String {
    let mut out = String::from("b\"");
    for &b in bytes {
        match b {
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('"');
    out
}
