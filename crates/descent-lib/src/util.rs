/// Convert an identifier to PascalCase.
///
/// Words are split on `_`, `-`, space, and lowercase→uppercase boundaries,
/// so existing PascalCase and camelCase inputs keep their interior casing.
/// All-caps words are normalized (`FOO_BAR` → `FooBar`).
///
/// # Examples
/// ```
/// use descent_lib::util::to_pascal_case;
/// assert_eq!(to_pascal_case("string_value"), "StringValue");
/// assert_eq!(to_pascal_case("fooBar"), "FooBar");
/// assert_eq!(to_pascal_case("FooBar"), "FooBar");  // idempotent
/// ```
pub fn to_pascal_case(s: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in s.chars() {
        if matches!(c, '_' | '-' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut result = String::with_capacity(s.len());
    for word in words {
        let all_caps = word.len() > 1 && !word.chars().any(|c| c.is_ascii_lowercase());
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.push(first.to_ascii_uppercase());
            for c in chars {
                if all_caps {
                    result.push(c.to_ascii_lowercase());
                } else {
                    result.push(c);
                }
            }
        }
    }
    result
}

/// True when the text is SCREAMING_SNAKE_CASE (letters all uppercase,
/// at least one letter, only `A-Z0-9_` allowed).
pub fn is_screaming_snake(s: &str) -> bool {
    !s.is_empty()
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Splits a DSL expression into coarse tokens: quoted literals (kept with
/// their quotes), identifier/number/`:param` runs, and operator runs.
/// Whitespace separates; it is not required around operators.
pub fn tokenize_expr(expr: &str) -> Vec<String> {
    #[derive(PartialEq)]
    enum Kind {
        None,
        Word,
        Op,
    }
    fn is_word(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_' || c == ':'
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut kind = Kind::None;
    let mut chars = expr.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' || c == '"' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            kind = Kind::None;
            let mut lit = String::new();
            lit.push(c);
            let mut escaped = false;
            for n in chars.by_ref() {
                lit.push(n);
                if escaped {
                    escaped = false;
                } else if n == '\\' {
                    escaped = true;
                } else if n == c {
                    break;
                }
            }
            tokens.push(lit);
            continue;
        }
        if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            kind = Kind::None;
            continue;
        }
        let next_kind = if is_word(c) { Kind::Word } else { Kind::Op };
        if next_kind != kind && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        kind = next_kind;
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
