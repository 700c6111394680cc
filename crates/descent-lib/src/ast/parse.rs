//! Recursive-descent parser over the token stream.

use crate::lexer::Token;

use super::{
    Case, Clause, Command, EmitArg, EmitSpec, Function, Keywords, Machine, ReturnSpec, Selector,
    State, TypeDecl,
};

/// Structural failure, fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

impl ParseError {
    fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Parses a token stream into a [`Machine`].
pub fn parse(tokens: &[Token]) -> Result<Machine, ParseError> {
    Parser { tokens, pos: 0 }.parse_machine()
}

const CLASS_TAGS: &[&str] = &[
    "letter",
    "digit",
    "hex_digit",
    "label_cont",
    "ws",
    "nl",
    "xid_start",
    "xid_cont",
    "xlbl_start",
    "xlbl_cont",
];

fn is_top_level(tag: &str) -> bool {
    matches!(
        tag,
        "parser" | "entry-point" | "entry_point" | "type" | "function" | "keywords"
    )
}

fn is_class_tag(tag: &str) -> bool {
    CLASS_TAGS.contains(&tag)
}

fn is_case_starter(tag: &str) -> bool {
    tag == "c" || tag == "default" || tag_head(tag) == "if" || is_class_tag(tag)
}

/// A token that reads as an action: calls, arrows, inline emits, and the
/// keyword commands (which reach here already lowercased). These may open
/// a bare-action case.
fn is_command_like(tag: &str) -> bool {
    if tag.starts_with('/') || tag.starts_with("->") || tag.starts_with(">>") {
        return true;
    }
    if tag.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return true;
    }
    matches!(tag_head(tag), "return" | "err" | "mark" | "term")
        || (matches!(tag_head(tag), "keywords" | "prepend" | "emit") && tag.contains('('))
}

fn tag_head(tag: &str) -> &str {
    match tag.find('(') {
        Some(i) => &tag[..i],
        None => tag,
    }
}

/// Content between the first `(` and the matching final `)` of a tag.
fn paren_inner(tag: &str, line: u32) -> Result<Option<String>, ParseError> {
    let Some(start) = tag.find('(') else {
        return Ok(None);
    };
    let tail = &tag[start..];
    if !tail.ends_with(')') {
        return Err(ParseError::new(line, format!("unbalanced parentheses in `{tag}`")));
    }
    Ok(Some(tail[1..tail.len() - 1].trim().to_string()))
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_machine(&mut self) -> Result<Machine, ParseError> {
        let mut machine = Machine {
            name: "parser".to_string(),
            ..Machine::default()
        };
        while let Some(tok) = self.peek() {
            match tok.tag.as_str() {
                "parser" => {
                    let tok = self.next().unwrap();
                    if tok.id.is_empty() {
                        return Err(ParseError::new(tok.lineno, "parser directive needs a name"));
                    }
                    machine.name = tok.id.clone();
                }
                "entry-point" | "entry_point" => {
                    let tok = self.next().unwrap();
                    if tok.id.is_empty() {
                        return Err(ParseError::new(
                            tok.lineno,
                            "entry-point directive needs a function name",
                        ));
                    }
                    machine.entry_point = tok.id.trim_start_matches('/').to_string();
                    machine.entry_point_lineno = tok.lineno;
                }
                "type" => {
                    let tok = self.next().unwrap();
                    if tok.id.is_empty() {
                        return Err(ParseError::new(tok.lineno, "type directive needs a name"));
                    }
                    machine.types.push(TypeDecl {
                        name: tok.id.clone(),
                        kind: tok.rest.to_lowercase(),
                        lineno: tok.lineno,
                    });
                }
                "function" => {
                    let func = self.parse_function()?;
                    machine.functions.push(func);
                }
                "keywords" => {
                    let block = self.parse_keywords()?;
                    machine.keywords.push(block);
                }
                other => {
                    return Err(ParseError::new(
                        tok.lineno,
                        format!("unknown top-level directive `{other}`"),
                    ));
                }
            }
        }
        Ok(machine)
    }

    fn parse_function(&mut self) -> Result<Function, ParseError> {
        let header = self.next().unwrap().clone();
        let (name, params) = parse_signature(&header.id, header.lineno)?;
        let return_type = parse_return_type(&header.rest, header.lineno)?;
        let mut func = Function {
            name,
            params,
            return_type,
            entry_actions: Vec::new(),
            states: Vec::new(),
            eof_handler: None,
            lineno: header.lineno,
        };
        let mut state: Option<State> = None;

        while let Some(tok) = self.peek() {
            let tag = tok.tag.clone();
            let lineno = tok.lineno;
            if is_top_level(&tag) {
                break;
            }
            if tag == "state" {
                let tok = self.next().unwrap();
                if let Some(s) = state.take() {
                    func.states.push(s);
                }
                let name = tok.id.trim().trim_start_matches(':');
                state = Some(State {
                    name: (!name.is_empty()).then(|| name.to_string()),
                    cases: Vec::new(),
                    eof_handler: None,
                    lineno,
                });
                continue;
            }
            if tag == "eof" {
                let tok = self.next().unwrap().clone();
                let mut commands = Vec::new();
                if !tok.rest.is_empty() {
                    commands.push(parse_inline_command(&tok.rest, tok.lineno)?);
                }
                self.collect_commands(&mut commands, false)?;
                let slot = match state.as_mut() {
                    Some(s) => &mut s.eof_handler,
                    None => &mut func.eof_handler,
                };
                if slot.is_some() {
                    return Err(ParseError::new(lineno, "duplicate eof handler"));
                }
                *slot = Some(commands);
                continue;
            }
            if tag_head(&tag) == "if" && state.is_none() {
                let cmd = self.parse_conditional()?;
                func.entry_actions.push(cmd);
                continue;
            }
            if tag == "else" {
                return Err(ParseError::new(lineno, "`else` without a preceding `if`"));
            }
            if is_case_starter(&tag) || is_command_like(&tag) {
                if state.is_none() {
                    state = Some(State {
                        name: None,
                        cases: Vec::new(),
                        eof_handler: None,
                        lineno,
                    });
                }
                let case = self.parse_case()?;
                state.as_mut().unwrap().cases.push(case);
                continue;
            }
            if state.is_none() {
                let tok = self.next().unwrap().clone();
                func.entry_actions.push(self.token_as_command(&tok)?);
                continue;
            }
            return Err(ParseError::new(
                lineno,
                format!("unexpected token `{tag}` inside function `{}`", func.name),
            ));
        }

        if let Some(s) = state.take() {
            func.states.push(s);
        }
        Ok(func)
    }

    fn parse_case(&mut self) -> Result<Case, ParseError> {
        let tok = self.next().unwrap().clone();
        let lineno = tok.lineno;
        let head = tag_head(&tok.tag).to_string();

        let (selector, mut commands, rest_text) = if head == "c" {
            (Selector::Chars(tok.id.clone()), Vec::new(), tok.rest.clone())
        } else if head == "default" {
            (Selector::Default, Vec::new(), tok.rest.clone())
        } else if head == "if" {
            (
                Selector::Condition(tok.id.clone()),
                Vec::new(),
                tok.rest.clone(),
            )
        } else if is_class_tag(&head) {
            (Selector::Class(head.clone()), Vec::new(), tok.rest.clone())
        } else {
            let first = self.token_as_command(&tok)?;
            (Selector::Bare, vec![first], String::new())
        };

        let mut substate = None;
        let mut rest_text = rest_text.trim().to_string();
        if let Some(stripped) = rest_text.strip_prefix('.') {
            let mut parts = stripped.splitn(2, char::is_whitespace);
            let label = parts.next().unwrap_or_default();
            if label.is_empty() {
                return Err(ParseError::new(lineno, "empty substate label"));
            }
            substate = Some(label.to_string());
            rest_text = parts.next().unwrap_or_default().trim().to_string();
        }
        if !rest_text.is_empty() {
            commands.push(parse_inline_command(&rest_text, lineno)?);
        }

        let stop_after_return = matches!(selector, Selector::Condition(_));
        let already_returned =
            stop_after_return && matches!(commands.last(), Some(Command::Return(_)));
        if !already_returned {
            self.collect_commands(&mut commands, stop_after_return)?;
        }
        Ok(Case {
            selector,
            substate,
            commands,
            lineno,
        })
    }

    /// Accumulates command tokens until the next case-starter or
    /// structural token. With `stop_after_return`, a `return` ends the
    /// run (so a following command-like token starts a fresh case).
    fn collect_commands(
        &mut self,
        commands: &mut Vec<Command>,
        stop_after_return: bool,
    ) -> Result<(), ParseError> {
        while let Some(tok) = self.peek() {
            let tag = &tok.tag;
            if is_top_level(tag)
                || *tag == "state"
                || *tag == "eof"
                || *tag == "else"
                || is_case_starter(tag)
            {
                break;
            }
            let tok = self.next().unwrap().clone();
            let cmd = self.token_as_command(&tok)?;
            let is_return = matches!(cmd, Command::Return(_));
            commands.push(cmd);
            if is_return && stop_after_return {
                break;
            }
        }
        Ok(())
    }

    /// `if[cond] cmds… [else cmds…]` at function level.
    fn parse_conditional(&mut self) -> Result<Command, ParseError> {
        let tok = self.next().unwrap().clone();
        let mut clauses = Vec::new();

        let mut commands = Vec::new();
        if !tok.rest.is_empty() {
            commands.push(parse_inline_command(&tok.rest, tok.lineno)?);
        }
        self.collect_commands(&mut commands, false)?;
        clauses.push(Clause {
            condition: Some(tok.id.clone()),
            commands,
        });

        if self.peek().is_some_and(|t| t.tag == "else") {
            let else_tok = self.next().unwrap().clone();
            let mut commands = Vec::new();
            if !else_tok.rest.is_empty() {
                commands.push(parse_inline_command(&else_tok.rest, else_tok.lineno)?);
            }
            self.collect_commands(&mut commands, false)?;
            clauses.push(Clause {
                condition: None,
                commands,
            });
        }
        Ok(Command::Conditional(clauses))
    }

    fn parse_keywords(&mut self) -> Result<Keywords, ParseError> {
        let header = self.next().unwrap().clone();
        if header.id.is_empty() {
            return Err(ParseError::new(header.lineno, "keywords block needs a name"));
        }
        let mut block = Keywords {
            name: header.id.clone(),
            fallback_func: None,
            fallback_args: Vec::new(),
            mappings: Vec::new(),
            lineno: header.lineno,
        };
        while let Some(tok) = self.peek() {
            match tok.tag.as_str() {
                "k" => {
                    let tok = self.next().unwrap();
                    if tok.id.is_empty() || tok.rest.is_empty() {
                        return Err(ParseError::new(
                            tok.lineno,
                            "keyword mapping needs `k[keyword] EventName`",
                        ));
                    }
                    block.mappings.push((tok.id.clone(), tok.rest.clone()));
                }
                "fallback" => {
                    let tok = self.next().unwrap();
                    let (name, args) = parse_call_text(&tok.id, tok.lineno)?;
                    block.fallback_func = Some(name);
                    block.fallback_args = args;
                }
                _ => break,
            }
        }
        Ok(block)
    }

    /// Classifies a non-selector token as a command.
    fn token_as_command(&mut self, tok: &Token) -> Result<Command, ParseError> {
        let tag = tok.tag.as_str();
        let line = tok.lineno;
        let head = tag_head(tag);
        match head {
            "" => parse_inline_command(&tok.rest, line),
            "->" => {
                if !tok.id.is_empty() {
                    Ok(Command::AdvanceTo(tok.id.clone()))
                } else if tok.rest.is_empty() {
                    Ok(Command::Advance)
                } else {
                    Err(ParseError::new(
                        line,
                        format!("unexpected text after `->`: `{}`", tok.rest),
                    ))
                }
            }
            _ if tag.starts_with(">>") => {
                let mut target = tag[2..].trim().to_string();
                if target.is_empty() {
                    target = tok.rest.trim().to_string();
                }
                Ok(Command::Transition(
                    (!target.is_empty()).then_some(target),
                ))
            }
            "return" => parse_return(&tok.rest, line),
            "mark" => Ok(Command::Mark),
            "term" => {
                let offset = match paren_inner(tag, line)? {
                    Some(inner) => parse_offset(&inner, line)?,
                    None => 0,
                };
                Ok(Command::Term(offset))
            }
            "prepend" => {
                let inner = paren_inner(tag, line)?.ok_or_else(|| {
                    ParseError::new(line, "PREPEND needs an argument: `PREPEND(x)`")
                })?;
                Ok(Command::Prepend(inner))
            }
            "keywords" => {
                let inner = paren_inner(tag, line)?.ok_or_else(|| {
                    ParseError::new(line, "KEYWORDS needs a block name: `KEYWORDS(name)`")
                })?;
                Ok(Command::KeywordsLookup(inner))
            }
            "emit" => {
                let inner = paren_inner(tag, line)?
                    .ok_or_else(|| ParseError::new(line, "emit needs a type: `emit(Type)`"))?;
                Ok(Command::InlineEmit(parse_emit_spec(&inner, line)?))
            }
            "err" => Ok(Command::Error(
                (!tok.id.is_empty()).then(|| tok.id.clone()),
            )),
            _ if tag.starts_with('/') => {
                let (name, args) = parse_call_text(tag, line)?;
                if name == "error" {
                    return Ok(Command::Error(args.into_iter().next()));
                }
                Ok(Command::Call { name, args })
            }
            _ if head.chars().next().is_some_and(|c| c.is_ascii_uppercase()) => {
                Ok(Command::InlineEmit(parse_emit_spec(tag, line)?))
            }
            _ => {
                let text = if tok.rest.is_empty() {
                    tag.to_string()
                } else {
                    format!("{tag} {}", tok.rest)
                };
                parse_inline_command(&text, line)
            }
        }
    }
}

/// Parses a single command from free text (a token `rest` or an entry
/// action).
pub(crate) fn parse_inline_command(text: &str, line: u32) -> Result<Command, ParseError> {
    let t = text.trim();
    if t.is_empty() {
        return Ok(Command::Noop);
    }
    if let Some(tail) = t.strip_prefix("->") {
        let tail = tail.trim();
        if tail.is_empty() {
            return Ok(Command::Advance);
        }
        if let Some(inner) = tail.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return Ok(Command::AdvanceTo(inner.to_string()));
        }
        return Err(ParseError::new(line, format!("malformed advance `{t}`")));
    }
    if let Some(tail) = t.strip_prefix(">>") {
        let target = tail.trim();
        return Ok(Command::Transition(
            (!target.is_empty()).then(|| target.to_string()),
        ));
    }
    let lower_head = head_word(t).to_lowercase();
    match lower_head.as_str() {
        "mark" => return Ok(Command::Mark),
        "term" => {
            let rest = &t[4..];
            let offset = match rest.trim().strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
                Some(inner) => parse_offset(inner, line)?,
                None if rest.trim().is_empty() => 0,
                None => return Err(ParseError::new(line, format!("malformed TERM `{t}`"))),
            };
            return Ok(Command::Term(offset));
        }
        "prepend" => {
            let inner = inner_parens(t, line)?;
            return Ok(Command::Prepend(inner));
        }
        "keywords" => {
            let inner = inner_parens(t, line)?;
            return Ok(Command::KeywordsLookup(inner));
        }
        "emit" => {
            let inner = inner_parens(t, line)?;
            return Ok(Command::InlineEmit(parse_emit_spec(&inner, line)?));
        }
        "return" => return parse_return(t[6..].trim(), line),
        "err" => {
            if t.contains('(') {
                let inner = inner_parens(t, line)?;
                return Ok(Command::Error((!inner.is_empty()).then_some(inner)));
            }
            if let Some(inner) = t
                .strip_prefix("err")
                .and_then(|s| s.trim().strip_prefix('['))
                .and_then(|s| s.strip_suffix(']'))
            {
                let inner = inner.trim().to_string();
                return Ok(Command::Error((!inner.is_empty()).then_some(inner)));
            }
            return Ok(Command::Error(None));
        }
        _ => {}
    }
    if t.starts_with('/') {
        let (name, args) = parse_call_text(t, line)?;
        if name == "error" {
            return Ok(Command::Error(args.into_iter().next()));
        }
        return Ok(Command::Call { name, args });
    }
    if t.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return Ok(Command::InlineEmit(parse_emit_spec(t, line)?));
    }
    if let Some(cmd) = parse_assignment(t, line)? {
        return Ok(cmd);
    }
    Err(ParseError::new(line, format!("unrecognised command `{t}`")))
}

/// First run of non-space, non-paren, non-bracket characters.
fn head_word(t: &str) -> &str {
    t.split(|c: char| c.is_whitespace() || c == '(' || c == '[')
        .next()
        .unwrap_or_default()
}

/// Content between the first `(` and the final `)` of free text.
fn inner_parens(t: &str, line: u32) -> Result<String, ParseError> {
    let Some(start) = t.find('(') else {
        return Err(ParseError::new(line, format!("expected parentheses in `{t}`")));
    };
    let tail = t[start..].trim();
    if !tail.ends_with(')') {
        return Err(ParseError::new(line, format!("unbalanced parentheses in `{t}`")));
    }
    Ok(tail[1..tail.len() - 1].trim().to_string())
}

fn parse_return(rest: &str, line: u32) -> Result<Command, ParseError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(Command::Return(None));
    }
    if rest.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return Ok(Command::Return(Some(ReturnSpec::Emit(parse_emit_spec(
            rest, line,
        )?))));
    }
    Ok(Command::Return(Some(ReturnSpec::Value(rest.to_string()))))
}

fn parse_emit_spec(text: &str, line: u32) -> Result<EmitSpec, ParseError> {
    let text = text.trim();
    let (head, inner) = match text.find('(') {
        Some(i) => {
            let tail = &text[i..];
            if !tail.ends_with(')') {
                return Err(ParseError::new(line, format!("malformed emit `{text}`")));
            }
            (&text[..i], Some(tail[1..tail.len() - 1].trim().to_string()))
        }
        None => (text, None),
    };
    if head.is_empty()
        || !head.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        || !head.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ParseError::new(line, format!("malformed emit type `{text}`")));
    }
    let arg = match inner {
        None => None,
        Some(inner) if inner.is_empty() => None,
        Some(inner) if inner == "USE_MARK" => Some(EmitArg::UseMark),
        Some(inner) => Some(EmitArg::Literal(inner)),
    };
    Ok(EmitSpec {
        type_name: head.to_string(),
        arg,
    })
}

fn parse_offset(text: &str, line: u32) -> Result<u32, ParseError> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| ParseError::new(line, format!("malformed TERM offset `{text}`")))
}

/// `name` or `name(:a, 'x', <>)` with `/` prefix.
fn parse_call_text(text: &str, line: u32) -> Result<(String, Vec<String>), ParseError> {
    let body = text.trim().trim_start_matches('/');
    let (name, args) = match body.find('(') {
        Some(i) => {
            let tail = &body[i..];
            if !tail.ends_with(')') {
                return Err(ParseError::new(line, format!("unbalanced call `{text}`")));
            }
            (&body[..i], split_args(&tail[1..tail.len() - 1]))
        }
        None => (body, Vec::new()),
    };
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ParseError::new(line, format!("malformed call `{text}`")));
    }
    Ok((name.to_string(), args))
}

/// Splits an argument list on top-level commas, respecting quotes,
/// `<...>` classes, and nested parentheses.
pub(crate) fn split_args(inner: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut angle_depth = 0u32;
    let mut paren_depth = 0u32;

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
            '<' if quote.is_none() => {
                angle_depth += 1;
                current.push(c);
            }
            '>' if quote.is_none() && angle_depth > 0 => {
                angle_depth -= 1;
                current.push(c);
            }
            '(' if quote.is_none() => {
                paren_depth += 1;
                current.push(c);
            }
            ')' if quote.is_none() => {
                paren_depth = paren_depth.saturating_sub(1);
                current.push(c);
            }
            ',' if quote.is_none() && angle_depth == 0 && paren_depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let last = current.trim();
    if !last.is_empty() {
        args.push(last.to_string());
    }
    args
}

fn parse_assignment(t: &str, line: u32) -> Result<Option<Command>, ParseError> {
    for (op, kind) in [("+=", 0u8), ("-=", 1u8)] {
        if let Some(i) = find_top_level(t, op) {
            let var = t[..i].trim();
            let expr = t[i + 2..].trim();
            check_var(var, t, line)?;
            let cmd = match kind {
                0 => Command::AddAssign {
                    var: var.to_string(),
                    expr: expr.to_string(),
                },
                _ => Command::SubAssign {
                    var: var.to_string(),
                    expr: expr.to_string(),
                },
            };
            return Ok(Some(cmd));
        }
    }
    if let Some(i) = find_plain_assign(t) {
        let var = t[..i].trim();
        let expr = t[i + 1..].trim();
        check_var(var, t, line)?;
        return Ok(Some(Command::Assign {
            var: var.to_string(),
            expr: expr.to_string(),
        }));
    }
    Ok(None)
}

fn check_var(var: &str, full: &str, line: u32) -> Result<(), ParseError> {
    let ok = !var.is_empty()
        && var
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !var.chars().next().unwrap().is_ascii_digit();
    if ok {
        Ok(())
    } else {
        Err(ParseError::new(
            line,
            format!("malformed assignment target in `{full}`"),
        ))
    }
}

fn find_top_level(t: &str, needle: &str) -> Option<usize> {
    let bytes = t.as_bytes();
    let needle = needle.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i + needle.len() <= bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'\'' || b == b'"' {
                    quote = Some(b);
                } else if &bytes[i..i + needle.len()] == needle {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Position of a bare `=` (not part of `==`, `!=`, `<=`, `>=`, `+=`, `-=`).
fn find_plain_assign(t: &str) -> Option<usize> {
    let bytes = t.as_bytes();
    let mut quote: Option<u8> = None;
    for i in 0..bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'\'' || b == b'"' {
                    quote = Some(b);
                } else if b == b'=' {
                    let prev = i.checked_sub(1).map(|j| bytes[j]);
                    let next = bytes.get(i + 1);
                    if next == Some(&b'=') {
                        return None;
                    }
                    if matches!(prev, Some(b'=') | Some(b'!') | Some(b'<') | Some(b'>'))
                        || matches!(prev, Some(b'+') | Some(b'-'))
                    {
                        return None;
                    }
                    return Some(i);
                }
            }
        }
    }
    None
}

fn parse_signature(id: &str, line: u32) -> Result<(String, Vec<String>), ParseError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ParseError::new(line, "function directive needs a name"));
    }
    let (name, params) = match id.find('(') {
        Some(i) => {
            let tail = &id[i..];
            if !tail.ends_with(')') {
                return Err(ParseError::new(line, format!("unbalanced signature `{id}`")));
            }
            let inner = &tail[1..tail.len() - 1];
            let mut params = Vec::new();
            for piece in split_args(inner) {
                let p = piece.trim_start_matches(':');
                if p.is_empty() || !p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(ParseError::new(
                        line,
                        format!("malformed parameter `{piece}` in `{id}`"),
                    ));
                }
                params.push(p.to_string());
            }
            (&id[..i], params)
        }
        None => (id, Vec::new()),
    };
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ParseError::new(line, format!("malformed function name `{name}`")));
    }
    Ok((name.to_string(), params))
}

fn parse_return_type(rest: &str, line: u32) -> Result<Option<String>, ParseError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(None);
    }
    if let Some(ty) = rest.strip_prefix("->") {
        let ty = ty.trim();
        if ty.is_empty() || !ty.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ParseError::new(line, format!("malformed return type `{rest}`")));
        }
        return Ok(Some(ty.to_string()));
    }
    Err(ParseError::new(
        line,
        format!("unexpected text after function header: `{rest}`"),
    ))
}
