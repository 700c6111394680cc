//! AST → IR lowering and pass orchestration.

use indexmap::IndexSet;

use crate::ast;
use crate::chars::{self, CharSpec};
use crate::util::to_pascal_case;

use super::{
    infer, params, Case, Clause, Command, Emit, EmitKind, EmitPayload, Function, Keywords,
    Mapping, Parser, State, TypeInfo, TypeKind,
};

/// Shared lowering context: the enclosing function's parameters and the
/// PascalCase names of events that carry content.
struct LowerCtx<'a> {
    params: &'a [String],
    content_events: &'a IndexSet<String>,
}

/// Semantic failure during IR construction, fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BuildError {
    pub line: u32,
    pub message: String,
}

impl BuildError {
    pub(super) fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Maximum byte count for `->[...]`, limited to chained multi-byte search.
const ADVANCE_TO_MAX: usize = 6;

/// Builds the IR from a parsed machine and runs every inference pass.
pub fn build(machine: &ast::Machine) -> Result<Parser, BuildError> {
    let types = lower_types(machine);
    let content_events: IndexSet<String> = types
        .iter()
        .filter(|t| t.kind == TypeKind::Content)
        .map(|t| to_pascal_case(&t.name))
        .collect();

    let mut functions = machine
        .functions
        .iter()
        .map(|f| lower_function(f, &types, &content_events))
        .collect::<Result<Vec<_>, _>>()?;

    for func in &mut functions {
        infer::infer_locals(func);
        for state in &mut func.states {
            infer::infer_state_flags(state);
        }
        infer::infer_expects(func);
        infer::fixup_inline_returns(func);
        func.returns_value = returns_value(func);
    }
    params::infer_param_types(&mut functions);
    params::collect_prepend_values(&mut functions);
    params::rewrite_call_args(&mut functions)?;

    let custom_error_codes = collect_error_codes(&functions);
    let keywords = machine
        .keywords
        .iter()
        .map(|block| lower_keywords(block, &content_events))
        .collect();

    Ok(Parser {
        name: machine.name.clone(),
        entry_point: machine.entry_point.clone(),
        entry_point_lineno: machine.entry_point_lineno,
        types,
        functions,
        keywords,
        custom_error_codes,
    })
}

fn lower_types(machine: &ast::Machine) -> Vec<TypeInfo> {
    machine
        .types
        .iter()
        .map(|decl| {
            let kind = match decl.kind.as_str() {
                "bracket" => TypeKind::Bracket,
                "content" => TypeKind::Content,
                _ => TypeKind::Internal,
            };
            TypeInfo {
                name: decl.name.clone(),
                kind,
                emits_start: kind == TypeKind::Bracket,
                emits_end: kind == TypeKind::Bracket,
                lineno: decl.lineno,
                kind_raw: decl.kind.clone(),
            }
        })
        .collect()
}

fn lower_function(
    func: &ast::Function,
    types: &[TypeInfo],
    content_events: &IndexSet<String>,
) -> Result<Function, BuildError> {
    let return_kind = func
        .return_type
        .as_deref()
        .and_then(|name| types.iter().find(|t| t.name == name))
        .map(|t| t.kind);
    let emits_events = matches!(return_kind, Some(TypeKind::Bracket | TypeKind::Content));
    let ctx = LowerCtx {
        params: &func.params,
        content_events,
    };

    Ok(Function {
        name: func.name.clone(),
        params: func.params.clone(),
        return_type: func.return_type.clone(),
        return_kind,
        returns_value: false,
        param_types: func
            .params
            .iter()
            .map(|p| (p.clone(), Default::default()))
            .collect(),
        locals: Default::default(),
        local_init_values: Default::default(),
        entry_actions: lower_commands(&func.entry_actions, &ctx, func.lineno)?,
        states: func
            .states
            .iter()
            .map(|s| lower_state(s, &ctx))
            .collect::<Result<Vec<_>, _>>()?,
        eof_handler: func
            .eof_handler
            .as_ref()
            .map(|cmds| lower_commands(cmds, &ctx, func.lineno))
            .transpose()?,
        expects_char: None,
        emits_content_on_close: false,
        emits_events,
        prepend_values: Default::default(),
        lineno: func.lineno,
    })
}

fn lower_state(state: &ast::State, ctx: &LowerCtx<'_>) -> Result<State, BuildError> {
    Ok(State {
        name: state.name.clone(),
        cases: state
            .cases
            .iter()
            .map(|c| lower_case(c, ctx))
            .collect::<Result<Vec<_>, _>>()?,
        eof_handler: state
            .eof_handler
            .as_ref()
            .map(|cmds| lower_commands(cmds, ctx, state.lineno))
            .transpose()?,
        scan_chars: Vec::new(),
        is_self_looping: false,
        has_default: false,
        is_unconditional: false,
        newline_injected: false,
        lineno: state.lineno,
    })
}

fn lower_case(case: &ast::Case, ctx: &LowerCtx<'_>) -> Result<Case, BuildError> {
    let mut lowered = Case {
        chars: Vec::new(),
        class: None,
        special_class: None,
        param_ref: None,
        condition: None,
        is_default: false,
        is_bare: false,
        substate: case.substate.clone(),
        commands: lower_commands(&case.commands, ctx, case.lineno)?,
        lineno: case.lineno,
    };
    match &case.selector {
        ast::Selector::Chars(raw) => {
            let spec = parse_chars(raw, case.lineno)?;
            lowered.chars = spec.chars.iter().copied().collect();
            lowered.class = spec.named_class.clone();
            lowered.special_class = spec.special_class.map(|c| c.name().to_string());
            lowered.param_ref = spec.param_ref;
        }
        ast::Selector::Class(name) => {
            if name.starts_with("xid_") || name.starts_with("xlbl_") {
                lowered.special_class = Some(name.clone());
            } else {
                let spec = parse_chars(name, case.lineno)?;
                lowered.chars = spec.chars.iter().copied().collect();
                lowered.class = Some(name.clone());
            }
        }
        ast::Selector::Default => lowered.is_default = true,
        ast::Selector::Condition(cond) => lowered.condition = Some(cond.clone()),
        ast::Selector::Bare => lowered.is_bare = true,
    }
    Ok(lowered)
}

fn lower_commands(
    commands: &[ast::Command],
    ctx: &LowerCtx<'_>,
    line: u32,
) -> Result<Vec<Command>, BuildError> {
    commands
        .iter()
        .map(|cmd| lower_command(cmd, ctx, line))
        .collect()
}

fn lower_command(
    command: &ast::Command,
    ctx: &LowerCtx<'_>,
    line: u32,
) -> Result<Command, BuildError> {
    Ok(match command {
        ast::Command::Advance => Command::Advance,
        ast::Command::AdvanceTo(raw) => {
            let spec = parse_chars(raw, line)?;
            if spec.special_class.is_some() {
                return Err(BuildError::new(
                    line,
                    format!("advance-to cannot use a runtime-resolved class: `{raw}`"),
                ));
            }
            if spec.param_ref.is_some() {
                return Err(BuildError::new(
                    line,
                    format!("advance-to cannot use a parameter reference: `{raw}`"),
                ));
            }
            let bytes = literal_bytes(&spec);
            if bytes.is_empty() {
                return Err(BuildError::new(line, "advance-to needs at least one byte"));
            }
            if bytes.len() > ADVANCE_TO_MAX {
                return Err(BuildError::new(
                    line,
                    format!(
                        "advance-to supports at most {ADVANCE_TO_MAX} bytes, got {}",
                        bytes.len()
                    ),
                ));
            }
            Command::AdvanceTo { bytes }
        }
        ast::Command::Mark => Command::Mark,
        ast::Command::Term(offset) => Command::Term { offset: *offset },
        ast::Command::Transition(target) => Command::Transition {
            target: target.clone(),
        },
        ast::Command::Return(spec) => {
            let (emit, value) = match spec {
                None => (None, None),
                Some(ast::ReturnSpec::Emit(emit)) => (Some(lower_emit(emit, ctx, line)?), None),
                Some(ast::ReturnSpec::Value(value)) => (None, Some(value.clone())),
            };
            Command::Return {
                emit,
                value,
                suppress_auto_emit: false,
            }
        }
        ast::Command::Call { name, args } => {
            for arg in args {
                check_bare_collision(arg, ctx.params, line, "call argument")?;
            }
            Command::Call {
                func: name.clone(),
                args: args.clone(),
            }
        }
        ast::Command::Error(code) => Command::Error { code: code.clone() },
        ast::Command::Assign { var, expr } => Command::Assign {
            var: var.clone(),
            expr: expr.clone(),
        },
        ast::Command::AddAssign { var, expr } => Command::AddAssign {
            var: var.clone(),
            expr: expr.clone(),
        },
        ast::Command::SubAssign { var, expr } => Command::SubAssign {
            var: var.clone(),
            expr: expr.clone(),
        },
        ast::Command::Prepend(raw) => {
            let raw = raw.trim();
            if let Some(param) = raw.strip_prefix(':') {
                Command::PrependParam {
                    param: param.to_string(),
                }
            } else {
                check_bare_collision(raw, ctx.params, line, "PREPEND argument")?;
                let spec = parse_chars(raw, line)?;
                if spec.special_class.is_some() {
                    return Err(BuildError::new(
                        line,
                        format!("PREPEND cannot use a runtime-resolved class: `{raw}`"),
                    ));
                }
                let bytes = literal_bytes(&spec);
                if bytes.is_empty() {
                    return Err(BuildError::new(line, "PREPEND needs at least one byte"));
                }
                Command::Prepend { bytes }
            }
        }
        ast::Command::KeywordsLookup(name) => Command::KeywordsLookup { name: name.clone() },
        ast::Command::InlineEmit(spec) => Command::InlineEmit {
            emit: lower_emit(spec, ctx, line)?,
        },
        ast::Command::Conditional(clauses) => Command::Conditional {
            clauses: clauses
                .iter()
                .map(|clause| {
                    Ok(Clause {
                        condition: clause.condition.clone(),
                        commands: lower_commands(&clause.commands, ctx, line)?,
                    })
                })
                .collect::<Result<Vec<_>, BuildError>>()?,
        },
        ast::Command::Noop => Command::Noop,
    })
}

fn lower_emit(spec: &ast::EmitSpec, ctx: &LowerCtx<'_>, line: u32) -> Result<Emit, BuildError> {
    let (kind, literal) = match &spec.arg {
        None => (EmitKind::Bare, None),
        Some(ast::EmitArg::UseMark) => (EmitKind::Mark, None),
        Some(ast::EmitArg::Literal(raw)) => {
            let parsed = parse_chars(raw, line)?;
            let rendered = parsed
                .emit_bytes()
                .map_err(|e| BuildError::new(line, e.0))?;
            (EmitKind::Literal, Some(rendered))
        }
    };
    Ok(Emit {
        type_name: spec.type_name.clone(),
        kind,
        payload: event_payload(&spec.type_name, ctx.content_events),
        literal,
    })
}

/// Content events carry a slice; everything else (Start/End/Anon markers,
/// builtins, undeclared names) is span-only.
fn event_payload(event: &str, content_events: &IndexSet<String>) -> EmitPayload {
    if content_events.contains(event) {
        EmitPayload::Content
    } else {
        EmitPayload::Span
    }
}

fn lower_keywords(block: &ast::Keywords, content_events: &IndexSet<String>) -> Keywords {
    Keywords {
        name: block.name.clone(),
        fallback_func: block.fallback_func.clone(),
        fallback_args: block.fallback_args.clone(),
        mappings: block
            .mappings
            .iter()
            .map(|(keyword, event)| Mapping {
                keyword: keyword.clone(),
                event: event.clone(),
                payload: event_payload(event, content_events),
            })
            .collect(),
        lineno: block.lineno,
    }
}

/// True when any `return` in the function carries a value expression.
fn returns_value(func: &Function) -> bool {
    let mut found = false;
    super::walk_function_commands(func, &mut |cmd| {
        if let Command::Return { value: Some(_), .. } = cmd {
            found = true;
        }
    });
    found
}

pub(super) fn parse_chars(raw: &str, line: u32) -> Result<CharSpec, BuildError> {
    chars::parse(raw).map_err(|e| BuildError::new(line, e.0))
}

/// Ordered literal bytes of a spec: the string form when present, the set
/// form otherwise.
fn literal_bytes(spec: &CharSpec) -> Vec<u8> {
    if !spec.bytes.is_empty() {
        spec.bytes.clone()
    } else {
        spec.chars.iter().copied().collect()
    }
}

/// A bare identifier that names a parameter is almost always a mistyped
/// `:name` reference.
fn check_bare_collision(
    arg: &str,
    params: &[String],
    line: u32,
    context: &str,
) -> Result<(), BuildError> {
    let arg = arg.trim();
    let is_bare = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && arg.parse::<i64>().is_err();
    if is_bare && params.iter().any(|p| p == arg) {
        return Err(BuildError::new(
            line,
            format!("{context} `{arg}` matches a parameter name; write `:{arg}` to reference it"),
        ));
    }
    Ok(())
}

fn collect_error_codes(functions: &[Function]) -> Vec<String> {
    let mut codes: IndexSet<String> = IndexSet::new();
    for func in functions {
        super::walk_function_commands(func, &mut |cmd| {
            if let Command::Error { code: Some(code) } = cmd {
                codes.insert(code.clone());
            }
        });
    }
    let mut codes: Vec<String> = codes.into_iter().collect();
    codes.sort();
    codes
}
