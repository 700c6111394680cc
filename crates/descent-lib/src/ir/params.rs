//! Cross-function parameter analysis: type inference with fix-point
//! propagation, PREPEND value collection, and call-argument rewriting.

use indexmap::{IndexMap, IndexSet};

use crate::util::tokenize_expr;

use super::build::{parse_chars, BuildError};
use super::{walk_function_commands, Command, Function, ParamType};

/// Infers parameter types. Every parameter starts as `i32`; evidence can
/// raise it to `byte` or `bytes`, never lower it.
pub(super) fn infer_param_types(functions: &mut [Function]) {
    // own-body evidence: c[:p] selectors, character comparisons, PREPEND
    for func in functions.iter_mut() {
        let params = func.params.clone();
        let mut byte_params: IndexSet<String> = IndexSet::new();
        let mut bytes_params: IndexSet<String> = IndexSet::new();

        for state in &func.states {
            for case in &state.cases {
                if let Some(p) = &case.param_ref {
                    if params.contains(p) {
                        byte_params.insert(p.clone());
                    }
                }
                if let Some(cond) = &case.condition {
                    scan_condition(cond, &params, &mut byte_params);
                }
            }
        }
        walk_function_commands(func, &mut |cmd| match cmd {
            Command::PrependParam { param } => {
                if params.contains(param) {
                    bytes_params.insert(param.clone());
                }
            }
            Command::Conditional { clauses } => {
                for clause in clauses {
                    if let Some(cond) = &clause.condition {
                        scan_condition(cond, &params, &mut byte_params);
                    }
                }
            }
            _ => {}
        });

        for p in byte_params {
            raise(func, &p, ParamType::Byte);
        }
        for p in bytes_params {
            raise(func, &p, ParamType::Bytes);
        }
    }

    // call-site evidence: the empty class `<>` forces a bytes parameter
    let index = function_index(functions);
    let mut upgrades: Vec<(usize, usize)> = Vec::new();
    for func in functions.iter() {
        walk_function_commands(func, &mut |cmd| {
            if let Command::Call { func: callee, args } = cmd {
                if let Some(&ci) = index.get(callee.as_str()) {
                    for (ai, arg) in args.iter().enumerate() {
                        if arg.trim() == "<>" {
                            upgrades.push((ci, ai));
                        }
                    }
                }
            }
        });
    }
    for (ci, ai) in upgrades {
        if let Some(param) = functions[ci].params.get(ai).cloned() {
            raise(&mut functions[ci], &param, ParamType::Bytes);
        }
    }

    // fix-point: callee types flow back to callers passing `:x`
    loop {
        let by_name: IndexMap<String, Vec<ParamType>> = {
            let mut map = IndexMap::new();
            for func in functions.iter() {
                map.entry(func.name.clone())
                    .or_insert_with(|| func.param_types.values().copied().collect());
            }
            map
        };
        let mut upgrades: Vec<(usize, String, ParamType)> = Vec::new();
        for (fi, func) in functions.iter().enumerate() {
            walk_function_commands(func, &mut |cmd| {
                if let Command::Call { func: callee, args } = cmd {
                    let Some(callee_types) = by_name.get(callee.as_str()) else {
                        return;
                    };
                    for (ai, arg) in args.iter().enumerate() {
                        let Some(name) = arg.trim().strip_prefix(':') else {
                            continue;
                        };
                        if !func.params.iter().any(|p| p == name) {
                            continue;
                        }
                        match callee_types.get(ai) {
                            Some(&ty) if ty != ParamType::I32 => {
                                upgrades.push((fi, name.to_string(), ty));
                            }
                            _ => {}
                        }
                    }
                }
            });
        }
        let mut changed = false;
        for (fi, name, ty) in upgrades {
            if raise(&mut functions[fi], &name, ty) {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Raises a parameter from the lattice bottom. Returns true on change.
fn raise(func: &mut Function, param: &str, ty: ParamType) -> bool {
    match func.param_types.get_mut(param) {
        Some(slot) if *slot == ParamType::I32 && ty != ParamType::I32 => {
            *slot = ty;
            true
        }
        _ => false,
    }
}

fn function_index(functions: &[Function]) -> IndexMap<String, usize> {
    let mut index = IndexMap::new();
    for (i, func) in functions.iter().enumerate() {
        index.entry(func.name.clone()).or_insert(i);
    }
    index
}

/// `:p` (or a bare parameter name) compared against a quoted character
/// literal types the parameter as `byte`. Numeric comparisons (`:p == 0`)
/// are flag tests and prove nothing.
fn scan_condition(cond: &str, params: &[String], out: &mut IndexSet<String>) {
    fn is_cmp(tok: &str) -> bool {
        matches!(tok, "==" | "!=" | "<" | ">" | "<=" | ">=")
    }
    fn is_char_lit(tok: &str) -> bool {
        tok.starts_with('\'') || tok.starts_with('"')
    }

    let tokens = tokenize_expr(cond);
    for (i, tok) in tokens.iter().enumerate() {
        let name = tok.strip_prefix(':').unwrap_or(tok);
        if !params.iter().any(|p| p == name) {
            continue;
        }
        let after =
            i + 2 < tokens.len() && is_cmp(&tokens[i + 1]) && is_char_lit(&tokens[i + 2]);
        let before = i >= 2 && is_cmp(&tokens[i - 1]) && is_char_lit(&tokens[i - 2]);
        if after || before {
            out.insert(name.to_string());
        }
    }
}

/// For every parameter that flows into PREPEND, records the literal bytes
/// callers pass for it.
pub(super) fn collect_prepend_values(functions: &mut [Function]) {
    // func name -> [(param index, param name)] feeding PREPEND
    let mut targets: IndexMap<String, Vec<(usize, String)>> = IndexMap::new();
    for func in functions.iter() {
        let mut hit: IndexSet<String> = IndexSet::new();
        walk_function_commands(func, &mut |cmd| {
            if let Command::PrependParam { param } = cmd {
                hit.insert(param.clone());
            }
        });
        let list: Vec<(usize, String)> = func
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| hit.contains(p.as_str()))
            .map(|(i, p)| (i, p.clone()))
            .collect();
        if !list.is_empty() {
            targets.entry(func.name.clone()).or_insert(list);
        }
    }
    if targets.is_empty() {
        return;
    }

    let mut observed: IndexMap<String, IndexMap<String, IndexSet<u8>>> = IndexMap::new();
    for func in functions.iter() {
        walk_function_commands(func, &mut |cmd| {
            if let Command::Call { func: callee, args } = cmd {
                let Some(list) = targets.get(callee.as_str()) else {
                    return;
                };
                for (idx, pname) in list {
                    let Some(arg) = args.get(*idx) else { continue };
                    let a = arg.trim();
                    if !(a.starts_with('\'') || a.starts_with('"')) {
                        continue;
                    }
                    if let Ok(spec) = crate::chars::parse(a) {
                        observed
                            .entry(callee.clone())
                            .or_default()
                            .entry(pname.clone())
                            .or_default()
                            .extend(spec.bytes.iter().copied());
                    }
                }
            }
        });
    }

    for func in functions.iter_mut() {
        if let Some(by_param) = observed.get(func.name.as_str()) {
            for (param, bytes) in by_param {
                func.prepend_values
                    .insert(param.clone(), bytes.iter().copied().collect());
            }
        }
    }
}

/// Rewrites every call argument into the representation the callee's
/// parameter type demands. Literal `0` is the sentinel: empty slice for
/// `bytes`, never-match `0u8` for `byte`, itself for `i32`.
pub(super) fn rewrite_call_args(functions: &mut [Function]) -> Result<(), BuildError> {
    let by_name: IndexMap<String, Vec<ParamType>> = {
        let mut map = IndexMap::new();
        for func in functions.iter() {
            map.entry(func.name.clone())
                .or_insert_with(|| func.param_types.values().copied().collect());
        }
        map
    };

    for func in functions.iter_mut() {
        let line = func.lineno;
        rewrite_in_commands(&mut func.entry_actions, &by_name, line)?;
        for state in &mut func.states {
            for case in &mut state.cases {
                rewrite_in_commands(&mut case.commands, &by_name, case.lineno)?;
            }
            if let Some(handler) = &mut state.eof_handler {
                rewrite_in_commands(handler, &by_name, state.lineno)?;
            }
        }
        if let Some(handler) = &mut func.eof_handler {
            rewrite_in_commands(handler, &by_name, line)?;
        }
    }
    Ok(())
}

fn rewrite_in_commands(
    commands: &mut [Command],
    by_name: &IndexMap<String, Vec<ParamType>>,
    line: u32,
) -> Result<(), BuildError> {
    for cmd in commands {
        match cmd {
            Command::Call { func, args } => {
                if let Some(types) = by_name.get(func.as_str()) {
                    for (i, arg) in args.iter_mut().enumerate() {
                        let ty = types.get(i).copied().unwrap_or_default();
                        *arg = rewrite_arg(arg, ty, line)?;
                    }
                }
            }
            Command::Conditional { clauses } => {
                for clause in clauses {
                    rewrite_in_commands(&mut clause.commands, by_name, line)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn rewrite_arg(arg: &str, ty: ParamType, line: u32) -> Result<String, BuildError> {
    let a = arg.trim();
    if a.is_empty() || a.starts_with(':') || matches!(a, "COL" | "LINE" | "PREV") {
        return Ok(a.to_string());
    }
    if a.parse::<i64>().is_ok() {
        return Ok(match (a, ty) {
            ("0", ParamType::Bytes) => "b\"\"".to_string(),
            ("0", ParamType::Byte) => "0u8".to_string(),
            _ => a.to_string(),
        });
    }
    let charlike = a.starts_with('\'')
        || a.starts_with('"')
        || a.starts_with('<')
        || a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !charlike {
        // full expression: the template's expression filter handles it
        return Ok(a.to_string());
    }
    match ty {
        ParamType::I32 => Ok(a.to_string()),
        ParamType::Byte => parse_chars(a, line)?
            .emit_byte()
            .map_err(|e| BuildError::new(line, e.0)),
        ParamType::Bytes => parse_chars(a, line)?
            .emit_bytes()
            .map_err(|e| BuildError::new(line, e.0)),
    }
}
