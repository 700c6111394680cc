//! Post-IR cross-reference validation.
//!
//! Produces a report rather than failing fast: errors abort generation,
//! warnings describe likely grammar mistakes (dead code, undefined
//! references) that surface downstream in the generated parser.

use std::collections::HashSet;

use crate::diagnostics::Diagnostics;
use crate::ir::{self, walk_commands, Command, Parser};
use crate::util::to_pascal_case;

/// Walks the IR and reports errors and warnings.
pub fn validate(ir: &Parser) -> Diagnostics {
    let mut diags = Diagnostics::new();
    check_types(ir, &mut diags);
    check_entry_point(ir, &mut diags);
    check_functions(ir, &mut diags);
    check_keywords(ir, &mut diags);
    diags
}

fn check_types(ir: &Parser, diags: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for ty in &ir.types {
        if !seen.insert(ty.name.as_str()) {
            diags.error(ty.lineno, format!("duplicate type `{}`", ty.name));
        }
        if !matches!(ty.kind_raw.as_str(), "bracket" | "content" | "internal") {
            diags.error(
                ty.lineno,
                format!(
                    "unknown kind `{}` for type `{}` (expected bracket, content, or internal)",
                    ty.kind_raw, ty.name
                ),
            );
        }
    }
}

fn check_entry_point(ir: &Parser, diags: &mut Diagnostics) {
    if ir.function(&ir.entry_point).is_none() {
        diags.error(
            ir.entry_point_lineno,
            format!("entry point `{}` is not a defined function", ir.entry_point),
        );
    }
}

fn check_functions(ir: &Parser, diags: &mut Diagnostics) {
    let function_names: HashSet<&str> = ir.functions.iter().map(|f| f.name.as_str()).collect();
    let keyword_names: HashSet<&str> = ir.keywords.iter().map(|k| k.name.as_str()).collect();
    let emit_names = known_emit_names(ir);

    let mut seen = HashSet::new();
    for func in &ir.functions {
        if !seen.insert(func.name.as_str()) {
            diags.warning(func.lineno, format!("duplicate function `{}`", func.name));
        }
        if func.states.is_empty() {
            diags.warning(func.lineno, format!("function `{}` has no states", func.name));
        }
        if let Some(ret) = &func.return_type {
            if ir.type_info(ret).is_none() {
                diags.warning(
                    func.lineno,
                    format!("function `{}` returns undeclared type `{ret}`", func.name),
                );
            }
        }

        let state_names: HashSet<&str> = func
            .states
            .iter()
            .filter_map(|s| s.name.as_deref())
            .collect();

        for state in &func.states {
            if state.cases.is_empty() {
                let label = state.name.as_deref().unwrap_or("<main>");
                diags.warning(
                    state.lineno,
                    format!("state `{label}` of function `{}` is empty", func.name),
                );
            }
            for case in &state.cases {
                check_commands(
                    &case.commands,
                    case.lineno,
                    func,
                    &function_names,
                    &keyword_names,
                    &state_names,
                    &emit_names,
                    diags,
                );
            }
            if let Some(handler) = &state.eof_handler {
                check_commands(
                    handler,
                    state.lineno,
                    func,
                    &function_names,
                    &keyword_names,
                    &state_names,
                    &emit_names,
                    diags,
                );
            }
        }
        check_commands(
            &func.entry_actions,
            func.lineno,
            func,
            &function_names,
            &keyword_names,
            &state_names,
            &emit_names,
            diags,
        );
        if let Some(handler) = &func.eof_handler {
            check_commands(
                handler,
                func.lineno,
                func,
                &function_names,
                &keyword_names,
                &state_names,
                &emit_names,
                diags,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn check_commands(
    commands: &[Command],
    lineno: u32,
    func: &ir::Function,
    function_names: &HashSet<&str>,
    keyword_names: &HashSet<&str>,
    state_names: &HashSet<&str>,
    emit_names: &HashSet<String>,
    diags: &mut Diagnostics,
) {
    walk_commands(commands, &mut |cmd| match cmd {
        Command::Call { func: callee, .. } => {
            if !function_names.contains(callee.as_str()) {
                diags.warning(lineno, format!("call to undefined function `{callee}`"));
            }
        }
        Command::Transition {
            target: Some(target),
        } => {
            let Some(name) = target.strip_prefix(':') else {
                diags.warning(
                    lineno,
                    format!("malformed transition target `{target}` (expected `:state`)"),
                );
                return;
            };
            if !state_names.contains(name) {
                diags.warning(
                    lineno,
                    format!(
                        "transition target `:{name}` is not a state of function `{}`",
                        func.name
                    ),
                );
            }
        }
        Command::InlineEmit { emit } => {
            if !emit_names.contains(&emit.type_name) {
                diags.warning(lineno, format!("emit of undefined type `{}`", emit.type_name));
            }
        }
        Command::Return {
            emit: Some(emit), ..
        } => {
            if !emit_names.contains(&emit.type_name) {
                diags.warning(lineno, format!("emit of undefined type `{}`", emit.type_name));
            }
        }
        Command::KeywordsLookup { name } => {
            if !keyword_names.contains(name.as_str()) {
                diags.warning(lineno, format!("unknown keywords block `{name}`"));
            }
        }
        _ => {}
    });
}

fn check_keywords(ir: &Parser, diags: &mut Diagnostics) {
    let function_names: HashSet<&str> = ir.functions.iter().map(|f| f.name.as_str()).collect();
    let emit_names = known_emit_names(ir);
    let mut seen = HashSet::new();
    for block in &ir.keywords {
        if !seen.insert(block.name.as_str()) {
            diags.warning(
                block.lineno,
                format!("duplicate keywords block `{}` (the first one wins)", block.name),
            );
        }
        if let Some(fallback) = &block.fallback_func {
            if !function_names.contains(fallback.as_str()) {
                diags.warning(
                    block.lineno,
                    format!("keywords fallback calls undefined function `{fallback}`"),
                );
            }
        }
        for mapping in &block.mappings {
            if !emit_names.contains(&mapping.event) {
                diags.warning(
                    block.lineno,
                    format!("emit of undefined type `{}`", mapping.event),
                );
            }
        }
    }
}

/// Every event name an emit may reference: builtins, each declared type's
/// PascalCase name, and its `Start`/`End`/`Anon` variants.
fn known_emit_names(ir: &Parser) -> HashSet<String> {
    let mut names = HashSet::new();
    names.insert("Error".to_string());
    names.insert("Warning".to_string());
    for ty in &ir.types {
        let pascal = to_pascal_case(&ty.name);
        names.insert(format!("{pascal}Start"));
        names.insert(format!("{pascal}End"));
        names.insert(format!("{pascal}Anon"));
        names.insert(pascal);
    }
    names
}
