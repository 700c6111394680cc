//! Render-context assembly and helper-usage analysis.

use serde::Serialize;

use crate::ir::{walk_function_commands, Command, EmitKind, Keywords, Parser, TypeKind};
use crate::util::tokenize_expr;

/// The value handed to the template. Functions and types are the IR
/// records themselves; everything else is computed here.
#[derive(Debug, Serialize)]
pub struct Context<'a> {
    pub name: &'a str,
    pub entry_point: &'a str,
    pub types: &'a [crate::ir::TypeInfo],
    pub functions: &'a [crate::ir::Function],
    pub keywords: Vec<KeywordsCtx<'a>>,
    pub custom_error_codes: &'a [String],
    pub trace: bool,
    pub uses: Uses,
}

#[derive(Debug, Serialize)]
pub struct KeywordsCtx<'a> {
    #[serde(flatten)]
    pub block: &'a Keywords,
    /// Stable table constant name derived from the block identifier.
    pub const_name: String,
}

/// Which helpers the generated parser actually needs. The template gates
/// each helper on its flag so the output carries no dead code.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct Uses {
    pub col: bool,
    pub line: bool,
    pub prev: bool,
    pub set_term: bool,
    pub span_emit: bool,
    pub is_letter: bool,
    pub is_digit: bool,
    pub is_hex_digit: bool,
    pub is_label_cont: bool,
    pub is_ws: bool,
    pub is_nl: bool,
    pub unicode: bool,
    pub prepend: bool,
    pub keywords: bool,
    pub advance_to: bool,
    /// Widest multi-byte search required (SCAN states and advance-to).
    pub max_scan_arity: usize,
}

pub fn build_context(ir: &Parser, trace: bool) -> Context<'_> {
    Context {
        name: &ir.name,
        entry_point: &ir.entry_point,
        types: &ir.types,
        functions: &ir.functions,
        keywords: {
            // duplicate block names are validator warnings; the first wins
            let mut seen = std::collections::HashSet::new();
            ir.keywords
                .iter()
                .filter(|block| seen.insert(block.name.as_str()))
                .map(|block| KeywordsCtx {
                    block,
                    const_name: keyword_const_name(&block.name),
                })
                .collect()
        },
        custom_error_codes: &ir.custom_error_codes,
        trace,
        uses: analyze_uses(ir),
    }
}

pub fn keyword_const_name(name: &str) -> String {
    format!("{}_KEYWORDS", name.to_uppercase().replace('-', "_"))
}

fn analyze_uses(ir: &Parser) -> Uses {
    let mut uses = Uses::default();

    for func in &ir.functions {
        if func.emits_content_on_close {
            uses.span_emit = true;
            uses.set_term = true;
        }
        if func.emits_events
            && func
                .return_type
                .as_deref()
                .and_then(|t| ir.type_info(t))
                .is_some_and(|t| t.kind == TypeKind::Content)
        {
            uses.span_emit = true;
        }
        if !func.prepend_values.is_empty() {
            uses.prepend = true;
        }

        for state in &func.states {
            uses.max_scan_arity = uses.max_scan_arity.max(state.scan_chars.len());
            for case in &state.cases {
                match case.class.as_deref() {
                    Some("letter") => uses.is_letter = true,
                    Some("digit") => uses.is_digit = true,
                    Some("hex_digit") => uses.is_hex_digit = true,
                    Some("label_cont") => uses.is_label_cont = true,
                    Some("ws") => uses.is_ws = true,
                    Some("nl") => uses.is_nl = true,
                    _ => {}
                }
                if case.special_class.is_some() {
                    uses.unicode = true;
                }
                if let Some(cond) = &case.condition {
                    scan_expr(cond, &mut uses);
                }
            }
        }

        walk_function_commands(func, &mut |cmd| match cmd {
            Command::Term { .. } => uses.set_term = true,
            Command::AdvanceTo { bytes } => {
                uses.advance_to = true;
                uses.max_scan_arity = uses.max_scan_arity.max(bytes.len());
            }
            Command::Prepend { .. } | Command::PrependParam { .. } => uses.prepend = true,
            Command::KeywordsLookup { .. } => {
                uses.keywords = true;
                // lookup slices the accumulated word
                uses.span_emit = true;
            }
            Command::InlineEmit { emit } => {
                if matches!(emit.kind, EmitKind::Mark | EmitKind::Literal) {
                    uses.span_emit = true;
                }
            }
            Command::Assign { expr, .. }
            | Command::AddAssign { expr, .. }
            | Command::SubAssign { expr, .. } => scan_expr(expr, &mut uses),
            Command::Call { args, .. } => {
                for arg in args {
                    scan_expr(arg, &mut uses);
                }
            }
            Command::Return {
                value: Some(value), ..
            } => scan_expr(value, &mut uses),
            Command::Conditional { clauses } => {
                for clause in clauses {
                    if let Some(cond) = &clause.condition {
                        scan_expr(cond, &mut uses);
                    }
                }
            }
            _ => {}
        });
    }

    uses
}

/// Flags the built-in accessors referenced by a DSL expression.
fn scan_expr(expr: &str, uses: &mut Uses) {
    for token in tokenize_expr(expr) {
        match token.as_str() {
            "COL" => uses.col = true,
            "LINE" => uses.line = true,
            "PREV" => uses.prev = true,
            _ => {}
        }
    }
}
