//! Semantic IR: the analysed form handed to the generator.
//!
//! IR nodes are immutable value records; build passes produce new
//! snapshots rather than mutating shared state. Everything here derives
//! `Serialize` — the render context is the IR itself plus a handful of
//! generator-computed tables.

mod build;
mod infer;
mod params;

#[cfg(test)]
mod infer_tests;
#[cfg(test)]
mod params_tests;

pub use build::{build, BuildError};

use indexmap::IndexMap;
use serde::Serialize;

/// IR root.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Parser {
    pub name: String,
    pub entry_point: String,
    #[serde(skip)]
    pub entry_point_lineno: u32,
    pub types: Vec<TypeInfo>,
    pub functions: Vec<Function>,
    pub keywords: Vec<Keywords>,
    /// Codes seen in `/error(Code)` calls, deduplicated and sorted.
    pub custom_error_codes: Vec<String>,
}

impl Parser {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn type_info(&self, name: &str) -> Option<&TypeInfo> {
        self.types.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Bracket,
    Content,
    Internal,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeKind,
    pub emits_start: bool,
    pub emits_end: bool,
    pub lineno: u32,
    /// Raw kind text, kept for validation of unknown kinds.
    #[serde(skip)]
    pub kind_raw: String,
}

/// Parameter type lattice: `i32 < byte`, `i32 < bytes`, no join between
/// `byte` and `bytes`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    I32,
    Byte,
    Bytes,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub return_type: Option<String>,
    /// Kind of the declared return type, when it resolves.
    pub return_kind: Option<TypeKind>,
    /// Some `return` carries a value expression (the function returns
    /// `i32` in the target).
    pub returns_value: bool,
    pub param_types: IndexMap<String, ParamType>,
    /// Local variables (all `i32`), insertion-ordered.
    pub locals: IndexMap<String, String>,
    /// Entry-action literal initialisers hoisted into declarations.
    pub local_init_values: IndexMap<String, String>,
    pub entry_actions: Vec<Command>,
    pub states: Vec<State>,
    pub eof_handler: Option<Vec<Command>>,
    /// The unique byte every return-bearing case matches, when one exists.
    /// Drives the "unclosed X" EOF error in generated parsers.
    pub expects_char: Option<u8>,
    /// A return-bearing case runs TERM before returning, so EOF flushes
    /// accumulated content before the unclosed error.
    pub emits_content_on_close: bool,
    pub emits_events: bool,
    /// Literal bytes observed at call sites for parameters that flow into
    /// PREPEND.
    pub prepend_values: IndexMap<String, Vec<u8>>,
    pub lineno: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct State {
    pub name: Option<String>,
    pub cases: Vec<Case>,
    pub eof_handler: Option<Vec<Command>>,
    /// Bytes eligible for SIMD multi-byte search, empty when the state
    /// does not qualify.
    pub scan_chars: Vec<u8>,
    pub is_self_looping: bool,
    pub has_default: bool,
    pub is_unconditional: bool,
    pub newline_injected: bool,
    pub lineno: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Case {
    /// Literal byte set (empty for class/param/condition selectors).
    pub chars: Vec<u8>,
    /// Predefined ASCII class rendered through a helper (`letter`, …).
    pub class: Option<String>,
    /// Unicode class resolved by the generated parser (`xid_start`, …).
    pub special_class: Option<String>,
    /// `c[:param]` selector.
    pub param_ref: Option<String>,
    /// `if[...]` guard, raw DSL expression.
    pub condition: Option<String>,
    pub is_default: bool,
    pub is_bare: bool,
    pub substate: Option<String>,
    pub commands: Vec<Command>,
    pub lineno: u32,
}

impl Case {
    /// Selector matches byte content (as opposed to a guard or bare case).
    pub fn is_byte_selector(&self) -> bool {
        self.condition.is_none() && !self.is_default && !self.is_bare
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmitKind {
    /// Event without payload.
    Bare,
    /// Payload is the span accumulated since MARK.
    Mark,
    /// Fixed literal payload.
    Literal,
}

/// Whether the emitted event variant carries a content slice or only a
/// span; derived from the declared type the event name refers to.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmitPayload {
    Span,
    Content,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Emit {
    pub type_name: String,
    pub kind: EmitKind,
    pub payload: EmitPayload,
    /// Rendered byte-string literal for `EmitKind::Literal`.
    pub literal: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Clause {
    pub condition: Option<String>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Advance,
    AdvanceTo {
        bytes: Vec<u8>,
    },
    Mark,
    Term {
        offset: u32,
    },
    Transition {
        /// Raw target (`:name`); `None` self-loops.
        target: Option<String>,
    },
    Return {
        emit: Option<Emit>,
        value: Option<String>,
        suppress_auto_emit: bool,
    },
    Call {
        func: String,
        /// Arguments, rewritten against the callee's parameter types.
        args: Vec<String>,
    },
    Error {
        code: Option<String>,
    },
    Assign {
        var: String,
        expr: String,
    },
    AddAssign {
        var: String,
        expr: String,
    },
    SubAssign {
        var: String,
        expr: String,
    },
    Prepend {
        bytes: Vec<u8>,
    },
    PrependParam {
        param: String,
    },
    InlineEmit {
        emit: Emit,
    },
    KeywordsLookup {
        name: String,
    },
    Conditional {
        clauses: Vec<Clause>,
    },
    Noop,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Keywords {
    pub name: String,
    pub fallback_func: Option<String>,
    pub fallback_args: Vec<String>,
    pub mappings: Vec<Mapping>,
    pub lineno: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Mapping {
    pub keyword: String,
    pub event: String,
    pub payload: EmitPayload,
}

/// Depth-first walk over a command list, including conditional clauses.
pub fn walk_commands<'a>(commands: &'a [Command], visit: &mut impl FnMut(&'a Command)) {
    for cmd in commands {
        visit(cmd);
        if let Command::Conditional { clauses } = cmd {
            for clause in clauses {
                walk_commands(&clause.commands, visit);
            }
        }
    }
}

/// Every command list in a function: entry actions, case bodies, and EOF
/// handlers.
pub fn walk_function_commands<'a>(func: &'a Function, visit: &mut impl FnMut(&'a Command)) {
    walk_commands(&func.entry_actions, visit);
    for state in &func.states {
        for case in &state.cases {
            walk_commands(&case.commands, visit);
        }
        if let Some(handler) = &state.eof_handler {
            walk_commands(handler, visit);
        }
    }
    if let Some(handler) = &func.eof_handler {
        walk_commands(handler, visit);
    }
}
