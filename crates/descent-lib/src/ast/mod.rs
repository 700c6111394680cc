//! Structural tree for `.desc` sources.
//!
//! The AST mirrors the token stream: directives become declarations,
//! case/command tokens become `Case` and `Command` records. Character
//! content stays as raw text here; the IR builder runs it through the
//! character-class parser.

pub(crate) mod parse;


pub use parse::{parse, ParseError};

/// Root of a parsed machine description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machine {
    pub name: String,
    pub entry_point: String,
    pub entry_point_lineno: u32,
    pub types: Vec<TypeDecl>,
    pub functions: Vec<Function>,
    pub keywords: Vec<Keywords>,
}

/// `type[name] <kind>` declaration. The kind is kept raw; the validator
/// reports unknown kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: String,
    pub lineno: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub return_type: Option<String>,
    pub entry_actions: Vec<Command>,
    pub states: Vec<State>,
    pub eof_handler: Option<Vec<Command>>,
    pub lineno: u32,
}

/// A keyword block: literal→event mappings plus the fallback call used
/// on lookup miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub name: String,
    pub fallback_func: Option<String>,
    pub fallback_args: Vec<String>,
    pub mappings: Vec<(String, String)>,
    pub lineno: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// `None` for the function's implicit first state.
    pub name: Option<String>,
    pub cases: Vec<Case>,
    pub eof_handler: Option<Vec<Command>>,
    pub lineno: u32,
}

/// One case of a state. Cases are ordered; first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub selector: Selector,
    pub substate: Option<String>,
    pub commands: Vec<Command>,
    pub lineno: u32,
}

/// Exactly one selector kind per case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `c[...]` — raw character expression, parsed during IR build.
    Chars(String),
    /// Predefined class tag (`letter`, `digit`, `xid_start`, …).
    Class(String),
    Default,
    /// `if[...]` guard.
    Condition(String),
    /// No selector: matches unconditionally.
    Bare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitSpec {
    pub type_name: String,
    pub arg: Option<EmitArg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitArg {
    /// Quoted literal payload, raw.
    Literal(String),
    /// Emit the span accumulated since MARK.
    UseMark,
}

/// Payload of a `return` command: either an emit override or a plain
/// value expression (for functions that return a computed value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnSpec {
    Emit(EmitSpec),
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub condition: Option<String>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `->`
    Advance,
    /// `->[bytes]` — raw character expression.
    AdvanceTo(String),
    /// `mark` / `MARK`
    Mark,
    /// `term` / `TERM(n)` — n excludes trailing bytes from the slice.
    Term(u32),
    /// `>>` (self-loop) or `>> :state`. Target kept raw for validation.
    Transition(Option<String>),
    /// `return`, optionally with an emit override or return value.
    Return(Option<ReturnSpec>),
    /// `/name(args)` — args raw, rewritten during IR build.
    Call { name: String, args: Vec<String> },
    /// `err[Code]` or `/error(Code)`.
    Error(Option<String>),
    Assign { var: String, expr: String },
    AddAssign { var: String, expr: String },
    SubAssign { var: String, expr: String },
    /// `PREPEND(x)` — raw inner text (literal or `:param`).
    Prepend(String),
    /// `KEYWORDS(name)`
    KeywordsLookup(String),
    /// `TypeName`, `TypeName('lit')`, `TypeName(USE_MARK)`, `emit(...)`.
    InlineEmit(EmitSpec),
    /// Function-level `if[...] ... else ...`.
    Conditional(Vec<Clause>),
    Noop,
}
