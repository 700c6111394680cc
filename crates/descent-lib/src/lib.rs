//! descent: a recursive-descent parser generator.
//!
//! Reads a `.desc` machine description and emits a callback-based byte
//! parser in a target language. The pipeline is strictly feed-forward:
//!
//! - `lexer` - pipe-delimited tokenisation
//! - `chars` - the character/string/class literal sublanguage
//! - `ast` - structural tree and recursive-descent parser
//! - `ir` - semantic analysis and inference passes
//! - `validate` - cross-reference report (errors and warnings)
//! - `codegen` - render context, filters, and template emission
//!
//! # Example
//!
//! ```no_run
//! use descent_lib::{Compiler, GenerateOptions};
//!
//! let source = "|parser[words]\n|entry-point[word]\n|type[word] content\n\
//!               |function[word] -> word\n|c[' '] term |return\n|default -> |>>";
//! let compiler = Compiler::new(source).unwrap();
//! let rust = compiler.generate(&GenerateOptions::default()).unwrap();
//! ```

pub mod ast;
pub mod chars;
pub mod codegen;
pub mod diagnostics;
pub mod ir;
pub mod lexer;
pub mod util;
pub mod validate;

#[cfg(test)]
mod compiler_tests;
#[cfg(test)]
mod lexer_tests;

pub use codegen::GenerateOptions;
pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use ir::BuildError;
pub use lexer::LexError;

pub use ast::ParseError;

/// Any failure of the pipeline. The lexical, structural, and semantic
/// stages carry the originating source line.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Build(#[from] BuildError),
    #[error("validation failed with {} error(s)", .0.error_count())]
    Invalid(Diagnostics),
    #[error("no template for target `{0}`")]
    UnknownTarget(String),
    #[error(transparent)]
    Render(#[from] minijinja::Error),
}

impl Error {
    /// Source line the failure is anchored to, when it has one.
    pub fn line(&self) -> Option<u32> {
        match self {
            Error::Lex(e) => Some(e.line),
            Error::Parse(e) => Some(e.line),
            Error::Build(e) => Some(e.line),
            Error::Invalid(diags) => diags.errors().next().map(|d| d.line()),
            Error::UnknownTarget(_) | Error::Render(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// One compilation: source through IR and validation, generation on
/// demand.
///
/// Construction fails on the fatal taxonomies (lexical, structural,
/// semantic). Validator findings are collected, not thrown; `generate`
/// refuses to run when the report contains errors.
#[derive(Debug, Clone)]
pub struct Compiler<'a> {
    source: &'a str,
    tokens: Vec<lexer::Token>,
    machine: ast::Machine,
    ir: ir::Parser,
    diagnostics: Diagnostics,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a str) -> Result<Self> {
        let tokens = lexer::lex(source)?;
        let machine = ast::parse(&tokens)?;
        let ir = ir::build(&machine)?;
        let diagnostics = validate::validate(&ir);
        Ok(Self {
            source,
            tokens,
            machine,
            ir,
            diagnostics,
        })
    }

    pub fn source(&self) -> &str {
        self.source
    }

    pub fn tokens(&self) -> &[lexer::Token] {
        &self.tokens
    }

    pub fn machine(&self) -> &ast::Machine {
        &self.machine
    }

    pub fn ir(&self) -> &ir::Parser {
        &self.ir
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Renders the parser source. Fails on validator errors; warnings are
    /// the caller's to report.
    pub fn generate(&self, opts: &GenerateOptions) -> Result<String> {
        if self.diagnostics.has_errors() {
            return Err(Error::Invalid(self.diagnostics.clone()));
        }
        codegen::generate(&self.ir, opts)
    }
}
