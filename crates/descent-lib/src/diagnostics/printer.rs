//! Renders diagnostics in the CLI line format.

use std::fmt::Write;

use super::collection::Diagnostics;

/// Renders each diagnostic as `SEVERITY (<file>:<line>): <message>`,
/// one per line, in source order (the validator collects check by check,
/// so the collection's line-ordered view is used).
pub struct DiagnosticsPrinter<'a> {
    diagnostics: &'a Diagnostics,
    file: Option<&'a str>,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(diagnostics: &'a Diagnostics) -> Self {
        Self {
            diagnostics,
            file: None,
        }
    }

    pub fn file(mut self, name: &'a str) -> Self {
        self.file = Some(name);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        for diag in self.diagnostics.by_line() {
            match self.file {
                Some(file) => writeln!(
                    w,
                    "{} ({}:{}): {}",
                    diag.severity(),
                    file,
                    diag.line(),
                    diag.message()
                )?,
                None => writeln!(w, "{}", diag)?,
            }
        }
        Ok(())
    }
}
