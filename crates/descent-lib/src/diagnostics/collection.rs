//! Accumulates validator findings.
//!
//! The validator walks the IR check by check, so findings arrive grouped
//! by kind rather than by position. The collection keeps insertion order
//! for callers that care about check grouping and offers a line-ordered
//! view for rendering.

use super::message::{DiagnosticMessage, Severity};

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finding that must abort generation.
    pub fn error(&mut self, line: u32, message: impl Into<String>) {
        self.messages.push(DiagnosticMessage {
            severity: Severity::Error,
            line,
            message: message.into(),
        });
    }

    /// Records a finding that is reported but lets generation proceed.
    pub fn warning(&mut self, line: u32, message: impl Into<String>) {
        self.messages.push(DiagnosticMessage {
            severity: Severity::Warning,
            line,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Findings in insertion order, grouped by the check that produced
    /// them.
    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Findings in source order for rendering: ascending line, errors
    /// before warnings on the same line, insertion order as the final
    /// tie-break.
    pub fn by_line(&self) -> Vec<&DiagnosticMessage> {
        let mut sorted: Vec<&DiagnosticMessage> = self.messages.iter().collect();
        sorted.sort_by_key(|d| (d.line, d.severity == Severity::Warning));
        sorted
    }
}
