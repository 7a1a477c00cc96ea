//! Reporting adapter
//!
//! Turns violations into positioned diagnostics and hands them to the
//! host's sink. Whether an error blocks the build is the sink's policy,
//! not the checker's.

mod dump;
mod render;

pub use dump::{format_table, TagDump};
pub use render::AriadneSink;

use crate::ast::Span;
use crate::error::{Severity, Violation};

/// A finding ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub span: Span,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn from_violation(file: &str, violation: &Violation) -> Self {
        Self {
            file: file.to_string(),
            span: violation.span,
            severity: violation.severity(),
            code: violation.code(),
            message: violation.message(),
        }
    }
}

/// The host's diagnostic boundary
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn advisory_count(&self) -> usize {
        self.count(Severity::Advisory)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, d: Diagnostic) {
        match d.severity {
            Severity::Error => {
                tracing::error!(file = %d.file, span = %d.span, code = d.code, "{}", d.message)
            }
            Severity::Advisory => {
                tracing::info!(file = %d.file, span = %d.span, code = d.code, "{}", d.message)
            }
        }
    }
}

/// Send a unit's violations to `sink`, in order.
pub fn report_violations(file: &str, violations: &[Violation], sink: &mut dyn DiagnosticSink) {
    for violation in violations {
        sink.emit(Diagnostic::from_violation(file, violation));
    }
}
