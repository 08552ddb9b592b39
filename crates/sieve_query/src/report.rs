//! Conversion of token spans into positioned diagnostics.

use sieve_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Position};
use sieve_source::{LineIndex, Span};

/// Emits diagnostics for one assembled program, translating byte spans into
/// line/column positions.
pub(crate) struct Reporter<'a> {
    index: LineIndex,
    sink: &'a DiagnosticSink,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(source: &str, sink: &'a DiagnosticSink) -> Self {
        Self {
            index: LineIndex::new(source),
            sink,
        }
    }

    /// Returns the 1-based position of the start of `span`.
    pub(crate) fn position(&self, span: Span) -> Position {
        let (line, column) = self.index.line_col(span.start);
        Position::new(line, column)
    }

    /// Underline width of `span`, clipped to its first line.
    fn width(&self, span: Span) -> u32 {
        let (start_line, start_col) = self.index.line_col(span.start);
        let (end_line, end_col) = self.index.line_col(span.end);
        if start_line == end_line {
            end_col.saturating_sub(start_col).max(1)
        } else {
            1
        }
    }

    pub(crate) fn error(&self, code: DiagnosticCode, message: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic::error(code, message, self.position(span)).with_width(self.width(span))
    }

    pub(crate) fn warning(&self, code: DiagnosticCode, message: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic::warning(code, message, self.position(span)).with_width(self.width(span))
    }

    pub(crate) fn emit(&self, diag: Diagnostic) {
        self.sink.emit(diag);
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.sink.has_errors()
    }
}
