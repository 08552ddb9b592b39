//! Structured diagnostic messages positioned in the assembled program.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A 1-based line/column position in the assembled program text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based byte column.
    pub column: u32,
}

impl Position {
    /// Creates a position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A compiler diagnostic: severity, code, message, and where it was raised.
///
/// Positions always refer to the assembled program; use
/// [`DiagnosticRemapper`](crate::DiagnosticRemapper) to find the matching
/// line of the user's buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Where the problem starts.
    pub position: Position,
    /// Number of columns to underline (at least one caret is drawn).
    pub width: u32,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, position: Position) -> Self {
        Self::with_severity(Severity::Error, code, message, position)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, position: Position) -> Self {
        Self::with_severity(Severity::Warning, code, message, position)
    }

    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            position,
            width: 1,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Sets the number of underlined columns.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width.max(1);
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Returns `true` if this diagnostic is only a warning.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
