//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::remap::DiagnosticRemapper;
use crate::severity::Severity;
use sieve_source::ProgramText;

/// Number of user lines shown above the offending line.
const CONTEXT_BEFORE: usize = 2;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic raised while compiling `program`.
    fn render(&self, diag: &Diagnostic, program: &ProgramText) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error[E004]: unknown variable `x`
///   --> query:2:8
///    |
///  1 | from l in lines
///  2 | select x
///    |        ^
///    = help: ...
/// ```
/// Line numbers are 1-based positions in the user's buffer, not in the
/// assembled program.
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let label = format!("{}[{}]", diag.severity, diag.code);
        if !self.color {
            return format!("{label}: {}\n", diag.message);
        }
        let color = match diag.severity {
            Severity::Error => "31",
            Severity::Warning => "33",
        };
        format!("\x1b[1;{color}m{label}\x1b[0m\x1b[1m: {}\x1b[0m\n", diag.message)
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, program: &ProgramText) -> String {
        let mut out = self.header(diag);
        let remapper = DiagnosticRemapper::for_program(program);
        let column = diag.position.column;

        match remapper.remap(diag.position.line) {
            Some(k) => {
                let body = program.body();
                let first = k.saturating_sub(CONTEXT_BEFORE);
                let gutter = format!("{}", k + 1).len();
                let padding = " ".repeat(gutter);

                out.push_str(&format!("{padding}--> query:{}:{column}\n", k + 1));
                out.push_str(&format!("{padding} |\n"));
                for (idx, line) in body.iter().enumerate().take(k + 1).skip(first) {
                    out.push_str(&format!("{:>gutter$} | {line}\n", idx + 1));
                }
                let line = body.get(k).map(String::as_str).unwrap_or("");
                let (col_padding, carets) = underline(line, column as usize, diag.width as usize);
                out.push_str(&format!("{padding} | {col_padding}{carets}\n"));
            }
            None => {
                out.push_str(&format!(
                    "  --> <preamble>:{}:{column}\n",
                    diag.position.line
                ));
            }
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

/// Padding and carets for a span starting at 1-based byte `column` of `line`.
///
/// Both are counted in characters; tabs in the prefix are kept so the caret
/// lines up under the excerpt.
fn underline(line: &str, column: usize, width: usize) -> (String, String) {
    let start = column.saturating_sub(1);
    let end = start + width.max(1);
    let mut padding = String::new();
    let mut carets = 0;
    for (offset, ch) in line.char_indices() {
        if offset < start {
            padding.push(if ch == '\t' { '\t' } else { ' ' });
        } else if offset < end {
            carets += 1;
        } else {
            break;
        }
    }
    // Spans past the end of the line, such as a missing token at EOL.
    if line.len() < start {
        padding.push_str(&" ".repeat(start - line.len()));
    }
    (padding, "^".repeat(carets.max(1)))
}

/// Renders each diagnostic as a single-line JSON object.
///
/// `line` is the 1-based user line, or `null` when the diagnostic points into
/// the injected preamble or scaffolding.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic, program: &ProgramText) -> String {
        let remapper = DiagnosticRemapper::for_program(program);
        let line = remapper.remap(diag.position.line).map(|k| k + 1);
        serde_json::json!({
            "severity": diag.severity,
            "code": diag.code.to_string(),
            "message": diag.message,
            "line": line,
            "column": diag.position.column,
            "assembled_line": diag.position.line,
            "notes": diag.notes,
            "help": diag.help,
        })
        .to_string()
    }
}
