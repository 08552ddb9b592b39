//! Compile diagnostics, position remapping, and rendering.
//!
//! The query compiler reports [`Diagnostic`]s against positions in the
//! assembled program. [`DiagnosticRemapper`] translates those positions back
//! into the user's own buffer so that [`TerminalRenderer`] can show a short
//! context window with a caret under the offending column.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod remap;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Position};
pub use remap::DiagnosticRemapper;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
