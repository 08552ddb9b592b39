//! Program text assembly and source location tracking.
//!
//! A query program is assembled from command-line parts and imported files
//! into a single [`ProgramText`]: a fixed preamble, the user-visible body, and
//! closing scaffolding. [`Span`]s locate tokens in that assembled text and
//! [`LineIndex`] turns them into line/column positions for diagnostics.

#![warn(missing_docs)]

pub mod line_index;
pub mod program;
pub mod span;

pub use line_index::LineIndex;
pub use program::{ProgramBuilder, ProgramText, DEFAULT_IMPORTS, ENTRY_NAME};
pub use span::Span;
