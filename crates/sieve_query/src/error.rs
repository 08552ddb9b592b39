//! Errors raised after compilation: resolving an entry and running it.

use sieve_diagnostics::Position;

/// The compiled artifact does not expose a usable entry point.
///
/// Distinct from compile diagnostics: the program compiled, but what the
/// cache or compiler produced cannot be invoked.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The artifact was produced with a different plan format.
    #[error("compiled query uses plan format {found}, this build understands {expected}")]
    FormatVersion {
        /// Version supported by this build.
        expected: u32,
        /// Version recorded in the artifact.
        found: u32,
    },

    /// No entry with the required name exists.
    #[error("compiled query has no entry named `{name}`")]
    MissingEntry {
        /// The entry name looked for.
        name: String,
    },

    /// The entry exists but has the wrong number of parameters.
    #[error("entry `{name}` takes {found} parameters, expected {expected}")]
    Signature {
        /// The entry name.
        name: String,
        /// Required parameter count.
        expected: usize,
        /// Declared parameter count.
        found: usize,
    },
}

/// A failure while producing output lines.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Reading the input stream failed.
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),

    /// Evaluating the query failed for one row.
    #[error("query:{}:{}: {message}", .position.line, .position.column)]
    Eval {
        /// What went wrong.
        message: String,
        /// Position in the user's query text.
        position: Position,
    },
}

impl RuntimeError {
    pub(crate) fn eval(message: impl Into<String>, position: Position) -> Self {
        RuntimeError::Eval {
            message: message.into(),
            position,
        }
    }
}
