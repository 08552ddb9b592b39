//! Translation of assembled-program positions into the user's buffer.

use sieve_source::ProgramText;

/// Maps line numbers in the assembled program back to user body lines.
///
/// The assembled program injects `preamble_lines` lines before the user body
/// and a closing scaffolding line after it. A diagnostic raised on either is
/// "out of range" and has no user line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticRemapper {
    preamble_lines: usize,
    user_lines: usize,
}

impl DiagnosticRemapper {
    /// Creates a remapper for a template with `preamble_lines` injected lines
    /// and a user buffer of `user_lines` lines.
    pub fn new(preamble_lines: usize, user_lines: usize) -> Self {
        Self {
            preamble_lines,
            user_lines,
        }
    }

    /// Creates the remapper matching an assembled program.
    pub fn for_program(program: &ProgramText) -> Self {
        Self::new(program.preamble_lines(), program.body().len())
    }

    /// Maps a 1-based assembled line to a 0-based user line index.
    ///
    /// Assembled line `preamble + k + 1` maps to `Some(k)`. Returns `None` for
    /// lines inside the preamble or the trailing scaffolding.
    pub fn remap(&self, line: u32) -> Option<usize> {
        let line = line as usize;
        if line <= self.preamble_lines {
            return None;
        }
        let k = line - self.preamble_lines - 1;
        (k < self.user_lines).then_some(k)
    }
}
