//! Errors that abort a fan-out pass.

use std::error::Error;
use std::io;

/// A fatal fan-out failure.
///
/// A worker that exits early or stops reading is not an error; it shows up
/// in the [`FanoutReport`](crate::FanoutReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    /// A worker process could not be started. No pass was run.
    #[error("failed to start worker `{program}`: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The source sequence produced an error. Workers were shut down and
    /// drained before this was returned.
    #[error(transparent)]
    Source(Box<dyn Error + Send + Sync>),

    /// Writing merged output failed.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl FanoutError {
    /// Whether this is an output failure caused by the reader going away.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Output(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}
