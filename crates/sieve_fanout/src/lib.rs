//! Line distribution to worker processes and merged, tagged output.
//!
//! [`FanoutExecutor`] feeds a line sequence round-robin to N copies of a
//! worker program and merges what they print back into the caller's stdout
//! and stderr, each line prefixed by the 1-based slot number and a tab.
//! [`LineSink`] is the direct path: it writes the sequence itself with a
//! separator between lines. Both write through a [`SharedWriter`], so
//! concurrent writers never interleave partial lines.

#![warn(missing_docs)]

pub mod command;
mod drain;
pub mod error;
pub mod executor;
pub mod sink;
pub mod slot;
pub mod writer;

pub use command::{CommandError, WorkerCommand};
pub use error::FanoutError;
pub use executor::{FanoutConfig, FanoutExecutor, FanoutReport, SlotReport};
pub use sink::{LineSink, SinkError};
pub use slot::{OutputLine, WorkerSlot};
pub use writer::SharedWriter;
