//! One worker process and the pipes the executor owns for it.

use std::io::{self, BufWriter, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout};

use crate::command::WorkerCommand;

/// A line read from a worker, tagged with the slot that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    /// 1-based slot number.
    pub slot: usize,
    /// Line bytes without the terminator.
    pub text: Vec<u8>,
}

impl OutputLine {
    /// The merged-stream record: `"<slot>\t<text>\n"`.
    pub fn record(&self) -> Vec<u8> {
        let prefix = format!("{}\t", self.slot);
        let mut out = Vec::with_capacity(prefix.len() + self.text.len() + 1);
        out.extend_from_slice(prefix.as_bytes());
        out.extend_from_slice(&self.text);
        out.push(b'\n');
        out
    }
}

/// A spawned worker process.
///
/// The slot owns the write side of the worker's stdin. Once a write fails
/// the slot is dead: its stdin is dropped and every later line is counted
/// as dropped instead of sent.
pub struct WorkerSlot {
    slot: usize,
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    sent: u64,
    dropped: u64,
}

impl WorkerSlot {
    /// Starts `command` as slot number `slot`.
    pub fn spawn(slot: usize, command: &WorkerCommand) -> io::Result<Self> {
        let mut child = command.to_command().spawn()?;
        tracing::debug!(slot, pid = child.id(), program = command.program(), "spawned worker");
        Ok(Self {
            slot,
            stdin: child.stdin.take().map(BufWriter::new),
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
            child,
            sent: 0,
            dropped: 0,
        })
    }

    /// 1-based slot number.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Whether the slot still accepts input.
    pub fn is_alive(&self) -> bool {
        self.stdin.is_some()
    }

    /// Lines written to the worker so far.
    pub fn lines_sent(&self) -> u64 {
        self.sent
    }

    /// Lines discarded because the worker stopped reading.
    pub fn lines_dropped(&self) -> u64 {
        self.dropped
    }

    /// Writes one line terminated by `separator`. Returns `false` if the line
    /// was dropped.
    pub fn send(&mut self, line: &str, separator: &[u8]) -> bool {
        let Some(stdin) = self.stdin.as_mut() else {
            self.dropped += 1;
            return false;
        };
        let result = stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.write_all(separator));
        match result {
            Ok(()) => {
                self.sent += 1;
                true
            }
            Err(e) => {
                tracing::debug!(slot = self.slot, error = %e, "worker stopped reading input");
                self.stdin = None;
                self.dropped += 1;
                false
            }
        }
    }

    /// Flushes and closes the worker's stdin, signalling end of input.
    pub fn close_stdin(&mut self) {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.flush() {
                tracing::debug!(slot = self.slot, error = %e, "failed to flush worker input");
            }
        }
    }

    /// Hands the stdout and stderr pipes to the drains.
    pub(crate) fn take_output(&mut self) -> (Option<ChildStdout>, Option<ChildStderr>) {
        (self.stdout.take(), self.stderr.take())
    }

    /// Closes stdin and waits for the worker to exit, returning its exit
    /// code (`None` if it was killed by a signal or could not be reaped).
    pub fn wait(&mut self) -> Option<i32> {
        self.close_stdin();
        match self.child.wait() {
            Ok(status) => {
                if !status.success() {
                    tracing::debug!(slot = self.slot, %status, "worker exited unsuccessfully");
                }
                status.code()
            }
            Err(e) => {
                tracing::debug!(slot = self.slot, error = %e, "failed to wait for worker");
                None
            }
        }
    }

    /// Kills and reaps the worker.
    pub fn kill(&mut self) {
        self.stdin = None;
        // Already exited workers report an error here; reaping still applies.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
