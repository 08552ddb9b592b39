//! The fan-out pass: spawn, distribute round-robin, drain, join.

use std::error::Error;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::panic;
use std::thread;

use crate::command::WorkerCommand;
use crate::drain::{drain, DrainStats};
use crate::error::FanoutError;
use crate::slot::WorkerSlot;
use crate::writer::SharedWriter;

/// Settings for a fan-out pass.
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Number of worker processes.
    pub workers: NonZeroUsize,
    /// Program every worker runs.
    pub command: WorkerCommand,
    /// Terminates every line sent to a worker.
    pub separator: String,
}

/// Per-slot outcome of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotReport {
    /// 1-based slot number.
    pub slot: usize,
    /// Lines delivered to the worker's stdin.
    pub lines_sent: u64,
    /// Lines assigned to the slot after its worker stopped reading.
    pub lines_dropped: u64,
    /// Lines merged from the worker's stdout.
    pub stdout_lines: u64,
    /// Lines merged from the worker's stderr.
    pub stderr_lines: u64,
    /// Exit code, `None` if the worker died from a signal.
    pub exit_code: Option<i32>,
}

impl SlotReport {
    /// Whether the worker lost input or exited unsuccessfully.
    pub fn is_degraded(&self) -> bool {
        self.lines_dropped > 0 || self.exit_code != Some(0)
    }
}

/// Outcome of a completed pass, one entry per slot in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutReport {
    /// Slot reports, slot 1 first.
    pub slots: Vec<SlotReport>,
}

impl FanoutReport {
    /// Total lines delivered to workers.
    pub fn lines_sent(&self) -> u64 {
        self.slots.iter().map(|s| s.lines_sent).sum()
    }

    /// Total lines lost to dead workers.
    pub fn lines_dropped(&self) -> u64 {
        self.slots.iter().map(|s| s.lines_dropped).sum()
    }

    /// Slots whose worker lost input or failed.
    pub fn degraded(&self) -> impl Iterator<Item = &SlotReport> {
        self.slots.iter().filter(|s| s.is_degraded())
    }
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Runs a line sequence through a pool of worker processes.
///
/// Line `i` of the source goes to slot `i mod N`. Every worker's stdout and
/// stderr is read by its own thread and merged into the caller's writers as
/// `"<slot>\t<line>"` records. Output of one slot stays in emission order;
/// nothing is promised across slots.
///
/// A worker that dies mid-pass is not restarted and does not fail the pass:
/// lines assigned to it afterwards are lost and counted in
/// [`SlotReport::lines_dropped`].
pub struct FanoutExecutor {
    config: FanoutConfig,
}

impl FanoutExecutor {
    /// Creates an executor.
    pub fn new(config: FanoutConfig) -> Self {
        Self { config }
    }

    /// The executor's settings.
    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// Runs one pass over `source`.
    ///
    /// Returns after every worker has exited and every drain has reached end
    /// of stream. A source error stops distribution; workers are still shut
    /// down and drained before it is returned.
    pub fn run<I, E, O, R>(
        &self,
        source: I,
        stdout: &SharedWriter<O>,
        stderr: &SharedWriter<R>,
    ) -> Result<FanoutReport, FanoutError>
    where
        I: IntoIterator<Item = Result<String, E>>,
        E: Into<Box<dyn Error + Send + Sync>>,
        O: Write + Send,
        R: Write + Send,
    {
        let mut slots = self.spawn_all()?;
        let n = slots.len();
        let separator = self.config.separator.as_bytes();

        let (source_error, exit_codes, drained) = thread::scope(|s| {
            let mut handles = Vec::with_capacity(2 * n);
            for worker in &mut slots {
                let slot = worker.slot();
                let (out_pipe, err_pipe) = worker.take_output();
                if let Some(pipe) = out_pipe {
                    handles.push((slot, Stream::Stdout, s.spawn(move || drain(slot, pipe, stdout))));
                }
                if let Some(pipe) = err_pipe {
                    handles.push((slot, Stream::Stderr, s.spawn(move || drain(slot, pipe, stderr))));
                }
            }

            let mut source_error: Option<Box<dyn Error + Send + Sync>> = None;
            for (i, item) in source.into_iter().enumerate() {
                match item {
                    Ok(line) => {
                        slots[i % n].send(&line, separator);
                    }
                    Err(e) => {
                        source_error = Some(e.into());
                        break;
                    }
                }
            }

            for worker in &mut slots {
                worker.close_stdin();
            }
            let exit_codes: Vec<Option<i32>> = slots.iter_mut().map(WorkerSlot::wait).collect();

            let drained: Vec<(usize, Stream, DrainStats)> = handles
                .into_iter()
                .map(|(slot, stream, handle)| {
                    let stats = handle.join().unwrap_or_else(|p| panic::resume_unwind(p));
                    (slot, stream, stats)
                })
                .collect();
            (source_error, exit_codes, drained)
        });

        let mut reports: Vec<SlotReport> = slots
            .iter()
            .zip(exit_codes)
            .map(|(worker, exit_code)| SlotReport {
                slot: worker.slot(),
                lines_sent: worker.lines_sent(),
                lines_dropped: worker.lines_dropped(),
                stdout_lines: 0,
                stderr_lines: 0,
                exit_code,
            })
            .collect();

        let mut output_error: Option<io::Error> = None;
        for (slot, stream, stats) in drained {
            let report = &mut reports[slot - 1];
            match stream {
                Stream::Stdout => report.stdout_lines = stats.lines,
                Stream::Stderr => report.stderr_lines = stats.lines,
            }
            if output_error.is_none() {
                output_error = stats.error;
            }
        }

        if let Some(e) = source_error {
            return Err(FanoutError::Source(e));
        }
        if let Some(e) = output_error {
            return Err(FanoutError::Output(e));
        }
        stdout.flush().map_err(FanoutError::Output)?;
        stderr.flush().map_err(FanoutError::Output)?;

        let report = FanoutReport { slots: reports };
        tracing::debug!(
            workers = n,
            sent = report.lines_sent(),
            dropped = report.lines_dropped(),
            "fan-out pass complete"
        );
        Ok(report)
    }

    /// Starts every worker, or none: on failure the ones already running are
    /// killed and reaped.
    fn spawn_all(&self) -> Result<Vec<WorkerSlot>, FanoutError> {
        let n = self.config.workers.get();
        let mut slots = Vec::with_capacity(n);
        for slot in 1..=n {
            match WorkerSlot::spawn(slot, &self.config.command) {
                Ok(worker) => slots.push(worker),
                Err(source) => {
                    for worker in &mut slots {
                        worker.kill();
                    }
                    return Err(FanoutError::Spawn {
                        program: self.config.command.program().to_string(),
                        source,
                    });
                }
            }
        }
        Ok(slots)
    }
}
