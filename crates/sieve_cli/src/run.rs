//! `sieve run`: compile a query and stream input lines through it.
//!
//! Without `--exec` the transformed lines go straight to stdout, separated by
//! the output separator. With a worker program they are distributed
//! round-robin to the worker pool and the workers' tagged output is merged
//! into stdout and stderr.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use sieve_common::decode_escapes;
use sieve_config::SieveConfig;
use sieve_fanout::{
    FanoutConfig, FanoutError, FanoutExecutor, LineSink, SharedWriter, SinkError, WorkerCommand,
};
use sieve_query::{Transform, TransformInvoker};

use crate::pipeline::{
    self, Destination, ProgramPart, EXIT_COMPILE, EXIT_OK, EXIT_RUNTIME, EXIT_USAGE,
};
use crate::{GlobalArgs, RunArgs};

type Lines = Box<dyn Iterator<Item = io::Result<String>>>;

/// Runs the `sieve run` command.
///
/// Returns exit code 0 on success, 2 for usage or configuration errors, 3 if
/// the query does not compile, and 1 if evaluation fails.
pub fn run(
    args: &RunArgs,
    parts: Vec<ProgramPart>,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config = match pipeline::load_config(global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(EXIT_USAGE);
        }
    };
    let program = match pipeline::assemble(&parts, &args.program.uses, &config) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(EXIT_USAGE);
        }
    };
    let worker = match worker_command(args, &config) {
        Ok(worker) => worker,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(EXIT_USAGE);
        }
    };

    let cache = pipeline::open_cache(global, &config, args.program.no_cache);
    let Some(compilation) = pipeline::compile(
        &program,
        &cache,
        args.program.format,
        global,
        Destination::Stderr,
    )?
    else {
        return Ok(EXIT_COMPILE);
    };

    let invoker = TransformInvoker::resolve(&compilation.artifact)?;
    let transform = invoker.invoke(input_lines(args.input.as_deref())?, args.args.clone());
    let separator = args
        .separator
        .as_deref()
        .map(decode_escapes)
        .unwrap_or_else(|| config.output.separator());

    match worker {
        Some(command) => {
            let fanout = FanoutConfig {
                workers: args.workers.unwrap_or_else(|| config.fanout.workers()),
                command,
                separator,
            };
            run_fanout(fanout, transform)
        }
        None => run_direct(&separator, transform),
    }
}

/// The worker program: `--exec` with `--exec-args`, else the configured
/// `[fanout]` command with its configured arguments.
fn worker_command(
    args: &RunArgs,
    config: &SieveConfig,
) -> Result<Option<WorkerCommand>, sieve_fanout::CommandError> {
    if let Some(program) = &args.exec {
        let arg_string = args.exec_args.as_deref().unwrap_or("");
        return WorkerCommand::parse(program, arg_string).map(Some);
    }
    match &config.fanout.command {
        Some(program) => {
            let arg_string = config.fanout.args.as_deref().unwrap_or("");
            WorkerCommand::parse(program, arg_string).map(Some)
        }
        None => Ok(None),
    }
}

fn input_lines(path: Option<&Path>) -> io::Result<Lines> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                io::Error::new(e.kind(), format!("cannot open {}: {e}", path.display()))
            })?;
            Ok(Box::new(LossyLines::new(BufReader::new(file))))
        }
        None => Ok(Box::new(LossyLines::new(io::stdin().lock()))),
    }
}

/// Input lines without their `\n` or `\r\n` terminator. Invalid UTF-8 is
/// replaced with U+FFFD rather than failing the run.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

fn run_direct(separator: &str, transform: Transform<'_>) -> Result<i32, Box<dyn std::error::Error>> {
    let sink = LineSink::new(SharedWriter::stdout(), separator);
    match sink.write_lines(transform) {
        Ok(count) => {
            tracing::debug!(lines = count, "output complete");
            Ok(EXIT_OK)
        }
        Err(SinkError::Source(e)) => {
            eprintln!("error: {e}");
            Ok(EXIT_RUNTIME)
        }
        // The reader went away, e.g. `sieve run ... | head`.
        Err(SinkError::Output(e)) if e.kind() == io::ErrorKind::BrokenPipe => Ok(EXIT_OK),
        Err(SinkError::Output(e)) => Err(e.into()),
    }
}

fn run_fanout(
    config: FanoutConfig,
    transform: Transform<'_>,
) -> Result<i32, Box<dyn std::error::Error>> {
    let executor = FanoutExecutor::new(config);
    match executor.run(transform, &SharedWriter::stdout(), &SharedWriter::stderr()) {
        Ok(report) => {
            for slot in report.degraded() {
                tracing::debug!(
                    slot = slot.slot,
                    dropped = slot.lines_dropped,
                    exit_code = ?slot.exit_code,
                    "worker slot degraded"
                );
            }
            Ok(EXIT_OK)
        }
        Err(e) if e.is_broken_pipe() => Ok(EXIT_OK),
        Err(FanoutError::Source(e)) => {
            eprintln!("error: {e}");
            Ok(EXIT_RUNTIME)
        }
        Err(e) => Err(e.into()),
    }
}
