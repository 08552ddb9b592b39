//! Output drains: one thread per worker pipe.

use std::io::{self, BufRead, BufReader, Read, Write};

use crate::slot::OutputLine;
use crate::writer::SharedWriter;

/// What one drain observed.
#[derive(Debug, Default)]
pub(crate) struct DrainStats {
    /// Lines read from the pipe.
    pub lines: u64,
    /// First failure writing to the merged destination.
    pub error: Option<io::Error>,
}

/// Copies `pipe` to `out` line by line until end of stream, tagging each
/// line with `slot`.
///
/// Lines end at `\n`; a `\r` before it is stripped. A final line without a
/// terminator is still emitted. After a write failure the drain keeps
/// reading so the worker never blocks on a full pipe.
pub(crate) fn drain<R: Read, W: Write>(slot: usize, pipe: R, out: &SharedWriter<W>) -> DrainStats {
    let mut reader = BufReader::new(pipe);
    let mut stats = DrainStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                stats.lines += 1;
                if stats.error.is_some() {
                    continue;
                }
                let line = OutputLine {
                    slot,
                    text: std::mem::take(&mut buf),
                };
                if let Err(e) = out.write_record(&line.record()) {
                    tracing::debug!(slot, error = %e, "failed to write merged output");
                    stats.error = Some(e);
                }
            }
            Err(e) => {
                tracing::debug!(slot, error = %e, "worker pipe read failed");
                break;
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(slot: usize, input: &[u8]) -> (String, DrainStats) {
        let out = SharedWriter::new(Vec::new());
        let stats = drain(slot, input, &out);
        let text = out.with(|v| String::from_utf8(v.clone()).unwrap());
        (text, stats)
    }

    #[test]
    fn tags_each_line() {
        let (out, stats) = run(2, b"B\nD\n");
        assert_eq!(out, "2\tB\n2\tD\n");
        assert_eq!(stats.lines, 2);
        assert!(stats.error.is_none());
    }

    #[test]
    fn final_unterminated_line_flushed() {
        let (out, stats) = run(1, b"A\nC\nE");
        assert_eq!(out, "1\tA\n1\tC\n1\tE\n");
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn strips_carriage_return() {
        let (out, _) = run(1, b"a\r\nb\r\n");
        assert_eq!(out, "1\ta\n1\tb\n");
    }

    #[test]
    fn keeps_empty_lines() {
        let (out, stats) = run(3, b"\n\nx\n");
        assert_eq!(out, "3\t\n3\t\n3\tx\n");
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn empty_stream() {
        let (out, stats) = run(1, b"");
        assert!(out.is_empty());
        assert_eq!(stats.lines, 0);
    }

    #[test]
    fn long_line_not_split() {
        let long = "x".repeat(100_000);
        let (out, stats) = run(1, format!("{long}\n").as_bytes());
        assert_eq!(out, format!("1\t{long}\n"));
        assert_eq!(stats.lines, 1);
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_keeps_reading() {
        let out = SharedWriter::new(Closed);
        let stats = drain(1, &b"a\nb\nc\n"[..], &out);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.error.unwrap().kind(), io::ErrorKind::BrokenPipe);
    }
}
