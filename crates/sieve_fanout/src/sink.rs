//! Writes transform output lines with a separator between them.

use std::io::{self, Write};

use crate::writer::SharedWriter;

/// Failure while writing a line sequence.
#[derive(Debug, thiserror::Error)]
pub enum SinkError<E: std::error::Error + 'static> {
    /// The line sequence itself yielded an error.
    #[error(transparent)]
    Source(E),

    /// The destination could not be written.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Writes lines to a destination, separated by a fixed string.
///
/// The separator goes *between* lines: never before the first, never after
/// the last, and nothing at all is written for an empty sequence.
pub struct LineSink<W> {
    writer: SharedWriter<W>,
    separator: Vec<u8>,
}

impl<W: Write> LineSink<W> {
    /// Creates a sink writing to `writer`.
    pub fn new(writer: SharedWriter<W>, separator: &str) -> Self {
        Self {
            writer,
            separator: separator.as_bytes().to_vec(),
        }
    }

    /// Writes every line of `lines` and returns how many were written.
    ///
    /// Stops at the first source error or write error. Lines already written
    /// stay written, and the destination is flushed either way.
    pub fn write_lines<I, E>(&self, lines: I) -> Result<usize, SinkError<E>>
    where
        I: IntoIterator<Item = Result<String, E>>,
        E: std::error::Error + 'static,
    {
        let result = self.write_all(lines);
        let flushed = self.writer.flush().map_err(SinkError::Output);
        let count = result?;
        flushed?;
        Ok(count)
    }

    fn write_all<I, E>(&self, lines: I) -> Result<usize, SinkError<E>>
    where
        I: IntoIterator<Item = Result<String, E>>,
        E: std::error::Error + 'static,
    {
        let mut count = 0;
        let mut record = Vec::new();
        for line in lines {
            let line = line.map_err(SinkError::Source)?;
            record.clear();
            if count > 0 {
                record.extend_from_slice(&self.separator);
            }
            record.extend_from_slice(line.as_bytes());
            self.writer.write_record(&record).map_err(SinkError::Output)?;
            count += 1;
        }
        Ok(count)
    }
}
