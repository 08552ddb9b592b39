//! A mutex-guarded output handle shared between threads.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// A writer shared by the output drains and the coordinator.
///
/// Each [`write_record`](Self::write_record) holds the lock for one
/// `write_all`, so records from different threads never interleave.
pub struct SharedWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> SharedWriter<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Writes `bytes` as one uninterrupted record.
    pub fn write_record(&self, bytes: &[u8]) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_all(bytes)
    }

    /// Flushes the underlying writer.
    pub fn flush(&self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }

    /// Runs `f` with exclusive access to the underlying writer.
    pub fn with<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl SharedWriter<io::Stdout> {
    /// The process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl SharedWriter<io::Stderr> {
    /// The process's standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}
