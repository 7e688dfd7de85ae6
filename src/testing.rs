//! Testing utilities: in-memory and failing physical writers.
//!
//! Tests usually want to see exactly what a sink sent to its writer, write by
//! write. [`MemoryWriter`] records every physical write behind a cloneable
//! handle: give one clone to the [`Sink`](crate::Sink) and keep the other for
//! assertions.
//!
//! # Examples
//!
//! ```rust
//! use anchorline::testing::MemoryWriter;
//! use anchorline::{assert_output, Sink, Stream};
//!
//! let mem = MemoryWriter::new();
//! let sink = Sink::new(mem.clone());
//! let stream = Stream::with_sink(&sink);
//!
//! stream.write("loading").unwrap();
//! sink.write("!").unwrap();
//! stream.write(" done").unwrap();
//!
//! assert_output!(mem, "\nloading\n!\nloading done");
//! ```

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::writer::PhysicalWriter;

/// A [`PhysicalWriter`] that records every write in memory.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    writes: Arc<Mutex<Vec<String>>>,
}

impl MemoryWriter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every physical write, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// The most recent physical write, if any.
    pub fn last_write(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    /// All writes concatenated, i.e. what a terminal would show.
    pub fn contents(&self) -> String {
        self.lock().concat()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PhysicalWriter for MemoryWriter {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.lock().push(text.to_string());
        Ok(())
    }
}

/// A [`PhysicalWriter`] whose every write fails with the given error kind.
#[derive(Debug, Clone, Copy)]
pub struct FailingWriter {
    kind: io::ErrorKind,
}

impl FailingWriter {
    /// Fail every write with `kind`, e.g. [`io::ErrorKind::BrokenPipe`].
    pub fn new(kind: io::ErrorKind) -> Self {
        Self { kind }
    }
}

impl PhysicalWriter for FailingWriter {
    fn write_text(&mut self, _text: &str) -> io::Result<()> {
        Err(io::Error::new(self.kind, "simulated write failure"))
    }
}

/// Assert that a [`MemoryWriter`] shows exactly the expected terminal output.
///
/// On mismatch both sides are printed with escapes, so newlines are visible.
///
/// # Example
///
/// ```rust
/// use anchorline::testing::MemoryWriter;
/// use anchorline::{assert_output, Sink};
///
/// let mem = MemoryWriter::new();
/// Sink::new(mem.clone()).write("hi\n").unwrap();
/// assert_output!(mem, "hi\n");
/// ```
#[macro_export]
macro_rules! assert_output {
    ($writer:expr, $expected:expr) => {{
        let actual = $writer.contents();
        let expected: &str = $expected;
        if actual != expected {
            panic!(
                "output mismatch\n  expected: {:?}\n    actual: {:?}",
                expected, actual
            );
        }
    }};
}
