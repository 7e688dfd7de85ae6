//! Physical writers: the raw output a [`Sink`](crate::Sink) drives.
//!
//! A [`PhysicalWriter`] performs the actual output once the sink has decided
//! whether a newline prefix is needed. It never sees observers or streams and
//! its failures are handed back to the caller without retries.
//!
//! Any `FnMut(&str) -> io::Result<()>` closure is a writer, and [`IoWriter`]
//! adapts anything implementing [`std::io::Write`]:
//!
//! ```
//! use anchorline::writer::{IoWriter, PhysicalWriter};
//!
//! let mut writer = IoWriter::new(Vec::new()).with_flush(false);
//! writer.write_text("hello").unwrap();
//! assert_eq!(writer.get_ref(), b"hello");
//! ```

use std::fmt;
use std::io;

/// Raw text output behind a sink.
pub trait PhysicalWriter {
    /// Emit `text` exactly as given.
    fn write_text(&mut self, text: &str) -> io::Result<()>;
}

impl<F> PhysicalWriter for F
where
    F: FnMut(&str) -> io::Result<()>,
{
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self(text)
    }
}

/// Adapts an [`io::Write`] into a [`PhysicalWriter`].
///
/// Every write is followed by a flush unless disabled with
/// [`IoWriter::with_flush`]; interleaved output is only readable when each
/// fragment reaches the terminal before the next writer runs.
pub struct IoWriter<W> {
    inner: W,
    flush: bool,
}

impl<W: io::Write> IoWriter<W> {
    /// Wrap `inner`, flushing after every write.
    pub fn new(inner: W) -> Self {
        Self { inner, flush: true }
    }

    /// Enable or disable the flush after each write.
    pub fn with_flush(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    /// Returns true if every write is flushed.
    pub fn flushes(&self) -> bool {
        self.flush
    }

    /// Borrow the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap into the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> PhysicalWriter for IoWriter<W> {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes())?;
        if self.flush {
            self.inner.flush()?;
        }
        Ok(())
    }
}

impl<W> fmt::Debug for IoWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoWriter")
            .field("flush", &self.flush)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingFlush {
        data: Vec<u8>,
        flushes: usize,
    }

    impl io::Write for CountingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_io_writer_flushes_every_write_by_default() {
        let mut writer = IoWriter::new(CountingFlush {
            data: Vec::new(),
            flushes: 0,
        });
        assert!(writer.flushes());

        writer.write_text("a").unwrap();
        writer.write_text("b\n").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, b"ab\n");
        assert_eq!(inner.flushes, 2);
    }

    #[test]
    fn test_io_writer_without_flush() {
        let mut writer = IoWriter::new(CountingFlush {
            data: Vec::new(),
            flushes: 0,
        })
        .with_flush(false);

        writer.write_text("quiet").unwrap();
        assert_eq!(writer.get_ref().flushes, 0);
    }

    #[test]
    fn test_closure_is_a_writer() {
        let mut seen = Vec::new();
        {
            let mut writer = |text: &str| -> io::Result<()> {
                seen.push(text.to_string());
                Ok(())
            };
            writer.write_text("one").unwrap();
            writer.write_text("two").unwrap();
        }
        assert_eq!(seen, vec!["one", "two"]);
    }
}
