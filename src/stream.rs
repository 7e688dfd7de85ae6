//! Streams: logical output channels that re-anchor after interruptions.
//!
//! A [`Stream`] writes through one primary [`Sink`] and may watch further
//! secondary sinks. It keeps the text of the current visual line in a buffer
//! so it can restore it when something else writes in between:
//!
//! * the first visible write of a stream starts on a fresh line;
//! * a foreign write while the stream has buffered text starts on a fresh
//!   line and marks the stream interrupted;
//! * the next stream write after an interruption reprints the whole buffered
//!   line, again on a fresh line;
//! * a write ending in `\n` finishes the stream: the buffer is cleared and
//!   the stream unregisters from every sink;
//! * a write with an embedded `\n` keeps only the text after the last `\n`.
//!
//! ```
//! use anchorline::testing::MemoryWriter;
//! use anchorline::{Sink, Stream};
//!
//! let mem = MemoryWriter::new();
//! let sink = Sink::new(mem.clone());
//!
//! let stream = Stream::with_sink(&sink);
//! stream.write("compiling...").unwrap();
//! sink.write("warning: unused variable\n").unwrap();
//! stream.write(" ok\n").unwrap();
//!
//! assert_eq!(
//!     mem.contents(),
//!     "\ncompiling...\nwarning: unused variable\ncompiling... ok\n"
//! );
//! ```
//!
//! # Resuming after a newline-terminated interruption
//!
//! When the interrupting write itself ended in `\n` the cursor is already at
//! a line start, so no newline is prefixed, but the buffered line is still
//! reprinted in full: the reader sees the whole line again, not a dangling
//! fragment.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::mem;
use std::str;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::OutputError;
use crate::observer::{InterruptionObserver, WriterId};
use crate::sink::Sink;

/// Registration state of a [`Stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// No primary sink; non-empty writes fail with
    /// [`OutputError::NotRegistered`].
    Unregistered,
    /// Writing through a primary sink.
    Active,
}

/// A logical, resumable output channel sharing a sink with other writers.
///
/// All methods take `&self`; a stream is expected to be driven by one thread
/// at a time while sinks may be written from anywhere.
pub struct Stream {
    core: Arc<StreamCore>,
}

/// The part of a stream sinks hold (weakly) as an observer.
struct StreamCore {
    id: WriterId,
    tracking: Mutex<Tracking>,
}

#[derive(Default)]
struct Tracking {
    buffer: String,
    started: bool,
    interrupted: bool,
    /// Foreign writes seen while text was buffered.
    interruptions: u64,
    primary: Option<Sink>,
    secondaries: Vec<Sink>,
}

impl StreamCore {
    fn lock(&self) -> MutexGuard<'_, Tracking> {
        self.tracking.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InterruptionObserver for StreamCore {
    fn observer_id(&self) -> WriterId {
        self.id
    }

    fn on_sink_write(&self, output: &str, writer: Option<WriterId>) -> bool {
        if output.is_empty() {
            return false;
        }
        let mut tracking = self.lock();
        if tracking.buffer.is_empty() {
            return false;
        }

        if writer != Some(self.id) {
            tracking.interruptions = tracking.interruptions.wrapping_add(1);
            if tracking.interrupted {
                return false;
            }
            tracking.interrupted = true;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                stream = self.id.as_u64(),
                buffered = tracking.buffer.len(),
                "stream interrupted"
            );
            true
        } else if !tracking.started {
            true
        } else {
            tracking.interrupted
        }
    }
}

impl Stream {
    /// Create an unregistered stream with an empty buffer.
    pub fn new() -> Self {
        Stream {
            core: Arc::new(StreamCore {
                id: WriterId::next(),
                tracking: Mutex::new(Tracking::default()),
            }),
        }
    }

    /// Create a stream writing to `sink`.
    pub fn with_sink(sink: &Sink) -> Self {
        Stream::builder().sink(sink).build()
    }

    /// Create a stream writing to `primary` and watching `secondaries` for
    /// interruptions.
    pub fn with_sinks(primary: &Sink, secondaries: &[&Sink]) -> Self {
        secondaries
            .iter()
            .fold(Stream::builder().sink(primary), |b, s| b.observe(s))
            .build()
    }

    /// Start building a stream.
    pub fn builder() -> StreamBuilder {
        StreamBuilder::default()
    }

    /// This stream's writer identity.
    pub fn id(&self) -> WriterId {
        self.core.id
    }

    /// Make `sink` the primary sink and start observing it.
    ///
    /// Registering the current primary again is a no-op. Registering a
    /// different sink while [`StreamState::Active`] fails with
    /// [`OutputError::AlreadyRegistered`]; [`reset`](Stream::reset) first.
    pub fn register_sink(&self, sink: &Sink) -> Result<(), OutputError> {
        {
            let mut tracking = self.core.lock();
            match &tracking.primary {
                Some(current) if current == sink => return Ok(()),
                Some(_) => return Err(OutputError::AlreadyRegistered),
                None => {}
            }
            tracking.secondaries.retain(|s| s != sink);
            tracking.primary = Some(sink.clone());
        }
        sink.register_observer(&self.core);
        Ok(())
    }

    /// Watch `sink` for interruptions without ever writing to it.
    ///
    /// Observing a sink that is already primary or secondary is a no-op.
    pub fn observe_sink(&self, sink: &Sink) {
        {
            let mut tracking = self.core.lock();
            let known = tracking.primary.as_ref() == Some(sink)
                || tracking.secondaries.iter().any(|s| s == sink);
            if known {
                return;
            }
            tracking.secondaries.push(sink.clone());
        }
        sink.register_observer(&self.core);
    }

    /// Write `output` through the primary sink.
    ///
    /// Empty output is a no-op, even on an unregistered stream. After an
    /// interruption the whole buffered line is written instead of `output`
    /// alone.
    ///
    /// If the physical write fails the error is returned as is and the
    /// stream is rolled back: `output` is dropped from the buffer and the
    /// flags keep their previous values, so the next write reprints or
    /// re-anchors exactly as if the failed one never happened.
    pub fn write(&self, output: &str) -> Result<(), OutputError> {
        if output.is_empty() {
            return Ok(());
        }
        let sink = self
            .core
            .lock()
            .primary
            .clone()
            .ok_or(OutputError::NotRegistered)?;

        // Foreign writes to the primary sink wait until the flags are
        // settled. The stream lock is only taken in short sections since the
        // sink calls back into this stream.
        let mut held = sink.exclusive();
        let (text, rollback, seen) = {
            let mut tracking = self.core.lock();
            let rollback = tracking.buffer.len();
            tracking.buffer.push_str(output);
            let text = if tracking.interrupted {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    stream = self.core.id.as_u64(),
                    len = tracking.buffer.len(),
                    "reprinting buffered line"
                );
                Cow::Owned(tracking.buffer.clone())
            } else {
                Cow::Borrowed(output)
            };
            (text, rollback, tracking.interruptions)
        };

        let result = held.write_as(&text, self.core.id);

        let finished = {
            let mut tracking = self.core.lock();
            if result.is_err() {
                tracking.buffer.truncate(rollback);
                false
            } else {
                tracking.started = true;
                // A secondary sink may have been written meanwhile.
                if tracking.interruptions == seen {
                    tracking.interrupted = false;
                }
                if output.ends_with('\n') {
                    tracking.buffer.clear();
                    true
                } else {
                    if let Some(pos) = tracking.buffer.rfind('\n') {
                        tracking.buffer.drain(..=pos);
                    }
                    false
                }
            }
        };
        drop(held);

        if finished {
            self.reset();
        }
        result
    }

    /// Write raw bytes. The bytes must be valid UTF-8.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<(), OutputError> {
        let text = str::from_utf8(bytes).map_err(|e| {
            OutputError::invalid_argument(format!("output is not valid UTF-8: {}", e))
        })?;
        self.write(text)
    }

    /// Abandon the current line without writing a newline.
    ///
    /// Unregisters from every sink and clears the buffer and flags. The
    /// stream is [`StreamState::Unregistered`] afterwards; register it again
    /// to reuse it. Resetting an unregistered stream does nothing.
    pub fn reset(&self) {
        let (primary, secondaries) = {
            let mut tracking = self.core.lock();
            tracking.buffer.clear();
            tracking.started = false;
            tracking.interrupted = false;
            (tracking.primary.take(), mem::take(&mut tracking.secondaries))
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            stream = self.core.id.as_u64(),
            registered = primary.is_some(),
            "stream reset"
        );

        for sink in primary.iter().chain(secondaries.iter()) {
            sink.unregister_observer(self.core.id);
        }
    }

    /// Text of the current line written since the last reset.
    pub fn buffer(&self) -> String {
        self.core.lock().buffer.clone()
    }

    /// Returns true once a write has gone through since the last reset.
    pub fn is_started(&self) -> bool {
        self.core.lock().started
    }

    /// Returns true if a foreign write was seen since this stream's last write.
    pub fn is_interrupted(&self) -> bool {
        self.core.lock().interrupted
    }

    /// Current registration state.
    pub fn state(&self) -> StreamState {
        if self.core.lock().primary.is_some() {
            StreamState::Active
        } else {
            StreamState::Unregistered
        }
    }

    /// The sink this stream writes to, if registered.
    pub fn primary_sink(&self) -> Option<Sink> {
        self.core.lock().primary.clone()
    }

    /// Sinks watched for interruptions only.
    pub fn secondary_sinks(&self) -> Vec<Sink> {
        self.core.lock().secondaries.clone()
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracking = self.core.lock();
        f.debug_struct("Stream")
            .field("id", &self.core.id)
            .field("buffer", &tracking.buffer)
            .field("started", &tracking.started)
            .field("interrupted", &tracking.interrupted)
            .field("registered", &tracking.primary.is_some())
            .field("secondaries", &tracking.secondaries.len())
            .finish()
    }
}

/// Lets `write!` and `writeln!` target a stream.
impl io::Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf).map_err(OutputError::into_io_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builder for [`Stream`].
///
/// ```
/// use anchorline::testing::MemoryWriter;
/// use anchorline::{Sink, Stream, StreamState};
///
/// let stdout = Sink::new(MemoryWriter::new());
/// let stderr = Sink::new(MemoryWriter::new());
///
/// let stream = Stream::builder().sink(&stdout).observe(&stderr).build();
/// assert_eq!(stream.state(), StreamState::Active);
/// assert_eq!(stream.secondary_sinks().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StreamBuilder {
    primary: Option<Sink>,
    secondaries: Vec<Sink>,
}

impl StreamBuilder {
    /// Set the primary sink.
    pub fn sink(mut self, sink: &Sink) -> Self {
        self.primary = Some(sink.clone());
        self
    }

    /// Add a sink to watch for interruptions.
    pub fn observe(mut self, sink: &Sink) -> Self {
        self.secondaries.push(sink.clone());
        self
    }

    /// Build the stream. Without a primary sink it starts unregistered.
    pub fn build(self) -> Stream {
        let stream = Stream::new();
        if let Some(primary) = &self.primary {
            stream.core.lock().primary = Some(primary.clone());
            primary.register_observer(&stream.core);
        }
        for sink in &self.secondaries {
            stream.observe_sink(sink);
        }
        stream
    }
}
