//! Sinks: shared physical outputs that many writers compete for.
//!
//! A [`Sink`] owns a [`PhysicalWriter`] and serializes every write to it. For
//! each non-empty write it
//!
//! 1. asks every registered [`InterruptionObserver`] whether the output must
//!    start on a fresh line,
//! 2. prefixes `\n` if any observer said yes and the cursor is not already at
//!    a line start,
//! 3. performs the physical write,
//! 4. records whether the logical output ended with `\n` and copies that
//!    cursor state to every linked sink.
//!
//! All four steps run under one lock per sink.
//!
//! # Linking
//!
//! Two sinks that share a screen (stdout and stderr) should be linked so that
//! a write on one moves the cursor of the other:
//!
//! ```
//! use anchorline::testing::MemoryWriter;
//! use anchorline::{Cursor, Sink};
//!
//! let out = Sink::new(MemoryWriter::new());
//! let err = Sink::new(MemoryWriter::new());
//! Sink::link_pair(&out, &err).unwrap();
//!
//! err.write("warning: disk almost full\n").unwrap();
//! assert_eq!(out.cursor(), Cursor::AtLineStart);
//! ```
//!
//! A physical writer must not write back into the sink that drives it; the
//! sink lock is held for the whole write.

use std::fmt;
use std::io;
use std::str;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::cursor::{AtomicCursor, Cursor};
use crate::error::OutputError;
use crate::observer::{InterruptionObserver, WriterId};
use crate::writer::PhysicalWriter;

/// A physical output endpoint shared by streams and direct writers.
///
/// `Sink` is a cheap handle; clones refer to the same endpoint.
#[derive(Clone)]
pub struct Sink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    cursor: AtomicCursor,
    state: Mutex<SinkState>,
}

struct SinkState {
    writer: Box<dyn PhysicalWriter + Send>,
    observers: Vec<Registration>,
    links: Vec<Weak<SinkInner>>,
}

struct Registration {
    id: WriterId,
    observer: Weak<dyn InterruptionObserver>,
}

impl Sink {
    /// Create an unlinked sink over `writer`. Its cursor starts
    /// [`Cursor::Unknown`].
    pub fn new<W>(writer: W) -> Self
    where
        W: PhysicalWriter + Send + 'static,
    {
        Sink {
            inner: Arc::new(SinkInner {
                cursor: AtomicCursor::default(),
                state: Mutex::new(SinkState {
                    writer: Box::new(writer),
                    observers: Vec::new(),
                    links: Vec::new(),
                }),
            }),
        }
    }

    /// Create a sink whose cursor is mirrored into each of `links` after
    /// every write.
    ///
    /// The links are one-directional; see [`Sink::link_pair`] for sinks that
    /// must follow each other.
    pub fn with_links<W>(writer: W, links: &[&Sink]) -> Self
    where
        W: PhysicalWriter + Send + 'static,
    {
        let sink = Sink::new(writer);
        for other in links {
            sink.add_link(other);
        }
        sink
    }

    /// Start building a sink over `writer`.
    pub fn builder<W>(writer: W) -> SinkBuilder
    where
        W: PhysicalWriter + Send + 'static,
    {
        SinkBuilder {
            sink: Sink::new(writer),
            back_links: Vec::new(),
        }
    }

    /// Link `a` and `b` in both directions.
    pub fn link_pair(a: &Sink, b: &Sink) -> Result<(), OutputError> {
        a.link(b)?;
        b.link(a)
    }

    /// Mirror this sink's cursor into `other` after every write.
    ///
    /// Linking the same pair twice is a no-op. Linking a sink to itself is
    /// rejected.
    pub fn link(&self, other: &Sink) -> Result<(), OutputError> {
        if self.ptr_eq(other) {
            return Err(OutputError::invalid_argument(
                "a sink cannot be linked to itself",
            ));
        }
        self.add_link(other);
        Ok(())
    }

    fn add_link(&self, other: &Sink) {
        let mut state = self.lock();
        state.links.retain(|l| l.strong_count() > 0);
        let already = state
            .links
            .iter()
            .any(|l| std::ptr::eq(l.as_ptr(), Arc::as_ptr(&other.inner)));
        if !already {
            state.links.push(Arc::downgrade(&other.inner));
        }
    }

    /// Returns true if this sink mirrors its cursor into `other`.
    pub fn is_linked_to(&self, other: &Sink) -> bool {
        self.lock()
            .links
            .iter()
            .any(|l| std::ptr::eq(l.as_ptr(), Arc::as_ptr(&other.inner)))
    }

    /// Write `output` as a foreign writer.
    ///
    /// Every observing stream treats this as an interruption.
    pub fn write(&self, output: &str) -> Result<(), OutputError> {
        self.emit(output, None)
    }

    /// Write `output` on behalf of the writer identified by `writer`.
    pub fn write_as(&self, output: &str, writer: WriterId) -> Result<(), OutputError> {
        self.emit(output, Some(writer))
    }

    /// Write raw bytes as a foreign writer. The bytes must be valid UTF-8.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<(), OutputError> {
        let text = str::from_utf8(bytes).map_err(|e| {
            OutputError::invalid_argument(format!("output is not valid UTF-8: {}", e))
        })?;
        self.write(text)
    }

    /// Hold this sink for a write whose text depends on observer state.
    ///
    /// No other write can reach the sink until the guard is dropped, so the
    /// holder can pick its text, write it and settle its own state as one
    /// step. The holder must not take any other sink's guard meanwhile.
    pub(crate) fn exclusive(&self) -> SinkGuard<'_> {
        SinkGuard {
            sink: self,
            state: self.lock(),
        }
    }

    fn emit(&self, output: &str, writer: Option<WriterId>) -> Result<(), OutputError> {
        let mut state = self.lock();
        self.emit_locked(&mut state, output, writer)
    }

    fn emit_locked(
        &self,
        state: &mut SinkState,
        output: &str,
        writer: Option<WriterId>,
    ) -> Result<(), OutputError> {
        if output.is_empty() {
            return Ok(());
        }
        state.observers.retain(|r| r.observer.strong_count() > 0);

        // Every observer must see the write, so no short-circuit here.
        let mut needs_newline = false;
        for registration in &state.observers {
            if let Some(observer) = registration.observer.upgrade() {
                if observer.on_sink_write(output, writer) {
                    needs_newline = true;
                }
            }
        }

        let cursor = self.inner.cursor.load();
        let prefixed = needs_newline && !cursor.is_at_line_start();

        #[cfg(feature = "tracing")]
        tracing::trace!(
            writer = writer.map(WriterId::as_u64),
            len = output.len(),
            cursor = %cursor,
            prefixed,
            "sink write"
        );

        let result = if prefixed {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                writer = writer.map(WriterId::as_u64),
                cursor = %cursor,
                "prefixing newline"
            );
            let mut text = String::with_capacity(output.len() + 1);
            text.push('\n');
            text.push_str(output);
            state.writer.write_text(&text)
        } else {
            state.writer.write_text(output)
        };

        if let Err(e) = result {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "physical write failed");
            return Err(OutputError::Write(e));
        }

        let after = Cursor::after(output);
        self.inner.cursor.store(after);
        for link in &state.links {
            if let Some(linked) = link.upgrade() {
                linked.cursor.store(after);
            }
        }
        Ok(())
    }

    /// Register `observer`. Registering the same observer id twice is a no-op.
    ///
    /// The sink only holds a weak reference; dropping the last `Arc` of the
    /// observer removes it from the registry.
    pub fn register_observer<O>(&self, observer: &Arc<O>)
    where
        O: InterruptionObserver + 'static,
    {
        let id = observer.observer_id();
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn InterruptionObserver> = weak;
        let mut state = self.lock();
        state.observers.retain(|r| r.observer.strong_count() > 0);
        if !state.observers.iter().any(|r| r.id == id) {
            state.observers.push(Registration { id, observer: weak });
        }
    }

    /// Remove the observer with `id`. Unknown ids are ignored.
    pub fn unregister_observer(&self, id: WriterId) {
        self.lock().observers.retain(|r| r.id != id);
    }

    /// Returns true if an observer with `id` is registered and still alive.
    pub fn is_observed_by(&self, id: WriterId) -> bool {
        self.lock()
            .observers
            .iter()
            .any(|r| r.id == id && r.observer.strong_count() > 0)
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.lock()
            .observers
            .iter()
            .filter(|r| r.observer.strong_count() > 0)
            .count()
    }

    /// Current cursor state.
    pub fn cursor(&self) -> Cursor {
        self.inner.cursor.load()
    }

    /// Returns true if both handles refer to the same sink.
    pub fn ptr_eq(&self, other: &Sink) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Sink {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Sink {}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("cursor", &self.cursor())
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}

/// Exclusive hold on a [`Sink`], see [`Sink::exclusive`].
pub(crate) struct SinkGuard<'a> {
    sink: &'a Sink,
    state: MutexGuard<'a, SinkState>,
}

impl SinkGuard<'_> {
    /// Same as [`Sink::write_as`], under the held lock.
    pub(crate) fn write_as(&mut self, output: &str, writer: WriterId) -> Result<(), OutputError> {
        self.sink.emit_locked(&mut self.state, output, Some(writer))
    }
}

/// `write!` and `writeln!` on a sink count as foreign output.
impl io::Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf).map_err(OutputError::into_io_error)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builder for [`Sink`] with links.
///
/// ```
/// use anchorline::testing::MemoryWriter;
/// use anchorline::Sink;
///
/// let stdout = Sink::new(MemoryWriter::new());
/// let stderr = Sink::builder(MemoryWriter::new())
///     .link_both(&stdout)
///     .build();
///
/// assert!(stderr.is_linked_to(&stdout));
/// assert!(stdout.is_linked_to(&stderr));
/// ```
pub struct SinkBuilder {
    sink: Sink,
    back_links: Vec<Sink>,
}

impl SinkBuilder {
    /// Mirror the new sink's cursor into `other`.
    pub fn link_to(self, other: &Sink) -> Self {
        self.sink.add_link(other);
        self
    }

    /// Link the new sink and `other` in both directions.
    pub fn link_both(mut self, other: &Sink) -> Self {
        self.sink.add_link(other);
        self.back_links.push(other.clone());
        self
    }

    /// Finish building.
    pub fn build(self) -> Sink {
        for other in &self.back_links {
            other.add_link(&self.sink);
        }
        self.sink
    }
}

impl fmt::Debug for SinkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkBuilder")
            .field("sink", &self.sink)
            .field("back_links", &self.back_links.len())
            .finish()
    }
}
