//! The observer capability sinks use to ask whether a write needs a fresh line.
//!
//! Every [`Sink`](crate::Sink) keeps a registry of [`InterruptionObserver`]s.
//! Before each non-empty physical write the sink calls
//! [`on_sink_write`](InterruptionObserver::on_sink_write) on all of them and
//! prefixes a newline if any observer asks for one (and the cursor is not
//! already at a line start).
//!
//! [`Stream`](crate::Stream) is the main implementor, but anything that wants
//! to watch a sink can implement the trait:
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use anchorline::testing::MemoryWriter;
//! use anchorline::{InterruptionObserver, Sink, WriterId};
//!
//! #[derive(Debug)]
//! struct CountWrites {
//!     id: WriterId,
//!     seen: AtomicUsize,
//! }
//!
//! impl InterruptionObserver for CountWrites {
//!     fn observer_id(&self) -> WriterId {
//!         self.id
//!     }
//!
//!     fn on_sink_write(&self, _output: &str, _writer: Option<WriterId>) -> bool {
//!         self.seen.fetch_add(1, Ordering::SeqCst);
//!         false
//!     }
//! }
//!
//! let sink = Sink::new(MemoryWriter::new());
//! let counter = Arc::new(CountWrites { id: WriterId::next(), seen: AtomicUsize::new(0) });
//! sink.register_observer(&counter);
//!
//! sink.write("a").unwrap();
//! sink.write("").unwrap();
//! sink.write("b").unwrap();
//! assert_eq!(counter.seen.load(Ordering::SeqCst), 2);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_WRITER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a writer.
///
/// A stream tags its own writes with its id so that, when the sink calls back
/// into the same stream, the stream can tell its own output from a foreign
/// interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WriterId(u64);

impl WriterId {
    /// Allocate a fresh id, distinct from every id handed out before.
    pub fn next() -> Self {
        WriterId(NEXT_WRITER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value, useful in log fields.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WriterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "writer#{}", self.0)
    }
}

/// Something that watches a sink and may request a leading newline.
pub trait InterruptionObserver: Send + Sync {
    /// Identity used by the sink to make registration idempotent.
    fn observer_id(&self) -> WriterId;

    /// Called before every non-empty write on a sink this observer is
    /// registered with, including writes the observer itself issued.
    ///
    /// `writer` is `None` for writes that did not come from an identified
    /// writer. Returning `true` asks the sink to start the output on a fresh
    /// line.
    fn on_sink_write(&self, output: &str, writer: Option<WriterId>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_ids_are_unique() {
        let a = WriterId::next();
        let b = WriterId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_display() {
        let id = WriterId(7);
        assert_eq!(id.to_string(), "writer#7");
        assert_eq!(id.as_u64(), 7);
    }
}
