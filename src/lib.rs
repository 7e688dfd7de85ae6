//! # Anchorline
//!
//! Keep interleaved terminal output readable.
//!
//! Several logical writers often share one terminal: a progress line, log
//! messages, a child process's stderr. When they interleave mid-line the
//! result is unreadable. Anchorline gives each logical writer a [`Stream`]
//! that
//!
//! - always starts its first visible write at the beginning of a line,
//! - notices when something else wrote to the same [`Sink`] in between,
//! - and, when it resumes, reprints its current line on a fresh line.
//!
//! ## Quick Example
//!
//! ```rust
//! use anchorline::testing::MemoryWriter;
//! use anchorline::{Sink, Stream};
//!
//! let terminal = MemoryWriter::new();
//! let sink = Sink::new(terminal.clone());
//!
//! let build = Stream::with_sink(&sink);
//! build.write("building").unwrap();
//! build.write("...").unwrap();
//!
//! // someone else prints in the middle of the line
//! sink.write("note: using cached index").unwrap();
//!
//! build.write(" done\n").unwrap();
//!
//! assert_eq!(
//!     terminal.contents(),
//!     "\nbuilding...\nnote: using cached index\nbuilding... done\n"
//! );
//! ```
//!
//! ## Pieces
//!
//! - [`Sink`]: one physical output, with its cursor state and observers.
//! - [`Stream`]: one logical writer and the resynchronization state machine.
//! - [`InterruptionObserver`]: the callback sinks use before every write.
//! - [`PhysicalWriter`]: the raw output behind a sink.
//! - [`std_sinks`] / [`default_stream`]: the linked stdout/stderr pair.
//!
//! ## Feature flags
//!
//! - `tracing`: emit `tracing` events for interruptions, reprints, resets
//!   and physical writes.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cursor;
pub mod error;
pub mod observer;
pub mod sink;
pub mod std_sinks;
pub mod stream;
pub mod testing;
pub mod writer;

// Re-exports
pub use cursor::Cursor;
pub use error::OutputError;
pub use observer::{InterruptionObserver, WriterId};
pub use sink::{Sink, SinkBuilder};
pub use std_sinks::{default_stream, std_sinks, StdSinks};
pub use stream::{Stream, StreamBuilder, StreamState};
pub use writer::{IoWriter, PhysicalWriter};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cursor::Cursor;
    pub use crate::error::OutputError;
    pub use crate::observer::{InterruptionObserver, WriterId};
    pub use crate::sink::Sink;
    pub use crate::std_sinks::{default_stream, std_sinks};
    pub use crate::stream::{Stream, StreamState};
    pub use crate::writer::{IoWriter, PhysicalWriter};
}
