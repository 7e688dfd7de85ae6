//! Sinks over the process's standard output and standard error.
//!
//! Both sinks share one terminal, so they are linked in both directions: a
//! line finished on stderr also counts as a line start for stdout. Standard
//! output is flushed after every write; standard error is unbuffered already.
//!
//! The pair is created once per process on first use. Code printing with
//! `println!` bypasses it and cannot be detected; direct output that should
//! count as an interruption goes through [`StdSinks::stdout`] or
//! [`StdSinks::stderr`] instead:
//!
//! ```no_run
//! use std::io::Write;
//!
//! let progress = anchorline::default_stream();
//! progress.write("downloading...").unwrap();
//!
//! let mut err = anchorline::std_sinks().stderr().clone();
//! writeln!(err, "warning: slow mirror").unwrap();
//!
//! progress.write(" done\n").unwrap();
//! ```

use std::io;
use std::sync::OnceLock;

use crate::sink::Sink;
use crate::stream::Stream;
use crate::writer::{IoWriter, PhysicalWriter};

static STD_SINKS: OnceLock<StdSinks> = OnceLock::new();

/// A linked stdout/stderr pair of sinks.
#[derive(Debug, Clone)]
pub struct StdSinks {
    stdout: Sink,
    stderr: Sink,
}

impl StdSinks {
    /// Link two arbitrary writers the way stdout and stderr are linked.
    ///
    /// Useful to drive the same setup against in-memory writers.
    pub fn from_writers<O, E>(stdout: O, stderr: E) -> Self
    where
        O: PhysicalWriter + Send + 'static,
        E: PhysicalWriter + Send + 'static,
    {
        let stdout = Sink::new(stdout);
        let stderr = Sink::builder(stderr).link_both(&stdout).build();
        StdSinks { stdout, stderr }
    }

    /// The standard output sink.
    pub fn stdout(&self) -> &Sink {
        &self.stdout
    }

    /// The standard error sink.
    pub fn stderr(&self) -> &Sink {
        &self.stderr
    }

    /// A new stream writing to stdout and watching stderr.
    pub fn stream(&self) -> Stream {
        Stream::with_sinks(&self.stdout, &[&self.stderr])
    }
}

/// The process-wide stdout/stderr pair.
pub fn std_sinks() -> &'static StdSinks {
    STD_SINKS.get_or_init(|| {
        StdSinks::from_writers(
            IoWriter::new(io::stdout()),
            IoWriter::new(io::stderr()).with_flush(false),
        )
    })
}

/// A new stream on the process's standard output that also treats writes on
/// the standard error sink as interruptions.
pub fn default_stream() -> Stream {
    std_sinks().stream()
}
