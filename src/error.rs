//! Error type shared by sinks and streams.
//!
//! Empty writes are never errors: both [`Sink::write`](crate::Sink::write) and
//! [`Stream::write`](crate::Stream::write) treat `""` as a no-op. Everything
//! else that can go wrong is one of the [`OutputError`] variants below.
//!
//! # Examples
//!
//! ```
//! use anchorline::{OutputError, Stream};
//!
//! let stream = Stream::new();
//! match stream.write("orphan") {
//!     Err(OutputError::NotRegistered) => {}
//!     other => panic!("expected NotRegistered, got {:?}", other),
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Errors produced while writing through a [`Sink`](crate::Sink) or
/// [`Stream`](crate::Stream).
#[derive(Debug)]
pub enum OutputError {
    /// The caller passed a value the core cannot accept, such as bytes that
    /// are not valid UTF-8 or a sink linked to itself.
    InvalidArgument {
        /// Human readable description of what was rejected.
        reason: String,
    },
    /// The stream already writes to a different primary sink. Call
    /// [`Stream::reset`](crate::Stream::reset) before registering it again.
    AlreadyRegistered,
    /// The stream has no primary sink, either because it was never
    /// registered or because it was reset.
    NotRegistered,
    /// The physical writer failed. The I/O error is passed through unchanged.
    Write(io::Error),
}

impl OutputError {
    /// Create an [`OutputError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Returns true if this error came from the physical writer.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write(_))
    }

    /// Get the underlying I/O error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Write(e) => Some(e),
            _ => None,
        }
    }

    /// Convert into an [`io::Error`], preserving the original one for
    /// [`OutputError::Write`].
    pub fn into_io_error(self) -> io::Error {
        match self {
            Self::Write(e) => e,
            Self::InvalidArgument { .. } => io::Error::new(io::ErrorKind::InvalidData, self),
            Self::AlreadyRegistered | Self::NotRegistered => {
                io::Error::new(io::ErrorKind::NotConnected, self)
            }
        }
    }
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {}", reason),
            Self::AlreadyRegistered => {
                write!(f, "stream is already registered with another sink")
            }
            Self::NotRegistered => write!(f, "stream is not registered with a sink"),
            Self::Write(e) => write!(f, "physical write failed: {}", e),
        }
    }
}

impl StdError for OutputError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Write(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        Self::Write(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = OutputError::invalid_argument("bytes are not valid UTF-8");
        assert_eq!(
            err.to_string(),
            "invalid argument: bytes are not valid UTF-8"
        );
        assert!(OutputError::AlreadyRegistered
            .to_string()
            .contains("already registered"));
        assert!(OutputError::NotRegistered
            .to_string()
            .contains("not registered"));
    }

    #[test]
    fn test_write_error_keeps_source() {
        let err = OutputError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert!(err.is_write());
        assert_eq!(err.io_error().map(|e| e.kind()), Some(io::ErrorKind::BrokenPipe));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_non_write_errors_have_no_source() {
        assert!(OutputError::NotRegistered.source().is_none());
        assert!(!OutputError::AlreadyRegistered.is_write());
        assert!(OutputError::invalid_argument("x").io_error().is_none());
    }

    #[test]
    fn test_into_io_error_round_trip() {
        let original = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let io_err = OutputError::Write(original).into_io_error();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);

        let io_err = OutputError::invalid_argument("bad").into_io_error();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);

        let io_err = OutputError::NotRegistered.into_io_error();
        assert_eq!(io_err.kind(), io::ErrorKind::NotConnected);
    }
}
