//! Cursor state of a physical sink.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Where the visual cursor of a sink is, as far as the sink knows.
///
/// A sink starts out [`Cursor::Unknown`]: something may have been printed
/// before the sink existed. After the first non-empty write the cursor is
/// always either [`Cursor::AtLineStart`] or [`Cursor::MidLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cursor {
    /// Nothing has been written through this sink (or a linked one) yet.
    #[default]
    Unknown,
    /// The last write ended with a line terminator.
    AtLineStart,
    /// The last write ended somewhere in the middle of a line.
    MidLine,
}

impl Cursor {
    /// Cursor state after writing `output`.
    ///
    /// Only the logical output counts; a newline prefix added by the sink
    /// never changes where the text ends.
    ///
    /// ```
    /// use anchorline::Cursor;
    ///
    /// assert_eq!(Cursor::after("done\n"), Cursor::AtLineStart);
    /// assert_eq!(Cursor::after("working..."), Cursor::MidLine);
    /// ```
    pub fn after(output: &str) -> Self {
        if output.ends_with('\n') {
            Cursor::AtLineStart
        } else {
            Cursor::MidLine
        }
    }

    /// Returns true only when the cursor is known to sit at a line start.
    pub fn is_at_line_start(self) -> bool {
        self == Cursor::AtLineStart
    }

    fn to_u8(self) -> u8 {
        match self {
            Cursor::Unknown => 0,
            Cursor::AtLineStart => 1,
            Cursor::MidLine => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Cursor::AtLineStart,
            2 => Cursor::MidLine,
            _ => Cursor::Unknown,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cursor::Unknown => "unknown",
            Cursor::AtLineStart => "line-start",
            Cursor::MidLine => "mid-line",
        };
        f.write_str(s)
    }
}

/// Cursor cell that linked sinks can update without taking each other's locks.
#[derive(Debug, Default)]
pub(crate) struct AtomicCursor(AtomicU8);

impl AtomicCursor {
    pub(crate) fn load(&self) -> Cursor {
        Cursor::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, cursor: Cursor) {
        self.0.store(cursor.to_u8(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(Cursor::default(), Cursor::Unknown);
        assert_eq!(AtomicCursor::default().load(), Cursor::Unknown);
    }

    #[test]
    fn test_after_looks_only_at_the_last_char() {
        assert_eq!(Cursor::after("a\nb"), Cursor::MidLine);
        assert_eq!(Cursor::after("\n"), Cursor::AtLineStart);
        assert_eq!(Cursor::after("a\nb\n"), Cursor::AtLineStart);
    }

    #[test]
    fn test_only_line_start_counts_as_anchored() {
        assert!(Cursor::AtLineStart.is_at_line_start());
        assert!(!Cursor::MidLine.is_at_line_start());
        assert!(!Cursor::Unknown.is_at_line_start());
    }

    #[test]
    fn test_atomic_cursor_store_load() {
        let cell = AtomicCursor::default();
        for cursor in [Cursor::MidLine, Cursor::AtLineStart, Cursor::Unknown] {
            cell.store(cursor);
            assert_eq!(cell.load(), cursor);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Cursor::AtLineStart.to_string(), "line-start");
        assert_eq!(Cursor::MidLine.to_string(), "mid-line");
        assert_eq!(Cursor::Unknown.to_string(), "unknown");
    }
}
