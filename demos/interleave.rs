//! Walks through streams being interrupted on a real terminal.
//!
//! Run with: cargo run --example interleave

use anchorline::{std_sinks, OutputError, Stream};

fn main() -> Result<(), OutputError> {
    let sinks = std_sinks();
    let stdout = sinks.stdout();
    let stderr = sinks.stderr();

    // A stream that finishes in one write still starts on its own line.
    stdout.write("hey")?;
    let stream = sinks.stream();
    stream.write("starting... ending at once\n")?;

    // Interrupted mid-line, then resumed: the line is reprinted.
    let stream = sinks.stream();
    stream.write("starting ... ")?;
    stdout.write("interruption\n")?;
    stream.write(" ending later")?;
    stream.write(" and later.\nNew midstream ...")?;
    stdout.write("interruption\n")?;
    stdout.write("second interruption")?;
    stdout.write("third interruption")?;
    stream.write(" and finish\n")?;

    // Three streams taking turns on the same line.
    stdout.write("non interruption")?;
    let first = sinks.stream();
    first.write("starting another ... ")?;
    let second = sinks.stream();
    second.write("starting the second one ... ")?;
    let third = sinks.stream();
    third.write("starting the third one ... ")?;
    first.write("done.")?;
    second.write("done with #2")?;
    stdout.write("interruption")?;
    stderr.write("err interruption\n")?;
    third.write("done with #3")?;

    // stderr output interrupts a stdout stream too.
    let stream = Stream::with_sinks(stdout, &[stderr]);
    stream.write("starting ... ")?;
    stderr.write("err interruption")?;
    stream.write(" ending later\n")?;

    Ok(())
}
