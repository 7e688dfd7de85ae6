//! Shows the events emitted with the `tracing` feature.
//!
//! Run with: cargo run --example tracing_demo --features tracing

use anchorline::testing::MemoryWriter;
use anchorline::{OutputError, Sink, Stream};

fn main() -> Result<(), OutputError> {
    // Events fire while a sink lock is held, so the subscriber must not write
    // through a sink itself.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(std::io::stderr)
        .init();

    let terminal = MemoryWriter::new();
    let sink = Sink::new(terminal.clone());
    let stream = Stream::with_sink(&sink);

    stream.write("fetching")?;
    sink.write("cache miss\n")?;
    stream.write(" done\n")?;

    tracing::info!(output = ?terminal.contents(), "terminal received");
    Ok(())
}
