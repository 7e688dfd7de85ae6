//! Property-based tests for the stream/sink state machine.
//!
//! A small reference model replays the same script of writes and predicts
//! every physical write; the real implementation must agree exactly.

use anchorline::testing::MemoryWriter;
use anchorline::{Cursor, Sink, Stream, StreamState};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Stream(String),
    Foreign(String),
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => "[ab\\n]{0,5}".prop_map(Op::Stream),
        2 => "[xy\\n]{0,4}".prop_map(Op::Foreign),
        1 => Just(Op::Reset),
    ]
}

#[derive(Default)]
struct Model {
    buffer: String,
    started: bool,
    interrupted: bool,
    cursor: Cursor,
}

impl Model {
    fn prefix(&self, needs_newline: bool) -> &'static str {
        if needs_newline && !self.cursor.is_at_line_start() {
            "\n"
        } else {
            ""
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.started = false;
        self.interrupted = false;
    }

    /// Physical write the stream should produce for `output`.
    fn stream_write(&mut self, output: &str) -> Option<String> {
        if output.is_empty() {
            return None;
        }
        self.buffer.push_str(output);
        let text = if self.interrupted {
            self.buffer.clone()
        } else {
            output.to_string()
        };
        let needs = !self.started || self.interrupted;
        let physical = format!("{}{}", self.prefix(needs), text);
        self.cursor = Cursor::after(output);

        self.started = true;
        self.interrupted = false;
        if output.ends_with('\n') {
            self.reset();
        } else if let Some(pos) = self.buffer.rfind('\n') {
            self.buffer.drain(..=pos);
        }
        Some(physical)
    }

    /// Physical write a foreign writer should produce for `output`.
    fn foreign_write(&mut self, output: &str) -> Option<String> {
        if output.is_empty() {
            return None;
        }
        let needs = !self.buffer.is_empty() && !self.interrupted;
        if needs {
            self.interrupted = true;
        }
        let physical = format!("{}{}", self.prefix(needs), output);
        self.cursor = Cursor::after(output);
        Some(physical)
    }
}

proptest! {
    #[test]
    fn prop_matches_reference_model(ops in prop::collection::vec(op(), 0..40)) {
        let mem = MemoryWriter::new();
        let sink = Sink::new(mem.clone());
        let stream = Stream::with_sink(&sink);
        let mut model = Model::default();

        for op in ops {
            let before = mem.writes().len();
            let expected = match &op {
                Op::Stream(text) => {
                    if stream.state() == StreamState::Unregistered {
                        stream.register_sink(&sink).unwrap();
                    }
                    stream.write(text).unwrap();
                    model.stream_write(text)
                }
                Op::Foreign(text) => {
                    sink.write(text).unwrap();
                    model.foreign_write(text)
                }
                Op::Reset => {
                    stream.reset();
                    model.reset();
                    None
                }
            };

            let writes = mem.writes();
            match expected {
                Some(physical) => {
                    prop_assert_eq!(writes.len(), before + 1, "op {:?}", op);
                    prop_assert_eq!(&writes[before], &physical, "op {:?}", op);
                }
                None => prop_assert_eq!(writes.len(), before, "op {:?}", op),
            }

            prop_assert_eq!(stream.buffer(), model.buffer.clone());
            prop_assert_eq!(stream.is_started(), model.started);
            prop_assert_eq!(stream.is_interrupted(), model.interrupted);
            prop_assert_eq!(sink.cursor(), model.cursor);
        }
    }

    #[test]
    fn prop_buffer_never_spans_lines(fragments in prop::collection::vec("[ab\\n]{0,6}", 0..20)) {
        let sink = Sink::new(MemoryWriter::new());
        let stream = Stream::new();

        for fragment in &fragments {
            if stream.state() == StreamState::Unregistered {
                stream.register_sink(&sink).unwrap();
            }
            stream.write(fragment).unwrap();
            prop_assert!(!stream.buffer().contains('\n'));
        }
    }

    #[test]
    fn prop_uninterrupted_stream_is_printed_verbatim(
        fragments in prop::collection::vec("[ab ]{0,6}", 0..20)
    ) {
        let mem = MemoryWriter::new();
        let sink = Sink::new(mem.clone());
        let stream = Stream::with_sink(&sink);

        for fragment in &fragments {
            stream.write(fragment).unwrap();
        }

        let joined: String = fragments.concat();
        let expected = if joined.is_empty() {
            String::new()
        } else {
            format!("\n{}", joined)
        };
        prop_assert_eq!(mem.contents(), expected);
    }

    #[test]
    fn prop_empty_writes_change_nothing(
        ops in prop::collection::vec(op(), 0..20),
        empties in 1usize..5
    ) {
        let mem = MemoryWriter::new();
        let sink = Sink::new(mem.clone());
        let stream = Stream::with_sink(&sink);

        for op in &ops {
            match op {
                Op::Stream(text) => {
                    if stream.state() == StreamState::Unregistered {
                        stream.register_sink(&sink).unwrap();
                    }
                    stream.write(text).unwrap();
                }
                Op::Foreign(text) => sink.write(text).unwrap(),
                Op::Reset => stream.reset(),
            }
        }

        let snapshot = (
            stream.buffer(),
            stream.is_started(),
            stream.is_interrupted(),
            sink.cursor(),
            mem.writes(),
        );

        for _ in 0..empties {
            stream.write("").unwrap();
            sink.write("").unwrap();
        }

        prop_assert_eq!(
            (
                stream.buffer(),
                stream.is_started(),
                stream.is_interrupted(),
                sink.cursor(),
                mem.writes(),
            ),
            snapshot
        );
    }
}
