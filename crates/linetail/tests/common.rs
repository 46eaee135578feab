#![allow(missing_docs)]
#![allow(dead_code)]

use core::fmt::Write;

use linetail::{ByteSource, CharDecoder, Line, LineSplitter};

/// A short log as it might arrive from a writer that flushes mid-line and
/// mid-character: `é` is split across the third and fourth pieces.
pub const LOG_PIECES: [&[u8]; 5] = [
    b"boot",
    b" ok\r",
    b"\nwarn: disk 91%\ncaf\xC3",
    b"\xA9 ready\n\nerr",
    b"or: lost",
];

/// One line per [`Line`], showing its text, terminator and whether it is a
/// view into a decode chunk.
pub fn describe(out: &mut String, line: &Line) {
    let storage = if line.is_shared() { "shared" } else { "owned" };
    writeln!(out, "  {:?} {:?} {storage}", line.as_str(), line.ending()).unwrap();
}

/// Drains what `splitter` has right now into `out`.
pub fn describe_ready<S, D>(out: &mut String, splitter: &mut LineSplitter<S, D>)
where
    S: ByteSource,
    S::Error: core::fmt::Debug,
    D: CharDecoder,
{
    for line in splitter.ready() {
        describe(out, &line.expect("valid input"));
    }
}
