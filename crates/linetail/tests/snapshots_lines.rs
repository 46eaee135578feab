#![expect(missing_docs)]

mod common;

use core::{fmt::Write, num::NonZeroUsize};

use common::{LOG_PIECES, describe_ready};
use linetail::{LineReaderOptions, LineSplitter, MemorySource, NextLine};

fn render_tail_session(pieces: &[&[u8]], options: LineReaderOptions) -> String {
    let (source, appender) = MemorySource::growing();
    let mut splitter = LineSplitter::open(source, options);
    let mut out = String::new();
    for piece in pieces {
        appender.append(piece);
        writeln!(out, "+{} bytes", piece.len()).unwrap();
        describe_ready(&mut out, &mut splitter);
    }
    for line in splitter.close_returning_tail().expect("close") {
        writeln!(out, "tail {:?} {:?}", line.as_str(), line.ending()).unwrap();
    }
    out
}

#[test]
fn snapshot_tailing_a_log() {
    insta::assert_snapshot!(render_tail_session(&LOG_PIECES, LineReaderOptions::default()), @r#"
    +4 bytes
    +4 bytes
    +20 bytes
      "boot ok" CrLf owned
      "warn: disk 91%" Lf shared
    +12 bytes
      "café ready" Lf owned
      "" Lf shared
    +8 bytes
    tail "error: lost" Unterminated
    "#);
}

#[test]
fn snapshot_tailing_with_scan_cap() {
    let options = LineReaderOptions {
        max_lines_per_scan: NonZeroUsize::new(1),
        ..Default::default()
    };
    // The cap spreads work over more pulls; `ready` still drains everything.
    assert_eq!(
        render_tail_session(&LOG_PIECES, options),
        render_tail_session(&LOG_PIECES, LineReaderOptions::default())
    );
}

#[test]
fn snapshot_malformed_recovery() {
    let mut splitter = LineSplitter::open(
        MemorySource::new(&b"ok\n\xFFbad\nfine\n"[..]),
        LineReaderOptions::default(),
    );
    let mut out = String::new();
    for _ in 0..3 {
        match splitter.next_line() {
            Ok(NextLine::Ready(line)) => writeln!(out, "line {:?}", line.as_str()).unwrap(),
            Ok(NextLine::Pending) => writeln!(out, "pending").unwrap(),
            Err(err) => writeln!(out, "error: {err}").unwrap(),
        }
    }
    splitter.reset_decoder();
    writeln!(out, "reset").unwrap();
    for _ in 0..3 {
        match splitter.next_line() {
            Ok(NextLine::Ready(line)) => writeln!(out, "line {:?}", line.as_str()).unwrap(),
            Ok(NextLine::Pending) => writeln!(out, "pending").unwrap(),
            Err(err) => writeln!(out, "error: {err}").unwrap(),
        }
    }

    insta::assert_snapshot!(out, @r#"
    line "ok"
    error: malformed input at byte 3: "\xFF"
    error: decoder must be reset after malformed input
    reset
    line "bad"
    line "fine"
    pending
    "#);
}

#[cfg(feature = "serde")]
#[test]
fn snapshot_options_yaml() {
    let options = LineReaderOptions {
        max_lines_per_scan: NonZeroUsize::new(64),
        ..Default::default()
    };
    insta::assert_yaml_snapshot!(options, @r"
    charset: utf8
    buffer_size: ~
    max_lines_per_scan: 64
    ");
}
