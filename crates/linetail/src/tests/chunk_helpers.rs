//! Helpers that feed a splitter in controlled pieces.

use alloc::vec::Vec;

use crate::{Line, LineReaderOptions, LineSplitter, MemorySource};

/// Split `payload` into `parts` pieces of roughly equal byte length.
///
/// Unlike text chunking, the cuts ignore character boundaries: a multi-byte
/// character may well end up split between two pieces.
///
/// # Panics
///
/// Panics if `parts` is zero.
pub(crate) fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let size = payload.len().div_ceil(parts).max(1);
    payload.chunks(size).collect()
}

/// Cut `payload` at the byte offsets derived from `splits` (each taken modulo
/// the remaining length, plus one), the way the property tests partition
/// their input.
pub(crate) fn partition<'a>(payload: &'a [u8], splits: &[usize]) -> Vec<&'a [u8]> {
    let mut pieces = Vec::new();
    let mut rest = payload;
    for &s in splits {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(1 + s % rest.len());
        pieces.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

/// Append `pieces` one at a time to a growing source, draining the lines
/// available after each, then close and collect the tail.
pub(crate) fn read_appended(pieces: &[&[u8]], options: LineReaderOptions) -> Vec<Line> {
    let (source, appender) = MemorySource::growing();
    let mut splitter = LineSplitter::open(source, options);
    let mut lines = Vec::new();
    for piece in pieces {
        appender.append(piece);
        lines.extend(splitter.ready().map(Result::unwrap));
    }
    lines.extend(splitter.ready().map(Result::unwrap));
    lines.extend(splitter.close_returning_tail().unwrap());
    lines
}

/// Read a fixed `payload` through reads of at most `read_limit` bytes.
pub(crate) fn read_limited(
    payload: &[u8],
    read_limit: usize,
    options: LineReaderOptions,
) -> Vec<Line> {
    let source = MemorySource::new(payload).with_read_limit(read_limit);
    let mut splitter = LineSplitter::open(source, options);
    let mut lines: Vec<Line> = splitter.ready().map(Result::unwrap).collect();
    lines.extend(splitter.close_returning_tail().unwrap());
    lines
}

#[test]
fn produce_chunks_splits_inside_characters() {
    let payload = "a€b".as_bytes();
    let chunks = produce_chunks(payload, 3);
    assert_eq!(chunks, [&b"a\xE2"[..], &b"\x82\xAC"[..], &b"b"[..]]);
    assert_eq!(chunks.concat(), payload);
}

#[test]
fn partition_covers_payload() {
    let payload = b"0123456789";
    let pieces = partition(payload, &[2, 100, 0]);
    assert_eq!(pieces, [&b"012"[..], &b"345"[..], &b"6"[..], &b"789"[..]]);
}

#[test]
fn appended_and_limited_reads_agree() {
    let payload = "x\r\ny€\nz".as_bytes();
    let appended = read_appended(&produce_chunks(payload, 4), LineReaderOptions::default());
    let limited = read_limited(payload, 2, LineReaderOptions::default());
    assert_eq!(appended, limited);
    assert_eq!(appended, ["x", "y€", "z"]);
}

#[quickcheck_macros::quickcheck]
fn partition_preserves_bytes(payload: Vec<u8>, splits: Vec<usize>) -> bool {
    let pieces = partition(&payload, &splits);
    pieces.iter().all(|piece| !piece.is_empty()) && pieces.concat() == payload
}
