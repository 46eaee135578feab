#![no_main]
use std::{cell::RefCell, num::NonZeroUsize};

use arbitrary::Unstructured;
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use linetail::{
    ByteSource, CharDecoder, Charset, LineEnding, LineReaderOptions, LineSplitter, MemorySource,
    NextLine, StreamError,
};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

const HEADER: usize = 5; // 1 flag byte + 4-byte split seed

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

/// Fragments that stress terminator and multi-byte handling: every line
/// ending shape, characters of each UTF-8 width, and bytes that are only
/// valid as part of something else.
static FRAGMENT_TABLE: &[&[u8]] = &[
    b"\n",
    b"\r\n",
    b"\r",
    b"\n\n",
    b"\r\r\n",
    "é".as_bytes(),
    "€".as_bytes(),
    "🦀".as_bytes(),
    b"\xE2\x82",
    b"\xF0\x9F",
    b"\xFF",
    b"\x00\n",
    b"\n\x00",
    b"\x3D\xD8",
    b"\x00\xDC",
];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8 & 0x1F);
        data[1..5].copy_from_slice(&with_rng(|rng| rng.next_u32().to_le_bytes()));

        let mut prefix = HEADER;
        while prefix < size.max(HEADER + 1) && prefix < max_size {
            let before = prefix;
            prefix += append_fragments(&mut data[prefix..], max_size - prefix);
            prefix += append_text(&mut data[prefix..], size, max_size - prefix);
            if prefix == before {
                break;
            }
        }
        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

/// Append 1‒8 fragments from [`FRAGMENT_TABLE`] without exceeding `limit`.
/// Returns the number of bytes written.
fn append_fragments(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        if limit == 0 {
            return 0;
        }
        let count = rng.random_range(1..=8);
        let mut written = 0;
        for _ in 0..count {
            let f = FRAGMENT_TABLE[rng.random_range(0..FRAGMENT_TABLE.len())];
            if written + f.len() > limit {
                break;
            }
            buf[written..written + f.len()].copy_from_slice(f);
            written += f.len();
        }
        written
    })
}

/// Append arbitrary text (valid UTF-8) without exceeding `limit`.
fn append_text(buf: &mut [u8], size: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    let n = with_rng(|rng| rng.random_range(1..=size.max(2)).min(limit));
    let raw: Vec<u8> = with_rng(|rng| (0..n).map(|_| rng.random::<u8>()).collect());
    let text: String = Unstructured::new(&raw).arbitrary().unwrap_or_default();
    let len = text.len().min(limit);
    buf[..len].copy_from_slice(&text.as_bytes()[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug, PartialEq)]
enum Seen {
    Line(String, LineEnding),
    Malformed(u64),
}

/// Drain every line available right now, resetting the decoder after
/// malformed input.
fn drain<S, D>(splitter: &mut LineSplitter<S, D>, seen: &mut Vec<Seen>)
where
    S: ByteSource,
    S::Error: std::fmt::Debug,
    D: CharDecoder,
{
    loop {
        match splitter.next_line() {
            Ok(NextLine::Ready(line)) => {
                let ending = line.ending();
                seen.push(Seen::Line(line.into_string(), ending));
            }
            Ok(NextLine::Pending) => return,
            Err(StreamError::Malformed { offset, .. }) => {
                seen.push(Seen::Malformed(offset));
                splitter.reset_decoder();
            }
            Err(err) => panic!("unexpected error: {err:?}"),
        }
    }
}

fn lines(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let split_seed = u32::from_le_bytes(data[1..5].try_into().unwrap()) as u64;
    let data = &data[HEADER..];

    let charset = match flags & 3 {
        0 => Charset::Utf8,
        1 => Charset::Latin1,
        2 => Charset::Utf16Le,
        _ => Charset::Utf16Be,
    };
    let buffer_size = [1, 2, 7, 8192][usize::from((flags >> 3) & 3)];

    // Reference: the whole input available up front, default buffer.
    let mut expected = Vec::new();
    let mut reference = LineSplitter::open(
        MemorySource::new(data),
        LineReaderOptions {
            charset,
            ..Default::default()
        },
    );
    drain(&mut reference, &mut expected);
    for line in reference.close_returning_tail().unwrap() {
        let ending = line.ending();
        expected.push(Seen::Line(line.into_string(), ending));
    }

    // Same bytes appended to a live source in seed-chosen pieces.
    let (source, appender) = MemorySource::growing();
    let mut splitter = LineSplitter::open(
        source,
        LineReaderOptions {
            charset,
            buffer_size: NonZeroUsize::new(buffer_size),
            max_lines_per_scan: if flags & 4 != 0 {
                NonZeroUsize::new(1)
            } else {
                None
            },
        },
    );
    let mut seen = Vec::new();
    for piece in split_into_chunks(data, split_seed) {
        appender.append(piece);
        drain(&mut splitter, &mut seen);
    }
    for line in splitter.close_returning_tail().unwrap() {
        let ending = line.ending();
        seen.push(Seen::Line(line.into_string(), ending));
    }

    assert_eq!(expected, seen);
}

fuzz_target!(|data: &[u8]| lines(data));

/// Split `bytes` into pieces using a deterministic random value. Pieces are
/// at least one byte and ignore character boundaries.
fn split_into_chunks(bytes: &[u8], split_seed: u64) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let len = bytes.len();
    let mut seed = split_seed;

    while start < len {
        let remaining = len - start;
        let size = (seed as usize % remaining) + 1;
        chunks.push(&bytes[start..start + size]);
        start += size;
        seed = seed.rotate_left(7) ^ (size as u64);
    }

    chunks
}
