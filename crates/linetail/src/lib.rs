//! A continuous, resumable line reader.
//!
//! `linetail` turns bytes from a source that may still be growing, such as a
//! log file another process is writing, into text lines. Running out of
//! bytes is never the end: a request that finds nothing returns
//! [`NextLine::Pending`], and the same reader picks up where it left off once
//! more bytes arrive.
//!
//! Two layers do the work:
//!
//! - [`DecodingCursor`] reads bytes from a [`ByteSource`] and runs them
//!   through a stateful [`CharDecoder`], so a multi-byte character split
//!   across reads still decodes correctly.
//! - [`LineSplitter`] scans the decoded chunks for line terminators and hands
//!   out [`Line`]s, which view the chunk they were found in whenever they do
//!   not span chunks.
//!
//! ```rust
//! use linetail::{LineReaderOptions, LineSplitter, MemorySource};
//!
//! let (source, appender) = MemorySource::growing();
//! let mut lines = LineSplitter::open(source, LineReaderOptions::default());
//!
//! appender.append("début\r\nfin".as_bytes());
//! let now: Vec<_> = lines.ready().collect::<Result<_, _>>()?;
//! assert_eq!(now, ["début"]);
//!
//! appender.append(b"\n");
//! assert_eq!(lines.next_line()?.ready().unwrap(), "fin");
//! # Ok::<(), linetail::StreamError<linetail::MemorySourceError>>(())
//! ```
//!
//! The crate is `no_std` with `alloc`. The default `std` feature adds
//! [`IoSource`] for files and other `Read + Seek` types; the `serde` feature
//! makes [`LineReaderOptions`] loadable from configuration files.
//!
//! Nothing here is thread safe. Callers sharing a reader across threads must
//! serialise access themselves.

#![no_std]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

mod cursor;
pub mod decoder;
mod error;
mod line;
mod options;
pub mod source;
mod splitter;

#[cfg(test)]
mod tests;

pub use cursor::{DecodeStop, Decoded, DecodingCursor};
pub use decoder::{AnyDecoder, CharDecoder, Charset, DecodeStatus, DecodeStep};
pub use error::StreamError;
pub use line::{Line, LineEnding};
pub use options::{DEFAULT_CHUNK_CHARS, LineReaderOptions};
#[cfg(feature = "std")]
pub use source::IoSource;
pub use source::{Appender, ByteSource, MemorySource, MemorySourceError};
pub use splitter::{LineSplitter, NextLine, Ready, SplitterState};
