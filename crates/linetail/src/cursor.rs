//! Decoding cursor: bytes from a [`ByteSource`] in, characters out.
//!
//! The cursor owns a fixed-size staging buffer. Each [`DecodingCursor::decode`]
//! call performs at most one read from the source into the free tail of that
//! buffer, then runs the staged bytes through the decoder.
//!
//! Invariants
//! - The staged region `staging[start..end]` holds exactly the bytes at
//!   `[position - (end - start), position)`: read from the source, not yet
//!   handed to the decoder.
//! - A decode never blocks on the source. "Nothing decoded, nothing read" is
//!   a normal outcome, distinct from malformed input.
//! - Repositioning discards staged bytes and the decoder's partial
//!   character, since both belong to the old offset.

use alloc::{boxed::Box, string::String, vec};

use bstr::BString;

use crate::{
    decoder::{CharDecoder, DecodeStatus},
    error::StreamError,
    source::ByteSource,
};

/// Why a call to [`DecodingCursor::decode`] stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStop {
    /// The requested number of characters was produced.
    OutputFull,
    /// Every staged byte was decoded (or is pending in the decoder). More may
    /// arrive later.
    InputExhausted,
    /// Bytes that do not form a character were consumed. The decoder must be
    /// reset before the next decode.
    Malformed {
        /// Absolute byte offset of the first offending byte.
        offset: u64,
        /// The offending bytes.
        sequence: BString,
    },
}

/// Result of one [`DecodingCursor::decode`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Characters appended to the caller's buffer.
    pub produced: usize,
    /// Bytes read from the source during this call.
    pub bytes_read: usize,
    /// Why decoding stopped.
    pub stop: DecodeStop,
}

/// Turns a [`ByteSource`] into characters, tracking the byte position.
///
/// The decoder is owned by the cursor and used by nothing else.
#[derive(Debug)]
pub struct DecodingCursor<S, D> {
    source: S,
    decoder: D,
    staging: Box<[u8]>,
    start: usize,
    end: usize,
    poisoned: bool,
}

impl<S: ByteSource, D: CharDecoder> DecodingCursor<S, D> {
    /// Creates a cursor with a staging buffer of `buffer_size` bytes (at
    /// least one).
    pub fn new(source: S, decoder: D, buffer_size: usize) -> Self {
        Self {
            source,
            decoder,
            staging: vec![0u8; buffer_size.max(1)].into_boxed_slice(),
            start: 0,
            end: 0,
            poisoned: false,
        }
    }

    /// Reads what the source has available (bounded by the free staging
    /// space) and decodes up to `max_chars` characters into `out`.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Closed`] if the source is closed.
    /// - [`StreamError::DecoderPoisoned`] if the previous decode stopped on
    ///   malformed input and the decoder was not reset.
    /// - [`StreamError::Source`] if the read fails.
    pub fn decode(
        &mut self,
        out: &mut String,
        max_chars: usize,
    ) -> Result<Decoded, StreamError<S::Error>> {
        self.ensure_open()?;
        if self.poisoned {
            return Err(StreamError::DecoderPoisoned);
        }

        self.compact();
        let mut bytes_read = 0;
        if self.end < self.staging.len() {
            bytes_read = self
                .source
                .read(&mut self.staging[self.end..])
                .map_err(StreamError::Source)?;
            self.end += bytes_read;
        }

        let staged_offset = self.position().saturating_sub(self.unread_len() as u64);
        let step = self
            .decoder
            .decode(&self.staging[self.start..self.end], out, max_chars);
        self.start += step.consumed;
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }

        let stop = match step.status {
            DecodeStatus::OutputFull => DecodeStop::OutputFull,
            DecodeStatus::InputExhausted => DecodeStop::InputExhausted,
            DecodeStatus::Malformed { sequence } => {
                self.poisoned = true;
                let offset = (staged_offset + step.consumed as u64)
                    .saturating_sub(sequence.len() as u64);
                DecodeStop::Malformed {
                    offset,
                    sequence: BString::from(sequence),
                }
            }
        };
        log::trace!(
            "decode: read {bytes_read} bytes, produced {} chars, {} bytes staged, stop {stop:?}",
            step.produced,
            self.unread_len()
        );
        Ok(Decoded {
            produced: step.produced,
            bytes_read,
            stop,
        })
    }

    /// Byte offset of the end of the staged bytes, i.e. the source position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// Moves to byte `position`, discarding staged bytes and any partial
    /// character held by the decoder.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] if the source is closed, or
    /// [`StreamError::InvalidPosition`] if the source rejects the offset. In
    /// both cases nothing is changed.
    pub fn set_position(&mut self, position: u64) -> Result<(), StreamError<S::Error>> {
        self.ensure_open()?;
        self.source
            .set_position(position)
            .map_err(|reason| StreamError::InvalidPosition { position, reason })?;
        log::debug!(
            "repositioned to byte {position}, dropped {} staged bytes",
            self.unread_len()
        );
        self.start = 0;
        self.end = 0;
        self.decoder.reset();
        self.poisoned = false;
        Ok(())
    }

    /// Returns `true` while the source is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.source.is_open()
    }

    /// Best-effort count of bytes the source can deliver right now.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] if closed, [`StreamError::Source`] if the
    /// source cannot tell.
    pub fn available_bytes(&mut self) -> Result<u64, StreamError<S::Error>> {
        self.ensure_open()?;
        self.source.available().map_err(StreamError::Source)
    }

    /// Returns `true` if bytes have been read but not yet turned into
    /// characters, either staged or held by the decoder mid-character.
    #[must_use]
    pub fn has_buffered_undecoded_bytes(&self) -> bool {
        self.unread_len() > 0 || self.decoder.has_pending()
    }

    /// Discards the decoder's state so decoding can continue after
    /// malformed input.
    pub fn reset_decoder(&mut self) {
        self.decoder.reset();
        self.poisoned = false;
    }

    /// Swaps in a fresh decoder, returning the old one.
    pub fn replace_decoder(&mut self, decoder: D) -> D {
        self.poisoned = false;
        core::mem::replace(&mut self.decoder, decoder)
    }

    /// The decoder in use.
    #[must_use]
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// The underlying source.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// The underlying source, mutably. Moving its position directly breaks
    /// the staging invariant; use [`DecodingCursor::set_position`] instead.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Closes the source and drops staged bytes.
    ///
    /// # Errors
    ///
    /// [`StreamError::Source`] if the source fails to close.
    pub fn close(&mut self) -> Result<(), StreamError<S::Error>> {
        self.start = 0;
        self.end = 0;
        self.source.close().map_err(StreamError::Source)
    }

    fn ensure_open(&self) -> Result<(), StreamError<S::Error>> {
        if self.source.is_open() {
            Ok(())
        } else {
            Err(StreamError::Closed)
        }
    }

    fn unread_len(&self) -> usize {
        self.end - self.start
    }

    /// Moves unread bytes to the front of the staging buffer.
    fn compact(&mut self) {
        if self.start > 0 {
            self.staging.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::{
        decoder::{Charset, Endian, Utf8Decoder, Utf16Decoder},
        source::MemorySource,
    };

    fn utf8_cursor(
        source: MemorySource,
        buffer: usize,
    ) -> DecodingCursor<MemorySource, Utf8Decoder> {
        DecodingCursor::new(source, Utf8Decoder::new(), buffer)
    }

    #[test]
    fn nothing_available_is_not_an_error() {
        let (source, appender) = MemorySource::growing();
        let mut cursor = utf8_cursor(source, 16);
        assert_eq!(cursor.decoder().charset(), Charset::Utf8);
        let mut out = String::new();

        let decoded = cursor.decode(&mut out, 16).unwrap();
        assert_eq!(decoded.produced, 0);
        assert_eq!(decoded.bytes_read, 0);
        assert_eq!(decoded.stop, DecodeStop::InputExhausted);

        appender.append(b"late");
        let decoded = cursor.decode(&mut out, 16).unwrap();
        assert_eq!(decoded.produced, 4);
        assert_eq!(out, "late");
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn split_multibyte_char_is_held_not_lost() {
        let source = MemorySource::new("x€".as_bytes()).with_read_limit(2);
        let mut cursor = utf8_cursor(source, 16);
        let mut out = String::new();

        let decoded = cursor.decode(&mut out, 16).unwrap();
        assert_eq!(decoded.produced, 1);
        assert!(cursor.has_buffered_undecoded_bytes());

        let decoded = cursor.decode(&mut out, 16).unwrap();
        assert_eq!(decoded.produced, 1);
        assert_eq!(out, "x€");
        assert!(!cursor.has_buffered_undecoded_bytes());
    }

    #[test]
    fn output_full_keeps_bytes_staged() {
        let mut cursor = utf8_cursor(MemorySource::new(&b"abcdef"[..]), 16);
        let mut out = String::new();
        let decoded = cursor.decode(&mut out, 2).unwrap();
        assert_eq!(decoded.stop, DecodeStop::OutputFull);
        assert_eq!(cursor.position(), 6);
        assert!(cursor.has_buffered_undecoded_bytes());

        let mut rest = String::new();
        let decoded = cursor.decode(&mut rest, 16).unwrap();
        assert_eq!(decoded.bytes_read, 0);
        assert_eq!(rest, "cdef");
    }

    #[test]
    fn source_moved_behind_staged_bytes_still_decodes() {
        let mut cursor = utf8_cursor(MemorySource::new(&b"abcdef"[..]), 8);
        let mut out = String::new();
        cursor.decode(&mut out, 1).unwrap();
        assert_eq!(out, "a");

        // Five bytes stay staged while the source rewinds underneath them.
        cursor.get_mut().set_position(0).unwrap();
        let mut rest = String::new();
        let decoded = cursor.decode(&mut rest, 1).unwrap();
        assert_eq!(decoded.bytes_read, 3);
        assert_eq!(rest, "b");
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn reposition_discards_staged_and_pending() {
        let mut cursor = utf8_cursor(MemorySource::new("ab€".as_bytes()).with_read_limit(3), 16);
        let mut out = String::new();
        cursor.decode(&mut out, 1).unwrap();
        assert!(cursor.has_buffered_undecoded_bytes());

        cursor.set_position(0).unwrap();
        assert!(!cursor.has_buffered_undecoded_bytes());
        assert_eq!(cursor.position(), 0);

        let mut again = String::new();
        cursor.decode(&mut again, 16).unwrap();
        cursor.decode(&mut again, 16).unwrap();
        assert_eq!(again, "ab€");
    }

    #[test]
    fn rejected_seek_changes_nothing() {
        let mut cursor = utf8_cursor(MemorySource::new(&b"abcd"[..]), 16);
        let mut out = String::new();
        cursor.decode(&mut out, 1).unwrap();
        let err = cursor.set_position(10).unwrap_err();
        assert!(matches!(err, StreamError::InvalidPosition { position: 10, .. }));
        assert_eq!(cursor.position(), 4);
        assert!(cursor.has_buffered_undecoded_bytes());
    }

    #[test]
    fn malformed_input_poisons_until_reset() {
        let mut cursor = utf8_cursor(MemorySource::new(&b"ab\xFFcd"[..]), 16);
        let mut out = String::new();
        let decoded = cursor.decode(&mut out, 16).unwrap();
        assert_eq!(out, "ab");
        assert_eq!(
            decoded.stop,
            DecodeStop::Malformed {
                offset: 2,
                sequence: BString::from(&b"\xFF"[..]),
            }
        );

        assert_eq!(
            cursor.decode(&mut out, 16),
            Err(StreamError::DecoderPoisoned)
        );

        cursor.reset_decoder();
        cursor.decode(&mut out, 16).unwrap();
        assert_eq!(out, "abcd");
    }

    #[test]
    fn malformed_offset_counts_pending_bytes() {
        // E2 82 is held across reads, then 'A' proves it malformed.
        let source = MemorySource::new(&b"xy\xE2\x82A"[..]).with_read_limit(4);
        let mut cursor = utf8_cursor(source, 16);
        let mut out = String::new();
        cursor.decode(&mut out, 16).unwrap();
        let decoded = cursor.decode(&mut out, 16).unwrap();
        assert_eq!(
            decoded.stop,
            DecodeStop::Malformed {
                offset: 2,
                sequence: BString::from(&b"\xE2\x82"[..]),
            }
        );
        let old = cursor.replace_decoder(Utf8Decoder::new());
        assert!(!old.has_pending());
        cursor.decode(&mut out, 16).unwrap();
        assert_eq!(out, "xyA");
    }

    #[test]
    fn closed_source_fails_fast() {
        let mut cursor = utf8_cursor(MemorySource::new(&b"abc"[..]), 16);
        cursor.close().unwrap();
        assert!(!cursor.is_open());
        let mut out = String::new();
        assert_eq!(cursor.decode(&mut out, 4), Err(StreamError::Closed));
        assert_eq!(cursor.set_position(0), Err(StreamError::Closed));
        assert_eq!(cursor.available_bytes(), Err(StreamError::Closed));
    }

    #[test]
    fn small_staging_buffer_makes_progress() {
        let bytes: alloc::vec::Vec<u8> = "hé🦀"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        let mut cursor = DecodingCursor::new(
            MemorySource::new(bytes),
            Utf16Decoder::new(Endian::Little),
            1,
        );
        let mut out = String::new();
        for _ in 0..8 {
            cursor.decode(&mut out, 1).unwrap();
        }
        assert_eq!(out, "hé🦀");
        assert_eq!(cursor.available_bytes().unwrap(), 0);
    }
}
