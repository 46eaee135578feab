//! Stateful byte-to-character decoders.
//!
//! A decoder turns a run of bytes into characters appended to a `String`,
//! carrying any incomplete multi-byte sequence over to the next call.
//! Decoders are not `Clone`: a copy taken mid-sequence would decode the
//! continuation bytes twice or not at all. State is discarded only through
//! [`CharDecoder::reset`] or by replacing the decoder outright.
//!
//! Invariants
//! - `decode` never emits more than `max_chars` characters.
//! - Bytes that merely *start* a character are consumed into the decoder's
//!   pending state, never left unconsumed; `has_pending` reports them.
//! - On [`DecodeStatus::Malformed`] the offending bytes are consumed and
//!   returned so the caller can report them. The decoder must then be reset
//!   before further use.

mod latin1;
mod utf16;
mod utf8;

use alloc::{string::String, vec::Vec};

pub use latin1::Latin1Decoder;
pub use utf8::Utf8Decoder;
pub use utf16::{Endian, Utf16Decoder};

/// Why a call to [`CharDecoder::decode`] stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Every input byte was consumed. More input may complete a pending
    /// character.
    InputExhausted,
    /// `max_chars` characters were produced; unconsumed input remains.
    OutputFull,
    /// The bytes in `sequence` are not valid in this charset. They may
    /// include bytes carried over from an earlier call.
    Malformed {
        /// The offending bytes, in stream order.
        sequence: Vec<u8>,
    },
}

/// Outcome of one [`CharDecoder::decode`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeStep {
    /// Bytes of `input` consumed, including bytes moved into pending state
    /// and bytes of a malformed sequence.
    pub consumed: usize,
    /// Characters appended to the output.
    pub produced: usize,
    /// Why decoding stopped.
    pub status: DecodeStatus,
}

impl DecodeStep {
    pub(crate) fn new(consumed: usize, produced: usize, status: DecodeStatus) -> Self {
        Self {
            consumed,
            produced,
            status,
        }
    }
}

/// A stateful, incremental character decoder.
pub trait CharDecoder {
    /// Decodes as many characters from `input` as fit in `max_chars`,
    /// appending them to `out`.
    fn decode(&mut self, input: &[u8], out: &mut String, max_chars: usize) -> DecodeStep;

    /// Returns `true` while a partially received character is held.
    fn has_pending(&self) -> bool;

    /// Discards any partially received character.
    fn reset(&mut self);

    /// The charset this decoder implements.
    fn charset(&self) -> Charset;

    /// Typical number of bytes per character, used to size read buffers.
    fn bytes_per_char_estimate(&self) -> usize {
        self.charset().bytes_per_char_estimate()
    }
}

/// Supported character sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Charset {
    /// UTF-8.
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
    /// UTF-16, little endian, no byte order mark handling.
    Utf16Le,
    /// UTF-16, big endian, no byte order mark handling.
    Utf16Be,
}

impl Charset {
    /// Typical number of bytes per character in this charset.
    #[must_use]
    pub fn bytes_per_char_estimate(self) -> usize {
        match self {
            Charset::Utf8 | Charset::Latin1 => 1,
            Charset::Utf16Le | Charset::Utf16Be => 2,
        }
    }

    /// Creates a fresh decoder for this charset.
    #[must_use]
    pub fn decoder(self) -> AnyDecoder {
        match self {
            Charset::Utf8 => AnyDecoder::Utf8(Utf8Decoder::new()),
            Charset::Latin1 => AnyDecoder::Latin1(Latin1Decoder::new()),
            Charset::Utf16Le => AnyDecoder::Utf16(Utf16Decoder::new(Endian::Little)),
            Charset::Utf16Be => AnyDecoder::Utf16(Utf16Decoder::new(Endian::Big)),
        }
    }
}

/// A decoder for any [`Charset`], selected at runtime.
#[derive(Debug)]
pub enum AnyDecoder {
    /// See [`Utf8Decoder`].
    Utf8(Utf8Decoder),
    /// See [`Latin1Decoder`].
    Latin1(Latin1Decoder),
    /// See [`Utf16Decoder`].
    Utf16(Utf16Decoder),
}

impl Default for AnyDecoder {
    fn default() -> Self {
        Charset::default().decoder()
    }
}

impl CharDecoder for AnyDecoder {
    fn decode(&mut self, input: &[u8], out: &mut String, max_chars: usize) -> DecodeStep {
        match self {
            AnyDecoder::Utf8(d) => d.decode(input, out, max_chars),
            AnyDecoder::Latin1(d) => d.decode(input, out, max_chars),
            AnyDecoder::Utf16(d) => d.decode(input, out, max_chars),
        }
    }

    fn has_pending(&self) -> bool {
        match self {
            AnyDecoder::Utf8(d) => d.has_pending(),
            AnyDecoder::Latin1(d) => d.has_pending(),
            AnyDecoder::Utf16(d) => d.has_pending(),
        }
    }

    fn reset(&mut self) {
        match self {
            AnyDecoder::Utf8(d) => d.reset(),
            AnyDecoder::Latin1(d) => d.reset(),
            AnyDecoder::Utf16(d) => d.reset(),
        }
    }

    fn charset(&self) -> Charset {
        match self {
            AnyDecoder::Utf8(d) => d.charset(),
            AnyDecoder::Latin1(d) => d.charset(),
            AnyDecoder::Utf16(d) => d.charset(),
        }
    }
}

impl<D: CharDecoder + ?Sized> CharDecoder for &mut D {
    fn decode(&mut self, input: &[u8], out: &mut String, max_chars: usize) -> DecodeStep {
        (**self).decode(input, out, max_chars)
    }

    fn has_pending(&self) -> bool {
        (**self).has_pending()
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn charset(&self) -> Charset {
        (**self).charset()
    }

    fn bytes_per_char_estimate(&self) -> usize {
        (**self).bytes_per_char_estimate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_builds_matching_decoder() {
        for charset in [
            Charset::Utf8,
            Charset::Latin1,
            Charset::Utf16Le,
            Charset::Utf16Be,
        ] {
            assert_eq!(charset.decoder().charset(), charset);
        }
        assert_eq!(AnyDecoder::default().charset(), Charset::Utf8);
    }

    #[test]
    fn any_decoder_delegates() {
        let mut d = Charset::Latin1.decoder();
        let mut out = String::new();
        let step = d.decode(b"caf\xE9", &mut out, 16);
        assert_eq!(out, "café");
        assert_eq!(step.produced, 4);
        assert_eq!(d.bytes_per_char_estimate(), 1);
    }
}
