use alloc::string::String;

use super::{CharDecoder, Charset, DecodeStatus, DecodeStep};

/// ISO-8859-1 decoder. Stateless: every byte is one character.
#[derive(Debug, Default)]
pub struct Latin1Decoder;

impl Latin1Decoder {
    /// Creates a decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CharDecoder for Latin1Decoder {
    fn decode(&mut self, input: &[u8], out: &mut String, max_chars: usize) -> DecodeStep {
        let n = input.len().min(max_chars);
        out.extend(input[..n].iter().map(|&b| char::from(b)));
        let status = if n < input.len() {
            DecodeStatus::OutputFull
        } else {
            DecodeStatus::InputExhausted
        };
        DecodeStep::new(n, n, status)
    }

    fn has_pending(&self) -> bool {
        false
    }

    fn reset(&mut self) {}

    fn charset(&self) -> Charset {
        Charset::Latin1
    }
}
