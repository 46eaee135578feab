use alloc::{string::String, vec::Vec};

use super::{CharDecoder, Charset, DecodeStatus, DecodeStep};

/// Incremental UTF-8 decoder.
///
/// Holds at most three bytes of an incomplete sequence between calls, so a
/// character split across two reads decodes to the single correct `char`.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: [u8; 4],
    pending_len: usize,
}

enum Completion {
    Done { consumed: usize },
    NeedMore { consumed: usize },
    Malformed { consumed: usize, sequence: Vec<u8> },
}

/// Length of the sequence announced by `lead`. Invalid leads report 1 and are
/// left to `from_utf8` to reject.
fn sequence_len(lead: u8) -> usize {
    match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 1,
    }
}

/// Appends at most `budget` chars of `text` to `out`; returns `(bytes, chars)`
/// taken.
fn push_limited(text: &str, out: &mut String, budget: usize) -> (usize, usize) {
    if let Some((cut, _)) = text.char_indices().nth(budget) {
        out.push_str(&text[..cut]);
        (cut, budget)
    } else {
        out.push_str(text);
        (text.len(), text.chars().count())
    }
}

impl Utf8Decoder {
    /// Creates a decoder with no pending state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn complete_pending(&mut self, input: &[u8], out: &mut String) -> Completion {
        let held = self.pending_len;
        let need = sequence_len(self.pending[0]);
        let take = need.saturating_sub(held).min(input.len());
        self.pending[held..held + take].copy_from_slice(&input[..take]);
        let len = held + take;

        match core::str::from_utf8(&self.pending[..len]) {
            Ok(ch) => {
                out.push_str(ch);
                self.pending_len = 0;
                Completion::Done { consumed: take }
            }
            Err(err) => match err.error_len() {
                None => {
                    self.pending_len = len;
                    Completion::NeedMore { consumed: take }
                }
                Some(bad) => {
                    let sequence = self.pending[..bad].to_vec();
                    self.pending_len = 0;
                    Completion::Malformed {
                        consumed: bad.saturating_sub(held),
                        sequence,
                    }
                }
            },
        }
    }
}

impl CharDecoder for Utf8Decoder {
    fn decode(&mut self, input: &[u8], out: &mut String, max_chars: usize) -> DecodeStep {
        let mut consumed = 0;
        let mut produced = 0;

        if self.pending_len > 0 {
            if max_chars == 0 {
                return DecodeStep::new(0, 0, DecodeStatus::OutputFull);
            }
            match self.complete_pending(input, out) {
                Completion::Done { consumed: n } => {
                    consumed = n;
                    produced = 1;
                }
                Completion::NeedMore { consumed: n } => {
                    return DecodeStep::new(n, 0, DecodeStatus::InputExhausted);
                }
                Completion::Malformed {
                    consumed: n,
                    sequence,
                } => {
                    return DecodeStep::new(n, 0, DecodeStatus::Malformed { sequence });
                }
            }
        }

        let rest = &input[consumed..];
        let (valid, after) = match core::str::from_utf8(rest) {
            Ok(text) => (text, None),
            Err(err) => {
                let (head, tail) = rest.split_at(err.valid_up_to());
                let head = core::str::from_utf8(head).unwrap_or_default();
                (head, Some((tail, err.error_len())))
            }
        };

        let (bytes, chars) = push_limited(valid, out, max_chars - produced);
        consumed += bytes;
        produced += chars;
        if bytes < valid.len() {
            return DecodeStep::new(consumed, produced, DecodeStatus::OutputFull);
        }

        let status = match after {
            None => DecodeStatus::InputExhausted,
            Some((tail, None)) => {
                self.pending[..tail.len()].copy_from_slice(tail);
                self.pending_len = tail.len();
                consumed += tail.len();
                DecodeStatus::InputExhausted
            }
            Some((tail, Some(bad))) => {
                consumed += bad;
                DecodeStatus::Malformed {
                    sequence: tail[..bad].to_vec(),
                }
            }
        };
        DecodeStep::new(consumed, produced, status)
    }

    fn has_pending(&self) -> bool {
        self.pending_len > 0
    }

    fn reset(&mut self) {
        self.pending_len = 0;
    }

    fn charset(&self) -> Charset {
        Charset::Utf8
    }
}
