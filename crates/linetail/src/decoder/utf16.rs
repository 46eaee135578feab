use alloc::{string::String, vec::Vec};

use super::{CharDecoder, Charset, DecodeStatus, DecodeStep};

/// Byte order of a UTF-16 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

/// Incremental UTF-16 decoder.
///
/// Two pieces of state survive between calls: an odd trailing byte, and a
/// high surrogate still waiting for its low half. An unpaired surrogate is
/// malformed; when a high surrogate is followed by anything but a low
/// surrogate, both code units are reported and consumed.
#[derive(Debug)]
pub struct Utf16Decoder {
    endian: Endian,
    odd: Option<u8>,
    high: Option<u16>,
}

const HIGH: core::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW: core::ops::RangeInclusive<u16> = 0xDC00..=0xDFFF;

impl Utf16Decoder {
    /// Creates a decoder for the given byte order.
    #[must_use]
    pub fn new(endian: Endian) -> Self {
        Self {
            endian,
            odd: None,
            high: None,
        }
    }

    fn unit(&self, first: u8, second: u8) -> u16 {
        match self.endian {
            Endian::Little => u16::from_le_bytes([first, second]),
            Endian::Big => u16::from_be_bytes([first, second]),
        }
    }

    fn unit_bytes(&self, unit: u16, into: &mut Vec<u8>) {
        match self.endian {
            Endian::Little => into.extend_from_slice(&unit.to_le_bytes()),
            Endian::Big => into.extend_from_slice(&unit.to_be_bytes()),
        }
    }

    /// Assembles the next code unit, moving a lone trailing byte into `odd`.
    fn next_unit(&mut self, input: &[u8], consumed: &mut usize) -> Option<u16> {
        if let Some(first) = self.odd.take() {
            let Some(&second) = input.get(*consumed) else {
                self.odd = Some(first);
                return None;
            };
            *consumed += 1;
            return Some(self.unit(first, second));
        }
        match input.get(*consumed..*consumed + 2) {
            Some(&[first, second]) => {
                *consumed += 2;
                Some(self.unit(first, second))
            }
            _ => {
                if let Some(&first) = input.get(*consumed) {
                    self.odd = Some(first);
                    *consumed += 1;
                }
                None
            }
        }
    }

    fn malformed(&self, units: &[u16]) -> DecodeStatus {
        let mut sequence = Vec::with_capacity(units.len() * 2);
        for &unit in units {
            self.unit_bytes(unit, &mut sequence);
        }
        DecodeStatus::Malformed { sequence }
    }
}

impl CharDecoder for Utf16Decoder {
    fn decode(&mut self, input: &[u8], out: &mut String, max_chars: usize) -> DecodeStep {
        let mut consumed = 0;
        let mut produced = 0;

        loop {
            if produced >= max_chars {
                let status = if consumed < input.len() {
                    DecodeStatus::OutputFull
                } else {
                    DecodeStatus::InputExhausted
                };
                return DecodeStep::new(consumed, produced, status);
            }
            let Some(unit) = self.next_unit(input, &mut consumed) else {
                return DecodeStep::new(consumed, produced, DecodeStatus::InputExhausted);
            };

            match self.high.take() {
                None if HIGH.contains(&unit) => self.high = Some(unit),
                None if LOW.contains(&unit) => {
                    return DecodeStep::new(consumed, produced, self.malformed(&[unit]));
                }
                None => {
                    if let Some(ch) = char::from_u32(u32::from(unit)) {
                        out.push(ch);
                        produced += 1;
                    }
                }
                Some(high) if LOW.contains(&unit) => {
                    let scalar = 0x1_0000
                        + ((u32::from(high) - 0xD800) << 10)
                        + (u32::from(unit) - 0xDC00);
                    if let Some(ch) = char::from_u32(scalar) {
                        out.push(ch);
                        produced += 1;
                    }
                }
                Some(high) => {
                    return DecodeStep::new(consumed, produced, self.malformed(&[high, unit]));
                }
            }
        }
    }

    fn has_pending(&self) -> bool {
        self.odd.is_some() || self.high.is_some()
    }

    fn reset(&mut self) {
        self.odd = None;
        self.high = None;
    }

    fn charset(&self) -> Charset {
        match self.endian {
            Endian::Little => Charset::Utf16Le,
            Endian::Big => Charset::Utf16Be,
        }
    }
}
