//! C1: a streaming byte → codepoint / byte → sequence decoder (spec.md §4.1).
//!
//! This mirrors `terminol/utf8.{hxx,cxx}` byte-for-byte in its
//! classification rules (lead-length table, overlong rejection, surrogate
//! rejection) but is reshaped into the sum-type the design notes call for
//! (spec.md §9: "return a sum type; never allocate on the decode path").
//!
//! The VT state machine (`vtparse`) does not sit on top of this machine in
//! the hot path — it delegates UTF-8 recognition to the `vte` crate, which
//! implements the same DEC-parser-integrated decoding internally. This
//! module exists as the independently testable decoder spec.md's round-trip
//! property (§8) names, and is reused directly by the char-set translator
//! and by key-sequence encoding, where no `vte::Parser` is in the loop.

/// Length, in bytes, of a UTF-8 sequence given its lead byte's bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    L1 = 1,
    L2 = 2,
    L3 = 3,
    L4 = 4,
}

impl Length {
    /// Minimum codepoint value that does not overlong-encode at this length.
    const fn min_codepoint(self) -> u32 {
        match self {
            Length::L1 => 0x0,
            Length::L2 => 0x80,
            Length::L3 => 0x800,
            Length::L4 => 0x10000,
        }
    }
}

/// Decode/encode failure: malformed continuation, overlong encoding, or a
/// surrogate codepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf8Error;

/// Given a lead byte, classify the sequence length it introduces.
pub fn lead_length(lead: u8) -> Result<Length, Utf8Error> {
    if lead & 0b1000_0000 == 0 {
        Ok(Length::L1)
    } else if lead & 0b1110_0000 == 0b1100_0000 {
        Ok(Length::L2)
    } else if lead & 0b1111_0000 == 0b1110_0000 {
        Ok(Length::L3)
    } else if lead & 0b1111_1000 == 0b1111_0000 {
        Ok(Length::L4)
    } else {
        Err(Utf8Error)
    }
}

/// Decode a complete, in-bounds UTF-8 sequence into its codepoint.
pub fn decode(seq: &[u8]) -> Result<u32, Utf8Error> {
    let length = lead_length(seq[0])?;
    if seq.len() < length as usize {
        return Err(Utf8Error);
    }

    let mut codepoint: u32 = match length {
        Length::L1 => u32::from(seq[0]),
        Length::L2 => u32::from(seq[0] & 0b0001_1111),
        Length::L3 => u32::from(seq[0] & 0b0000_1111),
        Length::L4 => u32::from(seq[0] & 0b0000_0111),
    };

    for &cont in &seq[1..length as usize] {
        if cont & 0b1100_0000 != 0b1000_0000 {
            return Err(Utf8Error);
        }
        codepoint = (codepoint << 6) | u32::from(cont & 0b0011_1111);
    }

    if codepoint < length.min_codepoint() {
        return Err(Utf8Error);
    }
    if (0xD800..=0xDFFF).contains(&codepoint) {
        return Err(Utf8Error);
    }

    Ok(codepoint)
}

/// Length of the sequence that would encode `codepoint`.
pub fn codepoint_length(codepoint: u32) -> Result<Length, Utf8Error> {
    match codepoint {
        0..=0x7F => Ok(Length::L1),
        0x80..=0x7FF => Ok(Length::L2),
        0x800..=0xFFFF => Ok(Length::L3),
        0x1_0000..=0x10_FFFF => Ok(Length::L4),
        _ => Err(Utf8Error),
    }
}

/// Encode `codepoint` into `out`, returning the number of bytes written.
pub fn encode(codepoint: u32, out: &mut [u8; 4]) -> Result<Length, Utf8Error> {
    let length = codepoint_length(codepoint)?;
    match length {
        Length::L1 => out[0] = codepoint as u8,
        Length::L2 => {
            out[0] = ((codepoint >> 6) as u8) | 0b1100_0000;
            out[1] = ((codepoint & 0x3F) as u8) | 0b1000_0000;
        }
        Length::L3 => {
            out[0] = ((codepoint >> 12) as u8) | 0b1110_0000;
            out[1] = (((codepoint >> 6) & 0x3F) as u8) | 0b1000_0000;
            out[2] = ((codepoint & 0x3F) as u8) | 0b1000_0000;
        }
        Length::L4 => {
            out[0] = ((codepoint >> 18) as u8) | 0b1111_0000;
            out[1] = (((codepoint >> 12) & 0x3F) as u8) | 0b1000_0000;
            out[2] = (((codepoint >> 6) & 0x3F) as u8) | 0b1000_0000;
            out[3] = ((codepoint & 0x3F) as u8) | 0b1000_0000;
        }
    }
    Ok(length)
}

/// Outcome of feeding one byte to [`Machine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A complete sequence was accepted; `len` of `seq`'s leading bytes are
    /// valid.
    Accept { seq: [u8; 4], len: u8 },
    /// The byte was rejected (malformed continuation, overlong, or
    /// surrogate); the machine has been reset to its initial state.
    Reject,
    /// The sequence is not yet complete; more bytes are needed.
    Continue,
}

/// Incremental UTF-8 decoder: last incomplete sequence plus the expected
/// continuation count (spec.md §4.1).
#[derive(Debug, Default, Clone, Copy)]
pub struct Machine {
    buf: [u8; 4],
    filled: u8,
    expected: u8,
}

impl Machine {
    /// A fresh machine, not mid-sequence.
    pub const fn new() -> Self {
        Self { buf: [0; 4], filled: 0, expected: 0 }
    }

    fn reset(&mut self) {
        self.filled = 0;
        self.expected = 0;
    }

    /// Feed one byte. Never allocates.
    pub fn feed(&mut self, byte: u8) -> Event {
        if self.expected == 0 {
            let length = match lead_length(byte) {
                Ok(length) => length,
                Err(_) => {
                    tracing::debug!(byte, "utf8 machine resync: invalid lead byte");
                    self.reset();
                    return Event::Reject;
                }
            };
            self.buf = [0; 4];
            self.buf[0] = byte;
            self.filled = 1;
            if length == Length::L1 {
                self.reset();
                return Event::Accept { seq: self.buf, len: 1 };
            }
            self.expected = length as u8 - 1;
            return Event::Continue;
        }

        if byte & 0b1100_0000 != 0b1000_0000 {
            tracing::debug!(byte, "utf8 machine resync: bad continuation byte");
            self.reset();
            return Event::Reject;
        }

        self.buf[self.filled as usize] = byte;
        self.filled += 1;
        self.expected -= 1;

        if self.expected != 0 {
            return Event::Continue;
        }

        let len = self.filled;
        let result = decode(&self.buf[..len as usize]);
        self.reset();
        match result {
            Ok(_) => Event::Accept { seq: self.buf, len },
            Err(_) => Event::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_valid_codepoint_sample() {
        // Exhaustive over every codepoint would dominate the test suite's
        // runtime; sample densely including every length-class boundary
        // and the surrogate-adjacent range.
        let samples = (0u32..0x80)
            .chain(0x7E..0x82)
            .chain(0x7FE..0x802)
            .chain(0xD7FE..0xD800)
            .chain(0xE000..0xE004)
            .chain(0xFFFE..0x1_0002)
            .chain(0x10_FFFE..=0x10_FFFF);
        for cp in samples {
            let mut out = [0u8; 4];
            let len = encode(cp, &mut out).unwrap();
            assert_eq!(decode(&out[..len as usize]).unwrap(), cp);
        }
    }

    #[test]
    fn rejects_surrogates() {
        assert!(codepoint_length(0xD800).is_ok()); // length calc doesn't special-case
        let mut out = [0u8; 4];
        // Hand-construct the 3-byte encoding of 0xD800 to probe decode().
        out[0] = 0b1110_1101;
        out[1] = 0b1010_0000;
        out[2] = 0b1000_0000;
        assert_eq!(decode(&out[..3]), Err(Utf8Error));
    }

    #[test]
    fn rejects_overlong_encoding() {
        // Overlong 2-byte encoding of NUL (0x00): 0xC0 0x80.
        assert_eq!(decode(&[0xC0, 0x80]), Err(Utf8Error));
    }

    #[test]
    fn machine_streams_multi_byte_sequence() {
        let mut machine = Machine::new();
        assert_eq!(machine.feed(0xE2), Event::Continue);
        assert_eq!(machine.feed(0x82), Event::Continue);
        match machine.feed(0xAC) {
            Event::Accept { seq, len } => {
                assert_eq!(len, 3);
                assert_eq!(decode(&seq[..3]).unwrap(), 0x20AC); // Euro sign.
            }
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    fn machine_rejects_bad_continuation_and_resets() {
        let mut machine = Machine::new();
        assert_eq!(machine.feed(0xE2), Event::Continue);
        assert_eq!(machine.feed(b'A'), Event::Reject);
        // Machine is usable again afterwards.
        assert_eq!(machine.feed(b'B'), Event::Accept { seq: [b'B', 0, 0, 0], len: 1 });
    }
}
