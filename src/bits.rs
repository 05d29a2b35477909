//! Bit-level access to the entropy-coded scan data.
//!
//! [`BitReader`] consumes the scan body of a JPEG, undoing the `FF 00` byte
//! stuffing and pushing restart markers back into the bit buffer so that the
//! restart-interval logic can consume them explicitly. [`BitWriter`] is its
//! counterpart for re-emitting an entropy-coded body with stuffing applied.

use crate::error::{Error, Result};

pub struct BitReader<'a> {
    buf: &'a [u8],
    position: usize,
    /// Bit accumulator. Reads of up to 16 bits plus a pushed-back restart
    /// marker byte never exceed 31 bits.
    acc: u32,
    bits: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            position: 0,
            acc: 0,
            bits: 0,
        }
    }

    fn next_byte(&mut self) -> u8 {
        let byte = self.buf[self.position];
        self.position += 1;
        byte
    }

    fn exhausted(&self) -> bool {
        self.position >= self.buf.len()
    }

    /// Peeks at the next `count` bits without consuming them.
    ///
    /// Once the underlying data runs out, missing bits are synthesized as 1s,
    /// matching the padding convention of the format.
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        if count == 0 {
            return Ok(0);
        }
        while self.bits < count {
            if self.exhausted() {
                self.acc = (self.acc << 8) | 0xFF;
                self.bits += 8;
                continue;
            }
            let byte = self.next_byte();
            self.acc = (self.acc << 8) | u32::from(byte);
            self.bits += 8;
            if byte != 0xFF {
                continue;
            }
            if self.exhausted() {
                return Err(Error::syntax("scan data ends in a dangling FF byte"));
            }
            match self.next_byte() {
                // Stuffing (and FF fill bytes): a literal FF data byte.
                0x00 | 0xFF => {}
                // EOI: the scan ends here, everything past it is padding.
                0xD9 => self.buf = &self.buf[..self.position],
                marker => {
                    if marker & 0xF8 == 0xD0 {
                        // Restart markers are consumed as ordinary data bits
                        // by the restart-interval check.
                        self.acc = (self.acc << 8) | u32::from(marker);
                        self.bits += 8;
                    } else {
                        return Err(Error::syntax(format!(
                            "unexpected marker FF {marker:02X} in scan data"
                        )));
                    }
                }
            }
        }
        Ok((self.acc >> (self.bits - count)) & ((1 << count) - 1))
    }

    /// Consumes `count` previously peeked bits.
    pub fn skip_bits(&mut self, count: u32) -> Result<()> {
        if self.bits < count {
            self.read_bits(count)?;
        }
        self.bits -= count;
        Ok(())
    }

    /// Reads and consumes `count` bits.
    pub fn get_bits(&mut self, count: u32) -> Result<u32> {
        let value = self.read_bits(count)?;
        self.skip_bits(count)?;
        Ok(value)
    }

    /// Discards buffered bits up to the next byte boundary.
    pub fn byte_align(&mut self) {
        self.bits &= !7;
    }
}

/// Accumulates an entropy-coded bitstream, MSB first, applying `FF 00` byte
/// stuffing to every emitted data byte.
pub struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            acc: 0,
            bits: 0,
        }
    }

    /// Appends the `count` low bits of `code` to the stream.
    pub fn write_bits(&mut self, code: u32, count: u32) {
        debug_assert!(count <= 16);
        self.bits += count;
        self.acc |= (code & ((1 << count) - 1)) << (24 - self.bits);
        while self.bits >= 8 {
            let byte = (self.acc >> 16) as u8;
            self.out.push(byte);
            if byte == 0xFF {
                self.out.push(0x00);
            }
            self.acc <<= 8;
            self.bits -= 8;
        }
    }

    /// Pads the stream with 1-bits up to the next byte boundary.
    pub fn byte_align(&mut self) {
        if self.bits > 0 {
            let pad = 8 - self.bits;
            self.write_bits((1 << pad) - 1, pad);
        }
    }

    /// Appends a raw byte, bypassing bit packing and stuffing.
    ///
    /// Used for marker and header bytes; the bit buffer must be aligned.
    pub fn push_byte(&mut self, byte: u8) {
        debug_assert_eq!(self.bits, 0);
        self.out.push(byte);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        debug_assert_eq!(self.bits, 0);
        self.out.extend_from_slice(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}
