//! Canonical Huffman table restoration.
//!
//! DHT segments transmit only the number of codes of each length plus the
//! decoded values in code order. Both the decoder-side lookup table and the
//! encoder-side codeword table are rebuilt from that by walking the canonical
//! code sequence (Annex C `Generate_size_table` / `Generate_code_table`).

use core::fmt;

use crate::error::{Error, Result};

/// A single slot of the fast decode table.
#[derive(Clone, Copy)]
pub struct DecodeEntry {
    /// Length of the huffman code in bits (number of bits that need to be
    /// consumed from the input). 0 marks a slot no code maps to.
    pub bits: u8,
    /// Decoded value. Meaning depends on table class (AC/DC).
    pub value: u8,
}

/// Fast decoder lookup, indexed by the next 16 bits of the stream.
///
/// Every codeword fills all `2^(16 - len)` slots that share its prefix, so a
/// single peek resolves any code.
pub struct DecodeTable {
    slots: Box<[DecodeEntry; 65536]>,
}

impl DecodeTable {
    fn empty() -> Self {
        Self {
            slots: vec![DecodeEntry { bits: 0, value: 0 }; 65536]
                .into_boxed_slice()
                .try_into()
                .unwrap_or_else(|_| unreachable!()),
        }
    }

    /// Resolves the codeword at the start of `peek16`.
    ///
    /// Fails on bit patterns that are not a prefix of any transmitted code.
    pub fn lookup(&self, peek16: u16) -> Result<DecodeEntry> {
        let entry = self.slots[usize::from(peek16)];
        if entry.bits == 0 {
            return Err(Error::syntax("invalid huffman code in scan data"));
        }
        Ok(entry)
    }
}

/// Encoder-side codeword for one symbol.
#[derive(Clone, Copy, Default)]
pub struct Codeword {
    pub code: u16,
    /// 0 if the table defines no code for this symbol.
    pub bits: u16,
}

/// Encoder lookup, indexed by symbol value.
pub struct EncodeTable {
    codes: [Codeword; 256],
}

impl EncodeTable {
    /// Returns the codeword for `symbol`, failing if the table defines none.
    pub fn codeword(&self, symbol: u8) -> Result<Codeword> {
        let cw = self.codes[usize::from(symbol)];
        if cw.bits == 0 {
            return Err(Error::syntax(format!(
                "no huffman code for symbol {symbol:02x}"
            )));
        }
        Ok(cw)
    }

    /// Returns, per run nibble, the shortest codeword among the AC symbols
    /// with that run. Used to emit a placeholder (codeword without magnitude
    /// bits) for a coefficient position reserved for later refinement.
    pub fn shortest_codewords_by_run(&self) -> [Codeword; 16] {
        let mut result = [Codeword::default(); 16];
        for symbol in 1..=255u8 {
            if symbol == 0xF0 {
                continue;
            }
            let cw = self.codes[usize::from(symbol)];
            if cw.bits == 0 {
                continue;
            }
            let argmin = &mut result[usize::from(symbol >> 4)];
            if argmin.bits == 0 || argmin.bits > cw.bits {
                *argmin = cw;
            }
        }
        result
    }
}

/// A decode/encode table pair restored from one DHT table definition.
pub struct Table {
    pub decode: DecodeTable,
    pub encode: EncodeTable,
}

impl Table {
    /// Restores the canonical code from `num_codes_per_length` (codes of
    /// length 1..=16) and the symbol `values` in code order.
    pub fn build(num_codes_per_length: &[u8; 16], values: &[u8]) -> Result<Self> {
        let total: usize = num_codes_per_length.iter().map(|&n| usize::from(n)).sum();
        if total != values.len() {
            return Err(Error::syntax("huffman value count does not match spectrum"));
        }

        let mut decode = DecodeTable::empty();
        let mut encode = EncodeTable {
            codes: [Codeword::default(); 256],
        };

        // Track the unassigned share of the 16-bit code space; overfull
        // histograms would otherwise assign overlapping codes.
        let mut remain: i32 = 65536;
        let mut next_code: u16 = 0;
        let mut value_iter = values.iter();
        for (code_length, &code_count) in num_codes_per_length.iter().enumerate() {
            let code_length = (code_length + 1) as u8; // 1-based
            let spread = 1usize << (16 - code_length);

            for _ in 0..code_count {
                remain -= spread as i32;
                if remain < 0 {
                    return Err(Error::syntax("overfull huffman code histogram"));
                }
                let value = *value_iter.next().ok_or_else(|| {
                    Error::internal("huffman value iterator exhausted after count check")
                })?;

                encode.codes[usize::from(value)] = Codeword {
                    code: next_code,
                    bits: u16::from(code_length),
                };

                let base = usize::from(next_code) << (16 - code_length);
                for slot in &mut decode.slots[base..base + spread] {
                    *slot = DecodeEntry {
                        bits: code_length,
                        value,
                    };
                }

                next_code += 1;
            }
            next_code <<= 1;
        }

        Ok(Self { decode, encode })
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // List codewords in canonical order for snapshot tests.
        let mut entries: Vec<(u16, u16, u8)> = (0..=255u8)
            .filter_map(|value| {
                let cw = self.encode.codes[usize::from(value)];
                (cw.bits != 0).then_some((cw.bits, cw.code, value))
            })
            .collect();
        entries.sort_by_key(|&(bits, code, _)| (bits, code));
        for (bits, code, value) in entries {
            writeln!(f, "{bits} {:01$b} -> {2:02x}", code, usize::from(bits), value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tablegen() {
        // Default Luminance DC table.
        let num_dc_codes = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        let dc_values = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
        ];

        let tbl = Table::build(&num_dc_codes, &dc_values).unwrap();
        expect_test::expect![[r#"
            2 00 -> 00
            3 010 -> 01
            3 011 -> 02
            3 100 -> 03
            3 101 -> 04
            3 110 -> 05
            4 1110 -> 06
            5 11110 -> 07
            6 111110 -> 08
            7 1111110 -> 09
            8 11111110 -> 0a
            9 111111110 -> 0b

        "#]]
        .assert_debug_eq(&tbl);
    }

    #[test]
    fn decode_table_spread() {
        let num_codes = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        let values = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
        ];
        let tbl = Table::build(&num_codes, &values).unwrap();

        // Code `00` (length 2) resolves regardless of the trailing bits.
        let entry = tbl.decode.lookup(0b0010_1010_1010_1010).unwrap();
        assert_eq!(entry.bits, 2);
        assert_eq!(entry.value, 0x00);

        // Code `11111110` (length 8) -> 0x0a.
        let entry = tbl.decode.lookup(0b1111_1110_0000_0000).unwrap();
        assert_eq!(entry.bits, 8);
        assert_eq!(entry.value, 0x0a);

        // All-ones is not a valid codeword in this table.
        assert!(tbl.decode.lookup(0xFFFF).is_err());
    }

    #[test]
    fn overfull_histogram_is_rejected() {
        // Three codes of length 1 cannot exist.
        let mut num_codes = [0u8; 16];
        num_codes[0] = 3;
        assert!(Table::build(&num_codes, &[0, 1, 2]).is_err());
    }

    #[test]
    fn value_count_mismatch_is_rejected() {
        let mut num_codes = [0u8; 16];
        num_codes[1] = 2;
        assert!(Table::build(&num_codes, &[0]).is_err());
    }
}
