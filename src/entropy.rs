//! Per-block entropy coding: DC predictor deltas and AC run/level pairs over
//! canonical Huffman codes.

use crate::bits::{BitReader, BitWriter};
use crate::block::Zigzag;
use crate::error::{Error, Result};
use crate::huffman::{DecodeTable, EncodeTable};
use crate::mask::Mask;

/// One decoded run/level item.
struct RunLevel {
    /// Number of zero coefficients preceding this one (ZRL escapes folded in).
    run: usize,
    /// Magnitude category. 0 together with `run == 0` marks end-of-block.
    level: u8,
    /// Sign-extended coefficient value. 0 for positions the mask excludes.
    coefficient: i32,
}

/// Decodes one codeword (folding in any 16-zeros escapes) plus its magnitude
/// bits.
///
/// `index` is the zigzag position the item lands on; when the mask excludes
/// it, the magnitude bits are assumed absent from the stream.
fn decode_run_level(
    reader: &mut BitReader<'_>,
    table: &DecodeTable,
    index: usize,
    mask: Mask,
) -> Result<RunLevel> {
    let mut run = 0usize;
    loop {
        let peek = reader.read_bits(16)? as u16;
        let entry = table.lookup(peek)?;
        reader.skip_bits(u32::from(entry.bits))?;

        run += usize::from(entry.value >> 4);
        let level = entry.value & 0b1111;

        if level == 0 {
            if run == 0 {
                // End-of-block marker.
                return Ok(RunLevel {
                    run,
                    level,
                    coefficient: 0,
                });
            }
            // Sixteen-zeros marker.
            run += 1;
            continue;
        }

        let mut coefficient = 0;
        if mask.keeps(index + run) {
            coefficient = reader.get_bits(u32::from(level))? as i32;
            if coefficient < 1 << (level - 1) {
                coefficient += ((-1) << level) + 1;
            }
        }

        return Ok(RunLevel {
            run,
            level,
            coefficient,
        });
    }
}

/// Decodes one 8×8 coefficient block in zigzag order.
///
/// `last_dc` is the component's running DC predictor and is advanced to this
/// block's DC value. `mask` describes which AC positions carry magnitude
/// bits; positions it excludes were written as placeholders and decode to 0.
pub fn decode_block(
    reader: &mut BitReader<'_>,
    dc_table: &DecodeTable,
    ac_table: &DecodeTable,
    last_dc: &mut i32,
    mask: Mask,
) -> Result<Zigzag> {
    let mut block = Zigzag::ZERO;

    let dc = decode_run_level(reader, dc_table, 0, Mask::ALL)?;
    block[0] = *last_dc + dc.coefficient;

    let mut i = 1;
    while i < 64 {
        let ac = decode_run_level(reader, ac_table, i, mask)?;
        if ac.level == 0 && ac.run == 0 {
            break;
        }

        i += ac.run;
        if i > 63 {
            return Err(Error::syntax(format!(
                "coefficient run goes beyond the block boundary: {i}"
            )));
        }

        block[i] = ac.coefficient;
        i += 1;
    }

    *last_dc = block[0];
    Ok(block)
}

/// The (extra bits, bit count) pair encoding a coefficient's magnitude.
fn magnitude(value: i32) -> (u32, u32) {
    let mut bits = 1;
    let mut absolute = value.unsigned_abs();
    while absolute > 1 {
        absolute >>= 1;
        bits += 1;
    }

    let mut value = value;
    if value < 0 {
        value -= 1;
    }
    (value as u32 & ((1 << bits) - 1), bits)
}

/// Encodes one 8×8 coefficient block in zigzag order.
///
/// Positions the mask excludes are written as a placeholder codeword (the
/// shortest one with the right run) with no magnitude bits, so the stream
/// stays decodable by a consumer that knows the mask. `last_dc` is the
/// running predictor and is advanced to this block's DC value.
pub fn encode_block(
    writer: &mut BitWriter,
    block: &Zigzag,
    dc_table: &EncodeTable,
    ac_table: &EncodeTable,
    last_dc: &mut i32,
    mask: Mask,
) -> Result<()> {
    // DC delta.
    let delta = block[0] - *last_dc;
    if delta == 0 {
        let cw = dc_table.codeword(0)?;
        writer.write_bits(u32::from(cw.code), u32::from(cw.bits));
    } else {
        let (extra, bits) = magnitude(delta);
        let cw = dc_table.codeword(bits as u8)?;
        writer.write_bits(u32::from(cw.code), u32::from(cw.bits));
        writer.write_bits(extra, bits);
    }
    *last_dc = block[0];

    // AC run/level.
    let placeholders = ac_table.shortest_codewords_by_run();
    let mut run = 0usize;
    for i in 1..64 {
        let ac = block[i];
        if ac == 0 {
            run += 1;
            continue;
        }

        let zrl = ac_table.codeword(0xF0)?;
        for _ in 0..run >> 4 {
            writer.write_bits(u32::from(zrl.code), u32::from(zrl.bits));
        }
        run &= 0xF;

        if !mask.keeps(i) {
            let cw = placeholders[run];
            if cw.bits == 0 {
                return Err(Error::syntax(format!("no placeholder code for run {run}")));
            }
            writer.write_bits(u32::from(cw.code), u32::from(cw.bits));
        } else {
            let (extra, bits) = magnitude(ac);
            let cw = ac_table.codeword((run << 4) as u8 | bits as u8)?;
            writer.write_bits(u32::from(cw.code), u32::from(cw.bits));
            writer.write_bits(extra, bits);
        }

        run = 0;
    }

    if run > 0 {
        let eob = ac_table.codeword(0x00)?;
        writer.write_bits(u32::from(eob.code), u32::from(eob.bits));
    }

    Ok(())
}
