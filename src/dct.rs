//! The 8×8 block transform and quantization.
//!
//! The forward path is the floating-point AAN factorization with a final
//! per-coefficient descale; the inverse path is the classic fixed-point
//! butterfly that writes clipped pixels straight into a strided output
//! buffer. The two are not bit-exact inverses of each other, but quantization
//! swallows the difference.

use crate::block::{Natural, Zigzag, ZIGZAG_ORDER};

/// `aan_scale[0] = 1`, `aan_scale[k] = cos(k * PI / 16) * sqrt(2)`, times the
/// common `2 * sqrt(2)` gain of the row/column passes.
const AAN_SCALE: [f32; 8] = [
    1.000000000 * 2.828427125,
    1.387039845 * 2.828427125,
    1.306562965 * 2.828427125,
    1.175875602 * 2.828427125,
    1.000000000 * 2.828427125,
    0.785694958 * 2.828427125,
    0.541196100 * 2.828427125,
    0.275899379 * 2.828427125,
];

fn forward_1d(d: &mut [f32; 8]) {
    let x0 = d[0] + d[7];
    let x7 = d[0] - d[7];
    let x1 = d[1] + d[6];
    let x6 = d[1] - d[6];
    let x2 = d[2] + d[5];
    let x5 = d[2] - d[5];
    let x3 = d[3] + d[4];
    let x4 = d[3] - d[4];

    // Even part
    let mut x10 = x0 + x3;
    let tmp13 = x0 - x3;
    let x11 = x1 + x2;
    let mut x12 = x1 - x2;

    d[0] = x10 + x11;
    d[4] = x10 - x11;

    let z1 = (x12 + tmp13) * 0.707106781; // c4
    d[2] = tmp13 + z1;
    d[6] = tmp13 - z1;

    // Odd part
    x10 = x4 + x5;
    let x11 = x5 + x6;
    x12 = x6 + x7;

    // The rotator is modified from fig 4-8 to avoid extra negations.
    let z5 = (x10 - x12) * 0.382683433; // c6
    let z2 = x10 * 0.541196100 + z5; // c2-c6
    let z4 = x12 * 1.306562965 + z5; // c2+c6
    let z3 = x11 * 0.707106781; // c4

    let z11 = x7 + z3;
    let z13 = x7 - z3;

    d[5] = z13 + z2;
    d[3] = z13 - z2;
    d[1] = z11 + z4;
    d[7] = z11 - z4;
}

/// Forward DCT of one level-shifted sample block, natural order, in place.
pub fn forward(block: &mut [f32; 64]) {
    for row in 0..8 {
        let mut d = [0.0; 8];
        d.copy_from_slice(&block[row * 8..row * 8 + 8]);
        forward_1d(&mut d);
        block[row * 8..row * 8 + 8].copy_from_slice(&d);
    }

    for col in 0..8 {
        let mut d = [0.0; 8];
        for k in 0..8 {
            d[k] = block[col + k * 8];
        }
        forward_1d(&mut d);
        for k in 0..8 {
            block[col + k * 8] = d[k];
        }
    }

    for y in 0..8 {
        for x in 0..8 {
            block[y * 8 + x] /= AAN_SCALE[y] * AAN_SCALE[x];
        }
    }
}

const W1: i32 = 2841;
const W2: i32 = 2676;
const W3: i32 = 2408;
const W5: i32 = 1609;
const W6: i32 = 1108;
const W7: i32 = 565;

fn clip(x: i32) -> u8 {
    x.clamp(0, 0xFF) as u8
}

fn inverse_row(row: &mut [i32]) {
    let mut x1 = row[4] << 11;
    let mut x2 = row[6];
    let mut x3 = row[2];
    let mut x4 = row[1];
    let mut x5 = row[7];
    let mut x6 = row[5];
    let mut x7 = row[3];

    if x1 | x2 | x3 | x4 | x5 | x6 | x7 == 0 {
        // A DC-only row collapses to a constant.
        let dc = row[0] << 3;
        row[..8].fill(dc);
        return;
    }

    let mut x0 = (row[0] << 11) + 128;
    let mut x8 = W7 * (x4 + x5);
    x4 = x8 + (W1 - W7) * x4;
    x5 = x8 - (W1 + W7) * x5;
    x8 = W3 * (x6 + x7);
    x6 = x8 - (W3 - W5) * x6;
    x7 = x8 - (W3 + W5) * x7;
    x8 = x0 + x1;
    x0 -= x1;
    x1 = W6 * (x3 + x2);
    x2 = x1 - (W2 + W6) * x2;
    x3 = x1 + (W2 - W6) * x3;
    x1 = x4 + x6;
    x4 -= x6;
    x6 = x5 + x7;
    x5 -= x7;
    x7 = x8 + x3;
    x8 -= x3;
    x3 = x0 + x2;
    x0 -= x2;
    x2 = (181 * (x4 + x5) + 128) >> 8;
    x4 = (181 * (x4 - x5) + 128) >> 8;

    row[0] = (x7 + x1) >> 8;
    row[1] = (x3 + x2) >> 8;
    row[2] = (x0 + x4) >> 8;
    row[3] = (x8 + x6) >> 8;
    row[4] = (x8 - x6) >> 8;
    row[5] = (x0 - x4) >> 8;
    row[6] = (x3 - x2) >> 8;
    row[7] = (x7 - x1) >> 8;
}

fn inverse_column(block: &[i32; 64], col: usize, out: &mut [u8], offset: usize, stride: usize) {
    let at = |k: usize| block[col + k * 8];

    let mut x1 = at(4) << 8;
    let mut x2 = at(6);
    let mut x3 = at(2);
    let mut x4 = at(1);
    let mut x5 = at(7);
    let mut x6 = at(5);
    let mut x7 = at(3);

    if x1 | x2 | x3 | x4 | x5 | x6 | x7 == 0 {
        let value = clip(((at(0) + 32) >> 6) + 128);
        for k in 0..8 {
            out[offset + k * stride] = value;
        }
        return;
    }

    let mut x0 = (at(0) << 8) + 8192;
    let mut x8 = W7 * (x4 + x5) + 4;
    x4 = (x8 + (W1 - W7) * x4) >> 3;
    x5 = (x8 - (W1 + W7) * x5) >> 3;
    x8 = W3 * (x6 + x7) + 4;
    x6 = (x8 - (W3 - W5) * x6) >> 3;
    x7 = (x8 - (W3 + W5) * x7) >> 3;
    x8 = x0 + x1;
    x0 -= x1;
    x1 = W6 * (x3 + x2) + 4;
    x2 = (x1 - (W2 + W6) * x2) >> 3;
    x3 = (x1 + (W2 - W6) * x3) >> 3;
    x1 = x4 + x6;
    x4 -= x6;
    x6 = x5 + x7;
    x5 -= x7;
    x7 = x8 + x3;
    x8 -= x3;
    x3 = x0 + x2;
    x0 -= x2;
    x2 = (181 * (x4 + x5) + 128) >> 8;
    x4 = (181 * (x4 - x5) + 128) >> 8;

    let values = [
        clip(((x7 + x1) >> 14) + 128),
        clip(((x3 + x2) >> 14) + 128),
        clip(((x0 + x4) >> 14) + 128),
        clip(((x8 + x6) >> 14) + 128),
        clip(((x8 - x6) >> 14) + 128),
        clip(((x0 - x4) >> 14) + 128),
        clip(((x3 - x2) >> 14) + 128),
        clip(((x7 - x1) >> 14) + 128),
    ];
    for (k, value) in values.into_iter().enumerate() {
        out[offset + k * stride] = value;
    }
}

/// Inverse DCT of one dequantized block, writing 8×8 clipped samples into
/// `out` starting at `offset` with the given row `stride`.
pub fn inverse(block: &Natural, out: &mut [u8], offset: usize, stride: usize) {
    let mut work = block.0;
    for row in 0..8 {
        inverse_row(&mut work[row * 8..row * 8 + 8]);
    }
    for col in 0..8 {
        inverse_column(&work, col, out, offset + col, stride);
    }
}

/// One component's quantization step sizes, stored in natural order.
pub struct QuantTable {
    values: [i32; 64],
}

impl QuantTable {
    /// Builds a table from the 64 step sizes as they appear in a DQT segment
    /// (zigzag order), clamping each to 1..=255.
    pub fn from_zigzag(qk: &[u8; 64]) -> Self {
        let mut values = [0; 64];
        for (z, &q) in qk.iter().enumerate() {
            values[ZIGZAG_ORDER[z]] = i32::from(q).clamp(1, 255);
        }
        Self { values }
    }

    /// Builds a table by scaling a base table (natural order) by `scale`
    /// percent, clamping each step to 1..=255.
    pub fn scaled(base: &[i32; 64], scale: i32) -> Self {
        let mut values = [0; 64];
        for (i, &b) in base.iter().enumerate() {
            values[i] = ((b * scale + 50) / 100).clamp(1, 255);
        }
        Self { values }
    }

    /// The step sizes in the order a DQT segment serializes them.
    pub fn to_zigzag(&self) -> [u8; 64] {
        let mut out = [0; 64];
        for z in 0..64 {
            out[z] = self.values[ZIGZAG_ORDER[z]] as u8;
        }
        out
    }

    /// Quantizes a transformed block, rounding half away from zero.
    pub fn quantize(&self, dct: &[f32; 64]) -> Zigzag {
        let mut out = Zigzag::ZERO;
        for z in 0..64 {
            let n = ZIGZAG_ORDER[z];
            let v = dct[n] / self.values[n] as f32;
            out[z] = if v < 0.0 {
                (v - 0.5).ceil() as i32
            } else {
                (v + 0.5).floor() as i32
            };
        }
        out
    }

    /// Multiplies the step sizes back in, yielding a block ready for the
    /// inverse transform.
    pub fn dequantize(&self, block: &Zigzag) -> Natural {
        let mut out = Natural([0; 64]);
        for z in 0..64 {
            let n = ZIGZAG_ORDER[z];
            out[n] = block[z] * self.values[n];
        }
        out
    }
}
