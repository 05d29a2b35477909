//! Coefficient blocks, tagged by the index order they are in.
//!
//! An 8×8 block of DCT coefficients lives in one of two index spaces: the
//! *zigzag* order the entropy-coded bitstream serializes them in, or the
//! *natural* row-major order the DCT operates on. Mixing the two up is not a
//! type error in plain arrays, so both orders get their own wrapper type and
//! conversions are explicit.

use std::ops::{Index, IndexMut};

/// Maps a zigzag index to the corresponding natural (row-major) index.
#[rustfmt::skip]
pub const ZIGZAG_ORDER: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Maps a natural index back to its zigzag position.
pub const NATURAL_TO_ZIGZAG: [usize; 64] = {
    let mut rev = [0usize; 64];
    let mut z = 0;
    while z < 64 {
        rev[ZIGZAG_ORDER[z]] = z;
        z += 1;
    }
    rev
};

/// A coefficient block in zigzag (bitstream serialization) order.
///
/// Index 0 is the DC coefficient, indices 1..=63 are the AC coefficients from
/// low to high frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zigzag(pub [i32; 64]);

/// A coefficient block in natural row-major order, ready for the inverse DCT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Natural(pub [i32; 64]);

impl Zigzag {
    pub const ZERO: Self = Self([0; 64]);

    pub fn to_natural(&self) -> Natural {
        let mut out = [0; 64];
        for (z, &n) in ZIGZAG_ORDER.iter().enumerate() {
            out[n] = self.0[z];
        }
        Natural(out)
    }
}

impl Natural {
    pub fn to_zigzag(&self) -> Zigzag {
        let mut out = [0; 64];
        for (z, &n) in ZIGZAG_ORDER.iter().enumerate() {
            out[z] = self.0[n];
        }
        Zigzag(out)
    }
}

impl Index<usize> for Zigzag {
    type Output = i32;

    #[inline]
    fn index(&self, index: usize) -> &i32 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Zigzag {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut i32 {
        &mut self.0[index]
    }
}

impl Index<usize> for Natural {
    type Output = i32;

    #[inline]
    fn index(&self, index: usize) -> &i32 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Natural {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut i32 {
        &mut self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_is_a_permutation() {
        let mut seen = [false; 64];
        for &n in &ZIGZAG_ORDER {
            assert!(!seen[n]);
            seen[n] = true;
        }
    }

    #[test]
    fn zigzag_round_trip_is_identity() {
        for i in 0..64 {
            assert_eq!(NATURAL_TO_ZIGZAG[ZIGZAG_ORDER[i]], i);
            assert_eq!(ZIGZAG_ORDER[NATURAL_TO_ZIGZAG[i]], i);
        }

        let mut block = Zigzag::ZERO;
        for i in 0..64 {
            block[i] = i as i32 - 32;
        }
        assert_eq!(block.to_natural().to_zigzag(), block);
    }
}
