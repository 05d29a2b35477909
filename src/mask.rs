//! Coefficient-selection masks for the transcoding modes.
//!
//! A mask is a 64-bit set over zigzag coefficient positions. A set bit means
//! the coefficient is kept; a cleared bit marks it for zeroing (or residual
//! substitution). Masks never touch the DC coefficient or the perceptually
//! critical low frequencies, and stay away from the high-frequency tail that
//! is usually zero anyway.

/// A per-block coefficient selection, indexed by zigzag position.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Mask(u64);

impl Mask {
    /// The identity mask: every coefficient kept.
    pub const ALL: Self = Self(u64::MAX);

    /// Returns whether the coefficient at zigzag position `index` is kept.
    #[inline]
    pub fn keeps(&self, index: usize) -> bool {
        index >= 64 || self.0 & (1 << index) != 0
    }

    /// Builds a mask that keeps everything except the listed positions.
    pub fn without(positions: &[usize]) -> Self {
        let mut mask = Self::ALL;
        for &position in positions {
            mask.clear(position);
        }
        mask
    }

    fn clear(&mut self, index: usize) {
        self.0 &= !(1 << index);
    }
}

/// Binomial coefficient, saturating. 0 when `k > n`.
fn choose(n: u64, k: u64) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result
            .saturating_mul(u128::from(n - i))
            .checked_div(u128::from(i + 1))
            .unwrap_or(u128::MAX);
        if result == u128::MAX {
            break;
        }
    }
    result
}

/// A deterministic, seeded pool of distinct coefficient masks, drawn
/// round-robin.
pub struct MaskPool {
    masks: Vec<Mask>,
    index: usize,
}

pub const DEFAULT_MASK_COUNT: usize = 9;
pub const DEFAULT_MASK_SEED: u64 = 42;

impl MaskPool {
    /// Generates up to `count` distinct masks clearing `power` positions
    /// each, sampled without replacement from the maskable band.
    pub fn new(power: usize, count: usize, seed: u64) -> Self {
        // The maskable band excludes the DC + low frequencies at the front
        // and the mostly-zero tail. Shrink the tail margin first (then the
        // front) until the band can hold `power` choices at all.
        let mut save_low: usize = 6;
        let mut save_high: usize = 21;
        while choose((64 - save_low - save_high) as u64, power as u64) == 0 {
            if save_high > 0 {
                save_high -= 1;
            } else {
                save_low -= 1;
            }
        }

        let band: Vec<usize> = (save_low..64 - save_high).collect();
        let max_count = choose(band.len() as u64, power as u64);
        let count = u128::min(count.max(1) as u128, max_count) as usize;

        let mut rng = fastrand::Rng::with_seed(seed);
        let mut masks: Vec<Mask> = Vec::with_capacity(count);
        while masks.len() < count {
            let mut positions = band.clone();
            rng.shuffle(&mut positions);
            positions.truncate(power);

            let mut mask = Mask::ALL;
            for position in positions {
                mask.clear(position);
            }
            if !masks.contains(&mask) {
                masks.push(mask);
            }
        }

        Self { masks, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Draws the next mask in cyclic order.
    pub fn next_mask(&mut self) -> Mask {
        let mask = self.masks[self.index];
        self.index = (self.index + 1) % self.masks.len();
        mask
    }
}
