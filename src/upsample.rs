//! Chroma plane upsampling.
//!
//! Subsampled planes are doubled with a 4-tap Catmull-Rom-like filter rather
//! than pixel replication. All tap sets sum to 128, so flat areas pass
//! through unchanged.

use crate::error::{Error, Result};

// 4-tap interior filter and the 3/2-tap edge variants.
const CF4A: i32 = -9;
const CF4B: i32 = 111;
const CF4C: i32 = 29;
const CF4D: i32 = -3;
const CF3A: i32 = 28;
const CF3B: i32 = 109;
const CF3C: i32 = -9;
const CF3X: i32 = 104;
const CF3Y: i32 = 27;
const CF3Z: i32 = -3;
const CF2A: i32 = 139;
const CF2B: i32 = -11;

fn cf(x: i32) -> u8 {
    ((x + 64) >> 7).clamp(0, 0xFF) as u8
}

/// One decoded component's sample plane.
///
/// `stride` can exceed `width` while the plane still carries the block
/// padding from the MCU grid.
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub pixels: Vec<u8>,
}

impl Plane {
    fn at(&self, row: usize, col: usize) -> i32 {
        i32::from(self.pixels[row * self.stride + col])
    }

    /// Doubles the plane's width.
    fn upsample_horizontal(&mut self) {
        let (w, h) = (self.width, self.height);
        let mut out = vec![0u8; w * h * 2];

        for row in 0..h {
            let lout = &mut out[row * w * 2..(row + 1) * w * 2];
            lout[0] = cf(CF2A * self.at(row, 0) + CF2B * self.at(row, 1));
            lout[1] = cf(CF3X * self.at(row, 0) + CF3Y * self.at(row, 1) + CF3Z * self.at(row, 2));
            lout[2] = cf(CF3A * self.at(row, 0) + CF3B * self.at(row, 1) + CF3C * self.at(row, 2));
            for col in 0..w - 3 {
                lout[col * 2 + 3] = cf(CF4A * self.at(row, col)
                    + CF4B * self.at(row, col + 1)
                    + CF4C * self.at(row, col + 2)
                    + CF4D * self.at(row, col + 3));
                lout[col * 2 + 4] = cf(CF4D * self.at(row, col)
                    + CF4C * self.at(row, col + 1)
                    + CF4B * self.at(row, col + 2)
                    + CF4A * self.at(row, col + 3));
            }
            lout[w * 2 - 3] =
                cf(CF3A * self.at(row, w - 1) + CF3B * self.at(row, w - 2) + CF3C * self.at(row, w - 3));
            lout[w * 2 - 2] =
                cf(CF3X * self.at(row, w - 1) + CF3Y * self.at(row, w - 2) + CF3Z * self.at(row, w - 3));
            lout[w * 2 - 1] = cf(CF2A * self.at(row, w - 1) + CF2B * self.at(row, w - 2));
        }

        self.width = w * 2;
        self.stride = self.width;
        self.pixels = out;
    }

    /// Doubles the plane's height.
    fn upsample_vertical(&mut self) {
        let (w, h) = (self.width, self.height);
        let mut out = vec![0u8; w * h * 2];

        for col in 0..w {
            out[col] = cf(CF2A * self.at(0, col) + CF2B * self.at(1, col));
            out[w + col] =
                cf(CF3X * self.at(0, col) + CF3Y * self.at(1, col) + CF3Z * self.at(2, col));
            out[2 * w + col] =
                cf(CF3A * self.at(0, col) + CF3B * self.at(1, col) + CF3C * self.at(2, col));
            for row in 1..h - 2 {
                out[(row * 2 + 1) * w + col] = cf(CF4A * self.at(row - 1, col)
                    + CF4B * self.at(row, col)
                    + CF4C * self.at(row + 1, col)
                    + CF4D * self.at(row + 2, col));
                out[(row * 2 + 2) * w + col] = cf(CF4D * self.at(row - 1, col)
                    + CF4C * self.at(row, col)
                    + CF4B * self.at(row + 1, col)
                    + CF4A * self.at(row + 2, col));
            }
            out[(h * 2 - 3) * w + col] = cf(CF3A * self.at(h - 1, col)
                + CF3B * self.at(h - 2, col)
                + CF3C * self.at(h - 3, col));
            out[(h * 2 - 2) * w + col] = cf(CF3X * self.at(h - 1, col)
                + CF3Y * self.at(h - 2, col)
                + CF3Z * self.at(h - 3, col));
            out[(h * 2 - 1) * w + col] = cf(CF2A * self.at(h - 1, col) + CF2B * self.at(h - 2, col));
        }

        self.height = h * 2;
        self.stride = self.width;
        self.pixels = out;
    }

    /// Doubles the plane until it covers the image dimensions.
    ///
    /// The result can be slightly larger than requested when the image size
    /// is odd; callers read only the region they need.
    pub fn upsample_to(&mut self, width: usize, height: usize) -> Result<()> {
        while self.width < width || self.height < height {
            if (self.width < width && self.width < 3) || (self.height < height && self.height < 3)
            {
                return Err(Error::unsupported("component too small to upsample"));
            }
            if self.width < width {
                self.upsample_horizontal();
            }
            if self.height < height {
                self.upsample_vertical();
            }
        }
        Ok(())
    }

    /// Removes the block padding, leaving a densely packed plane.
    pub fn compact_stride(&mut self) {
        if self.stride == self.width {
            return;
        }
        for row in 1..self.height {
            self.pixels.copy_within(
                row * self.stride..row * self.stride + self.width,
                row * self.width,
            );
        }
        self.stride = self.width;
        self.pixels.truncate(self.width * self.height);
    }
}
