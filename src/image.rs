//! A borrowed interleaved pixel buffer, used as encoder input and as the
//! reference image for the residual modes.

use crate::color;
use crate::error::{Error, Result};

/// An RGB (3 components) or grayscale (1 component) image, row-major,
/// interleaved.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    width: usize,
    height: usize,
    components: usize,
    data: &'a [u8],
}

impl<'a> Image<'a> {
    pub fn new(width: usize, height: usize, components: usize, data: &'a [u8]) -> Result<Self> {
        if components != 1 && components != 3 {
            return Err(Error::unsupported(format!(
                "images must have 1 or 3 components, got {components}"
            )));
        }
        if width == 0 || height == 0 {
            return Err(Error::internal("image dimensions must be nonzero"));
        }
        if data.len() != width * height * components {
            return Err(Error::internal(format!(
                "pixel buffer holds {} bytes, expected {}",
                data.len(),
                width * height * components
            )));
        }
        Ok(Self {
            width,
            height,
            components,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Samples one pixel, clamping out-of-range coordinates to the edge so
    /// that callers can pad partial blocks.
    pub fn rgb(&self, row: usize, col: usize) -> [u8; 3] {
        let row = row.min(self.height - 1);
        let col = col.min(self.width - 1);
        let position = (row * self.width + col) * self.components;
        if self.components == 1 {
            let gray = self.data[position];
            [gray, gray, gray]
        } else {
            [
                self.data[position],
                self.data[position + 1],
                self.data[position + 2],
            ]
        }
    }

    /// Samples one pixel in YCbCr, luma level-shifted to -128..=127.
    pub fn yuv(&self, row: usize, col: usize) -> (f32, f32, f32) {
        let [r, g, b] = self.rgb(row, col);
        if self.components == 1 {
            (f32::from(r) - 128.0, 0.0, 0.0)
        } else {
            color::rgb_to_ycbcr(r, g, b)
        }
    }
}
