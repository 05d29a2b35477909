//! YCbCr / RGB conversion.
//!
//! The decode direction uses the 8-bit fixed-point constants of the
//! reconstruction path; the encode direction uses the BT.601 float weights
//! with the level shift folded into luma.

fn clip(x: i32) -> u8 {
    x.clamp(0, 0xFF) as u8
}

/// Converts one reconstructed YCbCr sample to RGB.
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = i32::from(y) << 8;
    let cb = i32::from(cb) - 128;
    let cr = i32::from(cr) - 128;
    [
        clip((y + 359 * cr + 128) >> 8),
        clip((y - 88 * cb - 183 * cr + 128) >> 8),
        clip((y + 454 * cb + 128) >> 8),
    ]
}

/// Converts one RGB sample to YCbCr, with luma level-shifted to -128..=127.
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let y = 0.299 * r + 0.587 * g + 0.114 * b - 128.0;
    let cb = -0.16874 * r - 0.33126 * g + 0.5 * b;
    let cr = 0.5 * r - 0.41869 * g - 0.08131 * b;
    (y, cb, cr)
}
