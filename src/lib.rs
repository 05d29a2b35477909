//! A baseline JPEG codec that works at the DCT coefficient level.
//!
//! Besides plain decoding, the [`Decoder`] can transform the entropy-coded
//! coefficients while they pass through: zeroing out a masked subset of luma
//! AC coefficients, or substituting them with residuals against a reference
//! image and re-emitting a bit-exact transcoded JPEG (see [`Mode`]). A small
//! [`encode`] entry point produces the baseline files these modes consume.
//!
//! Only sequential baseline JPEGs (SOF0, 8-bit, Huffman-coded, 1 or 3
//! components with power-of-two sampling factors) are accepted; everything
//! else fails with [`ErrorKind::Unsupported`].

mod bits;
mod block;
mod color;
mod dct;
mod decoder;
mod encoder;
mod entropy;
mod error;
pub mod file;
mod huffman;
mod image;
mod mask;
mod tables;
mod upsample;

pub use decoder::{Decoded, Decoder, Mode};
pub use encoder::encode;
pub use error::{Error, ErrorKind, Result};
pub use image::Image;
pub use mask::{DEFAULT_MASK_COUNT, DEFAULT_MASK_SEED};

#[cfg(test)]
mod tests;
