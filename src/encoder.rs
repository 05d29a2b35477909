//! A baseline JFIF encoder using the standard Annex K tables.
//!
//! The encoder exists to produce the reference bitstreams the transcoding
//! modes operate on; it always emits a single interleaved scan with the
//! default quantization and Huffman tables scaled by the requested quality.

use crate::bits::BitWriter;
use crate::dct::{self, QuantTable};
use crate::entropy;
use crate::error::{Error, Result};
use crate::huffman::Table;
use crate::image::Image;
use crate::mask::Mask;
use crate::tables;

/// Encodes `image` as a baseline JPEG.
///
/// `quality` ranges from 1 (worst) to 100 (best). Color images use 4:2:0
/// chroma subsampling up to quality 90, and 4:4:4 above that.
pub fn encode(image: &Image<'_>, quality: u8) -> Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(Error::internal(format!(
            "quality must be between 1 and 100, got {quality}"
        )));
    }
    if image.width() > 0xFFFF || image.height() > 0xFFFF {
        return Err(Error::unsupported(format!(
            "image of {}x{} exceeds the 16-bit frame header fields",
            image.width(),
            image.height()
        )));
    }

    let quality = i32::from(quality);
    let scale = if quality < 50 {
        5000 / quality
    } else {
        200 - 2 * quality
    };
    let luma_qt = QuantTable::scaled(&tables::LUMA_QUANT, scale);
    let chroma_qt = QuantTable::scaled(&tables::CHROMA_QUANT, scale);

    let luma_dc = Table::build(&tables::LUMA_DC_SPECTRUM, &tables::LUMA_DC_VALUES)?;
    let luma_ac = Table::build(&tables::LUMA_AC_SPECTRUM, &tables::LUMA_AC_VALUES)?;
    let chroma_dc = Table::build(&tables::CHROMA_DC_SPECTRUM, &tables::CHROMA_DC_VALUES)?;
    let chroma_ac = Table::build(&tables::CHROMA_AC_SPECTRUM, &tables::CHROMA_AC_VALUES)?;

    let color = image.components() == 3;
    // High qualities keep full chroma resolution.
    let scaling = if color && quality <= 90 { 2 } else { 1 };

    let mut writer = BitWriter::new();
    write_headers(&mut writer, image, color, scaling, &luma_qt, &chroma_qt);

    let mcu = 8 * scaling;
    let mut last_dc = [0i32; 3];
    let mut row = 0;
    while row < image.height() {
        let mut col = 0;
        while col < image.width() {
            if color {
                for sby in 0..scaling {
                    for sbx in 0..scaling {
                        let mut samples = [0.0f32; 64];
                        for r in 0..8 {
                            for c in 0..8 {
                                samples[r * 8 + c] =
                                    image.yuv(row + sby * 8 + r, col + sbx * 8 + c).0;
                            }
                        }
                        write_block(
                            &mut writer,
                            &samples,
                            &luma_qt,
                            &luma_dc,
                            &luma_ac,
                            &mut last_dc[0],
                        )?;
                    }
                }

                // Chroma is box-averaged over the subsampling area.
                let mut cb = [0.0f32; 64];
                let mut cr = [0.0f32; 64];
                let norm = (scaling * scaling) as f32;
                for r in 0..8 {
                    for c in 0..8 {
                        let (mut sum_b, mut sum_r) = (0.0, 0.0);
                        for dy in 0..scaling {
                            for dx in 0..scaling {
                                let (_, b, r2) =
                                    image.yuv(row + r * scaling + dy, col + c * scaling + dx);
                                sum_b += b;
                                sum_r += r2;
                            }
                        }
                        cb[r * 8 + c] = sum_b / norm;
                        cr[r * 8 + c] = sum_r / norm;
                    }
                }
                write_block(&mut writer, &cb, &chroma_qt, &chroma_dc, &chroma_ac, &mut last_dc[1])?;
                write_block(&mut writer, &cr, &chroma_qt, &chroma_dc, &chroma_ac, &mut last_dc[2])?;
            } else {
                let mut samples = [0.0f32; 64];
                for r in 0..8 {
                    for c in 0..8 {
                        samples[r * 8 + c] = image.yuv(row + r, col + c).0;
                    }
                }
                write_block(&mut writer, &samples, &luma_qt, &luma_dc, &luma_ac, &mut last_dc[0])?;
            }

            col += mcu;
        }
        row += mcu;
    }

    writer.byte_align();
    writer.push_byte(0xFF);
    writer.push_byte(0xD9);
    Ok(writer.into_bytes())
}

fn write_block(
    writer: &mut BitWriter,
    samples: &[f32; 64],
    qt: &QuantTable,
    dc: &Table,
    ac: &Table,
    last_dc: &mut i32,
) -> Result<()> {
    let mut block = *samples;
    dct::forward(&mut block);
    let quantized = qt.quantize(&block);
    entropy::encode_block(writer, &quantized, &dc.encode, &ac.encode, last_dc, Mask::ALL)
}

fn write_headers(
    writer: &mut BitWriter,
    image: &Image<'_>,
    color: bool,
    scaling: usize,
    luma_qt: &QuantTable,
    chroma_qt: &QuantTable,
) {
    // SOI + JFIF APP0.
    writer.extend_from_slice(&[0xFF, 0xD8]);
    writer.extend_from_slice(&[
        0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
        0x01, 0x00, 0x00,
    ]);

    // DQT.
    let dqt_len: u16 = if color { 2 + 2 * 65 } else { 2 + 65 };
    writer.extend_from_slice(&[0xFF, 0xDB]);
    writer.extend_from_slice(&dqt_len.to_be_bytes());
    writer.push_byte(0x00);
    writer.extend_from_slice(&luma_qt.to_zigzag());
    if color {
        writer.push_byte(0x01);
        writer.extend_from_slice(&chroma_qt.to_zigzag());
    }

    // SOF0.
    let components: u8 = if color { 3 } else { 1 };
    let sof_len: u16 = 8 + 3 * u16::from(components);
    writer.extend_from_slice(&[0xFF, 0xC0]);
    writer.extend_from_slice(&sof_len.to_be_bytes());
    writer.push_byte(0x08);
    writer.extend_from_slice(&(image.height() as u16).to_be_bytes());
    writer.extend_from_slice(&(image.width() as u16).to_be_bytes());
    writer.push_byte(components);
    let luma_sampling = (scaling << 4 | scaling) as u8;
    writer.extend_from_slice(&[0x01, luma_sampling, 0x00]);
    if color {
        writer.extend_from_slice(&[0x02, 0x11, 0x01]);
        writer.extend_from_slice(&[0x03, 0x11, 0x01]);
    }

    // DHT, luma tables first.
    let table_len = |values: &[u8]| 1 + 16 + values.len() as u16;
    let mut dht_len = 2 + table_len(&tables::LUMA_DC_VALUES) + table_len(&tables::LUMA_AC_VALUES);
    if color {
        dht_len += table_len(&tables::CHROMA_DC_VALUES) + table_len(&tables::CHROMA_AC_VALUES);
    }
    writer.extend_from_slice(&[0xFF, 0xC4]);
    writer.extend_from_slice(&dht_len.to_be_bytes());
    write_huffman_spec(writer, 0x00, &tables::LUMA_DC_SPECTRUM, &tables::LUMA_DC_VALUES);
    write_huffman_spec(writer, 0x10, &tables::LUMA_AC_SPECTRUM, &tables::LUMA_AC_VALUES);
    if color {
        write_huffman_spec(writer, 0x01, &tables::CHROMA_DC_SPECTRUM, &tables::CHROMA_DC_VALUES);
        write_huffman_spec(writer, 0x11, &tables::CHROMA_AC_SPECTRUM, &tables::CHROMA_AC_VALUES);
    }

    // SOS.
    let sos_len: u16 = 6 + 2 * u16::from(components);
    writer.extend_from_slice(&[0xFF, 0xDA]);
    writer.extend_from_slice(&sos_len.to_be_bytes());
    writer.push_byte(components);
    writer.extend_from_slice(&[0x01, 0x00]);
    if color {
        writer.extend_from_slice(&[0x02, 0x11]);
        writer.extend_from_slice(&[0x03, 0x11]);
    }
    writer.extend_from_slice(&[0x00, 0x3F, 0x00]);
}

fn write_huffman_spec(writer: &mut BitWriter, class_dest: u8, spectrum: &[u8; 16], values: &[u8]) {
    writer.push_byte(class_dest);
    writer.extend_from_slice(spectrum);
    writer.extend_from_slice(values);
}
