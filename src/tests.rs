//! End-to-end tests over the encode / decode / transcode pipeline.

use crate::bits::BitWriter;
use crate::entropy;
use crate::huffman::Table;
use crate::mask::Mask;
use crate::{encode, tables, Decoder, ErrorKind, Image, Mode};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gray_gradient(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((100 + 3 * row + 2 * col) as u8);
        }
    }
    data
}

/// A pattern with energy well beyond the lowest frequencies.
fn gray_texture(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((((row * row + 3 * col) % 23) * 9) as u8);
        }
    }
    data
}

#[test]
fn rejects_non_jpeg_input() {
    init_logger();
    let d = Decoder::new();
    assert_eq!(d.decode(&[]).unwrap_err().kind(), ErrorKind::NotAJpeg);
    assert_eq!(
        d.decode(&[0x89, 0x50, 0x4E, 0x47]).unwrap_err().kind(),
        ErrorKind::NotAJpeg
    );
}

#[test]
fn flat_grayscale_roundtrips_within_one() {
    init_logger();
    let (w, h) = (16, 16);
    let data = vec![180u8; w * h];
    let img = Image::new(w, h, 1, &data).unwrap();

    let jpeg = encode(&img, 90).unwrap();
    let decoded = Decoder::new().decode(&jpeg).unwrap();
    for &px in decoded.pixels() {
        assert!((i32::from(px) - 180).abs() <= 1, "got {px}");
    }
}

#[test]
fn grayscale_roundtrip_stays_close() {
    init_logger();
    let (w, h) = (16, 16);
    let data = gray_gradient(w, h);
    let img = Image::new(w, h, 1, &data).unwrap();

    let jpeg = encode(&img, 90).unwrap();
    let decoded = Decoder::new().decode(&jpeg).unwrap();
    assert_eq!(decoded.width(), w);
    assert_eq!(decoded.height(), h);
    assert_eq!(decoded.components(), 1);
    assert_eq!(decoded.pixels().len(), w * h);

    for (i, (&out, &orig)) in decoded.pixels().iter().zip(&data).enumerate() {
        let delta = (i32::from(out) - i32::from(orig)).abs();
        assert!(delta <= 8, "pixel {i}: {out} vs {orig}");
    }
}

#[test]
fn flat_color_roundtrip_stays_close() {
    init_logger();
    let (w, h) = (16, 16);
    let data: Vec<u8> = [90u8, 140, 200].repeat(w * h);
    let img = Image::new(w, h, 3, &data).unwrap();

    // Quality 80 subsamples chroma, which is lossless on a flat image.
    let jpeg = encode(&img, 80).unwrap();
    let decoded = Decoder::new().decode(&jpeg).unwrap();
    assert_eq!(decoded.components(), 3);
    assert_eq!(decoded.pixels().len(), w * h * 3);

    for (i, (&out, &orig)) in decoded.pixels().iter().zip(&data).enumerate() {
        let delta = (i32::from(out) - i32::from(orig)).abs();
        assert!(delta <= 3, "sample {i}: {out} vs {orig}");
    }
}

#[test]
fn full_resolution_color_roundtrip_stays_close() {
    init_logger();
    let (w, h) = (24, 16);
    let mut data = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        for col in 0..w {
            data.push((60 + 4 * row + 2 * col) as u8);
            data.push((200 - 3 * row) as u8);
            data.push((40 + 5 * col) as u8);
        }
    }
    let img = Image::new(w, h, 3, &data).unwrap();

    // Quality 95 keeps chroma at full resolution.
    let jpeg = encode(&img, 95).unwrap();
    let decoded = Decoder::new().decode(&jpeg).unwrap();

    for (i, (&out, &orig)) in decoded.pixels().iter().zip(&data).enumerate() {
        let delta = (i32::from(out) - i32::from(orig)).abs();
        assert!(delta <= 8, "sample {i}: {out} vs {orig}");
    }
}

#[test]
fn zero_power_filter_is_the_identity() {
    init_logger();
    let (w, h) = (16, 16);
    let data = gray_texture(w, h);
    let img = Image::new(w, h, 1, &data).unwrap();
    let jpeg = encode(&img, 95).unwrap();

    let plain = Decoder::new().decode(&jpeg).unwrap();
    let zeroed = Decoder::new()
        .mode(Mode::ZeroOutAndDecode)
        .filter_power(0)
        .decode(&jpeg)
        .unwrap();
    assert_eq!(plain.pixels(), zeroed.pixels());
}

#[test]
fn zeroing_coefficients_changes_the_output() {
    init_logger();
    let (w, h) = (16, 16);
    let data = gray_texture(w, h);
    let img = Image::new(w, h, 1, &data).unwrap();
    let jpeg = encode(&img, 95).unwrap();

    let plain = Decoder::new().decode(&jpeg).unwrap();
    let zeroed = Decoder::new()
        .mode(Mode::ZeroOutAndDecode)
        .filter_power(16)
        .decode(&jpeg)
        .unwrap();
    assert_eq!(zeroed.pixels().len(), plain.pixels().len());
    assert_ne!(plain.pixels(), zeroed.pixels());
}

#[test]
fn excessive_filter_power_is_rejected() {
    init_logger();
    let err = Decoder::new()
        .mode(Mode::ZeroOutAndDecode)
        .filter_power(64)
        .decode(&[0xFF, 0xD8])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalError);
}

#[test]
fn residual_modes_require_a_reference() {
    init_logger();
    let data = gray_gradient(16, 16);
    let img = Image::new(16, 16, 1, &data).unwrap();
    let jpeg = encode(&img, 90).unwrap();

    let err = Decoder::new()
        .mode(Mode::EncodeResiduals)
        .filter_power(4)
        .decode(&jpeg)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalError);
}

#[test]
fn reference_dimensions_are_checked() {
    init_logger();
    let data = gray_gradient(16, 16);
    let img = Image::new(16, 16, 1, &data).unwrap();
    let jpeg = encode(&img, 90).unwrap();

    let small = gray_gradient(8, 8);
    let reference = Image::new(8, 8, 1, &small).unwrap();
    let err = Decoder::new()
        .mode(Mode::EncodeResiduals)
        .filter_power(4)
        .reference(reference)
        .decode(&jpeg)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalError);
}

#[test]
fn residual_transcoding_roundtrips_exactly() {
    init_logger();
    let (w, h) = (32, 32);
    let data = gray_texture(w, h);
    let img = Image::new(w, h, 1, &data).unwrap();
    let jpeg = encode(&img, 95).unwrap();

    let mut reference_data = gray_gradient(w, h);
    for px in &mut reference_data {
        *px = px.wrapping_add(10);
    }
    let reference = Image::new(w, h, 1, &reference_data).unwrap();

    let plain = Decoder::new().decode(&jpeg).unwrap();

    let encoded = Decoder::new()
        .mode(Mode::EncodeResiduals)
        .filter_power(6)
        .reference(reference)
        .decode(&jpeg)
        .unwrap();
    assert!(encoded.pixels().is_empty());
    let residual_jpeg = encoded.into_bitstream().unwrap();

    // The residual stream carries the same headers and stays parseable.
    let restored = Decoder::new()
        .mode(Mode::DecodeResiduals)
        .filter_power(6)
        .reference(reference)
        .decode(&residual_jpeg)
        .unwrap();
    let restored_jpeg = restored.into_bitstream().unwrap();

    // Subtracting and re-adding the reference coefficients with the same
    // mask sequence must restore every coefficient, so the decoded pixels
    // match the untouched file exactly.
    let back = Decoder::new().decode(&restored_jpeg).unwrap();
    assert_eq!(back.width(), plain.width());
    assert_eq!(back.height(), plain.height());
    assert_eq!(back.pixels(), plain.pixels());
}

#[test]
fn subsampled_color_residual_transcoding_roundtrips_exactly() {
    init_logger();
    let (w, h) = (32, 32);
    let mut data = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        for col in 0..w {
            data.push((((row * row + 3 * col) % 23) * 9) as u8);
            data.push((200 - 4 * (row % 24)) as u8);
            data.push((40 + 6 * (col % 28)) as u8);
        }
    }
    let img = Image::new(w, h, 3, &data).unwrap();
    // Quality 85 subsamples chroma, so the scan interleaves four luma blocks
    // per MCU with one block of each chroma component.
    let jpeg = encode(&img, 85).unwrap();

    let mut reference_data = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        for col in 0..w {
            reference_data.push((100 + 2 * row + 2 * col) as u8);
            reference_data.push((90 + 2 * col) as u8);
            reference_data.push((160 - 3 * row) as u8);
        }
    }
    let reference = Image::new(w, h, 3, &reference_data).unwrap();

    let plain = Decoder::new().decode(&jpeg).unwrap();

    let encoded = Decoder::new()
        .mode(Mode::EncodeResiduals)
        .filter_power(6)
        .reference(reference)
        .decode(&jpeg)
        .unwrap();
    let residual_jpeg = encoded.into_bitstream().unwrap();

    let restored = Decoder::new()
        .mode(Mode::DecodeResiduals)
        .filter_power(6)
        .reference(reference)
        .decode(&residual_jpeg)
        .unwrap();
    let restored_jpeg = restored.into_bitstream().unwrap();

    // Chroma blocks pass through untouched and the luma mask sequence is
    // identical in both directions, so the round trip is coefficient-exact.
    let back = Decoder::new().decode(&restored_jpeg).unwrap();
    assert_eq!(back.components(), 3);
    assert_eq!(back.pixels(), plain.pixels());
}

#[test]
fn residual_encoding_differs_from_the_original() {
    init_logger();
    let (w, h) = (16, 16);
    let data = gray_texture(w, h);
    let img = Image::new(w, h, 1, &data).unwrap();
    let jpeg = encode(&img, 95).unwrap();

    let reference_data = gray_gradient(w, h);
    let reference = Image::new(w, h, 1, &reference_data).unwrap();

    let encoded = Decoder::new()
        .mode(Mode::EncodeResiduals)
        .filter_power(6)
        .reference(reference)
        .decode(&jpeg)
        .unwrap();
    let residual_jpeg = encoded.into_bitstream().unwrap();

    let plain = Decoder::new().decode(&jpeg).unwrap();
    let tampered = Decoder::new().decode(&residual_jpeg).unwrap();
    assert_ne!(plain.pixels(), tampered.pixels());
}

/// Hand-assembles a 16×8 grayscale baseline JPEG with a restart interval of
/// one MCU and a RST0 marker between the two blocks.
fn jpeg_with_restart(dc1: i32, dc2: i32) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];

    // DQT, all step sizes 1.
    jpeg.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    jpeg.extend_from_slice(&[1; 64]);

    // DRI, restart every MCU.
    jpeg.extend_from_slice(&[0xFF, 0xDD, 0x00, 0x04, 0x00, 0x01]);

    // SOF0, 16×8, one component.
    jpeg.extend_from_slice(&[
        0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x10, 0x01, 0x01, 0x11, 0x00,
    ]);

    // DHT with the standard luminance tables.
    jpeg.extend_from_slice(&[0xFF, 0xC4, 0x00, 0xD2, 0x00]);
    jpeg.extend_from_slice(&tables::LUMA_DC_SPECTRUM);
    jpeg.extend_from_slice(&tables::LUMA_DC_VALUES);
    jpeg.push(0x10);
    jpeg.extend_from_slice(&tables::LUMA_AC_SPECTRUM);
    jpeg.extend_from_slice(&tables::LUMA_AC_VALUES);

    // SOS.
    jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);

    let dc = Table::build(&tables::LUMA_DC_SPECTRUM, &tables::LUMA_DC_VALUES).unwrap();
    let ac = Table::build(&tables::LUMA_AC_SPECTRUM, &tables::LUMA_AC_VALUES).unwrap();

    let mut writer = BitWriter::new();
    let mut last_dc = 0;
    let mut block = crate::block::Zigzag::ZERO;
    block[0] = dc1;
    entropy::encode_block(&mut writer, &block, &dc.encode, &ac.encode, &mut last_dc, Mask::ALL)
        .unwrap();
    writer.byte_align();
    writer.push_byte(0xFF);
    writer.push_byte(0xD0);

    // The predictor resets at the restart marker.
    let mut last_dc = 0;
    block[0] = dc2;
    entropy::encode_block(&mut writer, &block, &dc.encode, &ac.encode, &mut last_dc, Mask::ALL)
        .unwrap();
    writer.byte_align();
    jpeg.extend_from_slice(&writer.into_bytes());

    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

#[test]
fn restart_markers_reset_the_predictor() {
    init_logger();
    let jpeg = jpeg_with_restart(40, -40);
    let decoded = Decoder::new().decode(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 8));

    let pixels = decoded.pixels();
    // Each block is DC-only, so each half of the image is flat.
    let left = pixels[0];
    let right = pixels[8];
    for row in 0..8 {
        for col in 0..16 {
            let expected = if col < 8 { left } else { right };
            assert_eq!(pixels[row * 16 + col], expected, "at {row},{col}");
        }
    }
    // DC 40 at unit quantization is a +5 offset from mid-gray, -40 a -5.
    assert_eq!(left, 133);
    assert_eq!(right, 123);
}

#[test]
fn out_of_sequence_restart_marker_is_rejected() {
    init_logger();
    let mut jpeg = jpeg_with_restart(40, -40);
    // Patch the RST0 into a RST3.
    let position = jpeg
        .windows(2)
        .position(|w| w == [0xFF, 0xD0])
        .expect("assembled stream contains RST0");
    jpeg[position + 1] = 0xD3;

    let err = Decoder::new().decode(&jpeg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
}

#[test]
fn restart_markers_survive_residual_transcoding() {
    init_logger();
    let jpeg = jpeg_with_restart(40, -40);
    let reference_data = vec![128u8; 16 * 8];
    let reference = Image::new(16, 8, 1, &reference_data).unwrap();

    let encoded = Decoder::new()
        .mode(Mode::EncodeResiduals)
        .filter_power(4)
        .reference(reference)
        .decode(&jpeg)
        .unwrap();
    let residual_jpeg = encoded.into_bitstream().unwrap();
    assert!(
        residual_jpeg.windows(2).any(|w| w == [0xFF, 0xD0]),
        "restart marker was dropped"
    );

    let decoded = Decoder::new().decode(&residual_jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 8));
}

#[test]
fn progressive_files_are_unsupported() {
    init_logger();
    let jpeg = [
        0xFF, 0xD8, // SOI
        0xFF, 0xC2, // SOF2 (progressive)
        0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00,
    ];
    let err = Decoder::new().decode(&jpeg).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}
