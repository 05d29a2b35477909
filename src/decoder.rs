//! The decoder and coefficient-transcoding pipeline.
//!
//! A [`Decoder`] runs one of four modes over a baseline JPEG:
//!
//! - [`Mode::Decode`] reconstructs pixels.
//! - [`Mode::ZeroOutAndDecode`] zeroes a masked subset of luma AC
//!   coefficients before reconstruction.
//! - [`Mode::EncodeResiduals`] subtracts reference-image coefficients at
//!   masked positions and re-emits the entropy-coded bitstream, mirroring
//!   all header segments verbatim.
//! - [`Mode::DecodeResiduals`] adds the reference coefficients back,
//!   inverting [`Mode::EncodeResiduals`].

use crate::bits::{BitReader, BitWriter};
use crate::block::Zigzag;
use crate::color;
use crate::dct::{self, QuantTable};
use crate::entropy;
use crate::error::{Error, Result};
use crate::file::{JpegParser, SegmentKind, SofMarker, Sos};
use crate::huffman::Table;
use crate::image::Image;
use crate::mask::{Mask, MaskPool, DEFAULT_MASK_COUNT, DEFAULT_MASK_SEED};
use crate::upsample::Plane;

/// What to do with the coefficients of each decoded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Plain baseline decoding to pixels.
    Decode,
    /// Zero out masked luma AC coefficients, then decode to pixels.
    ZeroOutAndDecode,
    /// Subtract reference coefficients at masked positions and re-encode
    /// the bitstream.
    EncodeResiduals,
    /// Add reference coefficients back at masked positions and re-encode
    /// the bitstream.
    DecodeResiduals,
}

impl Mode {
    fn processes_residuals(&self) -> bool {
        matches!(self, Mode::EncodeResiduals | Mode::DecodeResiduals)
    }
}

/// Decoder configuration. Everything is chosen up front; nothing is
/// discovered from the bitstream.
pub struct Decoder<'a> {
    mode: Mode,
    filter_power: usize,
    mask_count: usize,
    mask_seed: u64,
    reference: Option<Image<'a>>,
}

impl<'a> Decoder<'a> {
    pub fn new() -> Self {
        Self {
            mode: Mode::Decode,
            filter_power: 0,
            mask_count: DEFAULT_MASK_COUNT,
            mask_seed: DEFAULT_MASK_SEED,
            reference: None,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the number of luma AC coefficients each mask clears.
    pub fn filter_power(mut self, power: usize) -> Self {
        self.filter_power = power;
        self
    }

    pub fn mask_seed(mut self, seed: u64) -> Self {
        self.mask_seed = seed;
        self
    }

    pub fn mask_count(mut self, count: usize) -> Self {
        self.mask_count = count;
        self
    }

    /// Supplies the reference image whose coefficients the residual modes
    /// subtract or add at masked positions. Must match the dimensions of the
    /// image being decoded.
    pub fn reference(mut self, image: Image<'a>) -> Self {
        self.reference = Some(image);
        self
    }

    /// Runs the configured mode over `jpeg`.
    pub fn decode(&self, jpeg: &[u8]) -> Result<Decoded> {
        if self.mode != Mode::Decode && self.filter_power > 63 {
            return Err(Error::internal(format!(
                "filter power {} exceeds the number of AC coefficients",
                self.filter_power
            )));
        }

        let mut ctx = DecodeContext {
            mode: self.mode,
            reference: self.reference,
            qtables: Default::default(),
            htables: Default::default(),
            components: Vec::new(),
            width: 0,
            height: 0,
            mb_cols: 0,
            mb_rows: 0,
            ssx_max: 0,
            ssy_max: 0,
            rst_interval: 0,
            writer: self.mode.processes_residuals().then(BitWriter::new),
        };
        if let Some(writer) = &mut ctx.writer {
            writer.push_byte(0xFF);
            writer.push_byte(0xD8);
        }

        let mut parser = JpegParser::new(jpeg)?;
        let mut scanned = false;
        while let Some(segment) = parser.next_segment()? {
            log::trace!("ff {:02x} segment at {:#x}", segment.marker(), segment.offset());

            let sos = match segment.as_segment_kind() {
                Some(SegmentKind::Dqt(dqt)) => {
                    ctx.define_quantization_tables(dqt)?;
                    None
                }
                Some(SegmentKind::Dht(dht)) => {
                    ctx.define_huffman_tables(dht)?;
                    None
                }
                Some(SegmentKind::Dri(dri)) => {
                    ctx.rst_interval = usize::from(dri.Ri());
                    None
                }
                Some(SegmentKind::Sof(sof)) => {
                    ctx.start_of_frame(sof)?;
                    None
                }
                Some(SegmentKind::Sos(sos)) => Some(sos),
                Some(SegmentKind::App(_)) | Some(SegmentKind::Com(_)) => None,
                None => {
                    return Err(Error::syntax(format!(
                        "invalid marker ff {:02x}",
                        segment.marker()
                    )));
                }
            };

            // Residual modes mirror every header segment into the output.
            if let Some(writer) = &mut ctx.writer {
                writer.push_byte(0xFF);
                writer.push_byte(segment.marker());
                writer.extend_from_slice(segment.raw_bytes());
            }

            if let Some(sos) = sos {
                ctx.decode_scan(sos, self.filter_power, self.mask_count, self.mask_seed)?;
                scanned = true;
                break;
            }
        }
        if !scanned {
            return Err(Error::syntax("no scan data in JPEG file"));
        }

        ctx.finish()
    }
}

impl<'a> Default for Decoder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of a [`Decoder::decode`] call.
#[derive(Debug)]
pub struct Decoded {
    width: usize,
    height: usize,
    components: usize,
    pixels: Vec<u8>,
    bitstream: Option<Vec<u8>>,
}

impl Decoded {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 3 for color images, 1 for grayscale.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Interleaved RGB (or plain grayscale) pixels. Empty in the residual
    /// modes, which produce a bitstream instead.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The re-encoded JPEG bitstream produced by the residual modes.
    pub fn bitstream(&self) -> Option<&[u8]> {
        self.bitstream.as_deref()
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn into_bitstream(self) -> Option<Vec<u8>> {
        self.bitstream
    }
}

struct Component {
    id: u8,
    /// Horizontal / vertical sampling factors.
    ssx: usize,
    ssy: usize,
    qt: usize,
    dc_table: usize,
    ac_table: usize,
    last_dc: i32,
    plane: Plane,
}

struct DecodeContext<'a> {
    mode: Mode,
    reference: Option<Image<'a>>,
    qtables: [Option<QuantTable>; 4],
    htables: [Option<Table>; 4],
    components: Vec<Component>,
    width: usize,
    height: usize,
    mb_cols: usize,
    mb_rows: usize,
    ssx_max: usize,
    ssy_max: usize,
    rst_interval: usize,
    writer: Option<BitWriter>,
}

impl<'a> DecodeContext<'a> {
    fn define_quantization_tables(&mut self, dqt: &crate::file::Dqt<'_>) -> Result<()> {
        for table in dqt.tables() {
            if table.PqTq() & 0xFC != 0 {
                return Err(Error::syntax(format!(
                    "invalid quantization table spec {:02x}",
                    table.PqTq()
                )));
            }
            self.qtables[usize::from(table.Tq())] = Some(QuantTable::from_zigzag(table.Qk()));
        }
        Ok(())
    }

    fn define_huffman_tables(&mut self, dht: &crate::file::Dht<'_>) -> Result<()> {
        for table in dht.tables() {
            let spec = table.TcTh();
            if spec & 0xEC != 0 {
                return Err(Error::syntax(format!("invalid huffman table spec {spec:02x}")));
            }
            if spec & 0x02 != 0 {
                return Err(Error::unsupported(format!(
                    "huffman table destination {} is not baseline",
                    spec & 0x0F
                )));
            }
            // Fold class and destination into one of 4 slots:
            // DC 0/1 -> 0/1, AC 0/1 -> 2/3.
            let slot = usize::from((spec | (spec >> 3)) & 3);
            let values = table.Vij();
            self.htables[slot] = Some(Table::build(table.Li(), values)?);
        }
        Ok(())
    }

    fn start_of_frame(&mut self, sof: &crate::file::Sof<'_>) -> Result<()> {
        if sof.sof() != SofMarker::SOF0 {
            return Err(Error::unsupported(format!(
                "only baseline JPEG is supported, got {:?}",
                sof.sof()
            )));
        }
        if sof.P() != 8 {
            return Err(Error::unsupported(format!(
                "unsupported sample precision {}",
                sof.P()
            )));
        }
        self.width = usize::from(sof.X());
        self.height = usize::from(sof.Y());
        if self.width == 0 || self.height == 0 {
            return Err(Error::unsupported("zero image size"));
        }

        let components = sof.components();
        if components.len() != 1 && components.len() != 3 {
            return Err(Error::unsupported(format!(
                "images with {} components are not supported",
                components.len()
            )));
        }

        for fc in components {
            let (ssx, ssy) = (usize::from(fc.Hi()), usize::from(fc.Vi()));
            if ssx == 0 || !ssx.is_power_of_two() {
                return Err(Error::unsupported(format!(
                    "unsupported horizontal sampling factor {ssx} (component {})",
                    fc.Ci()
                )));
            }
            if ssy == 0 || !ssy.is_power_of_two() {
                return Err(Error::unsupported(format!(
                    "unsupported vertical sampling factor {ssy} (component {})",
                    fc.Ci()
                )));
            }
            if fc.Tqi() & 0xFC != 0 {
                return Err(Error::syntax(format!(
                    "invalid quantization table id {}",
                    fc.Tqi()
                )));
            }
            self.ssx_max = self.ssx_max.max(ssx);
            self.ssy_max = self.ssy_max.max(ssy);
            self.components.push(Component {
                id: fc.Ci(),
                ssx,
                ssy,
                qt: usize::from(fc.Tqi()),
                dc_table: 0,
                ac_table: 2,
                last_dc: 0,
                plane: Plane {
                    width: 0,
                    height: 0,
                    stride: 0,
                    pixels: Vec::new(),
                },
            });
        }

        self.mb_cols = (self.width + self.ssx_max * 8 - 1) / (self.ssx_max * 8);
        self.mb_rows = (self.height + self.ssy_max * 8 - 1) / (self.ssy_max * 8);

        for comp in &mut self.components {
            let width = (self.width * comp.ssx + self.ssx_max - 1) / self.ssx_max;
            let height = (self.height * comp.ssy + self.ssy_max - 1) / self.ssy_max;
            if (width < 3 && comp.ssx != self.ssx_max) || (height < 3 && comp.ssy != self.ssy_max)
            {
                return Err(Error::unsupported(
                    "image too small for chroma upsampling",
                ));
            }
            let stride = self.mb_cols * comp.ssx * 8;
            comp.plane = Plane {
                width,
                height,
                stride,
                pixels: vec![0; stride * self.mb_rows * comp.ssy * 8],
            };
        }

        Ok(())
    }

    fn decode_scan(
        &mut self,
        sos: &Sos<'_>,
        filter_power: usize,
        mask_count: usize,
        mask_seed: u64,
    ) -> Result<()> {
        if self.components.is_empty() {
            return Err(Error::syntax("SOS without a preceding SOF"));
        }
        if sos.components().len() != self.components.len() {
            return Err(Error::unsupported(
                "scan does not cover all frame components",
            ));
        }
        for (sc, comp) in sos.components().iter().zip(&mut self.components) {
            if sc.Csj() != comp.id {
                return Err(Error::syntax(format!(
                    "scan component {} does not match frame component {}",
                    sc.Csj(),
                    comp.id
                )));
            }
            let spec = sc.TdjTaj();
            if spec & 0xEE != 0 {
                return Err(Error::syntax(format!(
                    "invalid entropy table selector {spec:02x}"
                )));
            }
            comp.dc_table = usize::from(spec >> 4);
            comp.ac_table = usize::from(spec & 1) | 2;
        }
        if sos.Ss() != 0 || sos.Se() != 63 || sos.Ah() != 0 || sos.Al() != 0 {
            return Err(Error::unsupported("not a sequential baseline scan"));
        }

        if self.mode.processes_residuals() {
            let reference = self
                .reference
                .as_ref()
                .ok_or_else(|| Error::internal("residual modes require a reference image"))?;
            if reference.width() != self.width || reference.height() != self.height {
                return Err(Error::internal(format!(
                    "reference image is {}x{}, expected {}x{}",
                    reference.width(),
                    reference.height(),
                    self.width,
                    self.height
                )));
            }
        }

        let mut pool = (self.mode != Mode::Decode)
            .then(|| MaskPool::new(filter_power, mask_count, mask_seed));

        let mut reader = BitReader::new(sos.data());
        let mut rst_count = self.rst_interval;
        let mut next_rst = 0u32;

        for mby in 0..self.mb_rows {
            for mbx in 0..self.mb_cols {
                for ci in 0..self.components.len() {
                    self.decode_mcu_component(&mut reader, ci, mbx, mby, &mut pool)?;
                }

                let last_mcu = mby == self.mb_rows - 1 && mbx == self.mb_cols - 1;
                if self.rst_interval > 0 && !last_mcu {
                    rst_count -= 1;
                    if rst_count == 0 {
                        self.restart(&mut reader, next_rst)?;
                        next_rst = (next_rst + 1) & 7;
                        rst_count = self.rst_interval;
                    }
                }
            }
        }

        if let Some(writer) = &mut self.writer {
            writer.byte_align();
            writer.push_byte(0xFF);
            writer.push_byte(0xD9);
        }

        Ok(())
    }

    /// Decodes the data units one component contributes to one MCU.
    fn decode_mcu_component(
        &mut self,
        reader: &mut BitReader<'_>,
        ci: usize,
        mbx: usize,
        mby: usize,
        pool: &mut Option<MaskPool>,
    ) -> Result<()> {
        let (ssx, ssy) = {
            let comp = &self.components[ci];
            (comp.ssx, comp.ssy)
        };

        for sby in 0..ssy {
            for sbx in 0..ssx {
                let row = (mby * ssy + sby) * 8;
                let col = (mbx * ssx + sbx) * 8;

                // The pool only ever applies to the first (luma) component.
                let mask = match pool {
                    Some(pool) if ci == 0 => pool.next_mask(),
                    _ => Mask::ALL,
                };

                let comp = &self.components[ci];
                let dc_table = self.htables[comp.dc_table]
                    .as_ref()
                    .ok_or_else(|| Error::syntax("scan references an undefined DC table"))?;
                let ac_table = self.htables[comp.ac_table]
                    .as_ref()
                    .ok_or_else(|| Error::syntax("scan references an undefined AC table"))?;
                let qtable = self.qtables[comp.qt]
                    .as_ref()
                    .ok_or_else(|| Error::syntax("scan references an undefined DQT table"))?;

                let comp = &mut self.components[ci];
                let prev_dc = comp.last_dc;
                let mut block = entropy::decode_block(
                    reader,
                    &dc_table.decode,
                    &ac_table.decode,
                    &mut comp.last_dc,
                    Mask::ALL,
                )?;

                match self.mode {
                    Mode::Decode | Mode::ZeroOutAndDecode => {
                        if self.mode == Mode::ZeroOutAndDecode {
                            for i in 0..64 {
                                if !mask.keeps(i) {
                                    block[i] = 0;
                                }
                            }
                        }
                        let natural = qtable.dequantize(&block);
                        let offset = row * comp.plane.stride + col;
                        dct::inverse(&natural, &mut comp.plane.pixels, offset, comp.plane.stride);
                    }
                    Mode::EncodeResiduals | Mode::DecodeResiduals => {
                        if ci == 0 {
                            if let Some(reference) = &self.reference {
                                let enhanced = enhanced_coefficients(reference, qtable, row, col);
                                for i in 1..64 {
                                    if mask.keeps(i) {
                                        continue;
                                    }
                                    if self.mode == Mode::EncodeResiduals {
                                        block[i] -= enhanced[i];
                                    } else {
                                        block[i] += enhanced[i];
                                    }
                                }
                            }
                        }
                        let writer = self
                            .writer
                            .as_mut()
                            .ok_or_else(|| Error::internal("residual mode without an output"))?;
                        let mut predictor = prev_dc;
                        entropy::encode_block(
                            writer,
                            &block,
                            &dc_table.encode,
                            &ac_table.encode,
                            &mut predictor,
                            Mask::ALL,
                        )?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Consumes and validates one restart marker, resetting the DC
    /// predictors. The residual modes re-emit the marker so the transcoded
    /// stream keeps its restart structure.
    fn restart(&mut self, reader: &mut BitReader<'_>, next_rst: u32) -> Result<()> {
        reader.byte_align();
        let marker = reader.get_bits(16)?;
        if marker & 0xFFF8 != 0xFFD0 || marker & 7 != next_rst {
            return Err(Error::syntax(format!(
                "expected restart marker ffd{next_rst}, found {marker:04x}"
            )));
        }
        for comp in &mut self.components {
            comp.last_dc = 0;
        }
        if let Some(writer) = &mut self.writer {
            writer.byte_align();
            writer.push_byte(0xFF);
            writer.push_byte(0xD0 | next_rst as u8);
        }
        Ok(())
    }

    /// Upsamples, color-converts and packages the result.
    fn finish(mut self) -> Result<Decoded> {
        let components = self.components.len();

        if let Some(writer) = self.writer {
            return Ok(Decoded {
                width: self.width,
                height: self.height,
                components,
                pixels: Vec::new(),
                bitstream: Some(writer.into_bytes()),
            });
        }

        let pixels = if components == 3 {
            for comp in &mut self.components {
                comp.plane.upsample_to(self.width, self.height)?;
            }
            let (y, cb, cr) = match &self.components[..] {
                [y, cb, cr] => (&y.plane, &cb.plane, &cr.plane),
                _ => return Err(Error::internal("component count changed during decoding")),
            };
            let mut rgb = Vec::with_capacity(self.width * self.height * 3);
            for row in 0..self.height {
                for col in 0..self.width {
                    rgb.extend_from_slice(&color::ycbcr_to_rgb(
                        y.pixels[row * y.stride + col],
                        cb.pixels[row * cb.stride + col],
                        cr.pixels[row * cr.stride + col],
                    ));
                }
            }
            rgb
        } else {
            let plane = &mut self.components[0].plane;
            plane.compact_stride();
            let mut pixels = std::mem::take(&mut plane.pixels);
            pixels.truncate(self.width * self.height);
            pixels
        };

        Ok(Decoded {
            width: self.width,
            height: self.height,
            components,
            pixels,
            bitstream: None,
        })
    }
}

/// Forward-transforms and quantizes the co-located 8×8 luma patch of the
/// reference image.
fn enhanced_coefficients(
    reference: &Image<'_>,
    qtable: &QuantTable,
    row: usize,
    col: usize,
) -> Zigzag {
    let mut fragment = [0.0f32; 64];
    for r in 0..8 {
        for c in 0..8 {
            fragment[r * 8 + c] = reference.yuv(row + r, col + c).0;
        }
    }
    dct::forward(&mut fragment);
    qtable.quantize(&fragment)
}
