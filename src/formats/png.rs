//! PNG signature and IHDR chunk validation.

use serde::Serialize;
use tracing::trace;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::reader::ByteReader;
use crate::types::ImageFormat;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub const IHDR: [u8; 4] = *b"IHDR";

pub const IHDR_DATA_LENGTH: u32 = 13;

/// Length, type and CRC fields around every chunk payload.
pub const CHUNK_OVERHEAD: usize = 4 + 4 + 4;

/// Signature, the complete IHDR chunk, and the framing of the chunk that has
/// to follow it.
pub const HEADER_LENGTH: usize =
    PNG_SIGNATURE.len() + (CHUNK_OVERHEAD + IHDR_DATA_LENGTH as usize) + CHUNK_OVERHEAD;

/// Largest width or height the PNG standard allows.
pub const MAX_DIMENSION: u32 = 0x7FFF_FFFF;

const FORMAT: ImageFormat = ImageFormat::Png;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PngColorType {
    Grayscale,
    Rgb,
    Indexed,
    GrayscaleAlpha,
    Rgba,
    Unknown(u8),
}

impl PngColorType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Grayscale,
            2 => Self::Rgb,
            3 => Self::Indexed,
            4 => Self::GrayscaleAlpha,
            6 => Self::Rgba,
            b => Self::Unknown(b),
        }
    }

    pub const fn to_byte(&self) -> u8 {
        match self {
            Self::Grayscale => 0,
            Self::Rgb => 2,
            Self::Indexed => 3,
            Self::GrayscaleAlpha => 4,
            Self::Rgba => 6,
            Self::Unknown(b) => *b,
        }
    }

    /// Samples per pixel as stored (palette indices count as one).
    pub const fn channels(&self) -> u8 {
        match self {
            Self::Grayscale | Self::Indexed => 1,
            Self::GrayscaleAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
            Self::Unknown(_) => 0,
        }
    }

    pub const fn allows_bit_depth(&self, bit_depth: u8) -> bool {
        match self {
            Self::Grayscale => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
            Self::Indexed => matches!(bit_depth, 1 | 2 | 4 | 8),
            Self::Rgb | Self::GrayscaleAlpha | Self::Rgba => matches!(bit_depth, 8 | 16),
            Self::Unknown(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PngHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: PngColorType,
    pub compression: u8,
    pub filter: u8,
    pub interlaced: bool,
    /// CRC as stored in the file; only compared when CRC checks are enabled.
    pub crc: u32,
}

/// Raw IHDR payload fields.
#[derive(Debug, Clone, Copy)]
struct IhdrData {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    compression: u8,
    filter: u8,
    interlace: u8,
}

impl IhdrData {
    fn read(payload: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            width: payload.read_u32_be()?,
            height: payload.read_u32_be()?,
            bit_depth: payload.read_u8()?,
            color_type: payload.read_u8()?,
            compression: payload.read_u8()?,
            filter: payload.read_u8()?,
            interlace: payload.read_u8()?,
        })
    }

    fn check_dimensions(&self, config: &ProbeConfig) -> Result<()> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ProbeError::malformed(
                FORMAT,
                format!("IHDR declares invalid dimensions {width}x{height}"),
            ));
        }
        if config.exceeds_max_dimension(width, height) {
            return Err(ProbeError::malformed(
                FORMAT,
                format!("{width}x{height} exceeds the configured maximum dimension"),
            ));
        }
        Ok(())
    }

    /// Color type must be one the standard defines, even in lenient mode;
    /// channel count and texture format are derived from it.
    fn check_color_type(&self) -> Result<PngColorType> {
        match PngColorType::from_byte(self.color_type) {
            PngColorType::Unknown(b) => Err(ProbeError::malformed(
                FORMAT,
                format!("unknown color type {b}"),
            )),
            color_type => Ok(color_type),
        }
    }

    fn check_fields(&self, color_type: PngColorType) -> Result<()> {
        if !color_type.allows_bit_depth(self.bit_depth) {
            return Err(ProbeError::malformed(
                FORMAT,
                format!(
                    "bit depth {} is not valid for color type {}",
                    self.bit_depth, self.color_type
                ),
            ));
        }
        if self.compression != 0 || self.filter != 0 {
            return Err(ProbeError::malformed(
                FORMAT,
                format!(
                    "unsupported compression/filter method {}/{}",
                    self.compression, self.filter
                ),
            ));
        }
        if self.interlace > 1 {
            return Err(ProbeError::malformed(
                FORMAT,
                format!("unknown interlace method {}", self.interlace),
            ));
        }
        Ok(())
    }
}

/// Parses the signature and the leading IHDR chunk.
///
/// The reader must be positioned at the first byte of the PNG stream.
pub fn parse_header(reader: &mut ByteReader<'_>, config: &ProbeConfig) -> Result<PngHeader> {
    let signature = reader.read_array::<8>()?;
    if signature != PNG_SIGNATURE {
        return Err(ProbeError::InvalidSignature { format: FORMAT });
    }

    let offset = reader.position();
    let length = reader.read_u32_be()?;
    let chunk_type = reader.read_tag()?;

    if chunk_type != IHDR {
        return Err(ProbeError::malformed(
            FORMAT,
            format!(
                "first chunk is {:?}, expected IHDR",
                String::from_utf8_lossy(&chunk_type)
            ),
        ));
    }
    if length != IHDR_DATA_LENGTH {
        return Err(ProbeError::malformed(
            FORMAT,
            format!("IHDR length is {length}, expected {IHDR_DATA_LENGTH}"),
        ));
    }

    let mut payload = reader.sub_reader(IHDR_DATA_LENGTH as usize)?;
    let raw_payload = payload.rest();
    let ihdr = IhdrData::read(&mut payload)?;
    let crc = reader.read_u32_be()?;

    if config.verify_crc {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&chunk_type);
        hasher.update(raw_payload);
        let calculated = hasher.finalize();
        if calculated != crc {
            return Err(ProbeError::malformed(
                FORMAT,
                format!("IHDR CRC mismatch: stored {crc:#010X}, calculated {calculated:#010X}"),
            ));
        }
    }

    ihdr.check_dimensions(config)?;
    let color_type = ihdr.check_color_type()?;
    if config.check_png_fields {
        ihdr.check_fields(color_type)?;
    }

    trace!(offset, width = ihdr.width, height = ihdr.height, "PNG IHDR chunk");

    Ok(PngHeader {
        width: ihdr.width,
        height: ihdr.height,
        bit_depth: ihdr.bit_depth,
        color_type,
        compression: ihdr.compression,
        filter: ihdr.filter,
        interlaced: ihdr.interlace == 1,
        crc,
    })
}
