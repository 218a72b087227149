//! JPEG marker-segment walker.
//!
//! Walks the marker stream from the start-of-image marker up to the first
//! start-of-frame segment and reports the frame header. Entropy-coded data is
//! never touched: a scan marker before the frame header is a structural error.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::reader::ByteReader;
use crate::types::ImageFormat;

pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const DQT: u8 = 0xDB;
pub const DHT: u8 = 0xC4;
pub const DAC: u8 = 0xCC;
pub const DRI: u8 = 0xDD;
pub const SOF0: u8 = 0xC0;
pub const RST0: u8 = 0xD0;
pub const RST7: u8 = 0xD7;
pub const APP0: u8 = 0xE0;
pub const COM: u8 = 0xFE;
pub const TEM: u8 = 0x01;

/// Length field of a frame header with a single component: the length bytes
/// themselves, precision, height, width, component count, one 3-byte
/// component spec.
pub const SOF_MIN_SEGMENT_LENGTH: usize = 2 + 1 + 2 + 2 + 1 + 3;

/// Bytes needed before a verdict is possible: SOI followed directly by the
/// smallest frame header.
pub const HEADER_LENGTH: usize = JPEG_SOI.len() + 2 + SOF_MIN_SEGMENT_LENGTH;

const FORMAT: ImageFormat = ImageFormat::Jpeg;

#[inline]
pub const fn is_restart_marker(marker: u8) -> bool {
    marker >= RST0 && marker <= RST7
}

/// SOF0..SOF15, excluding DHT (C4), JPG (C8) and DAC (CC).
#[inline]
pub const fn is_sof_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
}

/// Markers that are not followed by a length field (T.81 table B.1).
#[inline]
pub const fn is_standalone_marker(marker: u8) -> bool {
    marker == TEM || is_restart_marker(marker) || marker == SOI || marker == EOI
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerType {
    Soi,
    Eoi,
    Sos,
    Dqt,
    Dht,
    Dac,
    Dri,
    Sof(u8),
    App(u8),
    Rst(u8),
    Com,
    Tem,
    Other(u8),
}

impl MarkerType {
    #[inline]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            SOI => Self::Soi,
            EOI => Self::Eoi,
            SOS => Self::Sos,
            DQT => Self::Dqt,
            DHT => Self::Dht,
            DAC => Self::Dac,
            DRI => Self::Dri,
            COM => Self::Com,
            TEM => Self::Tem,
            b if is_restart_marker(b) => Self::Rst(b - RST0),
            b if (0xE0..=0xEF).contains(&b) => Self::App(b - APP0),
            b if is_sof_marker(b) => Self::Sof(b - SOF0),
            b => Self::Other(b),
        }
    }
}

impl fmt::Display for MarkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soi => f.write_str("SOI"),
            Self::Eoi => f.write_str("EOI"),
            Self::Sos => f.write_str("SOS"),
            Self::Dqt => f.write_str("DQT"),
            Self::Dht => f.write_str("DHT"),
            Self::Dac => f.write_str("DAC"),
            Self::Dri => f.write_str("DRI"),
            Self::Com => f.write_str("COM"),
            Self::Tem => f.write_str("TEM"),
            Self::Sof(n) => write!(f, "SOF{n}"),
            Self::App(n) => write!(f, "APP{n}"),
            Self::Rst(n) => write!(f, "RST{n}"),
            Self::Other(b) => write!(f, "0xFF{b:02X}"),
        }
    }
}

/// Coding process announced by the frame marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JpegCoding {
    Baseline,
    ExtendedSequential,
    Progressive,
    Lossless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JpegHeader {
    pub width: u16,
    pub height: u16,
    /// Sample precision in bits.
    pub precision: u8,
    pub components: u8,
    pub coding: JpegCoding,
    pub arithmetic: bool,
    pub hierarchical: bool,
    pub sof_marker: u8,
}

impl JpegHeader {
    #[inline]
    pub const fn is_progressive(&self) -> bool {
        matches!(self.coding, JpegCoding::Progressive)
    }
}

/// Coding process, arithmetic flag and hierarchical flag for a SOF marker.
fn frame_kind(marker: u8) -> (JpegCoding, bool, bool) {
    let coding = match marker & 0x03 {
        0 if marker == SOF0 => JpegCoding::Baseline,
        0 | 1 => JpegCoding::ExtendedSequential,
        2 => JpegCoding::Progressive,
        _ => JpegCoding::Lossless,
    };
    let arithmetic = marker & 0x08 != 0;
    let hierarchical = marker & 0x04 != 0;
    (coding, arithmetic, hierarchical)
}

/// Parses from the start-of-image marker through the first frame header.
///
/// The reader must be positioned at the first byte of the JPEG stream.
pub fn parse_header(reader: &mut ByteReader<'_>, config: &ProbeConfig) -> Result<JpegHeader> {
    let soi = reader.read_array::<2>()?;
    if soi != JPEG_SOI {
        return Err(ProbeError::InvalidSignature { format: FORMAT });
    }

    loop {
        let offset = reader.position();
        let marker = next_marker(reader)?;

        if is_sof_marker(marker) {
            return parse_frame(reader, marker, offset, config);
        }

        match marker {
            SOI | EOI | SOS | 0x00 => {
                return Err(ProbeError::malformed(
                    FORMAT,
                    format!(
                        "{} at offset {offset} before frame header",
                        MarkerType::from_byte(marker)
                    ),
                ));
            }
            m if is_standalone_marker(m) => {
                trace!(offset, marker = %MarkerType::from_byte(m), "standalone JPEG marker");
            }
            _ => skip_segment(reader, marker, offset)?,
        }
    }
}

/// Reads `0xFF`, any fill bytes, and the marker code.
fn next_marker(reader: &mut ByteReader<'_>) -> Result<u8> {
    let offset = reader.position();
    let prefix = reader.read_u8()?;
    if prefix != 0xFF {
        return Err(ProbeError::malformed(
            FORMAT,
            format!("expected marker at offset {offset}, found 0x{prefix:02X}"),
        ));
    }

    let mut code = reader.read_u8()?;
    while code == 0xFF {
        code = reader.read_u8()?;
    }
    Ok(code)
}

fn read_segment_length(reader: &mut ByteReader<'_>, marker: u8, offset: usize) -> Result<usize> {
    let length = reader.read_u16_be()? as usize;
    if length < 2 {
        return Err(ProbeError::malformed(
            FORMAT,
            format!(
                "{} segment at offset {offset} declares length {length}",
                MarkerType::from_byte(marker)
            ),
        ));
    }
    Ok(length)
}

fn skip_segment(reader: &mut ByteReader<'_>, marker: u8, offset: usize) -> Result<()> {
    let length = read_segment_length(reader, marker, offset)?;
    reader.skip(length - 2)?;
    trace!(offset, length, marker = %MarkerType::from_byte(marker), "skipped JPEG segment");
    Ok(())
}

fn parse_frame(
    reader: &mut ByteReader<'_>,
    marker: u8,
    offset: usize,
    config: &ProbeConfig,
) -> Result<JpegHeader> {
    let length = read_segment_length(reader, marker, offset)?;
    if length < SOF_MIN_SEGMENT_LENGTH {
        return Err(ProbeError::malformed(
            FORMAT,
            format!("frame header length {length} is shorter than {SOF_MIN_SEGMENT_LENGTH}"),
        ));
    }

    let mut segment = reader.sub_reader(length - 2)?;
    let precision = segment.read_u8()?;
    let height = segment.read_u16_be()?;
    let width = segment.read_u16_be()?;
    let components = segment.read_u8()?;

    if components == 0 {
        return Err(ProbeError::malformed(FORMAT, "frame header has no components"));
    }

    let expected = 8 + 3 * components as usize;
    if length != expected {
        return Err(ProbeError::malformed(
            FORMAT,
            format!("frame header length {length} does not match {components} components"),
        ));
    }

    for index in 0..components {
        let _id = segment.read_u8()?;
        let sampling = segment.read_u8()?;
        let (h, v) = (sampling >> 4, sampling & 0x0F);
        if !(1..=4).contains(&h) || !(1..=4).contains(&v) {
            return Err(ProbeError::malformed(
                FORMAT,
                format!("component {index} has sampling factors {h}x{v}"),
            ));
        }
        let _quant_table = segment.read_u8()?;
    }

    if width == 0 || height == 0 {
        return Err(ProbeError::malformed(
            FORMAT,
            format!("frame declares {width}x{height} dimensions"),
        ));
    }

    if config.exceeds_max_dimension(u32::from(width), u32::from(height)) {
        return Err(ProbeError::malformed(
            FORMAT,
            format!("{width}x{height} exceeds the configured maximum dimension"),
        ));
    }

    let (coding, arithmetic, hierarchical) = frame_kind(marker);
    trace!(offset, width, height, components, ?coding, "JPEG frame header");

    Ok(JpegHeader {
        width,
        height,
        precision,
        components,
        coding,
        arithmetic,
        hierarchical,
        sof_marker: marker,
    })
}
