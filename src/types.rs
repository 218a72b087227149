use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::formats::jpeg::JpegHeader;
use crate::formats::png::PngHeader;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
        }
    }

    #[must_use]
    pub const fn signature(&self) -> &'static [u8] {
        match self {
            Self::Jpeg => &crate::formats::jpeg::JPEG_SOI,
            Self::Png => &crate::formats::png::PNG_SIGNATURE,
        }
    }

    #[must_use]
    pub const fn header_length(&self) -> usize {
        match self {
            Self::Jpeg => crate::formats::jpeg::HEADER_LENGTH,
            Self::Png => crate::formats::png::HEADER_LENGTH,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(format!("unknown image format '{other}'")),
        }
    }
}

/// Pixel layout a full decode would produce.
///
/// Decoders behind this layer always expand to four channels, so the
/// only choice left is the channel width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba16Unorm,
}

impl TextureFormat {
    #[must_use]
    pub const fn bytes_per_pixel(&self) -> u64 {
        match self {
            Self::Rgba8Unorm => 4,
            Self::Rgba16Unorm => 8,
        }
    }
}

/// Everything a GPU allocator needs to size the destination texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub layers: u32,
    pub mip_levels: u32,
    pub format: TextureFormat,
}

impl TextureDescriptor {
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            depth: 1,
            layers: 1,
            mip_levels: 1,
            format,
        }
    }

    /// Bytes of a fully decoded image, or `None` if that does not fit in `u64`.
    #[must_use]
    pub fn byte_size(&self) -> Option<u64> {
        u64::from(self.width)
            .checked_mul(u64::from(self.height))?
            .checked_mul(u64::from(self.depth))?
            .checked_mul(u64::from(self.layers))?
            .checked_mul(self.format.bytes_per_pixel())
    }
}

/// Validated header facts, one variant per supported container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum ImageHeader {
    Jpeg(JpegHeader),
    Png(PngHeader),
}

impl ImageHeader {
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        match self {
            Self::Jpeg(_) => ImageFormat::Jpeg,
            Self::Png(_) => ImageFormat::Png,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Jpeg(h) => u32::from(h.width),
            Self::Png(h) => h.width,
        }
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        match self {
            Self::Jpeg(h) => u32::from(h.height),
            Self::Png(h) => h.height,
        }
    }

    /// Channels stored in the source, before any expansion to RGBA.
    #[must_use]
    pub fn channels(&self) -> u8 {
        match self {
            Self::Jpeg(h) => h.components,
            Self::Png(h) => h.color_type.channels(),
        }
    }

    #[must_use]
    pub fn bits_per_sample(&self) -> u8 {
        match self {
            Self::Jpeg(h) => h.precision,
            Self::Png(h) => h.bit_depth,
        }
    }
}
