//! Loader factories and the handle they produce.
//!
//! A [`LoaderFactory`] is the per-format entry point: it guards the minimum
//! header length, runs the format's header parser and, only if that succeeds,
//! produces a [`TextureLoader`] carrying the validated metadata.

use tracing::debug;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::formats::jpeg::{self, JpegHeader};
use crate::formats::png::{self, PngHeader};
use crate::reader::ByteReader;
use crate::types::{ImageFormat, ImageHeader, TextureDescriptor, TextureFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoaderFactory {
    Jpeg,
    Png,
}

impl LoaderFactory {
    #[must_use]
    pub const fn for_format(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => Self::Jpeg,
            ImageFormat::Png => Self::Png,
        }
    }

    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }

    /// Minimum number of bytes needed to reach a verdict.
    #[must_use]
    pub const fn header_length(&self) -> usize {
        self.format().header_length()
    }

    /// Returns true if the leading bytes of `data` are consistent with this
    /// format's signature. A buffer shorter than the signature is compared
    /// over the bytes it has.
    #[must_use]
    pub fn recognizes(&self, data: &[u8]) -> bool {
        let signature = self.format().signature();
        let n = signature.len().min(data.len());
        data[..n] == signature[..n]
    }

    /// Validates the bytes remaining in `reader` with the default config.
    pub fn try_create(&self, reader: &ByteReader<'_>) -> Result<TextureLoader> {
        self.try_create_with(reader, &ProbeConfig::default())
    }

    /// Validates the bytes remaining in `reader`.
    ///
    /// The caller's reader is not advanced. Bytes past the header are ignored.
    pub fn try_create_with(
        &self,
        reader: &ByteReader<'_>,
        config: &ProbeConfig,
    ) -> Result<TextureLoader> {
        let format = self.format();
        let needed = self.header_length();
        let available = reader.remaining();

        if available < needed {
            debug!(%format, needed, available, "buffer shorter than minimum header");
            return Err(ProbeError::InsufficientData {
                offset: reader.position(),
                needed,
                available,
            });
        }

        let mut cursor = *reader;
        let parsed = match self {
            Self::Jpeg => jpeg::parse_header(&mut cursor, config).map(ImageHeader::Jpeg),
            Self::Png => png::parse_header(&mut cursor, config).map(ImageHeader::Png),
        };

        match parsed {
            Ok(header) => {
                debug!(
                    %format,
                    width = header.width(),
                    height = header.height(),
                    header_bytes = cursor.position() - reader.position(),
                    "header accepted"
                );
                Ok(TextureLoader { header })
            }
            Err(e) => {
                debug!(%format, kind = %e.kind(), "header rejected: {e}");
                Err(e)
            }
        }
    }
}

/// Validated metadata for one image, ready to size a texture.
///
/// Only a successful factory call creates one. It holds no reference to the
/// buffer it was validated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLoader {
    header: ImageHeader,
}

impl TextureLoader {
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.header.format()
    }

    #[must_use]
    pub const fn header(&self) -> &ImageHeader {
        &self.header
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.header.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.header.height()
    }

    #[must_use]
    pub fn channels(&self) -> u8 {
        self.header.channels()
    }

    #[must_use]
    pub const fn jpeg(&self) -> Option<&JpegHeader> {
        match &self.header {
            ImageHeader::Jpeg(h) => Some(h),
            ImageHeader::Png(_) => None,
        }
    }

    #[must_use]
    pub const fn png(&self) -> Option<&PngHeader> {
        match &self.header {
            ImageHeader::Png(h) => Some(h),
            ImageHeader::Jpeg(_) => None,
        }
    }

    /// Destination texture for a full decode. Sources wider than 8 bits per
    /// sample decode to 16-bit channels.
    #[must_use]
    pub fn descriptor(&self) -> TextureDescriptor {
        let format = if self.header.bits_per_sample() > 8 {
            TextureFormat::Rgba16Unorm
        } else {
            TextureFormat::Rgba8Unorm
        };
        TextureDescriptor::new_2d(self.width(), self.height(), format)
    }

    /// Bytes a full decode would need; nothing is allocated here.
    #[must_use]
    pub fn decoded_size(&self) -> Option<u64> {
        self.descriptor().byte_size()
    }
}
