//! Header validation for untrusted JPEG and PNG texture assets.
//!
//! Buffers are checked through a bounds-checked [`ByteReader`]; a
//! [`LoaderFactory`] per format turns a structurally valid header into a
//! [`TextureLoader`] carrying only the validated metadata, and the
//! [`Dispatcher`] picks the matching format for an unknown buffer.

pub mod config;
pub mod dispatch;
mod error;
pub mod formats;
pub mod loader;
pub mod reader;
pub mod types;

pub use config::ProbeConfig;
pub use dispatch::Dispatcher;
pub use error::{ErrorKind, ProbeError, Result};
pub use formats::jpeg::{JpegCoding, JpegHeader};
pub use formats::png::{PngColorType, PngHeader};
pub use loader::{LoaderFactory, TextureLoader};
pub use reader::ByteReader;
pub use types::{ImageFormat, ImageHeader, TextureDescriptor, TextureFormat};
