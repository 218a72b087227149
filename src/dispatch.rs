use rayon::prelude::*;
use tracing::debug;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::loader::{LoaderFactory, TextureLoader};
use crate::reader::ByteReader;
use crate::types::ImageFormat;

/// Tries an ordered set of factories against a buffer.
///
/// # Example
///
/// ```
/// use texprobe::Dispatcher;
///
/// let dispatcher = Dispatcher::new();
/// let err = dispatcher.probe(b"GIF89a not supported here").unwrap_err();
/// assert!(err.to_string().contains("no matching format"));
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    factories: Vec<LoaderFactory>,
    config: ProbeConfig,
}

impl Dispatcher {
    /// All supported formats, JPEG first, with the default config.
    pub fn new() -> Self {
        Self::from_config(ProbeConfig::default())
    }

    /// Factories in the order listed by `config.formats`; duplicates are
    /// dropped.
    pub fn from_config(config: ProbeConfig) -> Self {
        let mut factories = Vec::with_capacity(config.formats.len());
        for &format in &config.formats {
            let factory = LoaderFactory::for_format(format);
            if !factories.contains(&factory) {
                factories.push(factory);
            }
        }
        Self { factories, config }
    }

    pub fn with_factories(factories: Vec<LoaderFactory>, config: ProbeConfig) -> Self {
        Self { factories, config }
    }

    pub fn factories(&self) -> &[LoaderFactory] {
        &self.factories
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn formats(&self) -> Vec<ImageFormat> {
        self.factories.iter().map(LoaderFactory::format).collect()
    }

    /// Returns the first loader any factory produces.
    ///
    /// When every factory fails, the error of the first factory whose
    /// signature matches the buffer is returned; if none match, the result is
    /// [`ProbeError::UnrecognizedFormat`].
    pub fn probe(&self, data: &[u8]) -> Result<TextureLoader> {
        let reader = ByteReader::new(data);
        let mut first_recognized: Option<ProbeError> = None;

        for factory in &self.factories {
            match factory.try_create_with(&reader, &self.config) {
                Ok(loader) => return Ok(loader),
                Err(e) => {
                    if first_recognized.is_none() && factory.recognizes(data) {
                        first_recognized = Some(e);
                    }
                }
            }
        }

        let err = first_recognized.unwrap_or_else(|| ProbeError::UnrecognizedFormat {
            tried: self.formats(),
        });
        debug!(len = data.len(), "no factory accepted buffer: {err}");
        Err(err)
    }

    /// Probes independent buffers in parallel; results keep input order.
    pub fn probe_batch<B>(&self, buffers: &[B]) -> Vec<Result<TextureLoader>>
    where
        B: AsRef<[u8]> + Sync,
    {
        buffers
            .par_iter()
            .map(|buffer| self.probe(buffer.as_ref()))
            .collect()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
