use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::ImageFormat;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Recompute the IHDR CRC and reject mismatches.
    pub verify_crc: bool,
    /// Reject IHDR bit depth / color type / method combinations the PNG
    /// standard does not define.
    pub check_png_fields: bool,
    /// Reject headers declaring a larger width or height.
    pub max_dimension: Option<u32>,
    /// Factory order used by [`crate::Dispatcher::from_config`].
    pub formats: Vec<ImageFormat>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            verify_crc: false,
            check_png_fields: true,
            max_dimension: None,
            formats: ImageFormat::ALL.to_vec(),
        }
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crc_verification(mut self, enabled: bool) -> Self {
        self.verify_crc = enabled;
        self
    }

    pub fn with_png_field_checks(mut self, enabled: bool) -> Self {
        self.check_png_fields = enabled;
        self
    }

    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn with_formats(mut self, formats: &[ImageFormat]) -> Self {
        self.formats = formats.to_vec();
        self
    }

    /// Loads a config from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    #[inline]
    pub(crate) fn exceeds_max_dimension(&self, width: u32, height: u32) -> bool {
        self.max_dimension
            .is_some_and(|max| width > max || height > max)
    }
}
