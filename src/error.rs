use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::ImageFormat;

/// Coarse classification of a failed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Leading bytes don't match the format's magic.
    InvalidSignature,
    /// Fewer bytes available than a read or the minimum header requires.
    InsufficientData,
    /// Bytes are present but internally inconsistent.
    MalformedStructure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidSignature => "invalid signature",
            Self::InsufficientData => "insufficient data",
            Self::MalformedStructure => "malformed structure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("{format}: leading bytes do not match the {format} signature")]
    InvalidSignature { format: ImageFormat },

    #[error("need {needed} bytes at offset {offset}, only {available} available")]
    InsufficientData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("{format}: {reason}")]
    MalformedStructure { format: ImageFormat, reason: String },

    #[error("no matching format (tried: {})", format_list(.tried))]
    UnrecognizedFormat { tried: Vec<ImageFormat> },
}

impl ProbeError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSignature { .. } | Self::UnrecognizedFormat { .. } => {
                ErrorKind::InvalidSignature
            }
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::MalformedStructure { .. } => ErrorKind::MalformedStructure,
        }
    }

    pub(crate) fn malformed(format: ImageFormat, reason: impl Into<String>) -> Self {
        Self::MalformedStructure {
            format,
            reason: reason.into(),
        }
    }
}

fn format_list(formats: &[ImageFormat]) -> String {
    if formats.is_empty() {
        return "none".to_string();
    }
    formats
        .iter()
        .map(ImageFormat::name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ProbeError>;
