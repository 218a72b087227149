//! Per-container header parsers.
//!
//! Each module owns its signature, its `HEADER_LENGTH` and a `parse_header`
//! function that takes a [`crate::reader::ByteReader`] positioned at the start
//! of the stream.

pub mod jpeg;
pub mod png;
