//! Bounds-checked cursor over an immutable byte slice.
//!
//! Every header parser in this crate touches buffer bytes only through
//! [`ByteReader`]. A read either consumes exactly the bytes it decodes and
//! advances the cursor, or fails with [`ProbeError::InsufficientData`] and
//! leaves the cursor where it was.

use crate::error::{ProbeError, Result};

#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    ///
    /// An empty slice is a valid reader: zero-length reads succeed and
    /// everything else reports insufficient data.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Unread portion of the buffer.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns true if the unread bytes begin with `prefix`.
    #[inline]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.rest().starts_with(prefix)
    }

    #[inline]
    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(ProbeError::InsufficientData {
                offset: self.pos,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Consumes `n` bytes and returns them as a borrowed slice.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Four-byte ASCII tag, as used for PNG chunk types.
    #[inline]
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        self.read_array::<4>()
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    #[inline]
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.read_array::<2>().map(u16::from_be_bytes)
    }

    #[inline]
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.read_array::<2>().map(u16::from_le_bytes)
    }

    #[inline]
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.read_array::<4>().map(u32::from_be_bytes)
    }

    #[inline]
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.read_array::<4>().map(u32::from_le_bytes)
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek_u8(&self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Consumes `n` bytes and returns a reader confined to them.
    ///
    /// Offsets reported by the sub-reader are relative to its own start.
    pub fn sub_reader(&mut self, n: usize) -> Result<ByteReader<'a>> {
        self.read_bytes(n).map(ByteReader::new)
    }
}
