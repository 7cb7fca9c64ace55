//! Bounds-checked field access for fixed-layout NVMe structures
//!
//! Identify and log page structures are decoded by reading named byte
//! offsets out of a raw response buffer. `FieldReader` centralizes the
//! bounds checks and little-endian conversions so each record decoder is a
//! flat list of reads against its offset table.

use bytes::Buf;

use crate::error::{NvmeError, Result};

/// Reader over one fixed-layout response buffer
///
/// Every accessor checks that the field's extent fits the buffer and fails
/// with [`NvmeError::Truncated`] naming the record, so decoders never
/// repeat length checks.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    record: &'static str,
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    /// Create a reader for `record` over `buf`
    pub fn new(record: &'static str, buf: &'a [u8]) -> Self {
        Self { record, buf }
    }

    fn field(&self, offset: usize, width: usize) -> Result<&'a [u8]> {
        let end = offset + width;
        if end > self.buf.len() {
            return Err(NvmeError::Truncated {
                record: self.record,
                offset,
                end,
                len: self.buf.len(),
            });
        }
        Ok(&self.buf[offset..end])
    }

    /// Read a byte at `offset`
    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.field(offset, 1)?[0])
    }

    /// Read a little-endian u16 at `offset`
    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        let mut field = self.field(offset, 2)?;
        Ok(field.get_u16_le())
    }

    /// Read a little-endian u32 at `offset`
    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        let mut field = self.field(offset, 4)?;
        Ok(field.get_u32_le())
    }

    /// Read a little-endian u64 at `offset`
    pub fn u64_at(&self, offset: usize) -> Result<u64> {
        let mut field = self.field(offset, 8)?;
        Ok(field.get_u64_le())
    }

    /// Read a little-endian u128 at `offset`
    ///
    /// The capacity and lifetime counters are 16-byte integers.
    pub fn u128_at(&self, offset: usize) -> Result<u128> {
        let mut field = self.field(offset, 16)?;
        Ok(field.get_u128_le())
    }

    /// Read `N` raw bytes at `offset`
    pub fn bytes_at<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.field(offset, N)?);
        Ok(out)
    }

    /// Read an ASCII field, trimmed of space and NUL padding
    pub fn ascii_at(&self, offset: usize, width: usize) -> Result<String> {
        let raw = self.field(offset, width)?;
        Ok(String::from_utf8_lossy(raw)
            .trim_matches(|c| c == ' ' || c == '\0')
            .to_string())
    }
}
