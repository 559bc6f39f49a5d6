//! Bounds-checked little-endian reads over a byte slice.

use byteorder::{ByteOrder as _, LittleEndian};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("read of {len} bytes at offset {offset} exceeds buffer of {available} bytes")]
pub struct OutOfBounds {
    pub offset: usize,
    pub len: usize,
    pub available: usize,
}

/// Sequential reads advance `position`; the `*_at` accessors read at an
/// absolute offset and leave it alone.
#[derive(Debug, Clone)]
pub struct BinaryCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BinaryCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moving past the end is allowed; the next read reports it.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// True when `len` bytes starting at `offset` lie inside the buffer.
    pub fn fits(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.buf.len())
    }

    pub fn slice_at(&self, offset: usize, len: usize) -> Result<&'a [u8], OutOfBounds> {
        if !self.fits(offset, len) {
            return Err(OutOfBounds {
                offset,
                len,
                available: self.buf.len(),
            });
        }
        Ok(&self.buf[offset..offset + len])
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], OutOfBounds> {
        let bytes = self.slice_at(self.pos, len)?;
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, OutOfBounds> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, OutOfBounds> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, OutOfBounds> {
        Ok(LittleEndian::read_i32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, OutOfBounds> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, OutOfBounds> {
        Ok(LittleEndian::read_f64(self.read_bytes(8)?))
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8, OutOfBounds> {
        Ok(self.slice_at(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16, OutOfBounds> {
        Ok(LittleEndian::read_u16(self.slice_at(offset, 2)?))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32, OutOfBounds> {
        Ok(LittleEndian::read_u32(self.slice_at(offset, 4)?))
    }

    pub fn i32_at(&self, offset: usize) -> Result<i32, OutOfBounds> {
        Ok(LittleEndian::read_i32(self.slice_at(offset, 4)?))
    }

    pub fn f64_at(&self, offset: usize) -> Result<f64, OutOfBounds> {
        Ok(LittleEndian::read_f64(self.slice_at(offset, 8)?))
    }
}
