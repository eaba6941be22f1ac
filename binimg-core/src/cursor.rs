use crate::error::ScanError;
use byteorder::{ByteOrder, NativeEndian};

/// A forward-only cursor over a byte region with a hard upper bound.
///
/// Every offset computation in the crate goes through this type: reads and
/// advances that would cross `limit` fail with [`ScanError::Truncated`]
/// instead of touching memory past it.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at `start`. `limit` is clamped to the length of `data`.
    pub fn new(data: &'a [u8], start: usize, limit: usize) -> Self {
        Self {
            data,
            pos: start,
            limit: limit.min(data.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    /// Borrows the next `len` bytes without moving.
    pub fn peek(&self, len: usize) -> Result<&'a [u8], ScanError> {
        match self.pos.checked_add(len) {
            Some(end) if end <= self.limit => Ok(&self.data[self.pos..end]),
            _ => Err(ScanError::Truncated {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            }),
        }
    }

    pub fn advance(&mut self, len: usize) -> Result<(), ScanError> {
        self.peek(len)?;
        self.pos += len;
        Ok(())
    }

    /// Reads a native-endian `u32` and moves past it.
    pub fn read_u32(&mut self) -> Result<u32, ScanError> {
        let value = NativeEndian::read_u32(self.peek(4)?);
        self.pos += 4;
        Ok(value)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ScanError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.peek(N)?);
        self.pos += N;
        Ok(out)
    }
}
