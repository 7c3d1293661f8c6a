//! Bounded big-endian byte cursor

use super::{Result, SmfError};

/// Cursor over `data[pos..end]`
///
/// Track decoding uses a cursor bounded by the chunk's declared length,
/// so a malformed track can never read into the next chunk.
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, end: data.len() }
    }

    /// A sub-cursor covering the next `len` bytes; this cursor skips past them
    pub fn take(&mut self, len: usize, context: &str) -> Result<Cursor<'a>> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.end).ok_or_else(|| {
            SmfError::Truncated { offset: self.pos, context: context.to_string() }
        })?;
        let sub = Cursor { data: self.data, pos: self.pos, end };
        self.pos = end;
        Ok(sub)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    pub fn u8(&mut self, context: &str) -> Result<u8> {
        if self.pos >= self.end {
            return Err(SmfError::Truncated { offset: self.pos, context: context.to_string() });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Un-read the last byte (running status re-reads it as data)
    pub fn step_back(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    pub fn skip(&mut self, len: usize, context: &str) -> Result<()> {
        self.take(len, context).map(|_| ())
    }

    fn be(&mut self, bytes: usize, context: &str) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..bytes {
            value = (value << 8) | self.u8(context)? as u32;
        }
        Ok(value)
    }

    pub fn u16(&mut self, context: &str) -> Result<u16> {
        self.be(2, context).map(|v| v as u16)
    }

    pub fn u24(&mut self, context: &str) -> Result<u32> {
        self.be(3, context)
    }

    pub fn u32(&mut self, context: &str) -> Result<u32> {
        self.be(4, context)
    }

    pub fn tag(&mut self, context: &str) -> Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        for byte in &mut tag {
            *byte = self.u8(context)?;
        }
        Ok(tag)
    }

    /// Variable-length quantity: 7 bits per byte, high bit = continuation.
    ///
    /// Reads at most four bytes (the SMF limit of 0x0FFF_FFFF).
    pub fn vlq(&mut self, context: &str) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let byte = self.u8(context)?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(value)
    }
}
