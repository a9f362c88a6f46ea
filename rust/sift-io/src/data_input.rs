//! Positional decoding over an in-memory byte slice.

use byteorder::{BigEndian, ByteOrder};
use sift_common::{Result, error::ErrorKind};

use crate::utils::{MAX_VU32_LEN, MAX_VU64_LEN};

/// A forward cursor over a byte slice that decodes the primitives written by
/// [`DataOutput`](crate::DataOutput).
///
/// The cursor can be repositioned with [`seek`](ByteReader::seek), which is how the
/// skip list readers jump into the middle of a frequency stream.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> ByteReader<'a> {
        ByteReader { data, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.data.len() as u64 {
            return Err(ErrorKind::InvalidFormat {
                element: "seek".to_string(),
                message: format!("position {pos} beyond end ({})", self.data.len()),
            }
            .into());
        }
        self.pos = pos as usize;
        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| eof("byte", self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_vu32(&mut self) -> Result<u32> {
        let value = self.read_varint(MAX_VU32_LEN, "vu32")?;
        u32::try_from(value).map_err(|_| {
            ErrorKind::InvalidFormat {
                element: "vu32".to_string(),
                message: format!("value {value} overflows u32"),
            }
            .into()
        })
    }

    pub fn read_vu64(&mut self) -> Result<u64> {
        self.read_varint(MAX_VU64_LEN, "vu64")
    }

    pub fn read_fixed_u32(&mut self) -> Result<u32> {
        let bytes = self.read_slice(4)?;
        Ok(BigEndian::read_u32(bytes))
    }

    /// Returns the next `len` bytes as a sub-slice and advances past them.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(eof("slice", self.pos));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip_bytes(&mut self, len: usize) -> Result<()> {
        self.read_slice(len).map(|_| ())
    }

    fn read_varint(&mut self, max_len: usize, element: &str) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..max_len {
            let b = self.read_byte()?;
            value |= ((b & 0x7f) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ErrorKind::InvalidFormat {
            element: element.to_string(),
            message: format!("varint longer than {max_len} bytes at {}", self.pos),
        }
        .into())
    }
}

#[cold]
fn eof(element: &str, pos: usize) -> sift_common::error::Error {
    ErrorKind::InvalidFormat {
        element: element.to_string(),
        message: format!("unexpected end of data at {pos}"),
    }
    .into()
}
