//! Primitive encoders layered on top of [`IndexOutput`].

use byteorder::{BigEndian, WriteBytesExt};

use crate::{
    IndexOutput, verify,
    utils::{MAX_VU64_LEN, encode_vu64},
};

/// Extension trait providing the primitive encodings used by the index files.
///
/// Variable-length integers use seven data bits per byte, least significant group
/// first, with the high bit flagging that another byte follows. Fixed-width integers
/// are written big-endian.
pub trait DataOutput: IndexOutput {
    fn write_byte(&mut self, value: u8) -> std::io::Result<()> {
        self.write_all(&[value])
    }

    /// Writes a variable-length encoded `u32` (1 to 5 bytes).
    fn write_vu32(&mut self, value: u32) -> std::io::Result<()> {
        self.write_vu64(value as u64)
    }

    /// Writes a variable-length encoded `u64` (1 to 10 bytes).
    fn write_vu64(&mut self, value: u64) -> std::io::Result<()> {
        let mut buf = [0u8; MAX_VU64_LEN];
        let len = encode_vu64(value, &mut buf);
        self.write_all(&buf[..len])
    }

    fn write_fixed_u32(&mut self, value: u32) -> std::io::Result<()> {
        self.write_u32::<BigEndian>(value)
    }

    /// Writes `len` raw bytes of `buf` starting at `offset`.
    fn write_bytes(&mut self, buf: &[u8], offset: usize, len: usize) -> std::io::Result<()> {
        verify!(offset.checked_add(len).is_some_and(|end| end <= buf.len()));
        self.write_all(&buf[offset..offset + len])
    }
}

impl<W> DataOutput for W where W: IndexOutput + ?Sized {}
