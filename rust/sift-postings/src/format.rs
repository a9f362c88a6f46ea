//! Frequency stream header.

use sift_common::{Result, error::ErrorKind, verify_data};
use sift_io::{ByteReader, DataOutput, IndexOutput};

use crate::params::PostingsParams;

/// Format tag at the start of every frequency stream ("SFRQ").
pub const FREQ_STREAM_TAG: u32 = 0x5346_5251;

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Serialized size of [`FreqStreamHeader`].
pub const FREQ_HEADER_LEN: u64 = 20;

/// The fixed-width header written at the start of the frequency stream:
/// format tag, version, skip interval, max skip levels and skip minimum, each a
/// big-endian `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreqStreamHeader {
    pub version: u32,
    pub skip_interval: u32,
    pub max_skip_levels: u32,
    pub skip_minimum: u32,
}

impl FreqStreamHeader {
    pub fn from_params(params: &PostingsParams) -> FreqStreamHeader {
        FreqStreamHeader {
            version: FORMAT_VERSION,
            skip_interval: params.skip_interval,
            max_skip_levels: params.max_skip_levels,
            skip_minimum: params.skip_minimum(),
        }
    }

    pub fn write<W: IndexOutput + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_fixed_u32(FREQ_STREAM_TAG)?;
        out.write_fixed_u32(self.version)?;
        out.write_fixed_u32(self.skip_interval)?;
        out.write_fixed_u32(self.max_skip_levels)?;
        out.write_fixed_u32(self.skip_minimum)
    }

    pub fn read(input: &mut ByteReader) -> Result<FreqStreamHeader> {
        let tag = input.read_fixed_u32()?;
        if tag != FREQ_STREAM_TAG {
            return Err(ErrorKind::InvalidFormat {
                element: "frequency stream header".to_string(),
                message: format!("unexpected format tag {tag:#010x}"),
            }
            .into());
        }
        let version = input.read_fixed_u32()?;
        if version != FORMAT_VERSION {
            return Err(ErrorKind::InvalidFormat {
                element: "frequency stream header".to_string(),
                message: format!("unsupported version {version}"),
            }
            .into());
        }
        let header = FreqStreamHeader {
            version,
            skip_interval: input.read_fixed_u32()?,
            max_skip_levels: input.read_fixed_u32()?,
            skip_minimum: input.read_fixed_u32()?,
        };
        verify_data!(skip_interval, header.skip_interval >= 2);
        verify_data!(max_skip_levels, header.max_skip_levels >= 1);
        Ok(header)
    }
}
