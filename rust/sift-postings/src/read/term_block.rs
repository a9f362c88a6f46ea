use sift_common::{Result, error::ErrorKind};
use sift_io::ByteReader;

use crate::write::PendingTermEntry;

/// Decodes the term metadata blocks written by
/// [`TermBlockBuffer::flush_block`](crate::write::TermBlockBuffer::flush_block).
///
/// Whether an entry carries a skip offset is not recorded in the block; it follows
/// from the term's doc frequency, so the caller supplies the doc frequencies of the
/// block's terms in order.
#[derive(Debug, Clone, Copy)]
pub struct TermBlockReader {
    has_positions: bool,
    skip_minimum: u32,
}

impl TermBlockReader {
    pub fn new(has_positions: bool, skip_minimum: u32) -> TermBlockReader {
        TermBlockReader {
            has_positions,
            skip_minimum,
        }
    }

    /// Reads one block from `input`. The empty-block marker yields no entries.
    pub fn read_block(
        &self,
        input: &mut ByteReader,
        doc_freqs: &[u32],
    ) -> Result<Vec<PendingTermEntry>> {
        let len = input.read_vu64()?;
        if len == 0 {
            if !doc_freqs.is_empty() {
                return Err(block_error(format!(
                    "empty block for {} terms",
                    doc_freqs.len()
                )));
            }
            return Ok(Vec::new());
        }
        let len = usize::try_from(len).map_err(|_| block_error(format!("block length {len}")))?;
        let mut body = ByteReader::new(input.read_slice(len)?);

        let mut entries = Vec::with_capacity(doc_freqs.len());
        let mut freq_offset = 0u64;
        let mut prox_offset = 0u64;
        for &doc_freq in doc_freqs {
            freq_offset = add_delta(freq_offset, body.read_vu64()?)?;
            let skip_offset = if doc_freq >= self.skip_minimum {
                Some(body.read_vu64()?)
            } else {
                None
            };
            let prox = if self.has_positions {
                prox_offset = add_delta(prox_offset, body.read_vu64()?)?;
                Some(prox_offset)
            } else {
                None
            };
            entries.push(PendingTermEntry {
                freq_offset,
                prox_offset: prox,
                skip_offset,
            });
        }
        if !body.is_eof() {
            return Err(block_error(format!(
                "{} trailing bytes after {} entries",
                body.remaining(),
                doc_freqs.len()
            )));
        }
        Ok(entries)
    }
}

fn add_delta(base: u64, delta: u64) -> Result<u64> {
    base.checked_add(delta)
        .ok_or_else(|| block_error("offset overflow".to_string()))
}

fn block_error(message: String) -> sift_common::error::Error {
    ErrorKind::InvalidFormat {
        element: "term block".to_string(),
        message,
    }
    .into()
}
