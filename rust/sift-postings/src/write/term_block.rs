use sift_common::{Result, error::Error, verify_arg};
use sift_io::{DataOutput, IndexOutput};

/// Stream offsets of a finished term, waiting to be flushed in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingTermEntry {
    /// Start of the term's postings in the frequency stream.
    pub freq_offset: u64,
    /// Start of the term's positions in the position stream; `None` for fields
    /// without positions.
    pub prox_offset: Option<u64>,
    /// Offset of the skip block relative to `freq_offset`; `None` when the term
    /// is below the skip minimum and carries no skip data.
    pub skip_offset: Option<u64>,
}

/// Holds the metadata of finished terms until the term dictionary flushes them.
///
/// Entries are appended in term order. A flush writes a contiguous window of the
/// pending entries as one self-delimited block:
///
/// ```text
/// block     := vu64(len) body          (len > 0)
///            | 0x00                    (empty block)
/// body      := entry+
/// entry     := vu64(freq delta) [vu64(skip offset)] [vu64(prox delta)]
/// ```
///
/// Deltas are taken against the previous entry of the same block; the first entry
/// of a block is delta-coded against zero, i.e. written as absolute offsets.
#[derive(Debug, Default)]
pub struct TermBlockBuffer {
    pending: Vec<PendingTermEntry>,
    scratch: Vec<u8>,
}

impl TermBlockBuffer {
    pub fn new() -> TermBlockBuffer {
        Default::default()
    }

    pub fn append(&mut self, entry: PendingTermEntry) {
        self.pending.push(entry);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending entries in append order.
    pub fn pending(&self) -> &[PendingTermEntry] {
        &self.pending
    }

    /// Writes `count` pending entries, starting `start` entries from the tail of
    /// the pending list, as one block into `out` and removes them.
    ///
    /// Requires `count <= start <= len()`. A `count` of zero writes the one-byte
    /// empty-block marker.
    pub fn flush_block<W: IndexOutput + ?Sized>(
        &mut self,
        out: &mut W,
        start: usize,
        count: usize,
    ) -> Result<()> {
        let io_err = |e| Error::io("write terms block", e);
        if count == 0 {
            out.write_byte(0).map_err(io_err)?;
            return Ok(());
        }
        verify_arg!(start, start <= self.pending.len());
        verify_arg!(count, count <= start);

        let begin = self.pending.len() - start;
        let end = begin + count;

        self.scratch.clear();
        let mut last_freq_offset = 0u64;
        let mut last_prox_offset = 0u64;
        for entry in &self.pending[begin..end] {
            let freq_delta = entry
                .freq_offset
                .checked_sub(last_freq_offset)
                .ok_or_else(|| out_of_order("frequency", entry.freq_offset, last_freq_offset))?;
            self.scratch.write_vu64(freq_delta)?;
            last_freq_offset = entry.freq_offset;

            if let Some(skip_offset) = entry.skip_offset {
                self.scratch.write_vu64(skip_offset)?;
            }

            if let Some(prox_offset) = entry.prox_offset {
                let prox_delta = prox_offset
                    .checked_sub(last_prox_offset)
                    .ok_or_else(|| out_of_order("position", prox_offset, last_prox_offset))?;
                self.scratch.write_vu64(prox_delta)?;
                last_prox_offset = prox_offset;
            }
        }

        out.write_vu64(self.scratch.len() as u64).map_err(io_err)?;
        out.write_all(&self.scratch).map_err(io_err)?;

        self.pending.drain(begin..end);
        log::debug!(
            "flushed terms block: {count} entries, {} bytes, {} still pending",
            self.scratch.len(),
            self.pending.len()
        );
        Ok(())
    }
}

#[cold]
fn out_of_order(stream: &str, offset: u64, previous: u64) -> Error {
    Error::corruption(format!(
        "{stream} offset {offset} precedes the previous entry's offset {previous}"
    ))
}
