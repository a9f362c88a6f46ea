use sift_common::{Result, error::Error};
use sift_io::{DataOutput, IndexOutput};

use crate::DocId;

/// State captured at a skip boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipPoint {
    /// The last document written before the boundary.
    pub doc: DocId,
    /// Frequency stream position at the boundary.
    pub freq_pointer: u64,
    /// Position stream position at the boundary (0 for non-positional fields).
    pub prox_pointer: u64,
    /// Payload length in effect at the boundary (0 if no payload was seen yet).
    pub payload_length: u32,
}

/// Per-level buffer with the last values written to it, against which the next
/// entry of the same level is delta-coded.
#[derive(Debug, Default)]
struct SkipLevelBuffer {
    buf: Vec<u8>,
    last_doc: DocId,
    last_freq_pointer: u64,
    last_prox_pointer: u64,
    last_payload_length: Option<u32>,
}

impl SkipLevelBuffer {
    fn reset(&mut self, freq_start: u64, prox_start: u64) {
        self.buf.clear();
        self.last_doc = 0;
        self.last_freq_pointer = freq_start;
        self.last_prox_pointer = prox_start;
        self.last_payload_length = None;
    }
}

/// Buffers the skip points of the current term and serializes them into the
/// frequency stream once the term is finished.
///
/// The number of levels is fixed per segment, derived from the segment's total
/// document count so that no term can outgrow it.
pub struct SkipListWriter {
    skip_interval: u32,
    levels: Vec<SkipLevelBuffer>,
    store_payloads: bool,
    has_positions: bool,
    freq_start: u64,
}

impl SkipListWriter {
    pub fn new(skip_interval: u32, max_skip_levels: u32, total_docs: u32) -> SkipListWriter {
        let num_levels = super::num_skip_levels(total_docs, skip_interval, max_skip_levels);
        SkipListWriter {
            skip_interval,
            levels: (0..num_levels).map(|_| SkipLevelBuffer::default()).collect(),
            store_payloads: false,
            has_positions: false,
            freq_start: 0,
        }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Configures the entry layout for the terms of the next field.
    pub fn set_field(&mut self, store_payloads: bool, has_positions: bool) {
        self.store_payloads = store_payloads;
        self.has_positions = has_positions;
    }

    /// Clears all buffered levels. Called once per term before any postings.
    pub fn reset_skip(&mut self, freq_start: u64, prox_start: u64) {
        self.freq_start = freq_start;
        for level in &mut self.levels {
            level.reset(freq_start, prox_start);
        }
    }

    /// Returns the number of levels holding at least one skip point.
    pub fn buffered_levels(&self) -> usize {
        self.levels.iter().take_while(|l| !l.buf.is_empty()).count()
    }

    /// Records a skip point for the boundary reached after `doc_count` documents.
    ///
    /// `doc_count` must be a multiple of the skip interval. The point goes to
    /// level 0 and to every higher level `k` for which `doc_count` is a multiple
    /// of `skip_interval^(k+1)`.
    pub fn buffer_skip(&mut self, doc_count: u32, point: &SkipPoint) -> Result<()> {
        if doc_count == 0 || doc_count % self.skip_interval != 0 {
            return Err(Error::invalid_arg(
                "doc_count",
                format!(
                    "{doc_count} is not a positive multiple of the skip interval {}",
                    self.skip_interval
                ),
            ));
        }

        let mut num_levels = 1;
        let mut count = doc_count / self.skip_interval;
        while count % self.skip_interval == 0 && num_levels < self.levels.len() {
            num_levels += 1;
            count /= self.skip_interval;
        }
        log::trace!(
            "skip point after {doc_count} docs: doc {} on {num_levels} level(s)",
            point.doc
        );

        let mut child_pointer = 0u64;
        for level in 0..num_levels {
            self.write_skip_entry(level, point)?;
            let new_child_pointer = self.levels[level].buf.len() as u64;
            if level != 0 {
                self.levels[level].buf.write_vu64(child_pointer)?;
            }
            child_pointer = new_child_pointer;
        }
        Ok(())
    }

    /// Serializes all buffered levels into `out`, highest level first, and returns
    /// the position of the skip block relative to the term's frequency stream start.
    pub fn write_skip<W: IndexOutput + ?Sized>(&mut self, out: &mut W) -> Result<u64> {
        let skip_pointer = out.file_pointer();
        let io_err = |e| Error::io("write skip data", e);
        for level in self.levels.iter().skip(1).rev() {
            if !level.buf.is_empty() {
                out.write_vu64(level.buf.len() as u64).map_err(io_err)?;
                out.write_all(&level.buf).map_err(io_err)?;
            }
        }
        if let Some(level0) = self.levels.first() {
            out.write_all(&level0.buf).map_err(io_err)?;
        }
        Ok(skip_pointer - self.freq_start)
    }

    fn write_skip_entry(&mut self, level: usize, point: &SkipPoint) -> Result<()> {
        let store_payloads = self.store_payloads;
        let has_positions = self.has_positions;
        let level = &mut self.levels[level];

        let doc_delta = point.doc.checked_sub(level.last_doc).ok_or_else(|| {
            Error::corruption(format!(
                "skip point doc {} precedes previous skip doc {}",
                point.doc, level.last_doc
            ))
        })?;
        if store_payloads {
            let shifted = (doc_delta as u64) << 1;
            if level.last_payload_length == Some(point.payload_length) {
                level.buf.write_vu64(shifted)?;
            } else {
                level.buf.write_vu64(shifted | 1)?;
                level.buf.write_vu32(point.payload_length)?;
                level.last_payload_length = Some(point.payload_length);
            }
        } else {
            level.buf.write_vu32(doc_delta)?;
        }

        level
            .buf
            .write_vu64(point.freq_pointer - level.last_freq_pointer)?;
        if has_positions {
            level
                .buf
                .write_vu64(point.prox_pointer - level.last_prox_pointer)?;
        }

        level.last_doc = point.doc;
        level.last_freq_pointer = point.freq_pointer;
        level.last_prox_pointer = point.prox_pointer;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(doc: DocId, freq_pointer: u64) -> SkipPoint {
        SkipPoint {
            doc,
            freq_pointer,
            ..Default::default()
        }
    }

    #[test]
    fn test_level_promotion() {
        let mut writer = SkipListWriter::new(4, 10, 1000);
        assert_eq!(writer.num_levels(), 4);
        writer.reset_skip(0, 0);

        for n in 1..=16u32 {
            writer.buffer_skip(n * 4, &point(n * 5, n as u64 * 3)).unwrap();
        }
        // 16 level-0 points, 4 level-1 points (every 16 docs), 1 level-2 point (64 docs).
        assert_eq!(writer.buffered_levels(), 3);
        assert_eq!(writer.levels[0].buf.len(), 16 * 2);
        // Level 1 entries: doc delta, freq delta, child pointer.
        assert_eq!(writer.levels[1].buf.len(), 4 * 3);
        assert_eq!(writer.levels[2].buf.len(), 3);
        assert!(writer.levels[3].buf.is_empty());
    }

    #[test]
    fn test_write_skip_layout() {
        let mut writer = SkipListWriter::new(2, 10, 100);
        writer.reset_skip(100, 0);
        writer.buffer_skip(2, &point(5, 110)).unwrap();
        writer.buffer_skip(4, &point(9, 120)).unwrap();

        let mut out = vec![0u8; 130];
        let offset = writer.write_skip(&mut out).unwrap();
        assert_eq!(offset, 30);
        assert_eq!(
            &out[130..],
            &[
                // level 1: length, then (doc delta, freq delta, child pointer)
                3, 9, 20, 4,
                // level 0: (doc delta, freq delta) x 2
                5, 10, 4, 10,
            ]
        );
    }

    #[test]
    fn test_payload_length_flag() {
        let mut writer = SkipListWriter::new(2, 1, 100);
        writer.set_field(true, true);
        writer.reset_skip(0, 0);
        let mut p = SkipPoint {
            doc: 1,
            freq_pointer: 4,
            prox_pointer: 8,
            payload_length: 3,
        };
        writer.buffer_skip(2, &p).unwrap();
        p.doc = 3;
        p.freq_pointer = 6;
        p.prox_pointer = 20;
        writer.buffer_skip(4, &p).unwrap();
        p.doc = 5;
        p.payload_length = 0;
        writer.buffer_skip(6, &p).unwrap();
        assert_eq!(
            writer.levels[0].buf,
            vec![
                3, 3, 4, 8, // delta 1, changed length 3
                4, 2, 12, // delta 2, same length
                5, 0, 0, 0, // delta 2, changed length 0
            ]
        );
    }

    #[test]
    fn test_rejects_off_interval_count() {
        let mut writer = SkipListWriter::new(16, 10, 1000);
        writer.reset_skip(0, 0);
        assert!(writer.buffer_skip(15, &point(1, 1)).is_err());
        assert!(writer.buffer_skip(0, &point(1, 1)).is_err());
    }

    #[test]
    fn test_reset_clears_levels() {
        let mut writer = SkipListWriter::new(2, 10, 100);
        writer.reset_skip(0, 0);
        writer.buffer_skip(2, &point(5, 10)).unwrap();
        assert_eq!(writer.buffered_levels(), 1);
        writer.reset_skip(50, 0);
        assert_eq!(writer.buffered_levels(), 0);
        let mut out = vec![0u8; 60];
        assert_eq!(writer.write_skip(&mut out).unwrap(), 10);
        assert_eq!(out.len(), 60);
    }
}
