use sift_common::{Result, error::Error};
use sift_io::ByteReader;

use crate::DocId;

/// Decoding state of a single skip level.
#[derive(Debug, Clone)]
struct SkipLevelCursor<'a> {
    stream: ByteReader<'a>,
    /// Absolute position of the level's first entry.
    start: u64,
    /// Number of documents covered by one entry of this level.
    interval: u64,
    num_skipped: u64,
    skip_doc: DocId,
    child_pointer: u64,
    freq_pointer: u64,
    prox_pointer: u64,
    payload_length: u32,
}

/// Reads the multi-level skip data of one term and finds the furthest skip point
/// preceding a target document.
///
/// A reader is initialized per term with [`init`](SkipListReader::init) and then
/// queried with non-decreasing targets through [`skip_to`](SkipListReader::skip_to).
/// The levels are only located on the first query.
pub struct SkipListReader<'a> {
    data: &'a [u8],
    skip_interval: u32,
    max_skip_levels: u32,
    store_payloads: bool,
    has_positions: bool,

    skip_pointer: u64,
    doc_count: u32,
    num_levels: usize,
    loaded: bool,
    levels: Vec<SkipLevelCursor<'a>>,

    last_doc: DocId,
    last_child_pointer: u64,
    last_freq_pointer: u64,
    last_prox_pointer: u64,
    last_payload_length: u32,
}

impl<'a> SkipListReader<'a> {
    /// Creates a reader over the frequency stream `data`.
    pub fn new(
        data: &'a [u8],
        skip_interval: u32,
        max_skip_levels: u32,
        store_payloads: bool,
        has_positions: bool,
    ) -> SkipListReader<'a> {
        let mut interval = skip_interval as u64;
        let levels = (0..max_skip_levels.max(1))
            .map(|_| {
                let level = SkipLevelCursor {
                    stream: ByteReader::new(data),
                    start: 0,
                    interval,
                    num_skipped: 0,
                    skip_doc: 0,
                    child_pointer: 0,
                    freq_pointer: 0,
                    prox_pointer: 0,
                    payload_length: 0,
                };
                interval = interval.saturating_mul(skip_interval as u64);
                level
            })
            .collect();
        SkipListReader {
            data,
            skip_interval,
            max_skip_levels,
            store_payloads,
            has_positions,
            skip_pointer: 0,
            doc_count: 0,
            num_levels: 0,
            loaded: false,
            levels,
            last_doc: 0,
            last_child_pointer: 0,
            last_freq_pointer: 0,
            last_prox_pointer: 0,
            last_payload_length: 0,
        }
    }

    /// Prepares the reader for a term.
    ///
    /// * `skip_pointer` - absolute position of the term's skip block.
    /// * `freq_base`, `prox_base` - the term's stream start positions.
    /// * `doc_count` - the term's document frequency.
    pub fn init(&mut self, skip_pointer: u64, freq_base: u64, prox_base: u64, doc_count: u32) {
        self.skip_pointer = skip_pointer;
        self.doc_count = doc_count;
        self.loaded = false;
        self.num_levels = 0;
        for level in &mut self.levels {
            level.num_skipped = 0;
            level.skip_doc = 0;
            level.child_pointer = 0;
            level.freq_pointer = freq_base;
            level.prox_pointer = prox_base;
            level.payload_length = 0;
        }
        self.last_doc = 0;
        self.last_child_pointer = 0;
        self.last_freq_pointer = freq_base;
        self.last_prox_pointer = prox_base;
        self.last_payload_length = 0;
    }

    /// The document preceding the skip point found by the last `skip_to`.
    pub fn doc(&self) -> DocId {
        self.last_doc
    }

    /// Frequency stream position to resume decoding from.
    pub fn freq_pointer(&self) -> u64 {
        self.last_freq_pointer
    }

    /// Position stream position to resume decoding from.
    pub fn prox_pointer(&self) -> u64 {
        self.last_prox_pointer
    }

    /// Payload length in effect at the skip point.
    pub fn payload_length(&self) -> u32 {
        self.last_payload_length
    }

    /// Advances through the skip levels to the last skip point whose document is
    /// smaller than `target`.
    ///
    /// Returns the number of documents that precede the resume position, i.e. the
    /// number of postings a sequential reader would have consumed after positioning
    /// itself at [`freq_pointer`](Self::freq_pointer) with [`doc`](Self::doc) as its
    /// current document. Returns 0 when no skip point precedes `target`.
    pub fn skip_to(&mut self, target: DocId) -> Result<u32> {
        if !self.loaded {
            self.load_skip_levels()?;
            self.loaded = true;
        }

        // Walk up the levels until the highest level that has a skip for this target.
        let mut level = 0;
        while level + 1 < self.num_levels && target > self.levels[level + 1].skip_doc {
            level += 1;
        }

        loop {
            if target > self.levels[level].skip_doc {
                if !self.load_next_skip(level)? {
                    continue;
                }
            } else {
                // No more skips on this level, go down one level.
                if level > 0
                    && self.last_child_pointer > self.levels[level - 1].stream.position()
                {
                    self.seek_child(level - 1)?;
                }
                if level == 0 {
                    break;
                }
                level -= 1;
            }
        }

        let skipped = self.levels[0]
            .num_skipped
            .saturating_sub(self.levels[0].interval + 1);
        Ok(skipped as u32)
    }

    fn load_skip_levels(&mut self) -> Result<()> {
        self.num_levels =
            super::num_skip_levels(self.doc_count, self.skip_interval, self.max_skip_levels);

        let mut cursor = ByteReader::new(self.data);
        cursor.seek(self.skip_pointer)?;
        for i in (1..self.num_levels).rev() {
            let length = cursor.read_vu64()?;
            let start = cursor.position();
            let level = &mut self.levels[i];
            level.start = start;
            level.stream.seek(start)?;
            let length = usize::try_from(length)
                .map_err(|_| Error::invalid_format("skip level length"))?;
            cursor.skip_bytes(length)?;
        }
        let start = cursor.position();
        self.levels[0].start = start;
        self.levels[0].stream.seek(start)?;
        Ok(())
    }

    fn load_next_skip(&mut self, level: usize) -> Result<bool> {
        // The target document is greater than the current skip entry.
        self.set_last_skip_data(level);

        let doc_count = self.doc_count as u64;
        let cursor = &mut self.levels[level];
        cursor.num_skipped += cursor.interval;
        if cursor.num_skipped > doc_count {
            // This level is exhausted.
            cursor.skip_doc = DocId::MAX;
            if self.num_levels > level {
                self.num_levels = level;
            }
            return Ok(false);
        }

        let delta = self.read_skip_data(level)?;
        let parent_start = if level > 0 {
            self.levels[level - 1].start
        } else {
            0
        };
        let cursor = &mut self.levels[level];
        cursor.skip_doc = cursor
            .skip_doc
            .checked_add(delta)
            .ok_or_else(|| Error::invalid_format("skip doc delta"))?;
        if level != 0 {
            cursor.child_pointer = cursor.stream.read_vu64()? + parent_start;
        }
        Ok(true)
    }

    fn seek_child(&mut self, level: usize) -> Result<()> {
        let parent_skipped = self.levels[level + 1].num_skipped - self.levels[level + 1].interval;
        let grandparent_start = if level > 0 {
            self.levels[level - 1].start
        } else {
            0
        };

        let cursor = &mut self.levels[level];
        cursor.stream.seek(self.last_child_pointer)?;
        cursor.num_skipped = parent_skipped;
        cursor.skip_doc = self.last_doc;
        cursor.freq_pointer = self.last_freq_pointer;
        cursor.prox_pointer = self.last_prox_pointer;
        cursor.payload_length = self.last_payload_length;
        if level > 0 {
            cursor.child_pointer = cursor.stream.read_vu64()? + grandparent_start;
        }
        Ok(())
    }

    fn set_last_skip_data(&mut self, level: usize) {
        let cursor = &self.levels[level];
        self.last_doc = cursor.skip_doc;
        self.last_child_pointer = cursor.child_pointer;
        self.last_freq_pointer = cursor.freq_pointer;
        self.last_prox_pointer = cursor.prox_pointer;
        self.last_payload_length = cursor.payload_length;
    }

    fn read_skip_data(&mut self, level: usize) -> Result<DocId> {
        let store_payloads = self.store_payloads;
        let has_positions = self.has_positions;
        let cursor = &mut self.levels[level];

        let delta = if store_payloads {
            let code = cursor.stream.read_vu64()?;
            if code & 1 != 0 {
                cursor.payload_length = cursor.stream.read_vu32()?;
            }
            DocId::try_from(code >> 1).map_err(|_| Error::invalid_format("skip doc delta"))?
        } else {
            cursor.stream.read_vu32()?
        };
        cursor.freq_pointer += cursor.stream.read_vu64()?;
        if has_positions {
            cursor.prox_pointer += cursor.stream.read_vu64()?;
        }
        Ok(delta)
    }
}
