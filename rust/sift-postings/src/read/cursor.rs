use sift_common::{Result, error::Error};
use sift_io::ByteReader;

use crate::{
    DocId,
    field::{FieldInfo, IndexOptions},
    format::FreqStreamHeader,
    skip::SkipListReader,
    write::PendingTermEntry,
};

/// Iterates the postings of a single term: documents in increasing order, and for
/// positional fields the positions and payloads of the current document.
///
/// Positions of a document do not have to be consumed before moving on; unread
/// positions are skipped the next time positions are requested.
pub struct PostingsCursor<'a> {
    freq_data: &'a [u8],
    freq: ByteReader<'a>,
    prox: Option<ByteReader<'a>>,

    index_options: IndexOptions,
    store_payloads: bool,
    skip_interval: u32,
    max_skip_levels: u32,
    skip_minimum: u32,

    freq_start: u64,
    prox_start: u64,
    skip_offset: Option<u64>,
    skip_reader: Option<SkipListReader<'a>>,

    doc_freq: u32,
    count: u32,
    accum: DocId,
    doc: Option<DocId>,
    term_freq: u32,

    pending_positions: u64,
    position: u32,
    payload_length: u32,
    payload_pending: bool,
}

impl<'a> PostingsCursor<'a> {
    pub(crate) fn new(
        header: &FreqStreamHeader,
        field: &FieldInfo,
        freq_data: &'a [u8],
        prox: Option<(&'a [u8], u64)>,
        entry: &PendingTermEntry,
        doc_freq: u32,
    ) -> Result<PostingsCursor<'a>> {
        let mut freq = ByteReader::new(freq_data);
        freq.seek(entry.freq_offset)?;
        let (prox, prox_start) = match prox {
            Some((data, offset)) => {
                let mut reader = ByteReader::new(data);
                reader.seek(offset)?;
                (Some(reader), offset)
            }
            None => (None, 0),
        };
        if entry.skip_offset.is_some() != (doc_freq >= header.skip_minimum) {
            return Err(Error::invalid_arg(
                "entry",
                format!(
                    "skip offset presence does not match doc freq {doc_freq} (skip minimum {})",
                    header.skip_minimum
                ),
            ));
        }

        Ok(PostingsCursor {
            freq_data,
            freq,
            prox,
            index_options: field.index_options,
            store_payloads: field.store_payloads,
            skip_interval: header.skip_interval,
            max_skip_levels: header.max_skip_levels,
            skip_minimum: header.skip_minimum,
            freq_start: entry.freq_offset,
            prox_start,
            skip_offset: entry.skip_offset,
            skip_reader: None,
            doc_freq,
            count: 0,
            accum: 0,
            doc: None,
            term_freq: 0,
            pending_positions: 0,
            position: 0,
            payload_length: 0,
            payload_pending: false,
        })
    }

    pub fn doc_freq(&self) -> u32 {
        self.doc_freq
    }

    /// The current document, `None` before the first call to [`Self::next_doc`] and
    /// once the postings are exhausted.
    pub fn doc(&self) -> Option<DocId> {
        self.doc
    }

    /// Term frequency in the current document; 1 for fields without frequencies.
    pub fn freq(&self) -> u32 {
        self.term_freq
    }

    pub fn next_doc(&mut self) -> Result<Option<DocId>> {
        if self.count >= self.doc_freq {
            self.doc = None;
            return Ok(None);
        }

        let (delta, term_freq) = if self.index_options.has_freqs() {
            let code = self.freq.read_vu64()?;
            let delta = DocId::try_from(code >> 1)
                .map_err(|_| Error::invalid_format("document delta"))?;
            let term_freq = if code & 1 != 0 {
                1
            } else {
                self.freq.read_vu32()?
            };
            (delta, term_freq)
        } else {
            (self.freq.read_vu32()?, 1)
        };

        self.accum = self
            .accum
            .checked_add(delta)
            .ok_or_else(|| Error::invalid_format("document delta"))?;
        self.count += 1;
        self.term_freq = term_freq;
        self.doc = Some(self.accum);
        if self.prox.is_some() {
            self.pending_positions += term_freq as u64;
            self.position = 0;
        }
        Ok(self.doc)
    }

    /// Moves to the first document `>= target`, using skip data for long jumps.
    ///
    /// Returns the current document unchanged if it already satisfies `target`.
    pub fn advance(&mut self, target: DocId) -> Result<Option<DocId>> {
        if let Some(doc) = self.doc.filter(|&doc| doc >= target) {
            return Ok(Some(doc));
        }

        let far_enough = target as u64 >= self.accum as u64 + self.skip_interval as u64;
        match self.skip_offset {
            Some(skip_offset) if far_enough && self.doc_freq >= self.skip_minimum => {
                self.skip_ahead(skip_offset, target)?;
            }
            _ => (),
        }

        while let Some(doc) = self.next_doc()? {
            if doc >= target {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    fn skip_ahead(&mut self, skip_offset: u64, target: DocId) -> Result<()> {
        let (freq_data, freq_start, prox_start, doc_freq) =
            (self.freq_data, self.freq_start, self.prox_start, self.doc_freq);
        let (skip_interval, max_skip_levels) = (self.skip_interval, self.max_skip_levels);
        let store_payloads = self.store_payloads;
        let has_positions = self.index_options.has_positions();
        let reader = self.skip_reader.get_or_insert_with(|| {
            let mut reader = SkipListReader::new(
                freq_data,
                skip_interval,
                max_skip_levels,
                store_payloads,
                has_positions,
            );
            reader.init(freq_start + skip_offset, freq_start, prox_start, doc_freq);
            reader
        });

        let new_count = reader.skip_to(target)?;
        if new_count > self.count {
            self.freq.seek(reader.freq_pointer())?;
            if let Some(prox) = self.prox.as_mut() {
                prox.seek(reader.prox_pointer())?;
            }
            self.count = new_count;
            self.accum = reader.doc();
            self.payload_length = reader.payload_length();
            self.pending_positions = 0;
            self.payload_pending = false;
        }
        Ok(())
    }

    /// The next position within the current document, `None` once all `freq()`
    /// positions have been returned or when the field has no positions.
    pub fn next_position(&mut self) -> Result<Option<u32>> {
        if self.prox.is_none() || self.doc.is_none() {
            return Ok(None);
        }
        self.skip_pending_payload()?;

        let term_freq = self.term_freq as u64;
        while self.pending_positions > term_freq {
            self.read_position_delta()?;
            self.skip_pending_payload()?;
            self.pending_positions -= 1;
        }
        if self.pending_positions == 0 {
            return Ok(None);
        }

        let delta = self.read_position_delta()?;
        self.position = self
            .position
            .checked_add(delta)
            .ok_or_else(|| Error::invalid_format("position delta"))?;
        self.pending_positions -= 1;
        Ok(Some(self.position))
    }

    /// The payload of the position last returned by [`Self::next_position`].
    ///
    /// Each payload can be retrieved once; `None` when the position has no payload.
    pub fn payload(&mut self) -> Result<Option<&'a [u8]>> {
        if !self.payload_pending {
            return Ok(None);
        }
        self.payload_pending = false;
        let Some(prox) = self.prox.as_mut() else {
            return Ok(None);
        };
        Ok(Some(prox.read_slice(self.payload_length as usize)?))
    }

    fn read_position_delta(&mut self) -> Result<u32> {
        let Some(prox) = self.prox.as_mut() else {
            return Err(Error::invalid_operation("position stream is not available"));
        };
        if !self.store_payloads {
            return prox.read_vu32();
        }
        let code = prox.read_vu64()?;
        if code & 1 != 0 {
            self.payload_length = prox.read_vu32()?;
        }
        self.payload_pending = self.payload_length > 0;
        u32::try_from(code >> 1).map_err(|_| Error::invalid_format("position delta"))
    }

    fn skip_pending_payload(&mut self) -> Result<()> {
        if self.payload_pending {
            self.payload_pending = false;
            if let Some(prox) = self.prox.as_mut() {
                prox.skip_bytes(self.payload_length as usize)?;
            }
        }
        Ok(())
    }
}
