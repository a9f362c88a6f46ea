use sift_common::{Result, error::Error};
use sift_io::{DataOutput, IndexOutput};

use crate::{
    DocId,
    field::{FieldInfo, IndexOptions, TermStats},
    format::FreqStreamHeader,
    params::PostingsParams,
    skip::{SkipListWriter, SkipPoint},
};

use super::term_block::{PendingTermEntry, TermBlockBuffer};

/// The frequency and position streams handed back by [`PostingsWriter::close`].
#[derive(Debug)]
pub struct PostingsOutputs<W> {
    pub freq: W,
    pub prox: Option<W>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Idle,
    TermOpen,
    DocOpen,
}

/// Encoding state of the term currently being written. Reset by `start_term`.
#[derive(Debug, Default)]
struct TermStreamState {
    freq_start: u64,
    prox_start: u64,
    last_doc_id: DocId,
    doc_count: u32,
    last_position: u32,
    last_payload_length: Option<u32>,
    positions_in_doc: u32,
    term_freq: u32,
}

/// Writes the postings of one segment, term by term, into a frequency stream and an
/// optional position stream.
///
/// Calls must follow the lifecycle documented on the [`write`](crate::write) module.
/// Contract violations by the caller (documents out of order, doc frequency mismatch,
/// and the like) are reported as [`Corruption`](sift_common::error::ErrorKind::Corruption)
/// errors; the bytes already written for earlier terms are left untouched.
pub struct PostingsWriter<W: IndexOutput> {
    params: PostingsParams,
    skip_minimum: u32,
    freq_out: W,
    prox_out: Option<W>,
    skip_writer: SkipListWriter,
    pending: TermBlockBuffer,
    state: WriterState,
    index_options: IndexOptions,
    store_payloads: bool,
    field_set: bool,
    term: TermStreamState,
}

impl<W: IndexOutput> PostingsWriter<W> {
    /// Creates a writer over the given streams and writes the frequency stream header.
    ///
    /// `prox_out` is required if any field of the segment indexes positions.
    pub fn new(params: PostingsParams, mut freq_out: W, prox_out: Option<W>) -> Result<Self> {
        params.validate()?;
        FreqStreamHeader::from_params(&params)
            .write(&mut freq_out)
            .map_err(|e| Error::io("frequency stream", e))?;

        let skip_writer = SkipListWriter::new(
            params.skip_interval,
            params.max_skip_levels,
            params.total_docs,
        );
        Ok(PostingsWriter {
            skip_minimum: params.skip_minimum(),
            params,
            freq_out,
            prox_out,
            skip_writer,
            pending: TermBlockBuffer::new(),
            state: WriterState::Idle,
            index_options: IndexOptions::Docs,
            store_payloads: false,
            field_set: false,
            term: TermStreamState::default(),
        })
    }

    /// Switches the writer to the given field. Only allowed between terms.
    pub fn set_field(&mut self, field: &FieldInfo) -> Result<()> {
        if self.state != WriterState::Idle {
            return Err(Error::invalid_operation("set_field inside an open term"));
        }
        field.validate()?;
        if field.has_positions() && self.prox_out.is_none() {
            return Err(Error::invalid_arg(
                "field",
                format!(
                    "field '{}' indexes positions but the writer has no position stream",
                    field.name
                ),
            ));
        }
        self.index_options = field.index_options;
        self.store_payloads = field.store_payloads;
        self.skip_writer
            .set_field(field.store_payloads, field.has_positions());
        self.field_set = true;
        Ok(())
    }

    /// Begins a new term at the current end of both streams.
    ///
    /// A term that was started but received no documents may be restarted.
    /// Fails until a field has been selected with [`set_field`](Self::set_field).
    pub fn start_term(&mut self) -> Result<()> {
        if !self.field_set {
            return Err(Error::invalid_operation("start_term before set_field"));
        }
        match self.state {
            WriterState::Idle => (),
            WriterState::TermOpen if self.term.doc_count == 0 => (),
            _ => {
                return Err(Error::invalid_operation(
                    "start_term while another term has postings",
                ));
            }
        }
        let freq_start = self.freq_out.file_pointer();
        let prox_start = self.prox_out.as_ref().map_or(0, |p| p.file_pointer());
        self.term = TermStreamState {
            freq_start,
            prox_start,
            ..Default::default()
        };
        self.skip_writer.reset_skip(freq_start, prox_start);
        self.state = WriterState::TermOpen;
        Ok(())
    }

    /// Adds a document to the current term. `term_freq` is ignored for fields that
    /// do not index frequencies.
    ///
    /// An open document whose positions are complete is finished implicitly.
    pub fn start_doc(&mut self, doc: DocId, term_freq: u32) -> Result<()> {
        match self.state {
            WriterState::TermOpen => (),
            WriterState::DocOpen => self.finish_doc()?,
            WriterState::Idle => {
                return Err(Error::invalid_operation("start_doc outside of a term"));
            }
        }

        if self.term.doc_count > 0 && doc <= self.term.last_doc_id {
            return Err(Error::corruption(format!(
                "document {doc} does not follow previous document {} of the term",
                self.term.last_doc_id
            )));
        }
        if doc >= self.params.total_docs {
            return Err(Error::corruption(format!(
                "document {doc} is out of range for a segment of {} documents",
                self.params.total_docs
            )));
        }
        let has_freqs = self.index_options.has_freqs();
        if has_freqs && term_freq == 0 {
            return Err(Error::corruption(format!(
                "document {doc} has a term frequency of 0"
            )));
        }

        let doc_count = self.term.doc_count + 1;
        if doc_count % self.params.skip_interval == 0 {
            let point = SkipPoint {
                doc: self.term.last_doc_id,
                freq_pointer: self.freq_out.file_pointer(),
                prox_pointer: self.prox_out.as_ref().map_or(0, |p| p.file_pointer()),
                payload_length: self.term.last_payload_length.unwrap_or(0),
            };
            self.skip_writer.buffer_skip(doc_count, &point)?;
        }

        let delta = doc - self.term.last_doc_id;
        let io_err = |e| Error::io("frequency stream", e);
        if !has_freqs {
            self.freq_out.write_vu32(delta).map_err(io_err)?;
        } else if term_freq == 1 {
            self.freq_out
                .write_vu64(((delta as u64) << 1) | 1)
                .map_err(io_err)?;
        } else {
            self.freq_out
                .write_vu64((delta as u64) << 1)
                .map_err(io_err)?;
            self.freq_out.write_vu32(term_freq).map_err(io_err)?;
        }

        self.term.last_doc_id = doc;
        self.term.doc_count = doc_count;
        self.term.last_position = 0;
        self.term.positions_in_doc = 0;
        self.term.term_freq = if has_freqs { term_freq } else { 1 };
        self.state = WriterState::DocOpen;
        Ok(())
    }

    /// Adds the next position of the current document.
    ///
    /// Positions must not decrease within a document; repeating a position is allowed.
    /// `payload` is ignored unless the field stores payloads.
    pub fn add_position(&mut self, position: u32, payload: Option<&[u8]>) -> Result<()> {
        if self.state != WriterState::DocOpen {
            return Err(Error::invalid_operation("add_position outside of a document"));
        }
        if !self.index_options.has_positions() {
            return Err(Error::invalid_operation(
                "add_position on a field without positions",
            ));
        }
        let Some(prox_out) = self.prox_out.as_mut() else {
            return Err(Error::invalid_operation("add_position without a position stream"));
        };

        if position < self.term.last_position {
            return Err(Error::corruption(format!(
                "position {position} precedes position {} in document {}",
                self.term.last_position, self.term.last_doc_id
            )));
        }
        if self.term.positions_in_doc >= self.term.term_freq {
            return Err(Error::corruption(format!(
                "document {} has more positions than its term frequency {}",
                self.term.last_doc_id, self.term.term_freq
            )));
        }

        let delta = position - self.term.last_position;
        let io_err = |e| Error::io("position stream", e);
        if self.store_payloads {
            let payload = payload.unwrap_or_default();
            let payload_length = u32::try_from(payload.len())
                .map_err(|_| Error::invalid_arg("payload", "payload exceeds u32::MAX bytes"))?;
            let shifted = (delta as u64) << 1;
            if self.term.last_payload_length == Some(payload_length) {
                prox_out.write_vu64(shifted).map_err(io_err)?;
            } else {
                prox_out.write_vu64(shifted | 1).map_err(io_err)?;
                prox_out.write_vu32(payload_length).map_err(io_err)?;
                self.term.last_payload_length = Some(payload_length);
            }
            if !payload.is_empty() {
                prox_out
                    .write_bytes(payload, 0, payload.len())
                    .map_err(io_err)?;
            }
        } else {
            prox_out.write_vu32(delta).map_err(io_err)?;
        }

        self.term.last_position = position;
        self.term.positions_in_doc += 1;
        Ok(())
    }

    /// Ends the current document. Positional fields must have received exactly
    /// `term_freq` positions.
    pub fn finish_doc(&mut self) -> Result<()> {
        if self.state != WriterState::DocOpen {
            return Err(Error::invalid_operation("finish_doc without an open document"));
        }
        if self.index_options.has_positions() && self.term.positions_in_doc != self.term.term_freq
        {
            return Err(Error::corruption(format!(
                "document {} has {} positions but a term frequency of {}",
                self.term.last_doc_id, self.term.positions_in_doc, self.term.term_freq
            )));
        }
        self.state = WriterState::TermOpen;
        Ok(())
    }

    /// Ends the current term, writing its skip data when the term is long enough, and
    /// buffers its metadata for the next term block flush.
    pub fn finish_term(&mut self, stats: &TermStats) -> Result<PendingTermEntry> {
        match self.state {
            WriterState::TermOpen => (),
            WriterState::DocOpen => self.finish_doc()?,
            WriterState::Idle => {
                return Err(Error::invalid_operation("finish_term without an open term"));
            }
        }
        if stats.doc_freq == 0 {
            return Err(Error::invalid_operation("finish_term for a term without documents"));
        }
        if stats.doc_freq != self.term.doc_count {
            return Err(Error::corruption(format!(
                "term expected {} documents but {} were written",
                stats.doc_freq, self.term.doc_count
            )));
        }

        let skip_offset = if self.term.doc_count >= self.skip_minimum {
            let offset = self.skip_writer.write_skip(&mut self.freq_out)?;
            log::debug!(
                "term with {} docs: skip data at +{offset}, {} level(s) buffered",
                self.term.doc_count,
                self.skip_writer.buffered_levels()
            );
            Some(offset)
        } else {
            None
        };

        let entry = PendingTermEntry {
            freq_offset: self.term.freq_start,
            prox_offset: self
                .index_options
                .has_positions()
                .then_some(self.term.prox_start),
            skip_offset,
        };
        self.pending.append(entry);
        self.state = WriterState::Idle;
        Ok(entry)
    }

    /// Flushes `count` buffered term entries, starting `start` entries from the tail of
    /// the pending list, as one block into `out`.
    pub fn flush_terms_block<T: IndexOutput + ?Sized>(
        &mut self,
        out: &mut T,
        start: usize,
        count: usize,
    ) -> Result<()> {
        self.pending.flush_block(out, start, count)
    }

    /// Term entries finished but not yet flushed.
    pub fn pending_terms(&self) -> &[PendingTermEntry] {
        self.pending.pending()
    }

    /// Seals the position stream, if any, then the frequency stream, and hands both back.
    ///
    /// Both streams are always sealed; the first failure is returned.
    pub fn close(mut self) -> Result<PostingsOutputs<W>> {
        if self.state != WriterState::Idle {
            log::warn!("closing postings writer with an unfinished term");
        }
        if !self.pending.is_empty() {
            log::warn!(
                "closing postings writer with {} unflushed term entries",
                self.pending.len()
            );
        }

        let prox_result = match self.prox_out.as_mut() {
            Some(prox) => prox.seal().map_err(|e| Error::io("position stream", e)),
            None => Ok(()),
        };
        let freq_result = self
            .freq_out
            .seal()
            .map_err(|e| Error::io("frequency stream", e));

        match (prox_result, freq_result) {
            (Ok(()), Ok(())) => Ok(PostingsOutputs {
                freq: self.freq_out,
                prox: self.prox_out,
            }),
            (Err(first), Err(second)) => {
                log::warn!("failed to seal after a previous failure: {second}");
                Err(first)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        }
    }
}
