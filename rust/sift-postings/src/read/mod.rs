//! Decoding side: reads back what the [`write`](crate::write) module produced.

mod cursor;
mod term_block;

use sift_common::{Result, error::Error};
use sift_io::ByteReader;

use crate::{field::FieldInfo, format::FreqStreamHeader, write::PendingTermEntry};

pub use cursor::PostingsCursor;
pub use term_block::TermBlockReader;

/// Read access to the frequency and position streams of one segment.
#[derive(Debug, Clone)]
pub struct PostingsReader<'a> {
    freq: &'a [u8],
    prox: Option<&'a [u8]>,
    header: FreqStreamHeader,
}

impl<'a> PostingsReader<'a> {
    /// Opens the streams, validating the frequency stream header.
    pub fn new(freq: &'a [u8], prox: Option<&'a [u8]>) -> Result<PostingsReader<'a>> {
        let header = FreqStreamHeader::read(&mut ByteReader::new(freq))?;
        Ok(PostingsReader { freq, prox, header })
    }

    pub fn header(&self) -> &FreqStreamHeader {
        &self.header
    }

    /// Decoder for the term metadata blocks of `field`.
    pub fn term_block_reader(&self, field: &FieldInfo) -> TermBlockReader {
        TermBlockReader::new(field.has_positions(), self.header.skip_minimum)
    }

    /// Positions a cursor on the postings of one term of `field`.
    pub fn postings(
        &self,
        field: &FieldInfo,
        entry: &PendingTermEntry,
        doc_freq: u32,
    ) -> Result<PostingsCursor<'a>> {
        let prox = if field.has_positions() {
            let (Some(prox), Some(prox_offset)) = (self.prox, entry.prox_offset) else {
                return Err(Error::invalid_arg(
                    "entry",
                    format!("positional field '{}' without position data", field.name),
                ));
            };
            Some((prox, prox_offset))
        } else {
            None
        };
        PostingsCursor::new(&self.header, field, self.freq, prox, entry, doc_freq)
    }
}
