//! Encoding side: the postings writer and the term metadata block buffer.
//!
//! [`PostingsWriter`] is driven by the term dictionary through the lifecycle
//! `set_field` → (`start_term` → (`start_doc` → `add_position`* → `finish_doc`)* →
//! `finish_term`)* → `close`, interleaved with `flush_terms_block` whenever the
//! dictionary decides to emit a block of term metadata.

mod postings_writer;
mod term_block;

pub use postings_writer::{PostingsOutputs, PostingsWriter};
pub use term_block::{PendingTermEntry, TermBlockBuffer};
