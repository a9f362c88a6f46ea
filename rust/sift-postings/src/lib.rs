//! On-disk postings encoding for the sift inverted index.
//!
//! For every indexed term, the writer side turns an ordered stream of
//! (document, frequency, position, payload) postings into two append-only byte
//! streams and a small per-term metadata record:
//!
//! - **Frequency stream**: a fixed header followed, per term, by delta-coded
//!   document IDs (with the term frequency folded into the low bit when it is 1)
//!   and, for long posting lists, a multi-level skip list.
//! - **Position stream**: per document, delta-coded positions with run-length
//!   coded payload lengths and the raw payload bytes.
//! - **Term metadata blocks**: the stream offsets of finished terms, buffered and
//!   flushed in front-coded blocks on request of the term dictionary.
//!
//! The read side ([`read`]) decodes all three, including skipping through long
//! posting lists via the skip data.
//!
//! # Usage Pattern
//!
//! ```rust
//! use sift_postings::{FieldInfo, IndexOptions, PostingsParams, PostingsWriter, TermStats};
//!
//! let params = PostingsParams::with_total_docs(100);
//! let mut writer = PostingsWriter::new(params, Vec::new(), Some(Vec::new())).unwrap();
//! writer
//!     .set_field(&FieldInfo::new("body", IndexOptions::DocsAndFreqsAndPositions))
//!     .unwrap();
//!
//! writer.start_term().unwrap();
//! writer.start_doc(3, 2).unwrap();
//! writer.add_position(1, None).unwrap();
//! writer.add_position(4, None).unwrap();
//! writer.finish_doc().unwrap();
//! writer.finish_term(&TermStats::new(1, 2)).unwrap();
//!
//! let mut terms_out = Vec::new();
//! writer.flush_terms_block(&mut terms_out, 1, 1).unwrap();
//! let outputs = writer.close().unwrap();
//! assert!(outputs.prox.is_some());
//! ```

pub mod field;
pub mod format;
pub mod params;
pub mod read;
pub mod skip;
pub mod write;

pub use field::{FieldInfo, IndexOptions, TermStats};
pub use format::FreqStreamHeader;
pub use params::PostingsParams;
pub use read::{PostingsCursor, PostingsReader, TermBlockReader};
pub use write::{PendingTermEntry, PostingsOutputs, PostingsWriter, TermBlockBuffer};

/// Document identifier within a segment.
pub type DocId = u32;
