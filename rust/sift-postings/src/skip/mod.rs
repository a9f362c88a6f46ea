//! Multi-level skip lists over the frequency stream.
//!
//! While a term's postings are written, every `skip_interval`-th document
//! produces a level-0 skip point, every `skip_interval^2`-th one also a level-1
//! point, and so on up to the configured number of levels. A skip point records
//! the document preceding the boundary together with the frequency and position
//! stream pointers (and the payload length in effect) at the boundary, so that a
//! reader jumping to it resumes decoding exactly where the writer was.
//!
//! # Layout
//!
//! The skip block is appended to the frequency stream right after the term's last
//! posting. Levels are written highest first; every level above 0 is prefixed with
//! its byte length (vu64), level 0 is written last without a prefix:
//!
//! ```text
//! [len(L_n) L_n] ... [len(L_1) L_1] L_0
//! ```
//!
//! Each entry holds the doc delta (shifted left with a payload-length-changed flag
//! when the field stores payloads, followed by the new length), the frequency
//! pointer delta and, for positional fields, the position pointer delta. Entries of
//! levels above 0 are followed by a child pointer into the level below.

mod reader;
mod writer;

pub use reader::SkipListReader;
pub use writer::{SkipListWriter, SkipPoint};

/// Number of skip levels for a posting list of `doc_count` documents:
/// `floor(log_interval(doc_count))`, at least 1, at most `max_skip_levels`.
pub(crate) fn num_skip_levels(doc_count: u32, skip_interval: u32, max_skip_levels: u32) -> usize {
    debug_assert!(skip_interval >= 2);
    let mut levels = 0u32;
    let mut remaining = doc_count;
    while remaining >= skip_interval {
        levels += 1;
        remaining /= skip_interval;
    }
    levels.clamp(1, max_skip_levels.max(1)) as usize
}
