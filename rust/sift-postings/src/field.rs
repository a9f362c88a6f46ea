//! Per-field indexing options and per-term statistics.

use serde::{Deserialize, Serialize};
use sift_common::{Result, error::Error};

/// What is recorded in the postings of a field. Options are ordered: each one
/// includes everything recorded by the previous ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexOptions {
    /// Only document IDs.
    Docs,
    /// Document IDs and term frequencies.
    DocsAndFreqs,
    /// Document IDs, term frequencies and positions (with optional payloads).
    DocsAndFreqsAndPositions,
}

impl IndexOptions {
    pub fn has_freqs(self) -> bool {
        self >= IndexOptions::DocsAndFreqs
    }

    pub fn has_positions(self) -> bool {
        self >= IndexOptions::DocsAndFreqsAndPositions
    }
}

/// Schema information about the field whose terms are being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub index_options: IndexOptions,
    /// Whether positions of this field carry payloads.
    #[serde(default)]
    pub store_payloads: bool,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, index_options: IndexOptions) -> FieldInfo {
        FieldInfo {
            name: name.into(),
            index_options,
            store_payloads: false,
        }
    }

    pub fn with_payloads(mut self) -> FieldInfo {
        self.store_payloads = true;
        self
    }

    pub fn has_freqs(&self) -> bool {
        self.index_options.has_freqs()
    }

    pub fn has_positions(&self) -> bool {
        self.index_options.has_positions()
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_payloads && !self.has_positions() {
            return Err(Error::invalid_arg(
                "store_payloads",
                format!("field '{}' stores payloads without positions", self.name),
            ));
        }
        Ok(())
    }
}

/// Statistics of a finished term, supplied by the term dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TermStats {
    /// Number of documents containing the term.
    pub doc_freq: u32,
    /// Total number of occurrences across all documents.
    pub total_term_freq: u64,
}

impl TermStats {
    pub fn new(doc_freq: u32, total_term_freq: u64) -> TermStats {
        TermStats {
            doc_freq,
            total_term_freq,
        }
    }
}
