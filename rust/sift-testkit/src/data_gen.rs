//! Data generation utilities for testing.
//!
//! All generators are seeded, so a failing test reproduces with the same input.

use std::io::{Seek, SeekFrom, Write};

/// One document of a generated posting list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPosting {
    pub doc: u32,
    pub freq: u32,
    /// Non-decreasing positions, `freq` of them.
    pub positions: Vec<u32>,
    /// One payload per position; empty payloads are allowed.
    pub payloads: Vec<Vec<u8>>,
}

/// Generates random posting lists with strictly increasing doc IDs.
pub struct PostingListGenerator {
    rng: fastrand::Rng,
    max_doc_gap: u32,
    max_freq: u32,
    max_position_gap: u32,
    max_payload_len: usize,
}

impl PostingListGenerator {
    pub fn new(seed: u64) -> PostingListGenerator {
        PostingListGenerator {
            rng: fastrand::Rng::with_seed(seed),
            max_doc_gap: 10,
            max_freq: 4,
            max_position_gap: 6,
            max_payload_len: 4,
        }
    }

    pub fn with_max_doc_gap(mut self, max_doc_gap: u32) -> Self {
        assert_ne!(max_doc_gap, 0);
        self.max_doc_gap = max_doc_gap;
        self
    }

    pub fn with_max_freq(mut self, max_freq: u32) -> Self {
        assert_ne!(max_freq, 0);
        self.max_freq = max_freq;
        self
    }

    pub fn with_max_position_gap(mut self, max_position_gap: u32) -> Self {
        self.max_position_gap = max_position_gap;
        self
    }

    pub fn with_max_payload_len(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    /// Generates a posting list of `doc_count` documents.
    ///
    /// Payload lengths repeat the previous length about half of the time, and
    /// position gaps of zero occur, so both run-length paths of the position
    /// encoding are exercised.
    pub fn generate(&mut self, doc_count: usize) -> Vec<GeneratedPosting> {
        let mut postings = Vec::with_capacity(doc_count);
        let mut doc = 0u32;
        let mut payload_len = 0usize;
        for i in 0..doc_count {
            if i > 0 {
                doc += self.rng.u32(1..=self.max_doc_gap);
            } else {
                doc = self.rng.u32(0..self.max_doc_gap);
            }
            let freq = self.rng.u32(1..=self.max_freq);

            let mut position = 0u32;
            let mut positions = Vec::with_capacity(freq as usize);
            let mut payloads = Vec::with_capacity(freq as usize);
            for _ in 0..freq {
                position += self.rng.u32(0..=self.max_position_gap);
                positions.push(position);
                if self.rng.bool() {
                    payload_len = self.rng.usize(0..=self.max_payload_len);
                }
                payloads.push((0..payload_len).map(|_| self.rng.u8(..)).collect());
            }
            postings.push(GeneratedPosting {
                doc,
                freq,
                positions,
                payloads,
            });
        }
        postings
    }
}

/// Generates a text corpus with one document per line and whitespace-separated
/// words drawn from a small vocabulary with a skewed distribution, so that some
/// words occur in most documents and others in few.
pub fn generate_text_documents(seed: u64, doc_count: usize, vocabulary: usize) -> Vec<String> {
    assert_ne!(vocabulary, 0);
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..doc_count)
        .map(|_| {
            let words = rng.usize(1..12);
            (0..words)
                .map(|_| {
                    // Squaring a uniform sample favors low word indexes.
                    let x = rng.f64();
                    let index = ((x * x) * vocabulary as f64) as usize;
                    format!("w{}", index.min(vocabulary - 1))
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Writes the given lines into a temporary file, positioned at the start.
pub fn write_temp_text_file(lines: &[String]) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    file.flush()?;
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_list_invariants() {
        let postings = PostingListGenerator::new(7)
            .with_max_freq(5)
            .generate(500);
        assert_eq!(postings.len(), 500);
        for pair in postings.windows(2) {
            assert!(pair[0].doc < pair[1].doc);
        }
        for posting in &postings {
            assert!(posting.freq >= 1 && posting.freq <= 5);
            assert_eq!(posting.positions.len(), posting.freq as usize);
            assert_eq!(posting.payloads.len(), posting.freq as usize);
            assert!(posting.positions.windows(2).all(|p| p[0] <= p[1]));
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = PostingListGenerator::new(99).generate(50);
        let b = PostingListGenerator::new(99).generate(50);
        assert_eq!(a, b);
        assert_eq!(
            generate_text_documents(3, 20, 50),
            generate_text_documents(3, 20, 50)
        );
    }

    #[test]
    fn test_temp_text_file() {
        let lines = generate_text_documents(1, 5, 10);
        let file = write_temp_text_file(&lines).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().count(), 5);
    }
}
