//! Command implementations for sift-cmd

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sift_postings::{FieldInfo, PostingsParams};
use std::{collections::BTreeMap, path::Path};

pub mod index;
pub mod inspect;

pub const FREQ_FILE: &str = "postings.frq";
pub const PROX_FILE: &str = "postings.prx";
pub const TERMS_BLOCK_FILE: &str = "terms.tib";
pub const TERMS_MANIFEST_FILE: &str = "terms.json";

/// Number of terms per term metadata block.
pub const TERMS_PER_BLOCK: usize = 32;

/// The stand-in term dictionary written next to the postings files: which block
/// holds each term's metadata, and the statistics needed to decode it.
#[derive(Debug, Serialize, Deserialize)]
pub struct TermsManifest {
    pub params: PostingsParams,
    pub field: FieldInfo,
    pub doc_count: u32,
    pub terms: BTreeMap<String, TermRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TermRecord {
    pub doc_freq: u32,
    pub total_term_freq: u64,
    pub block: usize,
}

impl TermsManifest {
    pub fn load(dir: &Path) -> Result<TermsManifest> {
        let path = dir.join(TERMS_MANIFEST_FILE);
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(TERMS_MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Terms grouped by block, in block order and term order within each block.
    pub fn blocks(&self) -> Vec<Vec<(&str, &TermRecord)>> {
        let mut blocks: Vec<Vec<(&str, &TermRecord)>> = Vec::new();
        for (term, record) in &self.terms {
            if blocks.len() <= record.block {
                blocks.resize_with(record.block + 1, Vec::new);
            }
            blocks[record.block].push((term.as_str(), record));
        }
        blocks
    }
}
