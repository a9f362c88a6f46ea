//! Inspect command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use sift_io::ByteReader;
use sift_postings::{FreqStreamHeader, PendingTermEntry, PostingsReader};
use std::path::Path;

use super::{FREQ_FILE, PROX_FILE, TERMS_BLOCK_FILE, TermsManifest};

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub header: HeaderInfo,
    pub doc_count: u32,
    pub field: String,
    pub index_options: String,
    pub terms: Vec<TermInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postings: Option<PostingsInfo>,
}

#[derive(Debug, Serialize)]
pub struct HeaderInfo {
    pub version: u32,
    pub skip_interval: u32,
    pub max_skip_levels: u32,
    pub skip_minimum: u32,
}

#[derive(Debug, Serialize)]
pub struct TermInfo {
    pub term: String,
    pub block: usize,
    pub doc_freq: u32,
    pub total_term_freq: u64,
    pub freq_offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prox_offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct PostingsInfo {
    pub term: String,
    pub doc_freq: u32,
    pub docs: Vec<DocInfo>,
}

#[derive(Debug, Serialize)]
pub struct DocInfo {
    pub doc: u32,
    pub freq: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<u32>,
}

impl From<&FreqStreamHeader> for HeaderInfo {
    fn from(header: &FreqStreamHeader) -> Self {
        HeaderInfo {
            version: header.version,
            skip_interval: header.skip_interval,
            max_skip_levels: header.max_skip_levels,
            skip_minimum: header.skip_minimum,
        }
    }
}

pub fn run(out_dir: String, term: Option<String>) -> Result<()> {
    let dir = Path::new(&out_dir);
    println!("Inspecting postings: {}", dir.display());
    let report = collect(dir, term.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn collect(dir: &Path, term: Option<&str>) -> Result<InspectReport> {
    let manifest = TermsManifest::load(dir)?;
    let read = |name: &str| {
        let path = dir.join(name);
        std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
    };
    let freq = read(FREQ_FILE)?;
    let prox = if manifest.field.has_positions() {
        Some(read(PROX_FILE)?)
    } else {
        None
    };
    let terms_blocks = read(TERMS_BLOCK_FILE)?;

    let reader = PostingsReader::new(&freq, prox.as_deref())
        .context("Failed to open the frequency stream")?;
    let block_reader = reader.term_block_reader(&manifest.field);

    let mut terms = Vec::with_capacity(manifest.terms.len());
    let mut selected: Option<(PendingTermEntry, u32)> = None;
    let mut input = ByteReader::new(&terms_blocks);
    for (block, block_terms) in manifest.blocks().into_iter().enumerate() {
        let doc_freqs: Vec<u32> = block_terms.iter().map(|(_, r)| r.doc_freq).collect();
        let entries = block_reader
            .read_block(&mut input, &doc_freqs)
            .with_context(|| format!("Failed to decode terms block {block}"))?;
        for ((name, record), entry) in block_terms.into_iter().zip(entries) {
            if term == Some(name) {
                selected = Some((entry, record.doc_freq));
            }
            terms.push(TermInfo {
                term: name.to_string(),
                block,
                doc_freq: record.doc_freq,
                total_term_freq: record.total_term_freq,
                freq_offset: entry.freq_offset,
                prox_offset: entry.prox_offset,
                skip_offset: entry.skip_offset,
            });
        }
    }
    if !input.is_eof() {
        log::warn!(
            "{} unexpected trailing bytes in {TERMS_BLOCK_FILE}",
            input.remaining()
        );
    }

    let postings = match term {
        Some(term) => {
            let Some((entry, doc_freq)) = selected else {
                anyhow::bail!("Term not found: {term}");
            };
            Some(decode_postings(&reader, &manifest, term, &entry, doc_freq)?)
        }
        None => None,
    };

    Ok(InspectReport {
        header: reader.header().into(),
        doc_count: manifest.doc_count,
        field: manifest.field.name.clone(),
        index_options: format!("{:?}", manifest.field.index_options),
        terms,
        postings,
    })
}

fn decode_postings(
    reader: &PostingsReader,
    manifest: &TermsManifest,
    term: &str,
    entry: &PendingTermEntry,
    doc_freq: u32,
) -> Result<PostingsInfo> {
    let mut cursor = reader
        .postings(&manifest.field, entry, doc_freq)
        .with_context(|| format!("Failed to open postings of term '{term}'"))?;
    let mut docs = Vec::with_capacity(doc_freq as usize);
    while let Some(doc) = cursor.next_doc()? {
        let mut positions = Vec::new();
        while let Some(position) = cursor.next_position()? {
            positions.push(position);
        }
        docs.push(DocInfo {
            doc,
            freq: cursor.freq(),
            positions,
        });
    }
    Ok(PostingsInfo {
        term: term.to_string(),
        doc_freq,
        docs,
    })
}
