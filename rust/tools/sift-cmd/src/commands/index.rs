//! Index command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use sift_io::{FileOutput, IndexOutput};
use sift_postings::{FieldInfo, IndexOptions, PostingsParams, PostingsWriter, TermStats};
use std::{
    collections::BTreeMap,
    io::{BufRead, BufReader},
    path::Path,
};

use super::{
    FREQ_FILE, PROX_FILE, TERMS_BLOCK_FILE, TERMS_PER_BLOCK, TermRecord, TermsManifest,
};
use crate::utils::{format_size, validate_file_exists};

/// Postings of one term: documents in increasing order with their positions.
type TermPostings = Vec<(u32, Vec<u32>)>;

#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub doc_count: u32,
    pub term_count: usize,
    pub block_count: usize,
    pub freq_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prox_size: Option<String>,
    pub terms_size: String,
}

pub fn run(
    input: String,
    out_dir: String,
    skip_interval: Option<u32>,
    no_positions: bool,
) -> Result<()> {
    let summary = build(Path::new(&input), Path::new(&out_dir), skip_interval, no_positions)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub fn build(
    input: &Path,
    out_dir: &Path,
    skip_interval: Option<u32>,
    no_positions: bool,
) -> Result<IndexSummary> {
    validate_file_exists(input)?;
    let (doc_count, terms) = invert(input)?;
    log::info!(
        "Read {doc_count} documents with {} distinct terms from {}",
        terms.len(),
        input.display()
    );

    let mut params = PostingsParams::with_total_docs(doc_count);
    if let Some(skip_interval) = skip_interval {
        params = params.with_skip_interval(skip_interval);
    }
    let index_options = if no_positions {
        IndexOptions::DocsAndFreqs
    } else {
        IndexOptions::DocsAndFreqsAndPositions
    };
    let field = FieldInfo::new("text", index_options);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let create = |name: &str| -> Result<FileOutput> {
        let path = out_dir.join(name);
        if path.is_file() {
            log::info!("Replacing {}", path.display());
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        FileOutput::create(&path).with_context(|| format!("Failed to create {}", path.display()))
    };
    let freq_out = create(FREQ_FILE)?;
    let prox_out = if field.has_positions() {
        Some(create(PROX_FILE)?)
    } else {
        None
    };
    let mut terms_out = create(TERMS_BLOCK_FILE)?;

    let mut writer = PostingsWriter::new(params.clone(), freq_out, prox_out)?;
    writer.set_field(&field)?;

    let mut records = BTreeMap::new();
    let mut block = 0;
    for (term, postings) in &terms {
        let stats = write_term(&mut writer, &field, postings)
            .with_context(|| format!("Failed to write postings of term '{term}'"))?;
        records.insert(
            term.clone(),
            TermRecord {
                doc_freq: stats.doc_freq,
                total_term_freq: stats.total_term_freq,
                block,
            },
        );
        if writer.pending_terms().len() == TERMS_PER_BLOCK {
            writer.flush_terms_block(&mut terms_out, TERMS_PER_BLOCK, TERMS_PER_BLOCK)?;
            block += 1;
        }
    }
    let remaining = writer.pending_terms().len();
    if remaining > 0 {
        writer.flush_terms_block(&mut terms_out, remaining, remaining)?;
        block += 1;
    }

    let outputs = writer.close()?;
    terms_out.seal().context("Failed to seal the terms block file")?;

    let manifest = TermsManifest {
        params,
        field,
        doc_count,
        terms: records,
    };
    manifest.save(out_dir)?;

    Ok(IndexSummary {
        doc_count,
        term_count: manifest.terms.len(),
        block_count: block,
        freq_size: format_size(outputs.freq.file_pointer()),
        prox_size: outputs.prox.map(|prox| format_size(prox.file_pointer())),
        terms_size: format_size(terms_out.file_pointer()),
    })
}

/// Reads the input file into per-term postings, one document per line.
fn invert(input: &Path) -> Result<(u32, BTreeMap<String, TermPostings>)> {
    let file = std::fs::File::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut terms: BTreeMap<String, TermPostings> = BTreeMap::new();
    let mut doc_count = 0u32;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read {}", input.display()))?;
        let doc = doc_count;
        for (position, word) in line.split_whitespace().enumerate() {
            let postings = terms.entry(word.to_string()).or_default();
            match postings.last_mut() {
                Some((last, positions)) if *last == doc => positions.push(position as u32),
                _ => postings.push((doc, vec![position as u32])),
            }
        }
        doc_count = doc_count
            .checked_add(1)
            .context("Too many documents in the input")?;
    }
    Ok((doc_count, terms))
}

fn write_term<W: IndexOutput>(
    writer: &mut PostingsWriter<W>,
    field: &FieldInfo,
    postings: &TermPostings,
) -> Result<TermStats> {
    writer.start_term()?;
    let mut total_term_freq = 0u64;
    for (doc, positions) in postings {
        let freq = positions.len() as u32;
        writer.start_doc(*doc, freq)?;
        if field.has_positions() {
            for &position in positions {
                writer.add_position(position, None)?;
            }
        }
        writer.finish_doc()?;
        total_term_freq += freq as u64;
    }
    let stats = TermStats::new(postings.len() as u32, total_term_freq);
    writer.finish_term(&stats)?;
    Ok(stats)
}
