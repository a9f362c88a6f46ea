use sift_common::error::ErrorKind;
use sift_io::{ByteReader, FileOutput, IndexOutput};
use sift_postings::{
    FieldInfo, IndexOptions, PendingTermEntry, PostingsCursor, PostingsParams, PostingsReader,
    PostingsWriter, TermStats, format::FREQ_HEADER_LEN,
};
use sift_testkit::{
    data_gen::{GeneratedPosting, PostingListGenerator},
    faulty::FaultyOutput,
};

fn positional_field() -> FieldInfo {
    FieldInfo::new("body", IndexOptions::DocsAndFreqsAndPositions).with_payloads()
}

fn write_term<W: IndexOutput>(
    writer: &mut PostingsWriter<W>,
    field: &FieldInfo,
    postings: &[GeneratedPosting],
) -> PendingTermEntry {
    writer.start_term().unwrap();
    let mut total_freq = 0u64;
    for posting in postings {
        writer.start_doc(posting.doc, posting.freq).unwrap();
        if field.has_positions() {
            for (position, payload) in posting.positions.iter().zip(&posting.payloads) {
                writer
                    .add_position(*position, Some(payload.as_slice()))
                    .unwrap();
            }
        }
        writer.finish_doc().unwrap();
        total_freq += posting.freq as u64;
    }
    writer
        .finish_term(&TermStats::new(postings.len() as u32, total_freq))
        .unwrap()
}

/// Checks the current document of `cursor` against `expected`, consuming its positions.
fn check_doc(cursor: &mut PostingsCursor, field: &FieldInfo, expected: &GeneratedPosting) {
    assert_eq!(cursor.doc(), Some(expected.doc));
    if !field.has_freqs() {
        assert_eq!(cursor.freq(), 1);
        return;
    }
    assert_eq!(cursor.freq(), expected.freq, "doc {}", expected.doc);
    if !field.has_positions() {
        return;
    }
    for (position, payload) in expected.positions.iter().zip(&expected.payloads) {
        assert_eq!(cursor.next_position().unwrap(), Some(*position));
        if field.store_payloads {
            let actual = cursor.payload().unwrap();
            if payload.is_empty() {
                assert_eq!(actual, None);
            } else {
                assert_eq!(actual, Some(payload.as_slice()));
            }
        }
    }
    assert_eq!(cursor.next_position().unwrap(), None);
}

fn check_sequential(
    reader: &PostingsReader,
    field: &FieldInfo,
    entry: &PendingTermEntry,
    postings: &[GeneratedPosting],
) {
    let mut cursor = reader
        .postings(field, entry, postings.len() as u32)
        .unwrap();
    for expected in postings {
        assert_eq!(cursor.next_doc().unwrap(), Some(expected.doc));
        check_doc(&mut cursor, field, expected);
    }
    assert_eq!(cursor.next_doc().unwrap(), None);
}

#[test]
fn test_round_trip_multiple_fields() {
    let fields = [
        FieldInfo::new("id", IndexOptions::Docs),
        FieldInfo::new("tags", IndexOptions::DocsAndFreqs),
        FieldInfo::new("title", IndexOptions::DocsAndFreqsAndPositions),
        positional_field(),
    ];
    let params = PostingsParams::default().with_skip_interval(8);
    let mut writer = PostingsWriter::new(params, Vec::new(), Some(Vec::new())).unwrap();

    let mut terms = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        writer.set_field(field).unwrap();
        for (j, doc_count) in [1usize, 7, 8, 9, 300].into_iter().enumerate() {
            let postings = PostingListGenerator::new((i * 10 + j) as u64)
                .with_max_payload_len(6)
                .generate(doc_count);
            let entry = write_term(&mut writer, field, &postings);
            terms.push((field.clone(), entry, postings));
        }
    }

    let mut terms_out = Vec::new();
    let block_size = 5;
    for _ in 0..fields.len() {
        let pending = writer.pending_terms().len();
        writer
            .flush_terms_block(&mut terms_out, pending, block_size)
            .unwrap();
    }
    assert!(writer.pending_terms().is_empty());
    let outputs = writer.close().unwrap();

    let reader = PostingsReader::new(&outputs.freq, outputs.prox.as_deref()).unwrap();
    assert_eq!(reader.header().skip_interval, 8);

    let mut blocks = ByteReader::new(&terms_out);
    for chunk in terms.chunks(block_size) {
        let field = &chunk[0].0;
        let doc_freqs: Vec<u32> = chunk.iter().map(|(_, _, p)| p.len() as u32).collect();
        let decoded = reader
            .term_block_reader(field)
            .read_block(&mut blocks, &doc_freqs)
            .unwrap();
        let written: Vec<PendingTermEntry> = chunk.iter().map(|(_, e, _)| *e).collect();
        assert_eq!(decoded, written);
    }
    assert!(blocks.is_eof());

    for (field, entry, postings) in &terms {
        check_sequential(&reader, field, entry, postings);
    }
}

#[test]
fn test_identical_input_gives_identical_bytes() {
    let field = positional_field();
    let postings = PostingListGenerator::new(5).generate(200);

    let encode = || {
        let params = PostingsParams::default().with_skip_interval(4);
        let mut writer = PostingsWriter::new(params, Vec::new(), Some(Vec::new())).unwrap();
        writer.set_field(&field).unwrap();
        write_term(&mut writer, &field, &postings[..50]);
        write_term(&mut writer, &field, &postings);
        let mut terms_out = Vec::new();
        writer.flush_terms_block(&mut terms_out, 2, 2).unwrap();
        let outputs = writer.close().unwrap();
        (outputs.freq, outputs.prox, terms_out)
    };

    assert_eq!(encode(), encode());
}

#[test]
fn test_short_term_has_no_skip_data() {
    let field = FieldInfo::new("f", IndexOptions::Docs);
    let mut writer =
        PostingsWriter::new(PostingsParams::default(), Vec::new(), None).unwrap();
    writer.set_field(&field).unwrap();

    // Fifteen one-byte deltas: below the default skip minimum of 16.
    let postings: Vec<GeneratedPosting> = (0..15)
        .map(|doc| GeneratedPosting {
            doc,
            freq: 1,
            positions: Vec::new(),
            payloads: Vec::new(),
        })
        .collect();
    let entry = write_term(&mut writer, &field, &postings);
    assert_eq!(entry.skip_offset, None);

    let outputs = writer.close().unwrap();
    assert_eq!(outputs.freq.len() as u64, FREQ_HEADER_LEN + 15);
    assert!(outputs.prox.is_none());
}

#[test]
fn test_advance_matches_sequential_scan() {
    let field = positional_field();
    let params = PostingsParams::default().with_skip_interval(4);
    let mut writer = PostingsWriter::new(params, Vec::new(), Some(Vec::new())).unwrap();
    writer.set_field(&field).unwrap();

    let postings = PostingListGenerator::new(11)
        .with_max_doc_gap(30)
        .generate(2000);
    let entry = write_term(&mut writer, &field, &postings);
    assert!(entry.skip_offset.is_some());
    let outputs = writer.close().unwrap();
    let reader = PostingsReader::new(&outputs.freq, outputs.prox.as_deref()).unwrap();
    let doc_freq = postings.len() as u32;
    let last_doc = postings.last().unwrap().doc;

    // A fresh cursor per target, jumping straight from the start.
    for target in (0..=last_doc + 5).step_by(97) {
        let mut cursor = reader.postings(&field, &entry, doc_freq).unwrap();
        let expected = postings.iter().find(|p| p.doc >= target);
        let actual = cursor.advance(target).unwrap();
        assert_eq!(actual, expected.map(|p| p.doc), "target {target}");
        if let Some(expected) = expected {
            check_doc(&mut cursor, &field, expected);
            // Sequential decoding continues correctly after the jump.
            let index = postings.iter().position(|p| p.doc == expected.doc).unwrap();
            if let Some(next) = postings.get(index + 1) {
                assert_eq!(cursor.next_doc().unwrap(), Some(next.doc));
                check_doc(&mut cursor, &field, next);
            }
        }
    }

    // One cursor advanced through increasing targets, leaving positions unread
    // on every other document.
    let mut cursor = reader.postings(&field, &entry, doc_freq).unwrap();
    let mut rng = fastrand::Rng::with_seed(3);
    let mut target = 0;
    let mut checked = None;
    loop {
        target += rng.u32(1..400);
        let expected = postings.iter().find(|p| p.doc >= target);
        let actual = cursor.advance(target).unwrap();
        assert_eq!(actual, expected.map(|p| p.doc), "target {target}");
        match expected {
            // The cursor stays put when it already satisfies the target.
            Some(expected) if checked == Some(expected.doc) => (),
            Some(expected) if rng.bool() => {
                check_doc(&mut cursor, &field, expected);
                checked = Some(expected.doc);
            }
            Some(_) => (),
            None => break,
        }
    }
}

#[test]
fn test_zero_count_flush_writes_marker() {
    let field = FieldInfo::new("f", IndexOptions::DocsAndFreqs);
    let mut writer =
        PostingsWriter::new(PostingsParams::default(), Vec::new(), None).unwrap();
    writer.set_field(&field).unwrap();
    for seed in 0..3 {
        let postings = PostingListGenerator::new(seed).generate(4);
        write_term(&mut writer, &field, &postings);
    }

    let mut terms_out = Vec::new();
    writer.flush_terms_block(&mut terms_out, 3, 0).unwrap();
    writer.flush_terms_block(&mut terms_out, 0, 0).unwrap();
    assert_eq!(terms_out, vec![0, 0]);
    assert_eq!(writer.pending_terms().len(), 3);
}

#[test]
fn test_flush_removes_oldest_entries() {
    let field = FieldInfo::new("f", IndexOptions::DocsAndFreqs);
    let mut writer =
        PostingsWriter::new(PostingsParams::default(), Vec::new(), None).unwrap();
    writer.set_field(&field).unwrap();
    let entries: Vec<PendingTermEntry> = (0..5)
        .map(|seed| {
            let postings = PostingListGenerator::new(seed).generate(3);
            write_term(&mut writer, &field, &postings)
        })
        .collect();

    let mut terms_out = Vec::new();
    writer.flush_terms_block(&mut terms_out, 5, 3).unwrap();
    assert_eq!(writer.pending_terms(), &entries[3..]);

    let block = sift_postings::TermBlockReader::new(false, 16)
        .read_block(&mut ByteReader::new(&terms_out), &[3, 3, 3])
        .unwrap();
    assert_eq!(block, &entries[..3]);

    let err = writer.flush_terms_block(&mut terms_out, 1, 2).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[test]
fn test_short_term_scenario() {
    let field = FieldInfo::new("f", IndexOptions::DocsAndFreqs);
    let params = PostingsParams::default().with_skip_minimum(16);
    let mut writer = PostingsWriter::new(params, Vec::new(), None).unwrap();
    writer.set_field(&field).unwrap();

    writer.start_term().unwrap();
    writer.start_doc(0, 1).unwrap();
    writer.start_doc(3, 2).unwrap();
    writer.start_doc(17, 1).unwrap();
    let entry = writer.finish_term(&TermStats::new(3, 4)).unwrap();
    assert_eq!(entry.freq_offset, FREQ_HEADER_LEN);
    assert_eq!(entry.skip_offset, None);
    assert_eq!(entry.prox_offset, None);

    let outputs = writer.close().unwrap();
    // (0<<1|1), (3<<1), 2, (14<<1|1); no skip data follows.
    assert_eq!(&outputs.freq[FREQ_HEADER_LEN as usize..], &[1, 6, 2, 29]);
}

#[test]
fn test_payload_length_run_length_coding() {
    let field = positional_field();
    let mut writer =
        PostingsWriter::new(PostingsParams::default(), Vec::new(), Some(Vec::new())).unwrap();
    writer.set_field(&field).unwrap();

    writer.start_term().unwrap();
    writer.start_doc(0, 3).unwrap();
    writer.add_position(0, Some(&[0xaa, 0xbb][..])).unwrap();
    writer.add_position(0, Some(&[0xcc, 0xdd][..])).unwrap();
    writer.add_position(5, Some(&[][..])).unwrap();
    writer.finish_doc().unwrap();
    let entry = writer.finish_term(&TermStats::new(1, 3)).unwrap();
    assert_eq!(entry.prox_offset, Some(0));

    let outputs = writer.close().unwrap();
    assert_eq!(
        outputs.prox.as_deref(),
        Some(&[1, 2, 0xaa, 0xbb, 0, 0xcc, 0xdd, 11, 0][..])
    );
}

#[test]
fn test_equal_positions_round_trip() {
    let field = FieldInfo::new("f", IndexOptions::DocsAndFreqsAndPositions);
    let mut writer =
        PostingsWriter::new(PostingsParams::default(), Vec::new(), Some(Vec::new())).unwrap();
    writer.set_field(&field).unwrap();
    writer.start_term().unwrap();
    writer.start_doc(2, 3).unwrap();
    for position in [4, 4, 4] {
        writer.add_position(position, None).unwrap();
    }
    let entry = writer.finish_term(&TermStats::new(1, 3)).unwrap();
    let outputs = writer.close().unwrap();

    let reader = PostingsReader::new(&outputs.freq, outputs.prox.as_deref()).unwrap();
    let mut cursor = reader.postings(&field, &entry, 1).unwrap();
    assert_eq!(cursor.next_doc().unwrap(), Some(2));
    for _ in 0..3 {
        assert_eq!(cursor.next_position().unwrap(), Some(4));
    }
    assert_eq!(cursor.next_position().unwrap(), None);
}

#[test]
fn test_doc_regression_keeps_earlier_terms() {
    let field = FieldInfo::new("f", IndexOptions::DocsAndFreqs);
    let first = PostingListGenerator::new(21).generate(40);

    let mut reference =
        PostingsWriter::new(PostingsParams::default(), Vec::new(), None).unwrap();
    reference.set_field(&field).unwrap();
    write_term(&mut reference, &field, &first);
    let expected = reference.close().unwrap().freq;

    let mut writer =
        PostingsWriter::new(PostingsParams::default(), Vec::new(), None).unwrap();
    writer.set_field(&field).unwrap();
    write_term(&mut writer, &field, &first);
    writer.start_term().unwrap();
    writer.start_doc(5, 1).unwrap();
    let err = writer.start_doc(5, 1).unwrap_err();
    assert!(err.is_corruption());
    let err = writer.start_doc(4, 1).unwrap_err();
    assert!(err.is_corruption());

    let freq = writer.close().unwrap().freq;
    assert_eq!(&freq[..expected.len()], expected.as_slice());
    // Only the accepted document of the broken term was written.
    assert_eq!(freq.len(), expected.len() + 1);
}

#[test]
fn test_close_seals_both_streams_on_failure() {
    let freq = FaultyOutput::new();
    let prox = FaultyOutput::failing_seal();
    let freq_probe = freq.seal_probe();
    let writer = PostingsWriter::new(PostingsParams::default(), freq, Some(prox)).unwrap();

    let err = writer.close().unwrap_err();
    match err.kind() {
        ErrorKind::Io { context, .. } => assert_eq!(context, "position stream"),
        other => panic!("unexpected error kind: {other:?}"),
    }
    assert!(freq_probe.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn test_close_reports_first_failure() {
    let freq = FaultyOutput::failing_seal();
    let prox = FaultyOutput::failing_seal();
    let writer = PostingsWriter::new(PostingsParams::default(), freq, Some(prox)).unwrap();
    let err = writer.close().unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Io { context, .. } if context == "position stream"
    ));

    let freq = FaultyOutput::failing_seal();
    let writer = PostingsWriter::new(PostingsParams::default(), freq, None).unwrap();
    let err = writer.close().unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Io { context, .. } if context == "frequency stream"
    ));
}

#[test]
fn test_write_failure_is_propagated() {
    let field = FieldInfo::new("f", IndexOptions::Docs);
    let freq = FaultyOutput::failing_after(FREQ_HEADER_LEN as usize + 2);
    let mut writer = PostingsWriter::new(PostingsParams::default(), freq, None).unwrap();
    writer.set_field(&field).unwrap();
    writer.start_term().unwrap();
    writer.start_doc(1, 1).unwrap();
    writer.start_doc(2, 1).unwrap();
    let err = writer.start_doc(3, 1).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Io { .. }));
}

#[test]
fn test_file_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let freq_path = dir.path().join("postings.frq");
    let prox_path = dir.path().join("postings.prx");

    let field = positional_field();
    let postings = PostingListGenerator::new(8).generate(100);
    let params = PostingsParams::with_total_docs(10_000);
    let mut writer = PostingsWriter::new(
        params,
        FileOutput::create(&freq_path).unwrap(),
        Some(FileOutput::create(&prox_path).unwrap()),
    )
    .unwrap();
    writer.set_field(&field).unwrap();
    let entry = write_term(&mut writer, &field, &postings);
    let outputs = writer.close().unwrap();
    assert_eq!(
        outputs.freq.file_pointer(),
        std::fs::metadata(&freq_path).unwrap().len()
    );

    let freq = std::fs::read(&freq_path).unwrap();
    let prox = std::fs::read(&prox_path).unwrap();
    let reader = PostingsReader::new(&freq, Some(&prox)).unwrap();
    check_sequential(&reader, &field, &entry, &postings);
}

#[test]
fn test_params_from_json() {
    let params: PostingsParams =
        serde_json::from_str(r#"{ "skip_interval": 32, "total_docs": 5000 }"#).unwrap();
    assert_eq!(params.skip_minimum(), 32);
    let mut writer = PostingsWriter::new(params, Vec::new(), None).unwrap();
    writer
        .set_field(&FieldInfo::new("f", IndexOptions::Docs))
        .unwrap();
    let outputs = writer.close().unwrap();
    let reader = PostingsReader::new(&outputs.freq, None).unwrap();
    assert_eq!(reader.header().skip_interval, 32);
    assert_eq!(reader.header().skip_minimum, 32);
}

#[test]
fn test_advance_across_skip_configurations() {
    // (skip interval, skip minimum, max skip levels)
    let configs = [
        (16, 2, 10),
        (4, 40, 10),
        (4, 4, 1),
        (2, 2, 10),
        (3, 1, 2),
        (4, 9, 3),
    ];
    let fields = [
        FieldInfo::new("title", IndexOptions::DocsAndFreqsAndPositions),
        positional_field(),
    ];
    for (interval, minimum, levels) in configs {
        for field in &fields {
            let params = PostingsParams::default()
                .with_skip_interval(interval)
                .with_skip_minimum(minimum)
                .with_max_skip_levels(levels);
            let mut writer = PostingsWriter::new(params, Vec::new(), Some(Vec::new())).unwrap();
            writer.set_field(field).unwrap();

            let doc_freqs = [
                1,
                interval - 1,
                interval,
                interval + 1,
                minimum,
                minimum + 1,
                interval * interval + 1,
                300,
            ];
            let terms: Vec<(PendingTermEntry, Vec<GeneratedPosting>)> = doc_freqs
                .iter()
                .enumerate()
                .map(|(seed, &doc_freq)| {
                    let postings = PostingListGenerator::new(seed as u64)
                        .with_max_payload_len(3)
                        .generate(doc_freq as usize);
                    let entry = write_term(&mut writer, field, &postings);
                    assert_eq!(entry.skip_offset.is_some(), doc_freq >= minimum);
                    (entry, postings)
                })
                .collect();
            let outputs = writer.close().unwrap();
            let reader = PostingsReader::new(&outputs.freq, outputs.prox.as_deref()).unwrap();

            for (entry, postings) in &terms {
                let doc_freq = postings.len() as u32;
                let context = format!(
                    "interval {interval}, minimum {minimum}, levels {levels}, \
                     doc freq {doc_freq}, payloads {}",
                    field.store_payloads
                );
                for (index, posting) in postings.iter().enumerate() {
                    for target in [posting.doc, posting.doc + 1] {
                        let expected = postings[index..].iter().find(|p| p.doc >= target);
                        let mut cursor = reader.postings(field, entry, doc_freq).unwrap();
                        let actual = cursor.advance(target).unwrap();
                        assert_eq!(actual, expected.map(|p| p.doc), "{context}, target {target}");
                        if let Some(expected) = expected {
                            check_doc(&mut cursor, field, expected);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_writer_requires_field_before_terms() {
    let field = FieldInfo::new("body", IndexOptions::DocsAndFreqsAndPositions);
    let params = PostingsParams::default().with_skip_interval(4);
    let mut writer = PostingsWriter::new(params, Vec::new(), Some(Vec::new())).unwrap();
    let err = writer.start_term().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));

    writer.set_field(&field).unwrap();
    writer.start_term().unwrap();
    for i in 0..64u32 {
        writer.start_doc(3 * i, 2).unwrap();
        writer.add_position(1, None).unwrap();
        writer.add_position(5, None).unwrap();
    }
    let entry = writer.finish_term(&TermStats::new(64, 128)).unwrap();
    assert!(entry.skip_offset.is_some());
    let outputs = writer.close().unwrap();

    let reader = PostingsReader::new(&outputs.freq, outputs.prox.as_deref()).unwrap();
    let mut cursor = reader.postings(&field, &entry, 64).unwrap();
    assert_eq!(cursor.advance(150).unwrap(), Some(150));
    assert_eq!(cursor.next_position().unwrap(), Some(1));
    assert_eq!(cursor.next_position().unwrap(), Some(5));
    assert_eq!(cursor.next_doc().unwrap(), Some(153));
}
