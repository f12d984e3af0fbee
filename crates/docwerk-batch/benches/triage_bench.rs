// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for triage and the history ledger, the two pieces of
// the batch engine that run once per file on the collector side.

use std::path::PathBuf;

use chrono::Utc;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use docwerk_batch::HistoryLedger;
use docwerk_batch::triage::analyze;
use docwerk_core::types::{
    DEFAULT_MIN_TEXT_CHARS, DocumentMetadata, FontInfo, HistoryEntry, TriageSignals,
};

fn metadata() -> DocumentMetadata {
    DocumentMetadata {
        path: PathBuf::from("/bench/annual-report.pdf"),
        size_bytes: 4 * 1024 * 1024,
        page_count: 120,
        created_at: Utc::now(),
        modified_at: Utc::now(),
        is_encrypted: false,
        is_corrupted: false,
        title: Some("Annual report".into()),
        pdf_version: Some("1.7".into()),
    }
}

/// Triage a text-heavy document with a mix of embedded and missing fonts.
fn bench_triage(c: &mut Criterion) {
    let fonts: Vec<FontInfo> = (0..40)
        .map(|i| FontInfo {
            name: format!("Font{i}"),
            font_type: "TrueType".into(),
            embedded: i % 3 != 0,
            subset: i % 2 == 0,
        })
        .collect();
    let signals = TriageSignals {
        extracted_text: Some("Revenue grew across every region this year. ".repeat(2_000)),
        has_images: Some(true),
        fonts: Some(fonts),
        attachments: Some(vec!["figures.xlsx".into()]),
        tagged: Some(false),
        pdf_version: None,
    };
    let meta = metadata();

    c.bench_function("triage_analyze (40 fonts, 88k chars)", |b| {
        b.iter(|| black_box(analyze(black_box(&meta), black_box(&signals), DEFAULT_MIN_TEXT_CHARS)));
    });
}

/// Append past capacity, then read the newest 20.
fn bench_history(c: &mut Criterion) {
    let entry = HistoryEntry {
        file_name: "annual-report.pdf".into(),
        operation: "PDF_TO_WORD".into(),
        success: true,
        processed_at: Utc::now(),
        output_path: Some(PathBuf::from("/bench/annual-report.docx")),
        error_message: None,
        file_size_bytes: Some(4 * 1024 * 1024),
    };

    c.bench_function("history_append_recent (250 into 100)", |b| {
        b.iter(|| {
            let ledger = HistoryLedger::new(100).expect("ledger");
            for _ in 0..250 {
                ledger.append(entry.clone());
            }
            black_box(ledger.recent(20));
        });
    });
}

criterion_group!(benches, bench_triage, bench_history);
criterion_main!(benches);
