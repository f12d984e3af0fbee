// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document triage: classify a document from its metadata and raw signals.
//
// Pure and infallible. Missing signals degrade to "absent" rather than
// failing, so a half-readable document still gets a report.

use docwerk_core::types::{
    DocumentMetadata, Issue, Recommendation, TriageReport, TriageSignals, is_usable_text,
};

/// Build a [`TriageReport`] for `metadata` from `signals`.
///
/// Issues appear in observation order: the untagged-document issue first,
/// then one issue per unembedded font in the order fonts were listed.
pub fn analyze(
    metadata: &DocumentMetadata,
    signals: &TriageSignals,
    min_text_chars: usize,
) -> TriageReport {
    let has_text = signals
        .extracted_text
        .as_deref()
        .is_some_and(|text| is_usable_text(text, min_text_chars));
    let has_images = signals.has_images.unwrap_or(false);
    let fonts = signals.fonts.clone().unwrap_or_default();
    let attachments = signals.attachments.clone().unwrap_or_default();

    let mut issues = Vec::new();
    if signals.tagged == Some(false) {
        issues.push(Issue::Untagged);
    }
    issues.extend(
        fonts
            .iter()
            .filter(|font| !font.embedded)
            .map(|font| Issue::UnembeddedFont(font.name.clone())),
    );

    let is_scanned = !has_text && has_images;
    let recommendation = recommend(metadata.is_encrypted, is_scanned, &issues, has_text, has_images);

    TriageReport {
        is_encrypted: metadata.is_encrypted,
        is_scanned,
        has_text,
        has_images,
        has_attachments: !attachments.is_empty(),
        page_count: metadata.page_count,
        file_size_bytes: metadata.size_bytes,
        pdf_version: signals
            .pdf_version
            .clone()
            .or_else(|| metadata.pdf_version.clone()),
        issues,
        fonts,
        attachments,
        recommendation,
    }
}

/// First matching rule wins: encrypted, scanned, font risk, empty, healthy.
fn recommend(
    is_encrypted: bool,
    is_scanned: bool,
    issues: &[Issue],
    has_text: bool,
    has_images: bool,
) -> Recommendation {
    if is_encrypted {
        Recommendation::Decrypt
    } else if is_scanned {
        Recommendation::UseOcrFallback
    } else if issues.iter().any(Issue::is_font_issue) {
        Recommendation::FontRisk
    } else if !has_text && !has_images {
        Recommendation::EmptyOrCorrupted
    } else {
        Recommendation::Healthy
    }
}
