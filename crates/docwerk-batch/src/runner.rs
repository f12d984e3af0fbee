// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-document operation runner.
//
// Runs one convert or compress request against the collaborator toolkit and
// turns every outcome, including collaborator errors and cancellation, into
// an `OperationResult`. Blocking; the orchestrator calls it from the blocking
// pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use docwerk_core::error::{DocwerkError, ErrorKind, Result};
use docwerk_core::traits::DocumentToolkit;
use docwerk_core::types::{
    CompressionOptions, ConversionOptions, ConversionQuality, DOCX_EXTENSION, DocumentMetadata,
    Metrics, Operation, OperationRequest, OperationResult, PDF_EXTENSION, PageRange,
    TriageSignals, is_usable_text,
};
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::output::ReservedOutput;
use crate::triage;

/// Pages handed to the primary extractor per call. Cancellation is checked
/// between chunks.
pub const PAGES_PER_CHUNK: u32 = 50;

const COMPRESSED_SUFFIX: &str = "_compressed";

/// Recorded under `FallbackError` when weak text is written because the
/// toolkit has no fallback extractor.
const FALLBACK_UNAVAILABLE: &str = "fallback extraction is not available";

/// Executes operations for one document at a time. Shareable across workers.
pub struct OperationRunner<T: ?Sized> {
    toolkit: Arc<T>,
    min_text_chars: usize,
}

impl<T: DocumentToolkit + ?Sized> OperationRunner<T> {
    pub fn new(toolkit: Arc<T>, min_text_chars: usize) -> Self {
        Self {
            toolkit,
            min_text_chars,
        }
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    /// Run `request`. Never returns an error: failures are results.
    #[instrument(skip_all, fields(
        path = %request.document.path.display(),
        operation = %request.operation.kind(),
    ))]
    pub fn run(&self, request: &OperationRequest) -> OperationResult {
        let started = Instant::now();
        let kind = request.operation.kind();
        let document = &request.document;

        if document.is_encrypted {
            warn!("Document is encrypted, skipping");
            return OperationResult::failed(
                kind,
                ErrorKind::Encrypted,
                DocwerkError::Encrypted(document.path.clone()).to_string(),
            )
            .with_duration(started.elapsed());
        }
        if !document.can_process() {
            warn!(
                corrupted = document.is_corrupted,
                pages = document.page_count,
                size = document.size_bytes,
                "Document cannot be processed"
            );
            return OperationResult::failed(
                kind,
                ErrorKind::Unreadable,
                "Document cannot be processed",
            )
            .with_duration(started.elapsed());
        }

        let outcome = match &request.operation {
            Operation::Convert(options) => self.convert(request, options),
            Operation::Compress(options) => self.compress(request, options),
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok((output_path, metrics)) => {
                info!(
                    output = %output_path.display(),
                    size_mb = document.size_in_mb(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Operation succeeded"
                );
                OperationResult::succeeded(kind, output_path, elapsed, metrics)
            }
            Err(err) => {
                let error_kind = err.kind();
                if error_kind == ErrorKind::Cancelled {
                    info!("Operation cancelled");
                } else {
                    error!(%err, kind = %error_kind, "Operation failed");
                }
                OperationResult::failed(kind, error_kind, err.to_string()).with_duration(elapsed)
            }
        }
    }

    // -- Convert --------------------------------------------------------------

    fn convert(
        &self,
        request: &OperationRequest,
        options: &ConversionOptions,
    ) -> Result<(PathBuf, Metrics)> {
        request.cancel.check()?;
        let document = &request.document;
        let output = ReservedOutput::reserve(
            &document.path,
            options.output_directory.as_deref(),
            "",
            DOCX_EXTENSION,
        )?;
        // Dropping `output` on any early return deletes the partial file.
        let metrics = self.convert_into(request, options, output.path())?;
        Ok((output.keep(), metrics))
    }

    fn convert_into(
        &self,
        request: &OperationRequest,
        options: &ConversionOptions,
        output: &Path,
    ) -> Result<Metrics> {
        let document = &request.document;
        let cancel = &request.cancel;

        let mut chunks = Vec::new();
        let mut start = 1;
        while start <= document.page_count {
            cancel.check()?;
            let end = start
                .saturating_add(PAGES_PER_CHUNK - 1)
                .min(document.page_count);
            let text = self
                .toolkit
                .extract_primary_text(&document.path, Some(PageRange::new(start, end)))?;
            debug!(start, end, chars = text.len(), "Chunk extracted");
            chunks.push(text);
            start = end + 1;
        }

        let mut used_fallback = false;
        let mut fallback_error = None;
        let mut recommendation = None;
        let primary = chunks.concat();
        if !is_usable_text(&primary, self.min_text_chars) {
            let report = self.triage_weak_text(document, primary);
            recommendation = Some(report.recommendation);

            if options.allow_ocr_fallback && !self.toolkit.fallback_available() {
                warn!(
                    recommendation = %report.recommendation,
                    toolkit = self.toolkit.toolkit_name(),
                    "No usable embedded text and no fallback backend, writing extracted text as-is"
                );
                fallback_error = Some(FALLBACK_UNAVAILABLE);
            } else if options.allow_ocr_fallback {
                cancel.check()?;
                info!(recommendation = %report.recommendation, "No usable embedded text, using fallback extraction");
                let recognised = self
                    .toolkit
                    .extract_fallback_text(&document.path, cancel)?;
                chunks = vec![recognised];
                used_fallback = true;
            } else {
                warn!(
                    recommendation = %report.recommendation,
                    "No usable embedded text and fallback is disabled, writing extracted text as-is"
                );
            }
        }

        cancel.check()?;
        let paragraphs = build_paragraphs(&chunks, options.preserve_formatting);
        let title = match options.quality {
            ConversionQuality::Draft => None,
            ConversionQuality::Standard | ConversionQuality::High => document.title.as_deref(),
        };
        self.toolkit
            .write_editable_document(output, title, &paragraphs)?;

        let characters: usize = chunks.iter().map(|chunk| chunk.chars().count()).sum();
        let mut metrics = Metrics::new();
        metrics.insert("PagesConverted".into(), json!(document.page_count));
        metrics.insert("Quality".into(), json!(format!("{:?}", options.quality)));
        metrics.insert("FormattingPreserved".into(), json!(options.preserve_formatting));
        metrics.insert("UsedFallback".into(), json!(used_fallback));
        metrics.insert("CharactersExtracted".into(), json!(characters));
        if let Some(recommendation) = recommendation {
            metrics.insert("Recommendation".into(), json!(recommendation.to_string()));
        }
        if let Some(fallback_error) = fallback_error {
            metrics.insert("FallbackError".into(), json!(fallback_error));
        }
        Ok(metrics)
    }

    /// Triage a document whose embedded text fell below the threshold.
    fn triage_weak_text(
        &self,
        document: &DocumentMetadata,
        text: String,
    ) -> docwerk_core::types::TriageReport {
        let has_images = match self.toolkit.detect_images(&document.path) {
            Ok(found) => Some(found),
            Err(err) => {
                debug!(%err, "Image detection failed, treating as unknown");
                None
            }
        };
        let signals = TriageSignals {
            extracted_text: Some(text),
            has_images,
            ..Default::default()
        };
        triage::analyze(document, &signals, self.min_text_chars)
    }

    // -- Compress -------------------------------------------------------------

    fn compress(
        &self,
        request: &OperationRequest,
        options: &CompressionOptions,
    ) -> Result<(PathBuf, Metrics)> {
        request.cancel.check()?;
        let document = &request.document;
        let output = ReservedOutput::reserve(
            &document.path,
            options.output_directory.as_deref(),
            COMPRESSED_SUFFIX,
            PDF_EXTENSION,
        )?;

        let profile = options.quality_profile();
        self.toolkit
            .compress_document(&document.path, output.path(), &profile)?;

        let original = document.size_bytes;
        let compressed = std::fs::metadata(output.path())?.len();
        let ratio = if original == 0 {
            0.0
        } else {
            1.0 - compressed as f64 / original as f64
        };
        if ratio <= 0.0 {
            warn!(original, compressed, "Compression did not reduce file size");
        }

        let mut metrics = Metrics::new();
        metrics.insert("OriginalSizeBytes".into(), json!(original));
        metrics.insert("CompressedSizeBytes".into(), json!(compressed));
        metrics.insert("CompressionRatio".into(), json!(ratio));
        metrics.insert("Level".into(), json!(format!("{:?}", options.level)));
        metrics.insert("TargetDpi".into(), json!(profile.target_dpi));
        Ok((output.keep(), metrics))
    }
}

/// Paragraphs for the editable document.
///
/// With formatting preserved, blank lines separate paragraphs. Otherwise
/// each extraction chunk becomes one paragraph.
fn build_paragraphs(chunks: &[String], preserve_formatting: bool) -> Vec<String> {
    if !preserve_formatting {
        return chunks
            .iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect();
    }

    let mut paragraphs = Vec::new();
    for chunk in chunks {
        // Chunk boundaries always end a paragraph.
        let mut current: Vec<&str> = Vec::new();
        for line in chunk.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(current.join("\n"));
                    current.clear();
                }
            } else {
                current.push(line.trim_end());
            }
        }
        if !current.is_empty() {
            paragraphs.push(current.join("\n"));
        }
    }
    paragraphs
}
