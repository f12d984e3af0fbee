// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{CompressionLevel, DEFAULT_MIN_TEXT_CHARS};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Requested number of files processed at once. Clamped to the
    /// machine's available parallelism at run time.
    pub max_concurrency: usize,
    /// Extracted text must exceed this many characters to count as usable.
    pub min_text_chars: usize,
    /// Permit OCR when a document has no usable embedded text.
    pub allow_ocr_fallback: bool,
    /// Where outputs go. `None` writes next to each input.
    pub output_directory: Option<PathBuf>,
    pub default_compression: CompressionLevel,
    /// Number of entries the processing history keeps.
    pub history_capacity: usize,
    /// Batches larger than this are rejected up front.
    pub max_batch_size: usize,
    /// Throughput target used for time estimates and the end-of-batch log.
    pub throughput_mb_per_sec: f64,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    pub ocr_model_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            allow_ocr_fallback: true,
            output_directory: None,
            default_compression: CompressionLevel::Medium,
            history_capacity: 100,
            max_batch_size: 10_000,
            throughput_mb_per_sec: 10.0,
            ocr_model_dir: None,
        }
    }
}
