// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: document metadata, triage reports, operation requests and
// results, batch snapshots, and history entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cancel::CancelSignal;
use crate::error::ErrorKind;

/// Extracted text at or below this many characters (after trimming) is
/// treated as "no usable text". Rejects header/footer artifacts on scans.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 100;

pub const PDF_EXTENSION: &str = "pdf";
pub const DOCX_EXTENSION: &str = "docx";

/// Whether `text` carries more than `min_chars` characters of real content.
pub fn is_usable_text(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() > min_chars
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique identifier for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive, 1-indexed page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= self.start && page <= self.end
    }
}

// ---------------------------------------------------------------------------
// Document metadata
// ---------------------------------------------------------------------------

/// What the metadata reader learned about one document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub page_count: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub is_encrypted: bool,
    pub is_corrupted: bool,
    /// Title from the document information dictionary, if any.
    pub title: Option<String>,
    pub pdf_version: Option<String>,
}

impl DocumentMetadata {
    /// Not corrupted, non-empty, has pages, and still on disk.
    pub fn can_process(&self) -> bool {
        !self.is_corrupted && self.size_bytes > 0 && self.page_count > 0 && self.path.exists()
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }

    /// Lower-cased extension without the dot.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }

    pub fn size_in_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Final path component as a display string.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Triage
// ---------------------------------------------------------------------------

/// A font referenced by the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontInfo {
    pub name: String,
    /// Font subtype (Type1, TrueType, Type0, ...).
    pub font_type: String,
    pub embedded: bool,
    pub subset: bool,
}

/// A diagnostic raised during triage. Display order is observation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Issue {
    /// No structure tree, an accessibility problem.
    Untagged,
    /// The named font is referenced but not embedded.
    UnembeddedFont(String),
}

impl Issue {
    pub fn is_font_issue(&self) -> bool {
        matches!(self, Self::UnembeddedFont(_))
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Untagged => f.write_str("PDF is not tagged (accessibility issue)"),
            Self::UnembeddedFont(name) => {
                write!(f, "Font '{name}' is not embedded - may display incorrectly")
            }
        }
    }
}

/// What triage suggests doing with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Decrypt,
    UseOcrFallback,
    FontRisk,
    EmptyOrCorrupted,
    Healthy,
}

impl Recommendation {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Decrypt => "PDF is encrypted. Decrypt before processing.",
            Self::UseOcrFallback => {
                "Scanned PDF: no usable text, use fallback extraction (OCR)."
            }
            Self::FontRisk => "Formatting risk: unembedded fonts detected.",
            Self::EmptyOrCorrupted => "PDF appears to be empty or corrupted.",
            Self::Healthy => "PDF is healthy and ready for processing.",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Raw signals gathered from collaborators. Missing signals are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageSignals {
    pub extracted_text: Option<String>,
    pub has_images: Option<bool>,
    pub fonts: Option<Vec<FontInfo>>,
    pub attachments: Option<Vec<String>>,
    /// `Some(false)` when the document is known to be untagged.
    pub tagged: Option<bool>,
    pub pdf_version: Option<String>,
}

/// Classification of a document's processability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub is_encrypted: bool,
    /// `!has_text && has_images`.
    pub is_scanned: bool,
    pub has_text: bool,
    pub has_images: bool,
    pub has_attachments: bool,
    pub page_count: u32,
    pub file_size_bytes: u64,
    pub pdf_version: Option<String>,
    pub issues: Vec<Issue>,
    pub fonts: Vec<FontInfo>,
    pub attachments: Vec<String>,
    pub recommendation: Recommendation,
}

impl TriageReport {
    pub fn is_valid(&self) -> bool {
        self.page_count > 0
    }

    /// Issues rendered in display order.
    pub fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Convert,
    Compress,
}

impl OperationKind {
    /// Label recorded in history entries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Convert => "PDF_TO_WORD",
            Self::Compress => "COMPRESS",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionQuality {
    Draft,
    Standard,
    High,
}

/// Options for PDF → DOCX conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub quality: ConversionQuality,
    /// Split text into paragraphs on blank lines instead of one per chunk.
    pub preserve_formatting: bool,
    /// Permit the OCR fallback when embedded text is not usable.
    pub allow_ocr_fallback: bool,
    /// Defaults to the input file's directory.
    pub output_directory: Option<PathBuf>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            quality: ConversionQuality::High,
            preserve_formatting: true,
            allow_ocr_fallback: true,
            output_directory: None,
        }
    }
}

impl ConversionOptions {
    pub fn fast() -> Self {
        Self {
            quality: ConversionQuality::Draft,
            preserve_formatting: false,
            allow_ocr_fallback: false,
            output_directory: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionLevel {
    /// Highest quality, largest file.
    Low,
    Medium,
    High,
    /// Smallest file.
    Maximum,
}

impl CompressionLevel {
    /// Backend parameters for this level.
    pub fn profile(self) -> QualityProfile {
        match self {
            Self::Low => QualityProfile {
                target_dpi: 300,
                jpeg_quality: 90,
                recompress_images: false,
                strip_metadata: false,
                best_compression: false,
            },
            Self::Medium => QualityProfile {
                target_dpi: 150,
                jpeg_quality: 75,
                recompress_images: true,
                strip_metadata: false,
                best_compression: false,
            },
            Self::High => QualityProfile {
                target_dpi: 72,
                jpeg_quality: 60,
                recompress_images: true,
                strip_metadata: false,
                best_compression: false,
            },
            Self::Maximum => QualityProfile {
                target_dpi: 72,
                jpeg_quality: 45,
                recompress_images: true,
                strip_metadata: true,
                best_compression: true,
            },
        }
    }
}

/// Options for PDF size compression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionOptions {
    pub level: CompressionLevel,
    /// Overrides the level's resolution target.
    pub target_dpi: Option<u32>,
    pub compress_images: bool,
    pub strip_metadata: bool,
    pub output_directory: Option<PathBuf>,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self::balanced()
    }
}

impl CompressionOptions {
    pub fn balanced() -> Self {
        Self {
            level: CompressionLevel::Medium,
            target_dpi: Some(150),
            compress_images: true,
            strip_metadata: false,
            output_directory: None,
        }
    }

    pub fn maximum() -> Self {
        Self {
            level: CompressionLevel::Maximum,
            target_dpi: Some(96),
            compress_images: true,
            strip_metadata: true,
            output_directory: None,
        }
    }

    pub fn minimal() -> Self {
        Self {
            level: CompressionLevel::Low,
            target_dpi: Some(300),
            compress_images: false,
            strip_metadata: false,
            output_directory: None,
        }
    }

    pub fn for_level(level: CompressionLevel) -> Self {
        let profile = level.profile();
        Self {
            level,
            target_dpi: None,
            compress_images: profile.recompress_images,
            strip_metadata: profile.strip_metadata,
            output_directory: None,
        }
    }

    /// The level's profile with this request's overrides applied.
    pub fn quality_profile(&self) -> QualityProfile {
        let mut profile = self.level.profile();
        if let Some(dpi) = self.target_dpi {
            profile.target_dpi = dpi;
        }
        profile.recompress_images = self.compress_images;
        profile.strip_metadata = self.strip_metadata;
        profile
    }
}

/// Parameters handed to the compression backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub target_dpi: u32,
    /// JPEG quality (1-100) for re-encoded images.
    pub jpeg_quality: u8,
    pub recompress_images: bool,
    pub strip_metadata: bool,
    pub best_compression: bool,
}

impl QualityProfile {
    /// Long edge of an A4 page in inches.
    const LONG_EDGE_INCHES: f64 = 11.7;

    /// Largest image edge, in pixels, worth keeping at `target_dpi`.
    pub fn max_image_edge_px(&self) -> u32 {
        (self.target_dpi as f64 * Self::LONG_EDGE_INCHES).round() as u32
    }
}

/// Tagged operation variant: the kind plus its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Convert(ConversionOptions),
    Compress(CompressionOptions),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Convert(_) => OperationKind::Convert,
            Self::Compress(_) => OperationKind::Compress,
        }
    }
}

/// One operation against one document.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub operation: Operation,
    pub document: DocumentMetadata,
    pub cancel: CancelSignal,
}

/// Free-form per-operation measurements (pages converted, ratio, ...).
pub type Metrics = BTreeMap<String, serde_json::Value>;

/// Either an output file or a classified error, never both and never neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationOutcome {
    Succeeded { output_path: PathBuf },
    Failed { error: ErrorKind, message: String },
}

/// Result of any single-document operation. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub kind: OperationKind,
    pub outcome: OperationOutcome,
    pub duration: Duration,
    pub metrics: Metrics,
}

impl OperationResult {
    pub fn succeeded(
        kind: OperationKind,
        output_path: PathBuf,
        duration: Duration,
        metrics: Metrics,
    ) -> Self {
        Self {
            kind,
            outcome: OperationOutcome::Succeeded { output_path },
            duration,
            metrics,
        }
    }

    pub fn failed(kind: OperationKind, error: ErrorKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = format!("{} failed ({error})", kind.label());
        }
        Self {
            kind,
            outcome: OperationOutcome::Failed { error, message },
            duration: Duration::ZERO,
            metrics: Metrics::new(),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn success(&self) -> bool {
        matches!(self.outcome, OperationOutcome::Succeeded { .. })
    }

    pub fn output_path(&self) -> Option<&Path> {
        match &self.outcome {
            OperationOutcome::Succeeded { output_path } => Some(output_path),
            OperationOutcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            OperationOutcome::Succeeded { .. } => None,
            OperationOutcome::Failed { message, .. } => Some(message),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            OperationOutcome::Succeeded { .. } => None,
            OperationOutcome::Failed { error, .. } => Some(*error),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch runs
// ---------------------------------------------------------------------------

/// Derived lifecycle state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

/// Point-in-time snapshot of a batch. Progress produces a new value; an
/// existing snapshot never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRun {
    pub id: BatchId,
    /// Input order. Defines `total_files()`.
    pub file_paths: Arc<[PathBuf]>,
    pub operation: OperationKind,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    successful_files: usize,
    failed_files: usize,
    pub is_cancelled: bool,
    pub estimated_time_remaining: Option<Duration>,
}

impl BatchRun {
    pub fn new(file_paths: impl Into<Arc<[PathBuf]>>, operation: OperationKind) -> Self {
        Self {
            id: BatchId::new(),
            file_paths: file_paths.into(),
            operation,
            started_at: Utc::now(),
            completed_at: None,
            successful_files: 0,
            failed_files: 0,
            is_cancelled: false,
            estimated_time_remaining: None,
        }
    }

    pub fn total_files(&self) -> usize {
        self.file_paths.len()
    }

    pub fn processed_files(&self) -> usize {
        self.successful_files + self.failed_files
    }

    pub fn successful_files(&self) -> usize {
        self.successful_files
    }

    pub fn failed_files(&self) -> usize {
        self.failed_files
    }

    pub fn progress_percentage(&self) -> f64 {
        if self.total_files() == 0 {
            0.0
        } else {
            self.processed_files() as f64 / self.total_files() as f64 * 100.0
        }
    }

    pub fn status(&self) -> BatchStatus {
        if self.is_cancelled {
            BatchStatus::Cancelled
        } else if self.completed_at.is_some() {
            BatchStatus::Completed
        } else if self.processed_files() == 0 {
            BatchStatus::Pending
        } else {
            BatchStatus::Processing
        }
    }

    /// A new snapshot with updated counters.
    pub fn with_progress(
        &self,
        successful_files: usize,
        failed_files: usize,
        estimated_time_remaining: Option<Duration>,
    ) -> Self {
        debug_assert!(successful_files + failed_files <= self.total_files());
        Self {
            successful_files,
            failed_files,
            estimated_time_remaining,
            ..self.clone()
        }
    }

    /// The terminal snapshot.
    pub fn completed(&self, cancelled: bool) -> Self {
        Self {
            completed_at: Some(Utc::now()),
            is_cancelled: cancelled,
            estimated_time_remaining: None,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One processed file, as recorded in the history ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub file_name: String,
    pub operation: String,
    pub success: bool,
    pub processed_at: DateTime<Utc>,
    pub output_path: Option<PathBuf>,
    pub error_message: Option<String>,
    pub file_size_bytes: Option<u64>,
}

impl HistoryEntry {
    pub fn from_result(source: &Path, result: &OperationResult, file_size_bytes: Option<u64>) -> Self {
        Self {
            file_name: file_name_of(source),
            operation: result.kind.label().to_string(),
            success: result.success(),
            processed_at: Utc::now(),
            output_path: result.output_path().map(Path::to_path_buf),
            error_message: result.error_message().map(str::to_string),
            file_size_bytes,
        }
    }

    pub fn status_symbol(&self) -> &'static str {
        if self.success { "✓" } else { "✗" }
    }
}
