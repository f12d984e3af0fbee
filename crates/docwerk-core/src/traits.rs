// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator trait definitions.
//
// The batch engine never touches document bytes itself. Extraction, OCR,
// DOCX serialisation and PDF rewriting sit behind these traits. All methods
// are synchronous and may block; async callers run them on the blocking pool.

use std::path::Path;

use crate::cancel::CancelSignal;
use crate::error::Result;
use crate::types::{DocumentMetadata, FontInfo, PageRange, QualityProfile};

/// Unified toolkit that groups every collaborator the engine needs.
pub trait DocumentToolkit:
    MetadataReader
    + TextExtractor
    + DocumentInspector
    + EditableDocumentWriter
    + DocumentCompressor
    + Send
    + Sync
{
    /// Human-readable backend name, for logs.
    fn toolkit_name(&self) -> &str;
}

/// Read cheap structural facts about a document.
pub trait MetadataReader {
    /// `Err(NotFound)` if `path` does not exist. A file that exists but
    /// cannot be parsed yields metadata with `is_corrupted` set.
    fn read_metadata(&self, path: &Path) -> Result<DocumentMetadata>;
}

/// Pull text out of a document.
pub trait TextExtractor {
    /// Embedded text for `pages`, or the whole document when `None`.
    fn extract_primary_text(&self, path: &Path, pages: Option<PageRange>) -> Result<String>;

    /// Recognised text for documents without usable embedded text.
    /// Implementations poll `cancel` between units of work.
    fn extract_fallback_text(&self, path: &Path, cancel: &CancelSignal) -> Result<String>;

    /// Whether `extract_fallback_text` can work at all, e.g. OCR is compiled
    /// in and its models are present. When `false` the runner writes weak
    /// embedded text instead of failing the document.
    fn fallback_available(&self) -> bool {
        true
    }
}

/// Structural signals used by triage.
pub trait DocumentInspector {
    fn detect_images(&self, path: &Path) -> Result<bool>;

    /// Names of embedded file attachments.
    fn list_attachments(&self, path: &Path) -> Result<Vec<String>>;

    fn list_fonts(&self, path: &Path) -> Result<Vec<FontInfo>>;

    /// `Some(false)` for an untagged document, `None` when unknown.
    fn is_tagged(&self, path: &Path) -> Result<Option<bool>>;
}

/// Serialise text into an editable word-processing document.
pub trait EditableDocumentWriter {
    /// Write `paragraphs` (and an optional heading) to `output`, replacing
    /// any existing content at that path.
    fn write_editable_document(
        &self,
        output: &Path,
        title: Option<&str>,
        paragraphs: &[String],
    ) -> Result<()>;
}

/// Rewrite a PDF to reduce its size.
pub trait DocumentCompressor {
    fn compress_document(&self, input: &Path, output: &Path, profile: &QualityProfile)
    -> Result<()>;
}
