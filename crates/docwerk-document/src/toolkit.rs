// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local collaborator toolkit: every document trait backed by in-process
// libraries (lopdf, image, zip, and optionally ocrs).

use std::path::{Path, PathBuf};

use docwerk_core::CancelSignal;
use docwerk_core::error::Result;
use docwerk_core::traits::{
    DocumentCompressor, DocumentInspector, DocumentToolkit, EditableDocumentWriter, MetadataReader,
    TextExtractor,
};
use docwerk_core::types::{DocumentMetadata, FontInfo, PageRange, QualityProfile};
use tracing::instrument;

use crate::docx::DocxWriter;
use crate::pdf::{PdfCompressor, PdfReader, read_metadata};

/// The default [`DocumentToolkit`]. Stateless apart from the OCR model
/// location, so one instance serves any number of concurrent workers.
#[derive(Debug, Clone, Default)]
pub struct LocalToolkit {
    docx: DocxWriter,
    ocr_model_dir: Option<PathBuf>,
}

impl LocalToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load OCR models from `dir` instead of the default cache directory.
    pub fn with_ocr_model_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.ocr_model_dir = dir;
        self
    }

    pub fn ocr_model_dir(&self) -> Option<&Path> {
        self.ocr_model_dir.as_deref()
    }
}

impl DocumentToolkit for LocalToolkit {
    fn toolkit_name(&self) -> &str {
        if cfg!(feature = "ocr") {
            "local (lopdf, ocrs)"
        } else {
            "local (lopdf)"
        }
    }
}

impl MetadataReader for LocalToolkit {
    fn read_metadata(&self, path: &Path) -> Result<DocumentMetadata> {
        read_metadata(path)
    }
}

impl TextExtractor for LocalToolkit {
    fn extract_primary_text(&self, path: &Path, pages: Option<PageRange>) -> Result<String> {
        PdfReader::open(path)?.extract_text(pages)
    }

    #[cfg(feature = "ocr")]
    #[instrument(skip_all, fields(path = %path.display()))]
    fn extract_fallback_text(&self, path: &Path, cancel: &CancelSignal) -> Result<String> {
        use crate::scan::{OcrConfig, OcrEngine};

        cancel.check()?;
        // Models are loaded per document; the engine is not shared across workers.
        let engine = OcrEngine::new(&OcrConfig::from_optional_dir(self.ocr_model_dir()))?;
        engine.recognize_pdf(path, cancel)
    }

    #[cfg(feature = "ocr")]
    fn fallback_available(&self) -> bool {
        crate::scan::OcrConfig::from_optional_dir(self.ocr_model_dir())
            .validate()
            .is_ok()
    }

    #[cfg(not(feature = "ocr"))]
    fn fallback_available(&self) -> bool {
        false
    }

    #[cfg(not(feature = "ocr"))]
    #[instrument(skip_all, fields(path = %path.display()))]
    fn extract_fallback_text(&self, path: &Path, cancel: &CancelSignal) -> Result<String> {
        cancel.check()?;
        Err(docwerk_core::DocwerkError::Backend {
            tool: "ocr".into(),
            detail: "OCR support not compiled in".into(),
        })
    }
}

impl DocumentInspector for LocalToolkit {
    fn detect_images(&self, path: &Path) -> Result<bool> {
        Ok(PdfReader::open(path)?.has_images())
    }

    fn list_attachments(&self, path: &Path) -> Result<Vec<String>> {
        Ok(PdfReader::open(path)?.attachments())
    }

    fn list_fonts(&self, path: &Path) -> Result<Vec<FontInfo>> {
        Ok(PdfReader::open(path)?.fonts())
    }

    fn is_tagged(&self, path: &Path) -> Result<Option<bool>> {
        Ok(Some(PdfReader::open(path)?.is_tagged()))
    }
}

impl EditableDocumentWriter for LocalToolkit {
    fn write_editable_document(
        &self,
        output: &Path,
        title: Option<&str>,
        paragraphs: &[String],
    ) -> Result<()> {
        self.docx.write(output, title, paragraphs)
    }
}

impl DocumentCompressor for LocalToolkit {
    fn compress_document(
        &self,
        input: &Path,
        output: &Path,
        profile: &QualityProfile,
    ) -> Result<()> {
        PdfCompressor::new(*profile).compress_file(input, output)?;
        Ok(())
    }
}
