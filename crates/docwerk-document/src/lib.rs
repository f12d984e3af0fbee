// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docwerk-document: local collaborators for the docwerk batch engine.
//
// Provides PDF inspection and text extraction, PDF size compression, DOCX
// writing, image re-encoding, and (with the `ocr` feature) text recognition
// for scanned documents. `LocalToolkit` bundles them behind the core traits.

pub mod docx;
pub mod image;
pub mod pdf;
pub mod scan;
pub mod toolkit;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export the primary structs so callers can use `docwerk_document::PdfReader` etc.
pub use docx::DocxWriter;
pub use crate::image::ImageProcessor;
pub use pdf::{PdfCompressor, PdfReader};
pub use toolkit::LocalToolkit;

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
