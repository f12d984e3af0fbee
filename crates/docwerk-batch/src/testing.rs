// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted toolkit for orchestration tests.
//
// Each registered document is a real file on disk (so `can_process` holds)
// whose behaviour is scripted: page text, encryption, failures, panics and
// artificial latency. In-flight counters let tests check the concurrency cap.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use docwerk_core::CancelSignal;
use docwerk_core::error::{DocwerkError, Result};
use docwerk_core::traits::{
    DocumentCompressor, DocumentInspector, DocumentToolkit, EditableDocumentWriter, MetadataReader,
    TextExtractor,
};
use docwerk_core::types::{DocumentMetadata, FontInfo, PageRange, QualityProfile};
use docwerk_document::DocxWriter;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Behaviour of one scripted document.
#[derive(Debug, Clone)]
pub(crate) struct FakeDocument {
    pub pages: u32,
    /// Text returned for every page.
    pub page_text: String,
    pub encrypted: bool,
    pub corrupted: bool,
    pub has_images: bool,
    /// `None` makes the fallback fail.
    pub fallback_text: Option<String>,
    pub fonts: Vec<FontInfo>,
    pub tagged: Option<bool>,
    pub fail_extract: bool,
    pub panic_on_extract: bool,
    /// Latency of each extraction and compression call.
    pub delay: Duration,
    /// Cancel this signal from inside the first extraction call.
    pub cancel_during_extract: Option<CancelSignal>,
}

impl FakeDocument {
    /// A healthy document with `pages` pages of usable text.
    pub fn text(pages: u32) -> Self {
        Self {
            pages,
            page_text: "The committee reviewed the annual figures in detail. ".repeat(4),
            encrypted: false,
            corrupted: false,
            has_images: false,
            fallback_text: None,
            fonts: Vec::new(),
            tagged: Some(true),
            fail_extract: false,
            panic_on_extract: false,
            delay: Duration::ZERO,
            cancel_during_extract: None,
        }
    }

    /// Image-only pages with no embedded text.
    pub fn scanned(pages: u32) -> Self {
        Self {
            page_text: String::new(),
            has_images: true,
            fallback_text: Some("Recognised text from the scanned page images.".into()),
            ..Self::text(pages)
        }
    }

    pub fn encrypted() -> Self {
        Self {
            encrypted: true,
            ..Self::text(1)
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
pub(crate) struct FakeToolkit {
    documents: HashMap<PathBuf, FakeDocument>,
    writer: DocxWriter,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    extract_calls: AtomicUsize,
    fallback_calls: AtomicUsize,
    write_calls: AtomicUsize,
    no_fallback: bool,
}

impl FakeToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the fallback extractor as unavailable.
    pub fn without_fallback(mut self) -> Self {
        self.no_fallback = true;
        self
    }

    /// Create `dir/name` on disk and script its behaviour.
    pub fn add(&mut self, dir: &Path, name: &str, document: FakeDocument) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![b'%'; 2048]).expect("write fake document");
        self.documents.insert(path.clone(), document);
        path
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn fallback_calls(&self) -> usize {
        self.fallback_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn document(&self, path: &Path) -> Result<&FakeDocument> {
        self.documents
            .get(path)
            .filter(|_| path.exists())
            .ok_or_else(|| DocwerkError::NotFound(path.to_path_buf()))
    }

    /// Simulate a slow backend call while tracking concurrency.
    fn busy(&self, delay: Duration) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DocumentToolkit for FakeToolkit {
    fn toolkit_name(&self) -> &str {
        "fake"
    }
}

impl MetadataReader for FakeToolkit {
    fn read_metadata(&self, path: &Path) -> Result<DocumentMetadata> {
        let document = self.document(path)?;
        let size_bytes = std::fs::metadata(path)?.len();
        Ok(DocumentMetadata {
            path: path.to_path_buf(),
            size_bytes,
            page_count: document.pages,
            created_at: Utc::now(),
            modified_at: Utc::now(),
            is_encrypted: document.encrypted,
            is_corrupted: document.corrupted,
            title: Some("Fake document".into()),
            pdf_version: Some("1.7".into()),
        })
    }
}

impl TextExtractor for FakeToolkit {
    fn extract_primary_text(&self, path: &Path, pages: Option<PageRange>) -> Result<String> {
        let document = self.document(path)?;
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(signal) = &document.cancel_during_extract {
            signal.cancel();
        }
        if document.panic_on_extract {
            panic!("scripted extraction panic");
        }
        self.busy(document.delay);
        if document.fail_extract {
            return Err(DocwerkError::Pdf("scripted extraction failure".into()));
        }

        let range = pages.unwrap_or(PageRange::new(1, document.pages));
        let end = range.end.min(document.pages);
        let mut text = String::new();
        for _ in range.start..=end {
            text.push_str(&document.page_text);
            text.push_str("\n\n");
        }
        Ok(text)
    }

    fn fallback_available(&self) -> bool {
        !self.no_fallback
    }

    fn extract_fallback_text(&self, path: &Path, cancel: &CancelSignal) -> Result<String> {
        let document = self.document(path)?;
        self.fallback_calls.fetch_add(1, Ordering::SeqCst);
        cancel.check()?;
        document.fallback_text.clone().ok_or_else(|| DocwerkError::Backend {
            tool: "ocr".into(),
            detail: "scripted fallback failure".into(),
        })
    }
}

impl DocumentInspector for FakeToolkit {
    fn detect_images(&self, path: &Path) -> Result<bool> {
        Ok(self.document(path)?.has_images)
    }

    fn list_attachments(&self, path: &Path) -> Result<Vec<String>> {
        self.document(path)?;
        Ok(Vec::new())
    }

    fn list_fonts(&self, path: &Path) -> Result<Vec<FontInfo>> {
        Ok(self.document(path)?.fonts.clone())
    }

    fn is_tagged(&self, path: &Path) -> Result<Option<bool>> {
        Ok(self.document(path)?.tagged)
    }
}

impl EditableDocumentWriter for FakeToolkit {
    fn write_editable_document(
        &self,
        output: &Path,
        title: Option<&str>,
        paragraphs: &[String],
    ) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.writer.write(output, title, paragraphs)
    }
}

impl DocumentCompressor for FakeToolkit {
    fn compress_document(
        &self,
        input: &Path,
        output: &Path,
        _profile: &QualityProfile,
    ) -> Result<()> {
        let document = self.document(input)?;
        self.busy(document.delay);
        let bytes = std::fs::read(input)?;
        std::fs::write(output, &bytes[..bytes.len() / 2])?;
        Ok(())
    }
}

/// Write a real one-page PDF showing `text` in Helvetica, for tests that run
/// the local toolkit end to end.
pub(crate) fn write_text_pdf(path: &Path, text: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 770.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode page content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save PDF");
}
