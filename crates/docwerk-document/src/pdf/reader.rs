// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open and inspect existing PDF documents using the `lopdf` crate.
// Answers every structural question triage asks (pages, encryption, fonts,
// images, attachments, tagging) plus embedded text extraction.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use docwerk_core::error::{DocwerkError, Result};
use docwerk_core::types::{DocumentMetadata, FontInfo, PageRange};
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, info, instrument, warn};

/// Descriptor keys that hold an embedded font program.
const FONT_PROGRAM_KEYS: [&[u8]; 3] = [b"FontFile", b"FontFile2", b"FontFile3"];

/// Read-only view over a parsed PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        if !path_ref.exists() {
            return Err(DocwerkError::NotFound(path_ref.to_path_buf()));
        }
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            DocwerkError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    #[cfg(test)]
    pub(crate) fn from_document(document: Document) -> Self {
        Self { document }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Whether the trailer still carries an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.document.trailer.get(b"Encrypt").is_ok()
    }

    /// Header version, e.g. "1.7".
    pub fn version(&self) -> &str {
        &self.document.version
    }

    /// `/Title` from the document information dictionary.
    pub fn title(&self) -> Option<String> {
        let info = self
            .document
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|obj| self.resolve_dict(obj))?;
        match self.resolve(info.get(b"Title").ok()?) {
            Object::String(bytes, _) => {
                let title = decode_text_string(bytes);
                let trimmed = title.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            _ => None,
        }
    }

    /// Fonts referenced anywhere in the document, deduplicated by name.
    ///
    /// Type0 wrappers are skipped: their descendant CID font carries the
    /// descriptor and is listed instead.
    pub fn fonts(&self) -> Vec<FontInfo> {
        let mut seen = BTreeSet::new();
        let mut fonts = Vec::new();

        for object in self.document.objects.values() {
            let Object::Dictionary(dict) = object else {
                continue;
            };
            if name_of(dict, b"Type") != Some(b"Font".as_slice()) {
                continue;
            }
            let font_type = name_of(dict, b"Subtype")
                .map(|name| String::from_utf8_lossy(name).into_owned())
                .unwrap_or_else(|| "Unknown".to_string());
            if font_type == "Type0" {
                continue;
            }
            let Some(base_font) = name_of(dict, b"BaseFont") else {
                continue;
            };
            let name = String::from_utf8_lossy(base_font).into_owned();
            if !seen.insert(name.clone()) {
                continue;
            }

            // Type3 glyphs are drawn by content streams inside the font dict.
            let embedded = font_type == "Type3" || self.has_font_program(dict);
            let subset = is_subset_name(&name);
            fonts.push(FontInfo {
                name,
                font_type,
                embedded,
                subset,
            });
        }

        debug!(count = fonts.len(), "Fonts listed");
        fonts
    }

    /// Whether any image XObject exists.
    pub fn has_images(&self) -> bool {
        self.document.objects.values().any(|object| match object {
            Object::Stream(stream) => name_of(&stream.dict, b"Subtype") == Some(b"Image".as_slice()),
            _ => false,
        })
    }

    /// Names of files in the `/EmbeddedFiles` name tree.
    pub fn attachments(&self) -> Vec<String> {
        let mut names = Vec::new();
        let tree = self
            .document
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"Names").ok())
            .and_then(|obj| self.resolve_dict(obj))
            .and_then(|names_dict| names_dict.get(b"EmbeddedFiles").ok())
            .and_then(|obj| self.resolve_dict(obj));
        if let Some(tree) = tree {
            self.collect_name_tree(tree, &mut names, 0);
        }
        names
    }

    /// Tagged documents mark themselves in `/MarkInfo` or carry a structure tree.
    pub fn is_tagged(&self) -> bool {
        let Ok(catalog) = self.document.catalog() else {
            return false;
        };
        let marked = catalog
            .get(b"MarkInfo")
            .ok()
            .and_then(|obj| self.resolve_dict(obj))
            .and_then(|mark_info| mark_info.get(b"Marked").ok())
            .and_then(|marked| marked.as_bool().ok())
            .unwrap_or(false);
        marked || catalog.has(b"StructTreeRoot")
    }

    // -- Extraction -----------------------------------------------------------

    /// Embedded text of the pages in `range` (1-indexed, inclusive), or of
    /// the whole document. Pages beyond the end are ignored.
    #[instrument(skip(self))]
    pub fn extract_text(&self, range: Option<PageRange>) -> Result<String> {
        let page_numbers: Vec<u32> = self
            .document
            .get_pages()
            .keys()
            .copied()
            .filter(|page| range.is_none_or(|range| range.contains(*page)))
            .collect();
        if page_numbers.is_empty() {
            return Ok(String::new());
        }

        let text = self
            .document
            .extract_text(&page_numbers)
            .map_err(|err| DocwerkError::Pdf(format!("text extraction failed: {}", err)))?;
        debug!(pages = page_numbers.len(), chars = text.len(), "Text extracted");
        Ok(text)
    }

    /// Raw content of every DCT-encoded image stream, in object order.
    pub fn jpeg_images(&self) -> Vec<Vec<u8>> {
        self.document
            .objects
            .values()
            .filter_map(|object| match object {
                Object::Stream(stream)
                    if name_of(&stream.dict, b"Subtype") == Some(b"Image".as_slice())
                        && is_dct(&stream.dict) =>
                {
                    Some(stream.content.clone())
                }
                _ => None,
            })
            .collect()
    }

    // -- Helpers --------------------------------------------------------------

    /// Follow a single indirect reference; anything else is returned as-is.
    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(object) {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    fn has_font_program(&self, font: &Dictionary) -> bool {
        let descriptor = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|obj| self.resolve_dict(obj));
        match descriptor {
            Some(descriptor) => FONT_PROGRAM_KEYS.iter().any(|key| descriptor.has(key)),
            None => false,
        }
    }

    fn collect_name_tree(&self, node: &Dictionary, out: &mut Vec<String>, depth: usize) {
        // Malformed trees can loop.
        if depth > 32 {
            warn!("Embedded file name tree too deep, stopping");
            return;
        }
        if let Ok(Object::Array(pairs)) = node.get(b"Names").map(|obj| self.resolve(obj)) {
            for key in pairs.iter().step_by(2) {
                if let Object::String(bytes, _) = self.resolve(key) {
                    out.push(decode_text_string(bytes));
                }
            }
        }
        if let Ok(Object::Array(kids)) = node.get(b"Kids").map(|obj| self.resolve(obj)) {
            for kid in kids {
                if let Some(kid) = self.resolve_dict(kid) {
                    self.collect_name_tree(kid, out, depth + 1);
                }
            }
        }
    }
}

// -- Metadata -----------------------------------------------------------------

/// Build [`DocumentMetadata`] for `path`.
///
/// Missing files are `NotFound`. A file that lopdf cannot parse is reported
/// as corrupted, unless its bytes mention an encryption dictionary, in which
/// case it is reported as encrypted with zero readable pages.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_metadata(path: &Path) -> Result<DocumentMetadata> {
    let fs_meta = std::fs::metadata(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            DocwerkError::NotFound(path.to_path_buf())
        } else {
            DocwerkError::Io(err)
        }
    })?;

    let modified_at = fs_meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    let created_at = fs_meta
        .created()
        .map(DateTime::<Utc>::from)
        .unwrap_or(modified_at);

    let mut metadata = DocumentMetadata {
        path: path.to_path_buf(),
        size_bytes: fs_meta.len(),
        page_count: 0,
        created_at,
        modified_at,
        is_encrypted: false,
        is_corrupted: false,
        title: None,
        pdf_version: None,
    };

    match Document::load(path) {
        Ok(document) => {
            let reader = PdfReader { document };
            metadata.page_count = reader.page_count();
            metadata.is_encrypted = reader.is_encrypted();
            metadata.title = reader.title();
            metadata.pdf_version = Some(reader.version().to_string());
            debug!(
                pages = metadata.page_count,
                encrypted = metadata.is_encrypted,
                "Metadata read"
            );
        }
        Err(err) => {
            let bytes = std::fs::read(path)?;
            if mentions_encryption(&bytes) {
                warn!(%err, "PDF did not load and declares encryption");
                metadata.is_encrypted = true;
            } else {
                warn!(%err, "PDF could not be parsed, marking corrupted");
                metadata.is_corrupted = true;
            }
        }
    }

    Ok(metadata)
}

fn mentions_encryption(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|window| window == b"/Encrypt")
}

/// Name value stored directly under `key`.
fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key) {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

/// Whether the stream's only (or last) filter is DCTDecode.
pub(crate) fn is_dct(dict: &Dictionary) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => name == b"DCTDecode",
        Ok(Object::Array(filters)) => {
            filters.len() == 1 && matches!(&filters[0], Object::Name(name) if name == b"DCTDecode")
        }
        _ => false,
    }
}

/// Subset fonts are prefixed with six uppercase letters and a plus sign.
fn is_subset_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() > 7 && bytes[6] == b'+' && bytes[..6].iter().all(u8::is_ascii_uppercase)
}

/// Decode a PDF text string: UTF-16BE when it starts with a byte-order
/// mark, otherwise one byte per character.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&byte| byte as char).collect(),
    }
}
