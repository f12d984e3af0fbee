// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX writer: package paragraphs of text as a minimal WordprocessingML
// document inside a zip container.
//
// The package holds four parts: content types, package relationships, the
// main document, and core properties.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use docwerk_core::error::{DocwerkError, Result};
use tracing::{debug, instrument};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

const DOCUMENT_CLOSE: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

/// Writes editable `.docx` files.
#[derive(Debug, Clone, Default)]
pub struct DocxWriter;

impl DocxWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `paragraphs` to `output`, preceded by a bold `title` paragraph
    /// when one is given. An existing file at `output` is truncated.
    #[instrument(skip_all, fields(path = %output.display(), paragraphs = paragraphs.len()))]
    pub fn write(&self, output: &Path, title: Option<&str>, paragraphs: &[String]) -> Result<()> {
        let file = File::create(output)?;
        self.write_to(file, title, paragraphs)?;
        debug!("DOCX written");
        Ok(())
    }

    /// Write the package to any seekable sink.
    pub fn write_to<W: Write + Seek>(
        &self,
        sink: W,
        title: Option<&str>,
        paragraphs: &[String],
    ) -> Result<()> {
        let title = title.map(sanitize_text).filter(|title| !title.trim().is_empty());

        let mut package = ZipWriter::new(sink);
        add_part(&mut package, "[Content_Types].xml", CONTENT_TYPES_XML)?;
        add_part(&mut package, "_rels/.rels", PACKAGE_RELS_XML)?;
        add_part(
            &mut package,
            "word/document.xml",
            &document_xml(title.as_deref(), paragraphs),
        )?;
        add_part(&mut package, "docProps/core.xml", &core_xml(title.as_deref()))?;

        package
            .finish()
            .map_err(|err| DocwerkError::Docx(format!("failed to finish package: {}", err)))?;
        Ok(())
    }
}

fn add_part<W: Write + Seek>(package: &mut ZipWriter<W>, name: &str, body: &str) -> Result<()> {
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    package
        .start_file(name, options)
        .map_err(|err| DocwerkError::Docx(format!("failed to start {}: {}", name, err)))?;
    package.write_all(body.as_bytes())?;
    Ok(())
}

fn document_xml(title: Option<&str>, paragraphs: &[String]) -> String {
    let mut xml = String::from(DOCUMENT_OPEN);
    if let Some(title) = title {
        xml.push_str("<w:p><w:pPr><w:jc w:val=\"center\"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val=\"32\"/></w:rPr>");
        push_runs(&mut xml, title.trim());
        xml.push_str("</w:r></w:p>");
    }
    for paragraph in paragraphs {
        let clean = sanitize_text(paragraph);
        xml.push_str("<w:p><w:r>");
        push_runs(&mut xml, &clean);
        xml.push_str("</w:r></w:p>");
    }
    xml.push_str(DOCUMENT_CLOSE);
    xml
}

/// Emit text elements for one run; newlines become breaks, tabs become tabs.
fn push_runs(xml: &mut String, text: &str) {
    let mut segment = String::new();
    let flush = |xml: &mut String, segment: &mut String| {
        if !segment.is_empty() {
            xml.push_str("<w:t xml:space=\"preserve\">");
            xml.push_str(&escape_xml(segment));
            xml.push_str("</w:t>");
            segment.clear();
        }
    };

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                flush(xml, &mut segment);
                xml.push_str("<w:br/>");
            }
            '\n' => {
                flush(xml, &mut segment);
                xml.push_str("<w:br/>");
            }
            '\t' => {
                flush(xml, &mut segment);
                xml.push_str("<w:tab/>");
            }
            other => segment.push(other),
        }
    }
    flush(xml, &mut segment);
}

fn core_xml(title: Option<&str>) -> String {
    let title = title
        .map(|title| format!("<dc:title>{}</dc:title>", escape_xml(title.trim())))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">{title}<dc:creator>docwerk</dc:creator></cp:coreProperties>"#
    )
}

/// Keep only characters XML 1.0 can carry. Tab, newline and carriage return
/// pass; form feed becomes a newline; other control characters are dropped.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter_map(|ch| match ch {
            '\t' | '\n' | '\r' => Some(ch),
            '\u{0C}' => Some('\n'),
            '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}' => Some(ch),
            _ => None,
        })
        .collect()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
