// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test-only PDF builder. Produces small but structurally real documents with
// lopdf so reader, compressor and toolkit tests exercise the real parser.

use std::path::Path;

use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

#[derive(Debug, Default, Clone)]
pub(crate) struct PdfFixture {
    pages: Vec<Vec<String>>,
    title: Option<String>,
    jpeg: Option<(u32, u32)>,
    attachment: Option<String>,
    embedded_font: Option<String>,
    tagged: bool,
}

impl PdfFixture {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a page showing `lines`, one per text line.
    pub(crate) fn page(mut self, lines: &[&str]) -> Self {
        self.pages.push(lines.iter().map(|line| line.to_string()).collect());
        self
    }

    pub(crate) fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Draw a DCT-encoded RGB image of the given size on the first page.
    pub(crate) fn jpeg_image(mut self, width: u32, height: u32) -> Self {
        self.jpeg = Some((width, height));
        self
    }

    pub(crate) fn attachment(mut self, name: &str) -> Self {
        self.attachment = Some(name.to_string());
        self
    }

    /// Reference an extra font whose program is embedded.
    pub(crate) fn embedded_font(mut self, base_font: &str) -> Self {
        self.embedded_font = Some(base_font.to_string());
        self
    }

    pub(crate) fn tagged(mut self) -> Self {
        self.tagged = true;
        self
    }

    pub(crate) fn build(&self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut fonts = dictionary! { "F1" => font_id };
        if let Some(base_font) = &self.embedded_font {
            let program_id = doc.add_object(Stream::new(dictionary! {}, b"fake glyphs".to_vec()));
            let descriptor_id = doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => Object::Name(base_font.as_bytes().to_vec()),
                "FontFile2" => program_id,
            });
            let embedded_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
                "FontDescriptor" => descriptor_id,
            });
            fonts.set("F2", embedded_id);
        }

        let image_id = self.jpeg.map(|(width, height)| {
            let bytes = jpeg_bytes(width, height);
            doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                bytes,
            ))
        });

        let mut kids = Vec::new();
        for (index, lines) in self.pages.iter().enumerate() {
            let mut resources = Dictionary::new();
            resources.set("Font", fonts.clone());

            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 770.into()]),
            ];
            for line in lines {
                operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
                operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            }
            operations.push(Operation::new("ET", vec![]));

            if let (0, Some(image_id)) = (index, image_id) {
                resources.set("XObject", dictionary! { "Im1" => image_id });
                operations.extend([
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![200.into(), 0.into(), 0.into(), 200.into(), 72.into(), 300.into()],
                    ),
                    Operation::new("Do", vec!["Im1".into()]),
                    Operation::new("Q", vec![]),
                ]);
            }

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode page content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };

        if let Some(name) = &self.attachment {
            let payload_id = doc.add_object(Stream::new(
                dictionary! { "Type" => "EmbeddedFile" },
                b"attached payload".to_vec(),
            ));
            let filespec_id = doc.add_object(dictionary! {
                "Type" => "Filespec",
                "F" => Object::string_literal(name.as_str()),
                "EF" => dictionary! { "F" => payload_id },
            });
            catalog.set(
                "Names",
                dictionary! {
                    "EmbeddedFiles" => dictionary! {
                        "Names" => vec![Object::string_literal(name.as_str()), filespec_id.into()],
                    },
                },
            );
        }

        if self.tagged {
            let struct_root = doc.add_object(dictionary! { "Type" => "StructTreeRoot" });
            catalog.set("MarkInfo", dictionary! { "Marked" => true });
            catalog.set("StructTreeRoot", struct_root);
        }

        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = &self.title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title.as_str()),
                "Producer" => Object::string_literal("docwerk fixtures"),
            });
            doc.trailer.set("Info", info_id);
        }

        doc
    }

    pub(crate) fn write(&self, path: &Path) {
        let mut doc = self.build();
        doc.save(path).expect("save fixture PDF");
    }
}

/// Gradient test image encoded as baseline JPEG.
pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 95);
    img.write_with_encoder(encoder).expect("encode fixture JPEG");
    buffer
}

/// Page lines long enough to count as usable text.
pub(crate) fn prose_lines() -> Vec<&'static str> {
    vec![
        "Quarterly operations summary for the northern region",
        "Revenue grew steadily across all three product lines",
        "Staffing levels remained flat while output increased",
        "The warehouse consolidation completed ahead of schedule",
    ]
}
