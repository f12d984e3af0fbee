// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF compressor: rewrite a PDF smaller with `lopdf`.
//
// Steps, in order: optional metadata stripping (Info dictionary and XMP
// stream), optional downscaling of oversized JPEG images, pruning of
// unreferenced objects, Flate compression of uncompressed streams.

use std::path::Path;

use docwerk_core::error::{DocwerkError, Result};
use docwerk_core::types::QualityProfile;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;
use crate::pdf::reader::is_dct;

/// What a compression pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionStats {
    pub images_recompressed: usize,
    pub objects_pruned: usize,
    pub metadata_stripped: bool,
}

/// Applies a [`QualityProfile`] to PDF files.
pub struct PdfCompressor {
    profile: QualityProfile,
}

impl PdfCompressor {
    pub fn new(profile: QualityProfile) -> Self {
        Self { profile }
    }

    /// Compress `input` into `output`. `output` is overwritten.
    #[instrument(skip_all, fields(input = %input.display(), dpi = self.profile.target_dpi))]
    pub fn compress_file(&self, input: &Path, output: &Path) -> Result<CompressionStats> {
        let mut doc = Document::load(input).map_err(|err| {
            DocwerkError::Pdf(format!("failed to open {}: {}", input.display(), err))
        })?;
        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(DocwerkError::Encrypted(input.to_path_buf()));
        }

        let stats = self.compress_document(&mut doc);

        doc.save(output).map_err(|err| {
            DocwerkError::Pdf(format!("failed to write {}: {}", output.display(), err))
        })?;

        info!(
            images = stats.images_recompressed,
            pruned = stats.objects_pruned,
            stripped = stats.metadata_stripped,
            "PDF compressed"
        );
        Ok(stats)
    }

    /// Apply the profile to an in-memory document.
    pub fn compress_document(&self, doc: &mut Document) -> CompressionStats {
        let mut stats = CompressionStats::default();

        if self.profile.strip_metadata {
            stats.metadata_stripped = strip_metadata(doc);
        }
        if self.profile.recompress_images {
            stats.images_recompressed = self.downscale_images(doc);
        }

        stats.objects_pruned = doc.prune_objects().len();
        doc.delete_zero_length_streams();
        if self.profile.best_compression {
            doc.renumber_objects();
        }
        doc.compress();
        stats
    }

    // -- Images ---------------------------------------------------------------

    fn downscale_images(&self, doc: &mut Document) -> usize {
        let max_edge = self.profile.max_image_edge_px();
        let candidates: Vec<ObjectId> = doc
            .objects
            .iter()
            .filter_map(|(id, object)| match object {
                Object::Stream(stream) if is_recompressible(&stream.dict) => Some(*id),
                _ => None,
            })
            .collect();

        let mut replaced = 0;
        for id in candidates {
            let Ok(Object::Stream(stream)) = doc.get_object_mut(id) else {
                continue;
            };
            match shrink_jpeg(&stream.content, max_edge, self.profile.jpeg_quality) {
                Ok(Some((bytes, width, height))) => {
                    stream.dict.set("Width", width as i64);
                    stream.dict.set("Height", height as i64);
                    stream.set_content(bytes);
                    replaced += 1;
                }
                Ok(None) => {}
                Err(err) => warn!(?id, %err, "Skipping image that failed to re-encode"),
            }
        }
        debug!(replaced, max_edge, "Image pass complete");
        replaced
    }
}

/// DCT images in a colour space the re-encoder reproduces exactly.
fn is_recompressible(dict: &lopdf::Dictionary) -> bool {
    let is_image = matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image");
    let plain_colour = matches!(
        dict.get(b"ColorSpace"),
        Ok(Object::Name(name)) if name == b"DeviceRGB" || name == b"DeviceGray"
    );
    is_image && plain_colour && is_dct(dict) && !dict.has(b"Decode") && !dict.has(b"SMask")
}

/// Downscale and re-encode one JPEG. `None` when the image is already small
/// enough or the result would not be smaller.
fn shrink_jpeg(data: &[u8], max_edge: u32, quality: u8) -> Result<Option<(Vec<u8>, u32, u32)>> {
    let processor = ImageProcessor::from_bytes(data)?;
    if processor.long_edge() <= max_edge {
        return Ok(None);
    }
    let resized = processor.fit_within(max_edge);
    let bytes = resized.to_jpeg_bytes(quality)?;
    if bytes.len() >= data.len() {
        return Ok(None);
    }
    Ok(Some((bytes, resized.width(), resized.height())))
}

// -- Metadata -----------------------------------------------------------------

/// Remove the Info dictionary and the catalog's XMP stream.
fn strip_metadata(doc: &mut Document) -> bool {
    let mut stripped = doc.trailer.remove(b"Info").is_some();

    let catalog_id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    if let Some(catalog_id) = catalog_id {
        if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(catalog_id) {
            stripped |= catalog.remove(b"Metadata").is_some();
        }
    }

    // The orphaned objects go in the prune pass.
    stripped
}
